//! Run Args - 파싱된 CLI 인자 객체
//!
//! clap의 `ArgMatches`를 런타임이 들고 다니기 쉬운 형태로 평탄화합니다.
//! 플러그인들이 추가한 옵션도 여기에 함께 담겨 `configure`/`is_enabled`로 전달됩니다.

use clap::ArgMatches;
use std::collections::HashMap;
use std::path::PathBuf;

/// 파싱된 CLI 인자
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    /// bool 플래그 (ArgAction::SetTrue/SetFalse)
    flags: HashMap<String, bool>,

    /// 값을 가지는 인자 (문자열로 정규화)
    values: HashMap<String, Vec<String>>,
}

impl RunArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// `ArgMatches`에서 생성
    ///
    /// bool, String, PathBuf, 정수 타입 인자를 인식하며 그 외 타입은 무시합니다.
    /// 선택된 서브커맨드의 인자도 함께 담으며, 같은 이름이면 서브커맨드 쪽이 우선합니다.
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let mut args = Self::new();

        for id in matches.ids() {
            let id = id.as_str();

            if let Ok(Some(flag)) = matches.try_get_one::<bool>(id) {
                args.flags.insert(id.to_string(), *flag);
            } else if let Some(values) = collect_values(matches, id) {
                args.values.insert(id.to_string(), values);
            }
        }

        if let Some((_, sub)) = matches.subcommand() {
            args.merge(Self::from_matches(sub));
        }

        args
    }

    /// 다른 인자 집합을 덮어쓰기
    pub fn merge(&mut self, other: RunArgs) {
        self.flags.extend(other.flags);
        self.values.extend(other.values);
    }

    // ========================================================================
    // 빌더 (테스트/임베딩용)
    // ========================================================================

    pub fn with_flag(mut self, name: impl Into<String>, value: bool) -> Self {
        self.flags.insert(name.into(), value);
        self
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.entry(name.into()).or_default().push(value.into());
        self
    }

    // ========================================================================
    // 접근자
    // ========================================================================

    /// 플래그 값 (없으면 false)
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    /// 첫 번째 값
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// 모든 값
    pub fn values(&self, name: &str) -> &[String] {
        self.values.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 값을 원하는 타입으로 파싱
    pub fn parsed<T: std::str::FromStr>(&self, name: &str) -> Option<T> {
        self.value(name).and_then(|v| v.parse().ok())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.flags.contains_key(name) || self.values.contains_key(name)
    }
}

fn collect_values(matches: &ArgMatches, id: &str) -> Option<Vec<String>> {
    if let Ok(Some(values)) = matches.try_get_many::<String>(id) {
        return Some(values.cloned().collect());
    }
    if let Ok(Some(values)) = matches.try_get_many::<PathBuf>(id) {
        return Some(values.map(|p| p.display().to_string()).collect());
    }
    if let Ok(Some(values)) = matches.try_get_many::<usize>(id) {
        return Some(values.map(ToString::to_string).collect());
    }
    if let Ok(Some(values)) = matches.try_get_many::<i64>(id) {
        return Some(values.map(ToString::to_string).collect());
    }
    None
}
