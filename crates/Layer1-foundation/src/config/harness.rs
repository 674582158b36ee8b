//! Harness Config - 섹션/키 기반 설정 객체
//!
//! TOML 문서를 섹션 단위로 읽고, 타입별 접근자(bool/int/list)를 제공합니다.
//! 런타임은 이 객체를 해석하지 않고 컴포넌트의 `configure`/`is_enabled`에 그대로 전달합니다.
//!
//! ```toml
//! [components]
//! "log_*" = false
//!
//! [durations]
//! enabled = "yes"
//! slow_threshold_ms = 500
//! ```

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use toml::{Table, Value};
use tracing::debug;

/// 기본 설정 파일명
pub const HARNESS_CONFIG_FILE: &str = "harness.toml";

// ============================================================================
// Config
// ============================================================================

/// 섹션 기반 설정
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// 루트 테이블 (섹션 -> 키 -> 값)
    root: Table,

    /// 로드한 파일 경로 (메모리에서 생성된 경우 None)
    source: Option<PathBuf>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load
    // ========================================================================

    /// 파일에서 로드
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        let mut config: Config = content.parse()?;
        config.source = Some(path.to_path_buf());

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// 파일이 없으면 빈 설정 반환
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// 로드한 파일 경로
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    // ========================================================================
    // 섹션
    // ========================================================================

    /// 섹션 테이블
    pub fn section(&self, name: &str) -> Option<&Table> {
        self.root.get(name).and_then(Value::as_table)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    /// 섹션 이름 목록
    pub fn sections(&self) -> Vec<&str> {
        self.root
            .iter()
            .filter(|(_, v)| v.is_table())
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// 원시 값 조회
    pub fn get(&self, section: &str, key: &str) -> Option<&Value> {
        self.section(section).and_then(|s| s.get(key))
    }

    /// 값 설정 (섹션이 없으면 생성)
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<Value>) -> Result<()> {
        let entry = self
            .root
            .entry(section.to_string())
            .or_insert(Value::Table(Table::new()));

        let table = entry
            .as_table_mut()
            .ok_or_else(|| Error::Config(format!("[{}] is not a section", section)))?;
        table.insert(key.to_string(), value.into());
        Ok(())
    }

    // ========================================================================
    // 타입별 접근자
    // ========================================================================

    /// 문자열 값
    pub fn get_str(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key).and_then(Value::as_str)
    }

    /// bool 값 ("yes"/"no", "on"/"off", "1"/"0" 문자열도 허용)
    pub fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>> {
        let Some(value) = self.get(section, key) else {
            return Ok(None);
        };

        match value {
            Value::Boolean(b) => Ok(Some(*b)),
            Value::Integer(0) => Ok(Some(false)),
            Value::Integer(1) => Ok(Some(true)),
            Value::String(s) => parse_bool(s)
                .map(Some)
                .ok_or_else(|| type_error(section, key, "bool", value)),
            other => Err(type_error(section, key, "bool", other)),
        }
    }

    pub fn get_bool_or(&self, section: &str, key: &str, default: bool) -> Result<bool> {
        Ok(self.get_bool(section, key)?.unwrap_or(default))
    }

    /// 정수 값 (숫자 문자열도 허용)
    pub fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>> {
        let Some(value) = self.get(section, key) else {
            return Ok(None);
        };

        match value {
            Value::Integer(i) => Ok(Some(*i)),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| type_error(section, key, "integer", value)),
            other => Err(type_error(section, key, "integer", other)),
        }
    }

    pub fn get_int_or(&self, section: &str, key: &str, default: i64) -> Result<i64> {
        Ok(self.get_int(section, key)?.unwrap_or(default))
    }

    /// 리스트 값 (배열 또는 콤마 구분 문자열)
    pub fn get_list(&self, section: &str, key: &str) -> Result<Vec<String>> {
        let Some(value) = self.get(section, key) else {
            return Ok(Vec::new());
        };

        match value {
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    Value::Integer(_) | Value::Float(_) | Value::Boolean(_) => Ok(item.to_string()),
                    other => Err(type_error(section, key, "list of scalars", other)),
                })
                .collect(),
            Value::String(s) => Ok(s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()),
            other => Err(type_error(section, key, "list", other)),
        }
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let root: Table = s.parse::<Table>()?;
        Ok(Self { root, source: None })
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn type_error(section: &str, key: &str, expected: &str, value: &Value) -> Error {
    Error::Config(format!(
        "[{}] {}: expected {}, found {}",
        section,
        key,
        expected,
        value.type_str()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [run]
        workers = 4
        retries = "2"
        tags = ["smoke", "storage"]
        skip = "network, hosts"

        [durations]
        enabled = "yes"
        verbose = false
    "#;

    #[test]
    fn test_typed_accessors() {
        let config: Config = SAMPLE.parse().unwrap();

        assert_eq!(config.get_int("run", "workers").unwrap(), Some(4));
        assert_eq!(config.get_int("run", "retries").unwrap(), Some(2));
        assert_eq!(config.get_bool("durations", "enabled").unwrap(), Some(true));
        assert_eq!(config.get_bool("durations", "verbose").unwrap(), Some(false));
        assert_eq!(config.get_list("run", "tags").unwrap(), vec!["smoke", "storage"]);
        assert_eq!(config.get_list("run", "skip").unwrap(), vec!["network", "hosts"]);
    }

    #[test]
    fn test_missing_values() {
        let config: Config = SAMPLE.parse().unwrap();

        assert_eq!(config.get_bool("nope", "enabled").unwrap(), None);
        assert!(config.get_bool_or("nope", "enabled", true).unwrap());
        assert_eq!(config.get_int_or("run", "missing", 7).unwrap(), 7);
        assert!(config.get_list("run", "missing").unwrap().is_empty());
        assert!(!config.has_section("nope"));
    }

    #[test]
    fn test_type_mismatch() {
        let config: Config = SAMPLE.parse().unwrap();

        assert!(config.get_bool("run", "tags").is_err());
        assert!(config.get_int("durations", "enabled").is_err());
    }

    #[test]
    fn test_set_and_sections() {
        let mut config = Config::new();
        config.set("components", "log_*", false).unwrap();
        config.set("run", "workers", 2).unwrap();

        assert_eq!(config.get_bool("components", "log_*").unwrap(), Some(false));
        assert_eq!(config.get_int("run", "workers").unwrap(), Some(2));

        let mut sections = config.sections();
        sections.sort();
        assert_eq!(sections, vec!["components", "run"]);
    }

    #[test]
    fn test_load_or_default() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join(HARNESS_CONFIG_FILE);

        let config = Config::load_or_default(&path).unwrap();
        assert!(config.source().is_none());

        std::fs::write(&path, SAMPLE).unwrap();
        let config = Config::load_or_default(&path).unwrap();
        assert_eq!(config.source(), Some(path.as_path()));
        assert_eq!(config.get_int("run", "workers").unwrap(), Some(4));
    }

    #[test]
    fn test_invalid_toml() {
        assert!("[run\nworkers = ".parse::<Config>().is_err());
    }
}
