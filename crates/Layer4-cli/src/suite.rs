//! Suite file - TOML 테스트 스위트 로드
//!
//! ```toml
//! name = "smoke"
//!
//! [[group]]
//! name = "basic"
//!
//! [[group.case]]
//! name = "echo"
//! command = "echo hello"
//!
//! [[group.case]]
//! name = "slow"
//! command = "sleep 600"
//! skip = "too slow for smoke runs"
//! ```

use harness_core::{Error, Result, TestCase, TestGroup, TestSuite};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SuiteFile {
    name: Option<String>,
    #[serde(default, rename = "group")]
    groups: Vec<GroupFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GroupFile {
    name: String,
    #[serde(default, rename = "case")]
    cases: Vec<CaseFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CaseFile {
    name: String,
    command: String,
    /// 실행하지 않을 사유
    skip: Option<String>,
}

/// 파일에서 스위트 로드 (이름이 없으면 파일 이름 사용)
pub fn load(path: &Path) -> Result<TestSuite> {
    let content = std::fs::read_to_string(path)?;
    let fallback = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("suite");
    parse(&content, fallback)
}

/// 문자열에서 스위트 파싱
pub fn parse(content: &str, fallback_name: &str) -> Result<TestSuite> {
    let file: SuiteFile = toml::from_str(content)?;

    let mut seen = HashSet::new();
    let mut groups = Vec::with_capacity(file.groups.len());

    for group in file.groups {
        let cases = group
            .cases
            .into_iter()
            .map(|case| {
                let test = TestCase::new(&group.name, case.name, case.command);
                match case.skip {
                    Some(reason) => test.with_skip(reason),
                    None => test,
                }
            })
            .collect::<Vec<_>>();

        for case in &cases {
            if !seen.insert(case.id.clone()) {
                return Err(Error::InvalidInput(format!("duplicate test case: {}", case.id)));
            }
        }

        groups.push(TestGroup {
            name: group.name,
            cases,
        });
    }

    Ok(TestSuite {
        name: file.name.unwrap_or_else(|| fallback_name.to_string()),
        groups,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUITE: &str = r#"
name = "smoke"

[[group]]
name = "basic"

[[group.case]]
name = "ok"
command = "true"

[[group.case]]
name = "echo"
command = "echo 'hello world'"

[[group.case]]
name = "later"
command = "false"
skip = "not ready"

[[group]]
name = "empty"
"#;

    #[test]
    fn test_parse_suite() {
        let suite = parse(SUITE, "fallback").unwrap();

        assert_eq!(suite.name, "smoke");
        assert_eq!(suite.groups.len(), 2);
        assert_eq!(suite.case_count(), 3);
        assert_eq!(suite.groups[0].cases[1].id, "basic::echo");
        assert!(suite.groups[0].cases[1].skip.is_none());
        assert_eq!(suite.groups[0].cases[2].skip.as_deref(), Some("not ready"));
        assert_eq!(suite.groups[0].cases[1].command, "echo 'hello world'");
        assert!(suite.groups[1].cases.is_empty());
    }

    #[test]
    fn test_fallback_name() {
        let suite = parse("", "nightly").unwrap();
        assert_eq!(suite.name, "nightly");
        assert!(suite.groups.is_empty());
    }

    #[test]
    fn test_duplicate_case_rejected() {
        let content = r#"
[[group]]
name = "g"
[[group.case]]
name = "a"
command = "true"
[[group.case]]
name = "a"
command = "false"
"#;
        assert!(matches!(parse(content, "x"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let content = "[[group]]\nname = \"g\"\ntimeout = 3\n";
        assert!(matches!(parse(content, "x"), Err(Error::Toml(_))));
    }
}
