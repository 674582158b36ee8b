//! Lifecycle - 임베딩 애플리케이션이 브로드캐스트하는 이벤트 인터페이스
//!
//! 각 trait은 하나의 인터페이스이며, 플러그인은 필요한 것만 구현합니다.
//! 모든 훅은 동기 호출이며 에러를 반환하면 해당 브로드캐스트가 중단됩니다.

use crate::component::ComponentRegistry;
use crate::declare_interface;
use harness_foundation::Result;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

// ============================================================================
// 이벤트 데이터
// ============================================================================

/// 실행할 테스트 케이스
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCase {
    /// `group::name` 형식의 고유 ID
    pub id: String,
    pub name: String,
    pub group: String,
    pub command: String,
    /// 설정되면 실행하지 않고 사유와 함께 Skipped로 보고
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<String>,
}

impl TestCase {
    pub fn new(group: impl Into<String>, name: impl Into<String>, command: impl Into<String>) -> Self {
        let group = group.into();
        let name = name.into();
        Self {
            id: format!("{}::{}", group, name),
            name,
            group,
            command: command.into(),
            skip: None,
        }
    }

    pub fn with_skip(mut self, reason: impl Into<String>) -> Self {
        self.skip = Some(reason.into());
        self
    }
}

/// 테스트 그룹
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestGroup {
    pub name: String,
    pub cases: Vec<TestCase>,
}

/// 테스트 스위트
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestSuite {
    pub name: String,
    pub groups: Vec<TestGroup>,
}

impl TestSuite {
    pub fn case_count(&self) -> usize {
        self.groups.iter().map(|g| g.cases.len()).sum()
    }
}

/// 테스트 결과 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    /// 실행 자체가 실패 (명령을 찾을 수 없음 등)
    Error,
    /// 스위트에서 skip으로 표시되어 실행하지 않음
    Skipped,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TestStatus::Passed => "PASS",
            TestStatus::Failed => "FAIL",
            TestStatus::Error => "ERROR",
            TestStatus::Skipped => "SKIP",
        };
        f.write_str(s)
    }
}

/// 테스트 케이스 실행 결과
#[derive(Debug, Clone, Serialize)]
pub struct TestOutcome {
    pub status: TestStatus,
    pub exit_code: Option<i32>,
    pub output: String,
    pub duration: Duration,
}

impl TestOutcome {
    pub fn skipped() -> Self {
        Self {
            status: TestStatus::Skipped,
            exit_code: None,
            output: String::new(),
            duration: Duration::ZERO,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, TestStatus::Passed | TestStatus::Skipped)
    }
}

// ============================================================================
// 인터페이스
// ============================================================================

/// 플러그인 발견 완료
pub trait PluginsLoaded: Send + Sync {
    fn on_plugins_loaded(&self, registry: &ComponentRegistry) -> Result<()>;
}

/// 애플리케이션 시작/종료
pub trait ApplicationLifecycle: Send + Sync {
    fn on_application_start(&self) -> Result<()> {
        Ok(())
    }

    fn on_application_exit(&self) -> Result<()> {
        Ok(())
    }
}

/// 테스트 스위트 전후
pub trait TestSuiteHooks: Send + Sync {
    fn pre_test_suite(&self, _suite: &TestSuite) -> Result<()> {
        Ok(())
    }

    fn post_test_suite(&self, _suite: &TestSuite) -> Result<()> {
        Ok(())
    }
}

/// 테스트 그룹 전후
pub trait TestGroupHooks: Send + Sync {
    fn pre_test_group(&self, _group: &TestGroup) -> Result<()> {
        Ok(())
    }

    fn post_test_group(&self, _group: &TestGroup) -> Result<()> {
        Ok(())
    }
}

/// 테스트 케이스 전후
///
/// 워커 스레드에서 호출됩니다. 케이스 단위 상태는 `ThreadLocalScope`에 두세요.
pub trait TestCaseHooks: Send + Sync {
    fn pre_test_case(&self, _case: &TestCase) -> Result<()> {
        Ok(())
    }

    fn post_test_case(&self, _case: &TestCase, _outcome: &TestOutcome) -> Result<()> {
        Ok(())
    }
}

declare_interface!(
    PluginsLoaded,
    ApplicationLifecycle,
    TestSuiteHooks,
    TestGroupHooks,
    TestCaseHooks,
);
