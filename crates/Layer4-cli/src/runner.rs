//! Suite runner - 라이프사이클 이벤트를 브로드캐스트하며 테스트 스위트 실행
//!
//! ```text
//! on_application_start
//!   pre_test_suite
//!     pre_test_group
//!       [worker pool] pre_test_case -> 명령 실행 (skip이면 생략) -> post_test_case
//!     post_test_group
//!   post_test_suite
//! on_application_exit
//! ```
//!
//! 어느 브로드캐스트든 실패하면 실행을 중단합니다. `on_application_exit`는
//! 중단된 경우에도 호출됩니다.

use harness_core::{
    ApplicationLifecycle, Error, PluginManager, Result, TestCase, TestCaseHooks, TestGroup,
    TestGroupHooks, TestOutcome, TestStatus, TestSuite, TestSuiteHooks,
};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use std::process::{Command, Stdio};
use std::time::Instant;
use tracing::{debug, info};

/// 케이스 하나의 결과
#[derive(Debug, Clone, Serialize)]
pub struct CaseResult {
    pub case: TestCase,
    pub outcome: TestOutcome,
}

/// 스위트 실행 결과
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub suite: String,
    pub results: Vec<CaseResult>,
}

impl RunReport {
    pub fn count(&self, status: TestStatus) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome.status == status)
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.results.iter().all(|r| r.outcome.is_success())
    }
}

/// 스위트 실행기
pub struct SuiteRunner<'a> {
    plugins: &'a PluginManager,
    pool: ThreadPool,
}

impl<'a> SuiteRunner<'a> {
    pub fn new(plugins: &'a PluginManager, workers: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("harness-worker-{}", i))
            .build()
            .map_err(|e| Error::Internal(format!("failed to start worker pool: {}", e)))?;

        Ok(Self { plugins, pool })
    }

    pub fn run(&self, suite: &TestSuite) -> Result<RunReport> {
        let lifecycle = self.plugins.extension_point::<dyn ApplicationLifecycle>();

        lifecycle.broadcast("on_application_start", |l| l.on_application_start())?;
        let result = self.run_suite(suite);
        let exit = lifecycle.broadcast("on_application_exit", |l| l.on_application_exit());

        let report = result?;
        exit?;
        Ok(report)
    }

    fn run_suite(&self, suite: &TestSuite) -> Result<RunReport> {
        info!(
            "Running suite {} ({} case(s), {} worker(s))",
            suite.name,
            suite.case_count(),
            self.pool.current_num_threads()
        );

        let hooks = self.plugins.extension_point::<dyn TestSuiteHooks>();
        hooks.broadcast("pre_test_suite", |h| h.pre_test_suite(suite))?;

        let mut results = Vec::with_capacity(suite.case_count());
        for group in &suite.groups {
            results.extend(self.run_group(group)?);
        }

        hooks.broadcast("post_test_suite", |h| h.post_test_suite(suite))?;

        Ok(RunReport {
            suite: suite.name.clone(),
            results,
        })
    }

    fn run_group(&self, group: &TestGroup) -> Result<Vec<CaseResult>> {
        let hooks = self.plugins.extension_point::<dyn TestGroupHooks>();
        hooks.broadcast("pre_test_group", |h| h.pre_test_group(group))?;

        // 첫 에러에서 남은 케이스 스케줄링 중단
        let results = self.pool.install(|| {
            group
                .cases
                .par_iter()
                .map(|case| self.run_case(case))
                .collect::<Result<Vec<_>>>()
        })?;

        hooks.broadcast("post_test_group", |h| h.post_test_group(group))?;
        Ok(results)
    }

    fn run_case(&self, case: &TestCase) -> Result<CaseResult> {
        let hooks = self.plugins.extension_point::<dyn TestCaseHooks>();

        hooks.broadcast("pre_test_case", |h| h.pre_test_case(case))?;
        let outcome = match &case.skip {
            Some(reason) => TestOutcome {
                output: reason.clone(),
                ..TestOutcome::skipped()
            },
            None => execute(case),
        };
        debug!("{} {}", outcome.status, case.id);
        hooks.broadcast("post_test_case", |h| h.post_test_case(case, &outcome))?;

        Ok(CaseResult {
            case: case.clone(),
            outcome,
        })
    }
}

/// 케이스 명령 실행 (종료 코드 0이면 통과)
pub fn execute(case: &TestCase) -> TestOutcome {
    let started = Instant::now();

    let argv = match shlex::split(&case.command) {
        Some(argv) if !argv.is_empty() => argv,
        Some(_) => return error_outcome("empty command", started),
        None => return error_outcome("unbalanced quotes in command", started),
    };

    let output = Command::new(&argv[0])
        .args(&argv[1..])
        .stdin(Stdio::null())
        .output();

    match output {
        Ok(output) => {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));

            TestOutcome {
                status: if output.status.success() {
                    TestStatus::Passed
                } else {
                    TestStatus::Failed
                },
                exit_code: output.status.code(),
                output: text,
                duration: started.elapsed(),
            }
        }
        Err(e) => error_outcome(&format!("failed to run {}: {}", argv[0], e), started),
    }
}

fn error_outcome(message: &str, started: Instant) -> TestOutcome {
    TestOutcome {
        status: TestStatus::Error,
        exit_code: None,
        output: message.to_string(),
        duration: started.elapsed(),
    }
}
