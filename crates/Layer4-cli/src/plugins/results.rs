//! Results plugin - 통과/실패 집계 및 fail-fast
//!
//! 설정이 잘못되면 실행 결과를 신뢰할 수 없으므로 vital 컴포넌트입니다.
//!
//! ```toml
//! [results]
//! fail_fast = false
//! max_failures = 0   # 0 = 제한 없음
//! ```

use clap::{Arg, ArgAction, Command};
use harness_core::{
    ApplicationLifecycle, Component, ComponentClass, ComponentManager, ComponentRegistry, Config,
    Configurable, Error, PluginsLoaded, Result, RunArgs, TestCase, TestCaseHooks, TestOutcome,
    TestStatus,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

const SECTION: &str = "results";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Counters {
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub skipped: usize,
}

impl Counters {
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.errors + self.skipped
    }

    fn failures(&self) -> usize {
        self.failed + self.errors
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Limits {
    fail_fast: bool,
    max_failures: usize,
}

pub struct Results {
    counters: Mutex<Counters>,
    limits: Mutex<Limits>,
}

impl Results {
    pub fn counters(&self) -> Counters {
        self.counters.lock().clone()
    }
}

impl Component for Results {
    const NAME: &'static str = "results";
    const PRIORITY: i32 = 100;

    fn create(_manager: &ComponentManager) -> Result<Self> {
        Ok(Self {
            counters: Mutex::new(Counters::default()),
            limits: Mutex::new(Limits::default()),
        })
    }

    fn is_vital(_config: &Config) -> bool {
        true
    }

    fn add_options(command: Command) -> Command {
        command.arg(
            Arg::new("fail-fast")
                .long("fail-fast")
                .help("Abort the run after the first failing case")
                .action(ArgAction::SetTrue)
                .global(true),
        )
    }
}

impl Configurable for Results {
    fn configure(&self, args: &RunArgs, config: &Config) -> Result<()> {
        let fail_fast = args.flag("fail-fast") || config.get_bool_or(SECTION, "fail_fast", false)?;
        let max_failures = config.get_int_or(SECTION, "max_failures", 0)?;
        let max_failures = usize::try_from(max_failures).map_err(|_| {
            Error::Config(format!("[{}] max_failures must not be negative", SECTION))
        })?;

        *self.limits.lock() = Limits {
            fail_fast,
            max_failures,
        };
        debug!(
            "Results configured (fail_fast={}, max_failures={})",
            fail_fast, max_failures
        );
        Ok(())
    }
}

impl PluginsLoaded for Results {
    fn on_plugins_loaded(&self, registry: &ComponentRegistry) -> Result<()> {
        debug!("{} component(s) available after discovery", registry.len());
        Ok(())
    }
}

impl TestCaseHooks for Results {
    fn post_test_case(&self, case: &TestCase, outcome: &TestOutcome) -> Result<()> {
        let failures = {
            let mut counters = self.counters.lock();
            match outcome.status {
                TestStatus::Passed => counters.passed += 1,
                TestStatus::Failed => counters.failed += 1,
                TestStatus::Error => counters.errors += 1,
                TestStatus::Skipped => counters.skipped += 1,
            }
            counters.failures()
        };

        if outcome.is_success() {
            return Ok(());
        }

        let limits = *self.limits.lock();
        if limits.fail_fast {
            return Err(Error::Internal(format!("fail-fast: {} {}", case.id, outcome.status)));
        }
        if limits.max_failures > 0 && failures >= limits.max_failures {
            return Err(Error::Internal(format!(
                "stopping after {} failure(s)",
                failures
            )));
        }
        Ok(())
    }
}

impl ApplicationLifecycle for Results {
    fn on_application_exit(&self) -> Result<()> {
        let counters = self.counters();
        if counters.failures() > 0 {
            warn!(
                "{} of {} case(s) failed",
                counters.failures(),
                counters.total()
            );
        } else {
            info!("All {} case(s) passed", counters.total());
        }
        Ok(())
    }
}

pub fn register(registry: &ComponentRegistry) -> Result<()> {
    registry.register(
        ComponentClass::of::<Results>()
            .implements::<dyn Configurable>(|c| c)
            .implements::<dyn PluginsLoaded>(|c| c)
            .implements::<dyn TestCaseHooks>(|c| c)
            .implements::<dyn ApplicationLifecycle>(|c| c)
            .build(),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn results() -> Results {
        let manager = ComponentManager::new(Arc::new(ComponentRegistry::new()));
        Results::create(&manager).unwrap()
    }

    fn outcome(status: TestStatus) -> TestOutcome {
        TestOutcome {
            status,
            exit_code: None,
            output: String::new(),
            duration: Duration::ZERO,
        }
    }

    #[test]
    fn test_counts() {
        let results = results();
        results.configure(&RunArgs::new(), &Config::new()).unwrap();
        let case = TestCase::new("g", "c", "true");

        results.post_test_case(&case, &outcome(TestStatus::Passed)).unwrap();
        results.post_test_case(&case, &outcome(TestStatus::Failed)).unwrap();
        results.post_test_case(&case, &outcome(TestStatus::Error)).unwrap();

        let counters = results.counters();
        assert_eq!(counters.passed, 1);
        assert_eq!(counters.failures(), 2);
        assert_eq!(counters.total(), 3);
    }

    #[test]
    fn test_fail_fast_from_args() {
        let results = results();
        let args = RunArgs::new().with_flag("fail-fast", true);
        results.configure(&args, &Config::new()).unwrap();
        let case = TestCase::new("g", "c", "false");

        results.post_test_case(&case, &outcome(TestStatus::Passed)).unwrap();
        let err = results
            .post_test_case(&case, &outcome(TestStatus::Failed))
            .unwrap_err();
        assert!(err.to_string().contains("g::c"));
    }

    #[test]
    fn test_max_failures() {
        let results = results();
        let config: Config = "[results]\nmax_failures = 2".parse().unwrap();
        results.configure(&RunArgs::new(), &config).unwrap();
        let case = TestCase::new("g", "c", "false");

        assert!(results.post_test_case(&case, &outcome(TestStatus::Failed)).is_ok());
        assert!(results.post_test_case(&case, &outcome(TestStatus::Failed)).is_err());
    }

    #[test]
    fn test_invalid_config_is_error() {
        let results = results();
        let config: Config = "[results]\nmax_failures = -1".parse().unwrap();
        assert!(results.configure(&RunArgs::new(), &config).is_err());

        let config: Config = "[results]\nfail_fast = \"sometimes\"".parse().unwrap();
        assert!(results.configure(&RunArgs::new(), &config).is_err());
        assert!(Results::is_vital(&config));
    }
}
