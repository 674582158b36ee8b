//! Durations plugin - 케이스별 소요 시간 집계
//!
//! 시작 시각은 워커 스레드별로 `ThreadLocalScope`에 두고, 완료된 측정값만
//! 공유 목록에 모읍니다.
//!
//! ```toml
//! [durations]
//! enabled = true
//! top = 5
//! slow_threshold_ms = 500
//! ```

use clap::{Arg, ArgAction, Command};
use harness_core::{
    Component, ComponentClass, ComponentManager, ComponentRegistry, Config, Configurable, Error,
    Result, RunArgs, TestCase, TestCaseHooks, TestOutcome, TestSuite, TestSuiteHooks,
    ThreadLocalScope,
};
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const SECTION: &str = "durations";
const START_KEY: &str = "start";

#[derive(Debug, Clone, Copy)]
struct Settings {
    top: usize,
    slow_threshold: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            top: 5,
            slow_threshold: None,
        }
    }
}

pub struct Durations {
    scope: ThreadLocalScope,
    timings: Mutex<Vec<(String, Duration)>>,
    settings: Mutex<Settings>,
}

impl Durations {
    /// 측정값 (느린 순)
    pub fn slowest(&self) -> Vec<(String, Duration)> {
        let mut timings = self.timings.lock().clone();
        timings.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        timings
    }
}

impl Component for Durations {
    const NAME: &'static str = "durations";
    const PRIORITY: i32 = 10;

    fn create(_manager: &ComponentManager) -> Result<Self> {
        Ok(Self {
            scope: ThreadLocalScope::new(),
            timings: Mutex::new(Vec::new()),
            settings: Mutex::new(Settings::default()),
        })
    }

    fn is_enabled(args: &RunArgs, config: &Config) -> bool {
        args.flag("durations") || config.get_bool_or(SECTION, "enabled", false).unwrap_or(false)
    }

    fn add_options(command: Command) -> Command {
        command.arg(
            Arg::new("durations")
                .long("durations")
                .help("Report the slowest test cases")
                .action(ArgAction::SetTrue)
                .global(true),
        )
    }
}

impl Configurable for Durations {
    fn configure(&self, _args: &RunArgs, config: &Config) -> Result<()> {
        let top = config.get_int_or(SECTION, "top", 5)?;
        let top = usize::try_from(top)
            .map_err(|_| Error::Config(format!("[{}] top must not be negative", SECTION)))?;

        let slow_threshold = match config.get_int(SECTION, "slow_threshold_ms")? {
            Some(ms) => Some(Duration::from_millis(u64::try_from(ms).map_err(|_| {
                Error::Config(format!("[{}] slow_threshold_ms must not be negative", SECTION))
            })?)),
            None => None,
        };

        *self.settings.lock() = Settings {
            top,
            slow_threshold,
        };
        Ok(())
    }
}

impl TestCaseHooks for Durations {
    fn pre_test_case(&self, _case: &TestCase) -> Result<()> {
        self.scope.set(START_KEY, Instant::now())
    }

    fn post_test_case(&self, case: &TestCase, _outcome: &TestOutcome) -> Result<()> {
        let Some(started) = self.scope.get::<Instant>(START_KEY)? else {
            warn!("No start time recorded for {}", case.id);
            return Ok(());
        };
        self.scope.delete(START_KEY)?;

        let elapsed = started.elapsed();
        if let Some(threshold) = self.settings.lock().slow_threshold {
            if elapsed > threshold {
                warn!("Slow test case {}: {:?}", case.id, elapsed);
            }
        }

        self.timings.lock().push((case.id.clone(), elapsed));
        Ok(())
    }
}

impl TestSuiteHooks for Durations {
    fn post_test_suite(&self, suite: &TestSuite) -> Result<()> {
        let top = self.settings.lock().top;
        let slowest = self.slowest();

        info!("Slowest {} case(s) of {}:", top.min(slowest.len()), suite.name);
        for (id, elapsed) in slowest.iter().take(top) {
            info!("  {:>10.3}s  {}", elapsed.as_secs_f64(), id);
        }
        Ok(())
    }
}

pub fn register(registry: &ComponentRegistry) -> Result<()> {
    registry.register(
        ComponentClass::of::<Durations>()
            .implements::<dyn Configurable>(|c| c)
            .implements::<dyn TestCaseHooks>(|c| c)
            .implements::<dyn TestSuiteHooks>(|c| c)
            .build(),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn durations() -> Durations {
        let manager = ComponentManager::new(Arc::new(ComponentRegistry::new()));
        Durations::create(&manager).unwrap()
    }

    #[test]
    fn test_is_enabled() {
        assert!(!Durations::is_enabled(&RunArgs::new(), &Config::new()));
        assert!(Durations::is_enabled(
            &RunArgs::new().with_flag("durations", true),
            &Config::new()
        ));
        let config: Config = "[durations]\nenabled = \"yes\"".parse().unwrap();
        assert!(Durations::is_enabled(&RunArgs::new(), &config));
    }

    #[test]
    fn test_records_per_thread() {
        let durations = durations();
        durations.configure(&RunArgs::new(), &Config::new()).unwrap();
        let outcome = TestOutcome::skipped();

        thread::scope(|s| {
            for i in 0..4 {
                let durations = &durations;
                let outcome = &outcome;
                s.spawn(move || {
                    let case = TestCase::new("g", format!("c{}", i), "true");
                    durations.pre_test_case(&case).unwrap();
                    thread::sleep(Duration::from_millis(2 + 40 * i));
                    durations.post_test_case(&case, outcome).unwrap();
                });
            }
        });

        let slowest = durations.slowest();
        assert_eq!(slowest.len(), 4);
        assert_eq!(slowest[0].0, "g::c3");
        assert!(slowest[0].1 >= Duration::from_millis(122));
    }

    #[test]
    fn test_post_without_pre_is_ignored() {
        let durations = durations();
        let case = TestCase::new("g", "orphan", "true");

        durations
            .post_test_case(&case, &TestOutcome::skipped())
            .unwrap();
        assert!(durations.slowest().is_empty());
    }

    #[test]
    fn test_negative_settings_rejected() {
        let durations = durations();
        let config: Config = "[durations]\nslow_threshold_ms = -5".parse().unwrap();
        assert!(durations.configure(&RunArgs::new(), &config).is_err());
    }
}
