//! Log capture plugin - 케이스 출력 수집
//!
//! 케이스 실행 중의 출력은 워커 스레드별 `ThreadLocalScope`에 모았다가,
//! 케이스가 끝나면 `<log_dir>/<group>/<case>.log`로 저장합니다.
//! 디렉토리가 없으면 줄 수만 기록합니다.
//!
//! ```toml
//! [log_capture]
//! dir = "target/harness-logs"
//! ```

use clap::{value_parser, Arg, ArgAction, Command};
use harness_core::{
    Component, ComponentClass, ComponentManager, ComponentRegistry, Config, Configurable, Result,
    RunArgs, TestCase, TestCaseHooks, TestOutcome, ThreadLocalScope,
};
use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const SECTION: &str = "log_capture";
const LINES_KEY: &str = "lines";

pub struct LogCapture {
    scope: ThreadLocalScope,
    log_dir: RwLock<Option<PathBuf>>,
}

impl LogCapture {
    /// 현재 스레드에서 진행 중인 케이스에 줄 추가
    pub fn capture(&self, line: impl Into<String>) -> Result<()> {
        let line = line.into();
        self.scope
            .with_mut(LINES_KEY, Vec::new, |lines: &mut Vec<String>| lines.push(line))
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.log_dir.read().clone()
    }

    fn log_path(dir: &Path, case: &TestCase) -> PathBuf {
        dir.join(sanitize(&case.group))
            .join(format!("{}.log", sanitize(&case.name)))
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect()
}

impl Component for LogCapture {
    const NAME: &'static str = "log_capture";
    const PRIORITY: i32 = -10;

    fn create(_manager: &ComponentManager) -> Result<Self> {
        Ok(Self {
            scope: ThreadLocalScope::new(),
            log_dir: RwLock::new(None),
        })
    }

    fn is_enabled(args: &RunArgs, _config: &Config) -> bool {
        !args.flag("no-capture")
    }

    fn add_options(command: Command) -> Command {
        command
            .arg(
                Arg::new("log-dir")
                    .long("log-dir")
                    .help("Directory for captured case output")
                    .value_parser(value_parser!(PathBuf))
                    .global(true),
            )
            .arg(
                Arg::new("no-capture")
                    .long("no-capture")
                    .help("Do not capture case output")
                    .action(ArgAction::SetTrue)
                    .global(true),
            )
    }
}

impl Configurable for LogCapture {
    fn configure(&self, args: &RunArgs, config: &Config) -> Result<()> {
        let dir = args
            .value("log-dir")
            .or_else(|| config.get_str(SECTION, "dir"))
            .map(PathBuf::from);

        if let Some(dir) = &dir {
            fs::create_dir_all(dir)?;
            debug!("Capturing case output under {}", dir.display());
        }

        *self.log_dir.write() = dir;
        Ok(())
    }
}

impl TestCaseHooks for LogCapture {
    fn pre_test_case(&self, _case: &TestCase) -> Result<()> {
        self.scope.set(LINES_KEY, Vec::<String>::new())
    }

    fn post_test_case(&self, case: &TestCase, outcome: &TestOutcome) -> Result<()> {
        for line in outcome.output.lines() {
            self.capture(line)?;
        }
        self.capture(format!(
            "-- {} (exit code {:?}, {:.3}s)",
            outcome.status,
            outcome.exit_code,
            outcome.duration.as_secs_f64()
        ))?;

        let lines = self.scope.get::<Vec<String>>(LINES_KEY)?.unwrap_or_default();
        self.scope.delete(LINES_KEY)?;

        match self.log_dir() {
            Some(dir) => {
                let path = Self::log_path(&dir, case);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&path, lines.join("\n") + "\n")?;
                debug!("Wrote {} line(s) to {}", lines.len(), path.display());
            }
            None => debug!("Captured {} line(s) for {}", lines.len(), case.id),
        }
        Ok(())
    }
}

pub fn register(registry: &ComponentRegistry) -> Result<()> {
    registry.register(
        ComponentClass::of::<LogCapture>()
            .implements::<dyn Configurable>(|c| c)
            .implements::<dyn TestCaseHooks>(|c| c)
            .build(),
    )?;
    Ok(())
}
