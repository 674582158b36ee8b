//! Harness CLI - Main entry point
//!
//! 1. 로깅/플러그인 디렉토리를 위한 1차 인자 파싱 (플러그인 옵션은 아직 모름)
//! 2. 플러그인 발견
//! 3. 플러그인 옵션을 추가한 명령으로 최종 파싱
//! 4. 설정 단계 후 서브커맨드 실행

mod cli;
mod plugins;
mod runner;
mod suite;

use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use harness_core::{ComponentRegistry, Config, PluginManager, RunArgs};
use harness_foundation::HARNESS_CONFIG_FILE;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PLUGINS_DIR: &str = "plugins";
const PLUGINS_DIR_ENV: &str = "HARNESS_PLUGINS_DIR";

/// Harness - plugin-driven test runner
#[derive(Parser, Debug)]
#[command(name = "harness")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Directory searched for *_plugin.toml manifests
    #[arg(long, env = PLUGINS_DIR_ENV, default_value = DEFAULT_PLUGINS_DIR, global = true)]
    plugins_dir: PathBuf,

    /// Configuration file (default: harness.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List discovered components
    Plugins {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run a test suite
    Run {
        /// Suite file (TOML)
        suite: PathBuf,

        /// Number of worker threads
        #[arg(short, long, default_value_t = default_workers())]
        workers: usize,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// 1차 파싱 결과 (플러그인 디렉토리, debug 여부)
fn early_options() -> (PathBuf, bool) {
    let fallback = || {
        std::env::var_os(PLUGINS_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PLUGINS_DIR))
    };

    let matches = Args::command()
        .disable_help_flag(true)
        .disable_version_flag(true)
        .ignore_errors(true)
        .try_get_matches();

    match matches {
        Ok(matches) => (
            matches
                .get_one::<PathBuf>("plugins_dir")
                .cloned()
                .unwrap_or_else(fallback),
            matches
                .try_get_one::<bool>("debug")
                .ok()
                .flatten()
                .copied()
                .unwrap_or(false),
        ),
        Err(_) => (fallback(), false),
    }
}

fn main() -> anyhow::Result<()> {
    let (plugins_dir, debug) = early_options();

    // Initialize logging
    let log_level = if debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Discover plugins
    let plugins = PluginManager::new(
        Arc::new(ComponentRegistry::new()),
        plugins::builtin_modules(),
    );
    plugins.discover(&plugins_dir)?;

    // Parse again with plugin-contributed options
    let matches = plugins.add_options(Args::command()).get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    // Load configuration
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(HARNESS_CONFIG_FILE)?,
    };
    debug!(
        "Using configuration from {} (plugins: {}, debug: {})",
        config
            .source()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "defaults".to_string()),
        args.plugins_dir.display(),
        args.debug
    );

    plugins.configure(RunArgs::from_matches(&matches), config)?;

    match args.command {
        Command::Plugins { json } => cli::list_plugins(&plugins, json)?,
        Command::Run {
            suite,
            workers,
            json,
        } => {
            if !cli::run_suite(&plugins, &suite, workers, json)? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
