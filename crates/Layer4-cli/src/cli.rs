//! Subcommand implementations

use crate::runner::{RunReport, SuiteRunner};
use crate::suite;
use harness_core::{PluginManager, Result, TestStatus};
use std::path::Path;

/// 등록된 컴포넌트 목록 출력
pub fn list_plugins(plugins: &PluginManager, json: bool) -> Result<()> {
    let summary = plugins.summary();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.is_empty() {
        println!("No components registered.");
        return Ok(());
    }

    println!(
        "{:<20} {:>8}  {:<8} {:<6} {:<9} INTERFACES",
        "NAME", "PRIORITY", "ENABLED", "VITAL", "ACTIVATED"
    );
    for component in &summary {
        println!(
            "{:<20} {:>8}  {:<8} {:<6} {:<9} {}",
            component.name,
            component.priority,
            yes_no(component.enabled),
            yes_no(component.vital),
            yes_no(component.activated),
            component.interfaces.join(", ")
        );
    }
    Ok(())
}

/// 스위트 실행 후 결과 출력 (모두 통과하면 true)
pub fn run_suite(plugins: &PluginManager, path: &Path, workers: usize, json: bool) -> Result<bool> {
    let suite = suite::load(path)?;
    let report = SuiteRunner::new(plugins, workers)?.run(&suite)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(report.is_success())
}

fn print_report(report: &RunReport) {
    println!("Suite {}\n", report.suite);

    for result in &report.results {
        println!(
            "  {:<5} {} ({:.3}s)",
            result.outcome.status,
            result.case.id,
            result.outcome.duration.as_secs_f64()
        );
        if !result.outcome.is_success() {
            for line in result.outcome.output.lines().take(5) {
                println!("        {}", line);
            }
        }
    }

    println!(
        "\n{} passed, {} failed, {} error(s), {} skipped",
        report.count(TestStatus::Passed),
        report.count(TestStatus::Failed),
        report.count(TestStatus::Error),
        report.count(TestStatus::Skipped)
    );
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
