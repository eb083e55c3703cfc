use colored::*;
use ipsync_common::config::TargetConfig;
use ipsync_core::{PropagationRunner, RunReport};
use tracing::{error, info_span};

use crate::commands::{CommandLine, OutputMode, Status};
use crate::terminal::{colors, format, print};

/// Runs one propagation pass. With `dry_run` set, files are only inspected.
pub fn sync(cli: &CommandLine, targets: &[TargetConfig], dry_run: bool) -> anyhow::Result<Status> {
    let span = info_span!("sync");
    let _guard = span.enter();

    let cfg = cli.build_config(targets)?;
    let resolver = cli.resolver(&cfg);
    let runner = PropagationRunner::new(cfg, resolver)?.dry_run(dry_run);

    let report: RunReport = runner.run();

    match cli.output_mode() {
        OutputMode::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputMode::Quiet => println!("{}", report.announcement()),
        OutputMode::Pretty => print_report(&report),
    }

    let status = exit_status(&report);
    if status == Status::TotalFailure {
        error!("No target file could be processed");
    }
    Ok(status)
}

pub fn exit_status(report: &RunReport) -> Status {
    if report.is_total_failure() {
        Status::TotalFailure
    } else {
        Status::Success
    }
}

fn print_report(report: &RunReport) {
    let title = if report.dry_run { "dry run" } else { "propagating endpoint" };
    print::title(title);

    let key_width: usize = report
        .files
        .iter()
        .map(|f| f.path.display().to_string().chars().count())
        .max()
        .unwrap_or(0);

    for outcome in &report.files {
        print::key_value(
            &outcome.path.display().to_string(),
            key_width,
            format::result_value(&outcome.result, report.dry_run),
        );
    }

    print::blank();
    print_summary(report);
}

fn print_summary(report: &RunReport) {
    let failed: usize = report.failures().count();
    let verb = if report.dry_run { "would update" } else { "updated" };
    let counts: String = format!(
        "{}: {} {}, {} unchanged, {} failed",
        format::plural(report.files.len(), "target"),
        report.updated().to_string().green().bold(),
        verb,
        report.processed() - report.updated(),
        if failed > 0 {
            failed.to_string().red().bold()
        } else {
            failed.to_string().normal()
        },
    );

    print::rule();
    print::centered(&counts);

    let announcement: String = format!(
        "Server running on {}",
        format::endpoint_value(&report.endpoint)
    );
    if report.fallback {
        let note: ColoredString = "(loopback fallback)".color(colors::ACCENT);
        print::centered(&format!("{} {}", announcement, note));
    } else {
        print::centered(&announcement);
    }
}
