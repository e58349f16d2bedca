use std::process::ExitCode;

use clap::Parser;
use tripboard::config::{Cli, LabConfig};
use tripboard::lab;

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = LabConfig::from(&cli);
    tracing::info!(
        scenario = config.scenario.id(),
        action = ?config.action,
        frames = config.frames,
        width = config.width,
        height = config.height,
        "tripboard lab starting"
    );

    let report = match lab::run(&config) {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "lab run failed");
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match report.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => {
                tracing::error!(error = %e, "report encoding failed");
                return ExitCode::FAILURE;
            }
        }
    } else {
        tracing::info!(
            blocks = report.blocks,
            connectors = report.connectors,
            frames = report.frames,
            full_repaints = report.full_repaints,
            avg_ms = report.frame.avg_ms,
            p95_ms = report.frame.p95_ms,
            fps = report.frame.fps,
            avg_dirty_area_ratio = report.avg_dirty_area_ratio,
            "lab finished"
        );
    }
    ExitCode::SUCCESS
}
