// SPDX-License-Identifier: MIT OR Apache-2.0
//! Motionboard session replayer.
//!
//! Loads a RON script of editor actions, drives the timeline engine headlessly
//! and prints the resulting timeline state as JSON.

mod error;
mod replay;
mod report;
mod script;

use clap::Parser;
use error::Result;
use motionboard_timeline::TimelineConfig;
use replay::Replayer;
use report::Report;
use script::Script;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Command line arguments
#[derive(Debug, PartialEq, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// RON script of editor actions to replay
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    /// Timeline settings (RON); defaults are used when omitted
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,
}

fn run(args: &Args) -> Result<Report> {
    let config = match &args.config {
        Some(path) => TimelineConfig::load(path)?,
        None => TimelineConfig::default(),
    };
    let script = Script::load(&args.script)?;
    tracing::info!(
        "Replaying {} steps from {}",
        script.steps.len(),
        args.script.display()
    );

    let mut replayer = Replayer::new(config, script.viewport);
    replayer.run(&script.steps);
    Ok(Report::collect(&replayer))
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("motionboard_timeline=info,motionboard_replay=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Motionboard replay v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let result = run(&args).and_then(|report| {
            let failures = report.failures();
            println!("{}", report.to_json()?);
            Ok(failures)
        });
    match result {
        Ok(0) => {}
        Ok(failures) => tracing::warn!("{failures} steps failed"),
        Err(e) => {
            tracing::error!("Replay failed: {e}");
            std::process::exit(1);
        }
    }
}
