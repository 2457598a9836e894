//! CLI entry point for citefetch.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use citefetch_core::prepare;
use tracing::{debug, error, info, warn};

mod cli;
mod progress;

use cli::Args;

/// Exit code after an interrupt (128 + SIGINT).
const INTERRUPTED_EXIT_CODE: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.default_log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    match run(&args).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Resolves on Ctrl-C; never resolves if the signal cannot be watched.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

async fn run(args: &Args) -> Result<ExitCode> {
    let config = args.to_config();
    let prepared = prepare(&config).with_context(|| {
        format!(
            "cannot start run for dataset {}",
            config.dataset.display()
        )
    })?;

    let total = prepared.titles().len();
    info!(
        titles = total,
        concurrency = config.concurrency,
        download_dir = %config.download_dir.display(),
        "citefetch starting"
    );

    let recorder = prepared.recorder();
    let (bar, prepared) =
        if progress::should_show_progress(io::stderr().is_terminal(), args.quiet) {
            let (bar, callback) = progress::title_progress(total);
            (Some(bar), prepared.with_title_callback(callback))
        } else {
            (None, prepared)
        };

    let stats = tokio::select! {
        result = prepared.execute() => result.context("run aborted")?,
        () = interrupted() => {
            if let Some(bar) = &bar {
                bar.abandon();
            }
            warn!(failed = recorder.count(), "interrupted, closing failure log");
            recorder.close().context("cannot close failure log")?;
            return Ok(ExitCode::from(INTERRUPTED_EXIT_CODE));
        }
    };

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    let summary = stats.summary();
    info!(
        stored = summary.stored,
        already_present = summary.already_present,
        failed = summary.failed,
        total = summary.total,
        failed_file = %config.failed_file.display(),
        "run complete"
    );

    if args.json {
        let json = serde_json::to_string_pretty(&summary).context("cannot encode summary")?;
        println!("{json}");
    }

    Ok(ExitCode::SUCCESS)
}
