//! dupscan - incremental duplicate file scanner
//!
//! A background worker walks directory trees and reports each duplicate file
//! the moment it is confirmed. Every file gets a cheap digest of its first
//! 4 KiB; only files whose short digests collide are hashed in full
//! (BLAKE3), and a group is announced once two full digests agree.
//!
//! The engine ([`engine::ScanEngine`]) can be paused, resumed, fed new roots,
//! told about deleted files and terminated from any thread while it runs.
//! The `dupscan` binary is a thin front end over it.

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod empty_dirs;
pub mod engine;
pub mod error;
pub mod logging;
pub mod observer;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, IsTerminal};

use anyhow::{Context, Result};

use crate::cli::{Cli, Commands, OutputFormat, ScanArgs};
use crate::config::Config;
use crate::engine::ScanEngine;
use crate::error::ExitCode;
use crate::observer::{ChannelObserver, ScanEvent};
use crate::output::{EventSink, JsonOutput, ScanSummary, TextOutput};
use crate::progress::ProgressReporter;

/// Run the command described by `cli`. Logging must already be set up.
///
/// # Errors
///
/// Fails on invalid configuration, unusable scan roots, a worker that could
/// not be started or panicked, and write errors on stdout.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    if cli.no_color || !io::stdout().is_terminal() {
        yansi::disable();
    }

    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(ExitCode::Success)
        }
        Commands::Scan(args) => {
            config.apply_scan_args(&args);
            let show_progress =
                config.progress.enabled && !cli.quiet && io::stderr().is_terminal();
            run_scan(&args, &config, show_progress)
        }
    }
}

fn run_scan(args: &ScanArgs, config: &Config, show_progress: bool) -> Result<ExitCode> {
    let shutdown = signal::install_handler()?;

    let (observer, events) = ChannelObserver::bounded(config.event_channel_capacity.max(1));
    let engine = ScanEngine::start(config.engine_config(), observer)
        .context("Failed to start scan engine")?;
    let controller = engine.controller().clone();

    {
        let controller = controller.clone();
        shutdown.on_shutdown(move || controller.request_terminate());
    }

    // Hold the worker until every root is queued, so the queue cannot
    // drain between two roots.
    controller.request_pause();
    for path in &args.paths {
        controller
            .enqueue_root(path)
            .with_context(|| format!("Cannot scan {}", path.display()))?;
    }
    controller.request_resume();

    let progress = ProgressReporter::new(show_progress, config.progress.tick_ms);
    let mut sink: Box<dyn EventSink> = match args.output {
        OutputFormat::Text => Box::new(TextOutput::new(io::stdout().lock())),
        OutputFormat::Json => Box::new(
            JsonOutput::new(io::stdout().lock()).with_progress(args.progress_events),
        ),
    };

    let mut errors = 0u64;
    for event in events.iter() {
        match &event {
            ScanEvent::Progress(stats) => progress.update(stats),
            ScanEvent::Error { .. } => errors += 1,
            ScanEvent::QueueDrained(_) => controller.request_terminate(),
            _ => {}
        }
        progress
            .suspend(|| sink.event(&event))
            .context("Failed to write scan output")?;
        if matches!(event, ScanEvent::Terminated(_)) {
            break;
        }
    }

    let stats = engine.join()?;
    progress.finish(&stats);

    let interrupted = shutdown.is_shutdown_requested();
    let empty_dirs = config.report_empty_dirs.then(|| controller.empty_dirs());
    let summary = ScanSummary::new(stats, errors, empty_dirs, interrupted);
    sink.finish(&summary)
        .context("Failed to write scan summary")?;

    Ok(ExitCode::from_outcome(&stats, errors, interrupted))
}
