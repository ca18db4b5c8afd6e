use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use shared_slots::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Exit status for a strict run whose wait was interrupted (128 + SIGINT).
const INTERRUPTED_EXIT: u8 = 130;

/// When set, an interruption is pending before the wait starts. Used by the
/// integration tests to exercise the interrupted path without a signal.
const INTERRUPT_ENV: &str = "SHARED_SLOTS_INTERRUPT_BEFORE_WAIT";

#[derive(Parser, Debug)]
#[command(
    name = "shared-slots",
    version,
    about = "Spawn workers that each fill one slot of a shared array, then wait for all of them",
    long_about = None
)]
struct Cli {
    /// Number of workers (and slots)
    #[arg(short, long)]
    workers: Option<usize>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Prefix for worker thread names
    #[arg(long)]
    thread_prefix: Option<String>,

    /// Exit with a non-zero status if the wait is interrupted
    #[arg(long)]
    strict: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long)]
    log_format: Option<LogFormat>,
}

impl Cli {
    fn resolve_config(&self) -> Result<FanOutConfig> {
        let mut config = match &self.config {
            Some(path) => FanOutConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => FanOutConfig::default(),
        };

        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(prefix) = &self.thread_prefix {
            config.thread_name_prefix = prefix.clone();
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        config.strict_interrupt |= self.strict;
        config.logging.verbose |= self.verbose;

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    setup_tracing(&config.logging);

    let interrupt = Interrupt::new();
    let on_ctrl_c = interrupt.clone();
    ctrlc::set_handler(move || on_ctrl_c.trigger())
        .context("installing Ctrl-C handler")?;
    if std::env::var_os(INTERRUPT_ENV).is_some() {
        interrupt.trigger();
    }

    let strict = config.strict_interrupt;
    let mut coordinator = Coordinator::new(config)?;

    match coordinator.run(&ConsoleReport, &interrupt) {
        Ok(summary) => {
            tracing::debug!(order = ?summary.completion_order, "completion order");
            Ok(ExitCode::SUCCESS)
        }
        Err(err @ FanOutError::WaitInterrupted { .. }) => {
            println!("{err}");
            tracing::warn!(
                values = ?coordinator.container().as_slice(),
                "continuing after interrupted wait"
            );
            if strict {
                eprintln!("{}", "wait was interrupted (strict mode)".red());
                Ok(ExitCode::from(INTERRUPTED_EXIT))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
        Err(err) => Err(err.into()),
    }
}

fn setup_tracing(logging: &LoggingConfig) {
    let default_filter = if logging.verbose {
        "shared_slots=debug,info"
    } else {
        "shared_slots=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // stdout carries only the worker confirmations.
    match logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
