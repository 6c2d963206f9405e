mod app;
mod cli;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use std::{
    fs::{self, OpenOptions},
    io,
    process::ExitCode,
};

use fleet_core::{
    config::{self, AppConfig},
    FleetHandle, FleetService,
};
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let batch = cli.command.is_some();
    init_logging(&config, batch)?;

    let service = FleetService::open(&config).map_err(|err| {
        tracing::error!(error = %err, "Failed to open fleet data");
        anyhow::anyhow!(report::error(&err))
    })?;

    match cli.command {
        Some(command) => {
            let mut service = service;
            let stdout = io::stdout();
            let mut out = stdout.lock();
            cli::execute(&mut service, command, &mut out)
        }
        None => {
            let mut app = app::FleetApp::new(FleetHandle::new(service));
            app.run().await
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => {
            config::ensure_default_config()?;
            AppConfig::load()?
        }
    };
    Ok(match &cli.data_dir {
        Some(dir) => config.with_data_dir(dir),
        None => config,
    })
}

fn init_logging(config: &AppConfig, batch: bool) -> Result<()> {
    let log_dir = &config.log_dir;
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let log_path = log_dir.join("fleet.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(log_file));

    // The TUI owns the terminal, so only batch runs echo warnings to stderr.
    let stderr_layer = batch.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .compact()
            .with_writer(io::stderr)
            .with_filter(LevelFilter::WARN)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(())
}
