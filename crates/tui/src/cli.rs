//! Command-line arguments and the non-interactive drivers.

use std::{
    fs,
    io::{BufRead, BufReader, Write},
    num::NonZeroU32,
    path::PathBuf,
};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use fleet_core::{Command, FleetService};
use tracing::{error, info};

use crate::report;

/// Vehicle rental desk: interactive when run without a subcommand.
#[derive(Parser, Debug)]
#[command(name = "fleet")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding cars.csv and rentals.csv
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Show available vehicles
    List {
        /// Include rented vehicles
        #[arg(long)]
        all: bool,
    },

    /// Show active rentals
    Rentals,

    /// Price a rental without committing it
    Quote {
        vehicle_id: String,
        days: NonZeroU32,
    },

    /// Rent a vehicle
    Rent {
        vehicle_id: String,
        renter_name: String,
        days: NonZeroU32,
    },

    /// Return a rented vehicle
    Return { vehicle_id: String },

    /// Add a vehicle to the roster
    Add {
        vehicle_id: String,
        brand: String,
        model: String,
        rate_per_day: f64,
    },

    /// Run commands from a file, one per line
    Run {
        /// Script path; `#` starts a comment line
        script: PathBuf,
    },
}

impl CliCommand {
    fn into_command(self) -> Option<Command> {
        let command = match self {
            CliCommand::List { all: false } => Command::List,
            CliCommand::List { all: true } => Command::ListAll,
            CliCommand::Rentals => Command::Rentals,
            CliCommand::Quote { vehicle_id, days } => Command::Quote { vehicle_id, days },
            CliCommand::Rent {
                vehicle_id,
                renter_name,
                days,
            } => Command::Rent {
                vehicle_id,
                renter_name,
                days,
            },
            CliCommand::Return { vehicle_id } => Command::Return { vehicle_id },
            CliCommand::Add {
                vehicle_id,
                brand,
                model,
                rate_per_day,
            } => Command::Add {
                vehicle_id,
                brand,
                model,
                base_rate_per_day: rate_per_day,
            },
            CliCommand::Run { .. } => return None,
        };
        Some(command)
    }
}

/// Execute a subcommand, writing results to `out`.
pub fn execute(
    service: &mut FleetService,
    command: CliCommand,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        CliCommand::Run { script } => {
            let file = fs::File::open(&script)
                .with_context(|| format!("failed to open script {}", script.display()))?;
            let executed = run_script(service, BufReader::new(file), out)?;
            info!(script = %script.display(), executed, "Script finished");
            Ok(())
        }
        other => {
            let command = other
                .into_command()
                .ok_or_else(|| anyhow!("subcommand has no fleet equivalent"))?;
            run_one(service, command, out)
        }
    }
}

/// Dispatch one command and print its outcome.
pub fn run_one(service: &mut FleetService, command: Command, out: &mut impl Write) -> Result<()> {
    let label = command.to_string();
    match service.dispatch(command) {
        Ok(outcome) => {
            out.write_all(report::outcome(&outcome).as_bytes())?;
            Ok(())
        }
        Err(err) => {
            error!(command = %label, error = %err, "Command failed");
            Err(anyhow!(report::error(&err)).context(format!("`{label}` failed")))
        }
    }
}

/// Run each non-blank, non-comment line as a command, stopping at the first failure.
///
/// Returns the number of commands executed.
pub fn run_script(
    service: &mut FleetService,
    reader: impl BufRead,
    out: &mut impl Write,
) -> Result<usize> {
    let mut executed = 0;
    for (idx, line) in reader.lines().enumerate() {
        let line = line.context("failed to read script")?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let number = idx + 1;
        let command: Command = trimmed
            .parse()
            .with_context(|| format!("line {number}: cannot parse {trimmed:?}"))?;
        writeln!(out, "> {command}")?;
        run_one(service, command, out).with_context(|| format!("line {number}"))?;
        executed += 1;
    }
    Ok(executed)
}
