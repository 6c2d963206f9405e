//! Text commands understood by every driver (TUI, one-shot CLI, scripts).

use std::{fmt, num::NonZeroU32, str::FromStr};

use thiserror::Error;

use crate::{
    error::FleetResult,
    models::{Quote, Rental, RentalReceipt, Renter, Vehicle},
    service::FleetService,
};

/// A single fleet operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Available vehicles.
    List,
    /// Every vehicle, rented or not.
    ListAll,
    /// Active rentals.
    Rentals,
    /// Price a rental without committing it.
    Quote {
        /// Vehicle to price.
        vehicle_id: String,
        /// Duration in days.
        days: NonZeroU32,
    },
    /// Rent a vehicle to a new renter.
    Rent {
        /// Vehicle to rent.
        vehicle_id: String,
        /// Name of the renter.
        renter_name: String,
        /// Duration in days.
        days: NonZeroU32,
    },
    /// Return a rented vehicle.
    Return {
        /// Vehicle being returned.
        vehicle_id: String,
    },
    /// Add a vehicle to the roster.
    Add {
        /// New vehicle id.
        vehicle_id: String,
        /// Manufacturer name.
        brand: String,
        /// Model name.
        model: String,
        /// Price per day.
        base_rate_per_day: f64,
    },
}

/// Result of a dispatched [`Command`].
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Vehicles to display.
    Vehicles(Vec<Vehicle>),
    /// Active rentals to display.
    Rentals(Vec<Rental>),
    /// Price preview.
    Quoted(Quote),
    /// Rental committed.
    Rented(RentalReceipt),
    /// Vehicle returned by this renter.
    Returned(Renter),
    /// Vehicle added.
    Added(String),
}

/// Why a command line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The line holds no command.
    #[error("empty command")]
    Empty,
    /// The first word is not a known command.
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
    /// Wrong number of arguments.
    #[error("usage: {0}")]
    Usage(&'static str),
    /// An argument has the wrong shape.
    #[error("invalid {field}: {value:?}")]
    InvalidArgument {
        /// Argument name.
        field: &'static str,
        /// Text that failed to parse.
        value: String,
    },
    /// A quoted argument is missing its closing quote.
    #[error("unterminated quote")]
    UnterminatedQuote,
}

const RENT_USAGE: &str = "rent <vehicle-id> <renter-name> <days>";
const RETURN_USAGE: &str = "return <vehicle-id>";
const QUOTE_USAGE: &str = "quote <vehicle-id> <days>";
const ADD_USAGE: &str = "add <vehicle-id> <brand> <model> <rate-per-day>";

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words = split_words(line)?;
        let Some((head, args)) = words.split_first() else {
            return Err(ParseError::Empty);
        };

        match head.to_ascii_lowercase().as_str() {
            "list" | "available" => no_args(args, "list").map(|_| Command::List),
            "all" | "list-all" => no_args(args, "all").map(|_| Command::ListAll),
            "rentals" => no_args(args, "rentals").map(|_| Command::Rentals),
            "quote" => match args {
                [vehicle_id, days] => Ok(Command::Quote {
                    vehicle_id: vehicle_id.clone(),
                    days: parse_days(days)?,
                }),
                _ => Err(ParseError::Usage(QUOTE_USAGE)),
            },
            "rent" => match args {
                [vehicle_id, renter_name, days] => Ok(Command::Rent {
                    vehicle_id: vehicle_id.clone(),
                    renter_name: renter_name.clone(),
                    days: parse_days(days)?,
                }),
                _ => Err(ParseError::Usage(RENT_USAGE)),
            },
            "return" => match args {
                [vehicle_id] => Ok(Command::Return {
                    vehicle_id: vehicle_id.clone(),
                }),
                _ => Err(ParseError::Usage(RETURN_USAGE)),
            },
            "add" => match args {
                [vehicle_id, brand, model, rate] => Ok(Command::Add {
                    vehicle_id: vehicle_id.clone(),
                    brand: brand.clone(),
                    model: model.clone(),
                    base_rate_per_day: parse_rate(rate)?,
                }),
                _ => Err(ParseError::Usage(ADD_USAGE)),
            },
            other => Err(ParseError::UnknownCommand(other.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::List => write!(f, "list"),
            Command::ListAll => write!(f, "all"),
            Command::Rentals => write!(f, "rentals"),
            Command::Quote { vehicle_id, days } => write!(f, "quote {vehicle_id} {days}"),
            Command::Rent {
                vehicle_id,
                renter_name,
                days,
            } => write!(f, "rent {vehicle_id} {} {days}", quoted(renter_name)),
            Command::Return { vehicle_id } => write!(f, "return {vehicle_id}"),
            Command::Add {
                vehicle_id,
                brand,
                model,
                base_rate_per_day,
            } => write!(
                f,
                "add {vehicle_id} {} {} {base_rate_per_day}",
                quoted(brand),
                quoted(model)
            ),
        }
    }
}

impl FleetService {
    /// Run one command against the fleet.
    pub fn dispatch(&mut self, command: Command) -> FleetResult<Outcome> {
        match command {
            Command::List => Ok(Outcome::Vehicles(self.list_available())),
            Command::ListAll => Ok(Outcome::Vehicles(self.vehicles().to_vec())),
            Command::Rentals => Ok(Outcome::Rentals(self.active_rentals().to_vec())),
            Command::Quote { vehicle_id, days } => {
                self.quote(&vehicle_id, days).map(Outcome::Quoted)
            }
            Command::Rent {
                vehicle_id,
                renter_name,
                days,
            } => self
                .rent(&vehicle_id, &renter_name, days)
                .map(Outcome::Rented),
            Command::Return { vehicle_id } => {
                self.return_vehicle(&vehicle_id).map(Outcome::Returned)
            }
            Command::Add {
                vehicle_id,
                brand,
                model,
                base_rate_per_day,
            } => {
                self.add_vehicle(Vehicle::new(
                    vehicle_id.clone(),
                    brand,
                    model,
                    base_rate_per_day,
                ))?;
                Ok(Outcome::Added(vehicle_id))
            }
        }
    }
}

/// Parse a positive day count.
pub fn parse_days(text: &str) -> Result<NonZeroU32, ParseError> {
    text.trim()
        .parse::<NonZeroU32>()
        .map_err(|_| ParseError::InvalidArgument {
            field: "days",
            value: text.to_string(),
        })
}

/// Parse a daily rate.
pub fn parse_rate(text: &str) -> Result<f64, ParseError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|rate| rate.is_finite() && *rate >= 0.0)
        .ok_or_else(|| ParseError::InvalidArgument {
            field: "rate",
            value: text.to_string(),
        })
}

fn no_args(args: &[String], usage: &'static str) -> Result<(), ParseError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(ParseError::Usage(usage))
    }
}

/// Split on whitespace, keeping double-quoted runs together.
fn split_words(line: &str) -> Result<Vec<String>, ParseError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                in_word = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if in_quotes {
        return Err(ParseError::UnterminatedQuote);
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

fn quoted(value: &str) -> String {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}
