#![warn(clippy::all, missing_docs)]

//! Core domain logic for the fleet rental system.
//!
//! This crate hosts the vehicle roster and its flat-file store, the rental
//! ledger, and the fleet service that keeps the two in step. Frontends
//! drive it through [`FleetService`] or the text [`Command`] interface.

pub mod codec;
pub mod command;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod pricing;
pub mod renter;
pub mod service;
pub mod store;

pub use command::{Command, Outcome, ParseError};
pub use config::AppConfig;
pub use error::{FleetError, FleetResult};
pub use ledger::RentalLedger;
pub use models::{Quote, Rental, RentalReceipt, Renter, Vehicle};
pub use service::{FleetHandle, FleetService};
pub use store::VehicleStore;
