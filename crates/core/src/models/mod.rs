//! Shared domain models.

use std::num::NonZeroU32;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A rentable vehicle in the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Operator-supplied identifier, unique within the roster (e.g. `C001`).
    pub id: String,
    /// Manufacturer name.
    pub brand: String,
    /// Model name.
    pub model: String,
    /// Price charged per rented day.
    pub base_rate_per_day: f64,
    /// `false` while the vehicle is rented.
    pub available: bool,
}

impl Vehicle {
    /// Build a new, available vehicle.
    pub fn new(
        id: impl Into<String>,
        brand: impl Into<String>,
        model: impl Into<String>,
        base_rate_per_day: f64,
    ) -> Self {
        Self {
            id: id.into(),
            brand: brand.into(),
            model: model.into(),
            base_rate_per_day,
            available: true,
        }
    }

    /// Brand and model joined for display.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.brand, self.model)
    }
}

/// A customer holding (or having held) a rental.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Renter {
    /// Sequential identifier of the form `CUS<n>`.
    pub id: String,
    /// Name given by the operator at rental time.
    pub name: String,
}

/// An active rental linking one vehicle to one renter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rental {
    /// Id of the rented vehicle.
    pub vehicle_id: String,
    /// Renter holding the vehicle.
    pub renter: Renter,
    /// Rental duration in days.
    pub days: NonZeroU32,
    /// When the rental was opened.
    pub opened_at: DateTime<Utc>,
}

/// Priced preview of a rental, shown before the operator confirms it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Vehicle being quoted.
    pub vehicle_id: String,
    /// Vehicle brand.
    pub brand: String,
    /// Vehicle model.
    pub model: String,
    /// Requested duration.
    pub days: NonZeroU32,
    /// Total price for the whole duration.
    pub total: f64,
}

/// Summary returned by a successful rent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalReceipt {
    /// Renter issued for this rental.
    pub renter: Renter,
    /// Rented vehicle.
    pub vehicle_id: String,
    /// Vehicle brand.
    pub brand: String,
    /// Vehicle model.
    pub model: String,
    /// Rental duration in days.
    pub days: NonZeroU32,
    /// Total price for the whole duration.
    pub total: f64,
}
