//! Plain-text rendering of fleet results, shared by the CLI and the TUI status line.

use fleet_core::{FleetError, Outcome, Quote, Rental, RentalReceipt, Renter, Vehicle};

/// Table of vehicles with a running serial number.
pub fn vehicles(vehicles: &[Vehicle], show_status: bool) -> String {
    if vehicles.is_empty() {
        return "No vehicles to show.\n".to_string();
    }

    let mut out = format!(
        "{:<8}{:<15}{:<15}{:<15}{:>10}",
        "S.No.", "Car ID", "Brand", "Model", "Rate/day"
    );
    if show_status {
        out.push_str("  Status");
    }
    out.push('\n');

    for (idx, vehicle) in vehicles.iter().enumerate() {
        out.push_str(&format!(
            "{:<8}{:<15}{:<15}{:<15}{:>10.2}",
            idx + 1,
            vehicle.id,
            vehicle.brand,
            vehicle.model,
            vehicle.base_rate_per_day
        ));
        if show_status {
            out.push_str(if vehicle.available {
                "  available"
            } else {
                "  rented"
            });
        }
        out.push('\n');
    }
    out
}

/// Table of active rentals.
pub fn rentals(rentals: &[Rental]) -> String {
    if rentals.is_empty() {
        return "No active rentals.\n".to_string();
    }

    let mut out = format!(
        "{:<15}{:<12}{:<20}{:>6}  {}\n",
        "Car ID", "Customer", "Name", "Days", "Since"
    );
    for rental in rentals {
        out.push_str(&format!(
            "{:<15}{:<12}{:<20}{:>6}  {}\n",
            rental.vehicle_id,
            rental.renter.id,
            rental.renter.name,
            rental.days,
            rental.opened_at.format("%Y-%m-%d %H:%M UTC")
        ));
    }
    out
}

/// Rental information block shown before confirmation.
pub fn quote(quote: &Quote, renter_name: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(name) = renter_name {
        out.push_str(&format!("{:<15}{}\n", "Customer Name:", name));
    }
    out.push_str(&format!(
        "{:<15}{} {}\n{:<15}{}\n{:<15}{:.2}\n",
        "Car:", quote.brand, quote.model, "Rental Days:", quote.days, "Total Price:", quote.total
    ));
    out
}

/// Rental information block for a committed rental.
pub fn receipt(receipt: &RentalReceipt) -> String {
    format!(
        "{:<15}{}\n{:<15}{}\n{:<15}{} {}\n{:<15}{}\n{:<15}{:.2}\n",
        "Customer ID:",
        receipt.renter.id,
        "Customer Name:",
        receipt.renter.name,
        "Car:",
        receipt.brand,
        receipt.model,
        "Rental Days:",
        receipt.days,
        "Total Price:",
        receipt.total
    )
}

/// One-line confirmation of a return.
pub fn returned(vehicle_id: &str, renter: &Renter) -> String {
    format!("Car {vehicle_id} returned successfully by {}.\n", renter.name)
}

/// Human-readable text for any outcome.
pub fn outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Vehicles(list) => vehicles(list, list.iter().any(|v| !v.available)),
        Outcome::Rentals(list) => rentals(list),
        Outcome::Quoted(q) => quote(q, None),
        Outcome::Rented(r) => format!("Car rented successfully.\n{}", receipt(r)),
        Outcome::Returned(renter) => format!("Car returned successfully by {}.\n", renter.name),
        Outcome::Added(id) => format!("Car {id} added successfully.\n"),
    }
}

/// Operator-facing wording for a fleet error.
pub fn error(err: &FleetError) -> String {
    match err {
        FleetError::UnknownVehicle(id) => format!("Invalid car ID {id}."),
        FleetError::NotAvailable(id) | FleetError::AlreadyRented(id) => {
            format!("Car {id} is not available for rent.")
        }
        FleetError::NotRented(id) => format!("Car {id} was not rented."),
        FleetError::DuplicateId(id) => format!("A car with ID {id} already exists."),
        FleetError::InvalidRate(rate) => format!("Invalid price per day: {rate}."),
        FleetError::MalformedRecord { line, reason } => {
            format!("Data file is damaged at line {line}: {reason}.")
        }
        FleetError::Inconsistent { vehicle_ids } => format!(
            "Rental records do not match the car list for: {}.",
            vehicle_ids.join(", ")
        ),
        FleetError::InvalidField { field, .. } => {
            format!("The {field} must fit on one line.")
        }
        FleetError::RenterConflict(id) => {
            format!("Customer ID {id} clashes with the rental records.")
        }
        FleetError::Io { path, source } => {
            format!("Could not access {}: {source}.", path.display())
        }
    }
}
