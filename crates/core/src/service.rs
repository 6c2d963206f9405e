//! Fleet operations keeping roster and ledger in step.

use std::{num::NonZeroU32, sync::Arc};

use parking_lot::{Mutex, MutexGuard};
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    error::{FleetError, FleetResult},
    ledger::RentalLedger,
    models::{Quote, Rental, RentalReceipt, Renter, Vehicle},
    pricing::{self, PriceFn},
    store::VehicleStore,
};

/// Sole mutator of vehicle availability and rental existence.
///
/// After every public operation a vehicle is unavailable exactly when the
/// ledger holds a rental for it, and both backing files reflect memory.
#[derive(Debug)]
pub struct FleetService {
    store: VehicleStore,
    ledger: RentalLedger,
    price: PriceFn,
}

impl FleetService {
    /// Open roster and ledger as configured and check that they agree.
    ///
    /// With `release_orphaned_rentals` set, disagreements are repaired
    /// instead of reported.
    pub fn open(config: &AppConfig) -> FleetResult<Self> {
        let store = VehicleStore::open(config.store_path())?;
        let ledger = RentalLedger::load(config.ledger_path())?;
        let mut service = Self::new(store, ledger);

        let drift = service.inconsistencies();
        if !drift.is_empty() {
            if !config.release_orphaned_rentals {
                return Err(FleetError::Inconsistent { vehicle_ids: drift });
            }
            service.release_orphans()?;
        }
        Ok(service)
    }

    /// Assemble a service from already loaded parts.
    pub fn new(store: VehicleStore, ledger: RentalLedger) -> Self {
        Self {
            store,
            ledger,
            price: pricing::price,
        }
    }

    /// Replace the pricing rule.
    pub fn with_pricing(mut self, price: PriceFn) -> Self {
        self.price = price;
        self
    }

    /// Rent `vehicle_id` to a newly issued renter called `renter_name`.
    pub fn rent(
        &mut self,
        vehicle_id: &str,
        renter_name: &str,
        days: NonZeroU32,
    ) -> FleetResult<RentalReceipt> {
        let vehicle = self.available_vehicle(vehicle_id)?.clone();
        single_line("renter name", renter_name)?;

        let renter = self.ledger.next_renter(renter_name);
        let rental = self.ledger.open(&vehicle.id, renter, days)?;

        if let Err(err) = self.store.set_available(&vehicle.id, false) {
            warn!(vehicle_id, error = %err, "Roster write failed; revoking rental");
            if let Err(undo) = self.ledger.revoke(&vehicle.id) {
                warn!(vehicle_id, error = %undo, "Failed to revoke rental after roster write failure");
            }
            return Err(err);
        }

        let total = (self.price)(vehicle.base_rate_per_day, days);
        info!(
            vehicle_id,
            renter_id = %rental.renter.id,
            days = days.get(),
            total,
            "Vehicle rented"
        );
        Ok(RentalReceipt {
            renter: rental.renter,
            vehicle_id: vehicle.id,
            brand: vehicle.brand,
            model: vehicle.model,
            days,
            total,
        })
    }

    /// Price a rental of `vehicle_id` without changing anything.
    pub fn quote(&self, vehicle_id: &str, days: NonZeroU32) -> FleetResult<Quote> {
        let vehicle = self.available_vehicle(vehicle_id)?;
        Ok(Quote {
            vehicle_id: vehicle.id.clone(),
            brand: vehicle.brand.clone(),
            model: vehicle.model.clone(),
            days,
            total: (self.price)(vehicle.base_rate_per_day, days),
        })
    }

    /// End the rental of `vehicle_id` and return who held it.
    pub fn return_vehicle(&mut self, vehicle_id: &str) -> FleetResult<Renter> {
        if self.store.get(vehicle_id).is_none() {
            return Err(FleetError::UnknownVehicle(vehicle_id.to_string()));
        }

        let rental = self.ledger.close(vehicle_id)?;
        if let Err(err) = self.store.set_available(vehicle_id, true) {
            warn!(vehicle_id, error = %err, "Roster write failed; reinstating rental");
            if let Err(undo) = self.ledger.reinstate(rental) {
                warn!(vehicle_id, error = %undo, "Failed to reinstate rental after roster write failure");
            }
            return Err(err);
        }

        info!(vehicle_id, renter_id = %rental.renter.id, "Vehicle returned");
        Ok(rental.renter)
    }

    /// Add a new, available vehicle to the roster.
    pub fn add_vehicle(&mut self, vehicle: Vehicle) -> FleetResult<()> {
        if !vehicle.base_rate_per_day.is_finite() || vehicle.base_rate_per_day < 0.0 {
            return Err(FleetError::InvalidRate(vehicle.base_rate_per_day));
        }
        single_line("car id", &vehicle.id)?;
        single_line("brand", &vehicle.brand)?;
        single_line("model", &vehicle.model)?;
        let vehicle = Vehicle {
            available: true,
            ..vehicle
        };
        let id = vehicle.id.clone();
        self.store.add(vehicle)?;
        info!(vehicle_id = %id, "Vehicle added");
        Ok(())
    }

    /// Snapshot of available vehicles in roster order.
    pub fn list_available(&self) -> Vec<Vehicle> {
        self.store
            .vehicles()
            .iter()
            .filter(|vehicle| vehicle.available)
            .cloned()
            .collect()
    }

    /// The whole roster in order.
    pub fn vehicles(&self) -> &[Vehicle] {
        self.store.vehicles()
    }

    /// Active rentals, oldest first.
    pub fn active_rentals(&self) -> &[Rental] {
        self.ledger.rentals()
    }

    /// Active rental for `vehicle_id`, if any.
    pub fn active_rental_for(&self, vehicle_id: &str) -> Option<&Rental> {
        self.ledger.active_rental_for(vehicle_id)
    }

    /// Every renter issued so far.
    pub fn renters(&self) -> &[Renter] {
        self.ledger.renters()
    }

    /// Vehicle ids where roster availability and ledger disagree, sorted.
    pub fn inconsistencies(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .store
            .vehicles()
            .iter()
            .filter(|v| v.available == self.ledger.active_rental_for(&v.id).is_some())
            .map(|v| v.id.clone())
            .collect();
        ids.extend(
            self.ledger
                .rentals()
                .iter()
                .filter(|rental| self.store.get(&rental.vehicle_id).is_none())
                .map(|rental| rental.vehicle_id.clone()),
        );
        ids.sort();
        ids.dedup();
        ids
    }

    /// Drop rentals the roster does not back, then free rented vehicles without a rental.
    fn release_orphans(&mut self) -> FleetResult<()> {
        let store = &self.store;
        let dropped = self.ledger.retain(|rental| {
            store
                .get(&rental.vehicle_id)
                .map(|vehicle| !vehicle.available)
                .unwrap_or(false)
        })?;
        for rental in &dropped {
            warn!(
                vehicle_id = %rental.vehicle_id,
                renter_id = %rental.renter.id,
                "Dropped rental with no matching rented vehicle"
            );
        }

        let orphaned: Vec<String> = self
            .store
            .vehicles()
            .iter()
            .filter(|v| !v.available && self.ledger.active_rental_for(&v.id).is_none())
            .map(|v| v.id.clone())
            .collect();
        for id in orphaned {
            self.store.set_available(&id, true)?;
            warn!(vehicle_id = %id, "Released vehicle marked rented without a rental record");
        }
        Ok(())
    }

    fn available_vehicle(&self, vehicle_id: &str) -> FleetResult<&Vehicle> {
        let vehicle = self
            .store
            .get(vehicle_id)
            .ok_or_else(|| FleetError::UnknownVehicle(vehicle_id.to_string()))?;
        if !vehicle.available {
            return Err(FleetError::NotAvailable(vehicle_id.to_string()));
        }
        Ok(vehicle)
    }
}

/// Both backing files hold one record per line.
fn single_line(field: &'static str, value: &str) -> FleetResult<()> {
    if value.contains(&['\n', '\r'][..]) {
        return Err(FleetError::InvalidField {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Shared handle guarding roster and ledger with one lock.
///
/// Each compound operation runs entirely under the lock.
#[derive(Debug, Clone)]
pub struct FleetHandle {
    inner: Arc<Mutex<FleetService>>,
}

impl FleetHandle {
    /// Wrap a service for shared use.
    pub fn new(service: FleetService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    /// Lock the service for the duration of the returned guard.
    pub fn lock(&self) -> MutexGuard<'_, FleetService> {
        self.inner.lock()
    }
}
