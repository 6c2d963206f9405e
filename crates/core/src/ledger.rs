//! Active rentals and the renters that hold them.

use std::{
    num::NonZeroU32,
    path::{Path, PathBuf},
};

use chrono::Utc;
use tracing::{debug, info};

use crate::{
    codec::{self, LedgerRecord},
    error::{FleetError, FleetResult},
    models::{Rental, Renter},
    renter::RenterRegistry,
    store::{numbered, read_backing_file, write_atomic},
};

/// Default file name of the ledger inside the data directory.
pub const DEFAULT_LEDGER_FILE: &str = "rentals.csv";

#[derive(Debug, Clone, Default)]
struct LedgerState {
    renters: RenterRegistry,
    rentals: Vec<Rental>,
}

impl LedgerState {
    fn position(&self, vehicle_id: &str) -> Option<usize> {
        self.rentals
            .iter()
            .position(|rental| rental.vehicle_id == vehicle_id)
    }

    fn records(&self) -> impl Iterator<Item = LedgerRecord> + '_ {
        self.renters
            .renters()
            .iter()
            .cloned()
            .map(LedgerRecord::Renter)
            .chain(self.rentals.iter().map(LedgerRecord::from_rental))
    }
}

/// Ledger of active rentals, at most one per vehicle.
///
/// Like the roster, the ledger file is rewritten in full on every change and
/// memory is only updated after the write succeeds.
#[derive(Debug)]
pub struct RentalLedger {
    path: PathBuf,
    state: LedgerState,
}

impl RentalLedger {
    /// Load the ledger at `path`. A missing file is an empty ledger.
    pub fn load(path: impl Into<PathBuf>) -> FleetResult<Self> {
        let path = path.into();
        let state = read_state(&path)?;
        info!(
            path = %path.display(),
            renters = state.renters.len(),
            rentals = state.rentals.len(),
            "Rental ledger loaded"
        );
        Ok(Self { path, state })
    }

    /// Active rental for `vehicle_id`, if any.
    pub fn active_rental_for(&self, vehicle_id: &str) -> Option<&Rental> {
        self.state
            .position(vehicle_id)
            .map(|idx| &self.state.rentals[idx])
    }

    /// All active rentals, oldest first.
    pub fn rentals(&self) -> &[Rental] {
        &self.state.rentals
    }

    /// Every renter ever issued.
    pub fn renters(&self) -> &[Renter] {
        self.state.renters.renters()
    }

    /// The identity a rental opened now for `name` would receive.
    pub fn next_renter(&self, name: impl Into<String>) -> Renter {
        self.state.renters.next(name)
    }

    /// Register a rental of `vehicle_id` to `renter` and persist.
    ///
    /// The renter is recorded if it has not been issued yet; a new renter must
    /// carry the next id in sequence, and an issued id must match its name.
    /// The vehicle's availability flag is left to the caller.
    pub fn open(
        &mut self,
        vehicle_id: &str,
        renter: Renter,
        days: NonZeroU32,
    ) -> FleetResult<Rental> {
        if self.state.position(vehicle_id).is_some() {
            return Err(FleetError::AlreadyRented(vehicle_id.to_string()));
        }
        let issued = match self.state.renters.get(&renter.id) {
            Some(existing) if *existing != renter => {
                return Err(FleetError::RenterConflict(renter.id));
            }
            Some(_) => true,
            None if renter.id != self.state.renters.next_id() => {
                return Err(FleetError::RenterConflict(renter.id));
            }
            None => false,
        };

        let rental = Rental {
            vehicle_id: vehicle_id.to_string(),
            renter,
            days,
            opened_at: Utc::now(),
        };

        let mut next = self.state.clone();
        if !issued {
            next.renters.register(rental.renter.clone());
        }
        next.rentals.push(rental.clone());
        self.commit(next)?;
        Ok(rental)
    }

    /// Remove and return the rental of `vehicle_id`, persisting the change.
    pub fn close(&mut self, vehicle_id: &str) -> FleetResult<Rental> {
        let idx = self
            .state
            .position(vehicle_id)
            .ok_or_else(|| FleetError::NotRented(vehicle_id.to_string()))?;

        let mut next = self.state.clone();
        let rental = next.rentals.remove(idx);
        self.commit(next)?;
        Ok(rental)
    }

    /// Undo an [`RentalLedger::open`] whose follow-up step failed.
    ///
    /// Drops the rental and, when it is the most recently issued one, its renter.
    pub fn revoke(&mut self, vehicle_id: &str) -> FleetResult<()> {
        let Some(idx) = self.state.position(vehicle_id) else {
            return Ok(());
        };

        let mut next = self.state.clone();
        let rental = next.rentals.remove(idx);
        let renters = next.renters.renters();
        if renters.last().map(|last| last.id == rental.renter.id) == Some(true) {
            let mut kept = renters.to_vec();
            kept.pop();
            next.renters = RenterRegistry::from_renters(kept);
        }
        self.commit(next)
    }

    /// Put back a rental removed by [`RentalLedger::close`].
    pub fn reinstate(&mut self, rental: Rental) -> FleetResult<()> {
        if self.state.position(&rental.vehicle_id).is_some() {
            return Err(FleetError::AlreadyRented(rental.vehicle_id));
        }
        let mut next = self.state.clone();
        next.rentals.push(rental);
        self.commit(next)
    }

    /// Drop every rental whose vehicle fails `keep`, returning the dropped ones.
    pub(crate) fn retain(
        &mut self,
        mut keep: impl FnMut(&Rental) -> bool,
    ) -> FleetResult<Vec<Rental>> {
        let mut next = self.state.clone();
        let (kept, dropped): (Vec<_>, Vec<_>) =
            next.rentals.into_iter().partition(|rental| keep(rental));
        if dropped.is_empty() {
            return Ok(dropped);
        }
        next.rentals = kept;
        self.commit(next)?;
        Ok(dropped)
    }

    fn commit(&mut self, next: LedgerState) -> FleetResult<()> {
        write_atomic(&self.path, next.records().map(|record| codec::encode_ledger(&record)))?;
        debug!(
            path = %self.path.display(),
            rentals = next.rentals.len(),
            "Rental ledger saved"
        );
        self.state = next;
        Ok(())
    }
}

fn read_state(path: &Path) -> FleetResult<LedgerState> {
    let Some(content) = read_backing_file(path)? else {
        return Ok(LedgerState::default());
    };

    let mut state = LedgerState::default();
    for (number, line) in numbered(&content) {
        match codec::decode_ledger(line).map_err(|err| err.at_line(number))? {
            LedgerRecord::Renter(renter) => {
                if state.renters.get(&renter.id).is_some() {
                    return Err(FleetError::malformed(
                        number,
                        format!("renter {} declared twice", renter.id),
                    ));
                }
                let expected = state.renters.next_id();
                if renter.id != expected {
                    return Err(FleetError::malformed(
                        number,
                        format!("renter {} out of sequence, expected {expected}", renter.id),
                    ));
                }
                state.renters.register(renter);
            }
            LedgerRecord::Rental {
                vehicle_id,
                renter_id,
                days,
                opened_at,
            } => {
                let renter = state.renters.get(&renter_id).cloned().ok_or_else(|| {
                    FleetError::malformed(number, format!("unknown renter {renter_id}"))
                })?;
                if state.position(&vehicle_id).is_some() {
                    return Err(FleetError::malformed(
                        number,
                        format!("second active rental for {vehicle_id}"),
                    ));
                }
                state.rentals.push(Rental {
                    vehicle_id,
                    renter,
                    days,
                    opened_at,
                });
            }
        }
    }
    Ok(state)
}
