//! Line codec for the flat-file stores.
//!
//! A vehicle is one line holding `id,brand,model,base_rate_per_day,available`.
//! Fields are not quoted: a brand or model containing [`DELIMITER`] cannot be
//! represented and will not decode back to the same vehicle.

use std::num::NonZeroU32;

use chrono::{DateTime, Utc};

use crate::{
    error::{FleetError, FleetResult},
    models::{Rental, Renter, Vehicle},
};

/// Field separator shared by every record kind.
pub const DELIMITER: char = ',';

const VEHICLE_FIELDS: usize = 5;
const RENTER_TAG: &str = "renter";
const RENTAL_TAG: &str = "rental";

/// Encode a vehicle as a single line without terminator.
pub fn encode(vehicle: &Vehicle) -> String {
    [
        vehicle.id.as_str(),
        vehicle.brand.as_str(),
        vehicle.model.as_str(),
        &format_rate(vehicle.base_rate_per_day),
        if vehicle.available { "true" } else { "false" },
    ]
    .join(&DELIMITER.to_string())
}

/// Decode a line produced by [`encode`].
pub fn decode(line: &str) -> FleetResult<Vehicle> {
    let fields: Vec<&str> = line.split(DELIMITER).collect();
    if fields.len() != VEHICLE_FIELDS {
        return Err(FleetError::malformed(
            0,
            format!("expected {VEHICLE_FIELDS} fields, found {}", fields.len()),
        ));
    }

    let base_rate_per_day = parse_rate(fields[3])?;
    let available = parse_flag(fields[4])?;

    Ok(Vehicle {
        id: fields[0].to_string(),
        brand: fields[1].to_string(),
        model: fields[2].to_string(),
        base_rate_per_day,
        available,
    })
}

/// One line of the rental ledger file.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerRecord {
    /// A renter identity that has been issued.
    Renter(Renter),
    /// An active rental, referencing its renter by id.
    Rental {
        /// Rented vehicle.
        vehicle_id: String,
        /// Id of a renter declared elsewhere in the file.
        renter_id: String,
        /// Duration in days.
        days: NonZeroU32,
        /// When the rental was opened.
        opened_at: DateTime<Utc>,
    },
}

impl LedgerRecord {
    /// Build the record persisted for an active rental.
    pub fn from_rental(rental: &Rental) -> Self {
        LedgerRecord::Rental {
            vehicle_id: rental.vehicle_id.clone(),
            renter_id: rental.renter.id.clone(),
            days: rental.days,
            opened_at: rental.opened_at,
        }
    }
}

/// Encode a ledger record. Renter names go last so they may contain the delimiter.
pub fn encode_ledger(record: &LedgerRecord) -> String {
    let sep = DELIMITER.to_string();
    match record {
        LedgerRecord::Renter(renter) => [RENTER_TAG, &renter.id, &renter.name].join(&sep),
        LedgerRecord::Rental {
            vehicle_id,
            renter_id,
            days,
            opened_at,
        } => [
            RENTAL_TAG,
            vehicle_id,
            renter_id,
            &days.to_string(),
            &opened_at.to_rfc3339(),
        ]
        .join(&sep),
    }
}

/// Decode a line produced by [`encode_ledger`].
pub fn decode_ledger(line: &str) -> FleetResult<LedgerRecord> {
    let (tag, rest) = line
        .split_once(DELIMITER)
        .ok_or_else(|| FleetError::malformed(0, "missing record tag"))?;

    match tag {
        RENTER_TAG => {
            let (id, name) = rest
                .split_once(DELIMITER)
                .ok_or_else(|| FleetError::malformed(0, "renter record needs id and name"))?;
            Ok(LedgerRecord::Renter(Renter {
                id: id.to_string(),
                name: name.to_string(),
            }))
        }
        RENTAL_TAG => {
            let fields: Vec<&str> = rest.split(DELIMITER).collect();
            if fields.len() != 4 {
                return Err(FleetError::malformed(
                    0,
                    format!("rental record expects 4 fields, found {}", fields.len()),
                ));
            }
            let days = fields[2]
                .parse::<NonZeroU32>()
                .map_err(|err| FleetError::malformed(0, format!("invalid days {:?}: {err}", fields[2])))?;
            let opened_at = DateTime::parse_from_rfc3339(fields[3])
                .map_err(|err| {
                    FleetError::malformed(0, format!("invalid timestamp {:?}: {err}", fields[3]))
                })?
                .with_timezone(&Utc);
            Ok(LedgerRecord::Rental {
                vehicle_id: fields[0].to_string(),
                renter_id: fields[1].to_string(),
                days,
                opened_at,
            })
        }
        other => Err(FleetError::malformed(0, format!("unknown record tag {other:?}"))),
    }
}

/// Shortest round-trip form, always with a fractional part (`30.0`, `45.5`).
fn format_rate(rate: f64) -> String {
    let text = rate.to_string();
    if rate.is_finite() && !text.contains(&['.', 'e', 'E'][..]) {
        format!("{text}.0")
    } else {
        text
    }
}

fn parse_rate(field: &str) -> FleetResult<f64> {
    let rate = field
        .trim()
        .parse::<f64>()
        .map_err(|err| FleetError::malformed(0, format!("invalid rate {field:?}: {err}")))?;
    if !rate.is_finite() || rate < 0.0 {
        return Err(FleetError::malformed(0, format!("rate out of range: {field:?}")));
    }
    Ok(rate)
}

fn parse_flag(field: &str) -> FleetResult<bool> {
    match field.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(FleetError::malformed(
            0,
            format!("invalid availability flag {other:?}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corolla() -> Vehicle {
        Vehicle::new("C001", "Toyota", "Corolla", 30.0)
    }

    #[test]
    fn encodes_fields_in_fixed_order() {
        assert_eq!(encode(&corolla()), "C001,Toyota,Corolla,30.0,true");

        let mut rented = Vehicle::new("C002", "Honda", "Civic", 45.5);
        rented.available = false;
        assert_eq!(encode(&rented), "C002,Honda,Civic,45.5,false");
    }

    #[test]
    fn decode_inverts_encode() -> FleetResult<()> {
        let samples = [
            corolla(),
            Vehicle {
                available: false,
                ..Vehicle::new("C017", "Mahindra", "Thar 4x4", 0.1 + 0.2)
            },
            Vehicle::new("", "", "", 0.0),
        ];
        for vehicle in samples {
            assert_eq!(decode(&encode(&vehicle))?, vehicle);
        }
        Ok(())
    }

    #[test]
    fn decodes_integral_rates_written_elsewhere() -> FleetResult<()> {
        let vehicle = decode("C003,Ford,Focus,60,true")?;
        assert_eq!(vehicle.base_rate_per_day, 60.0);
        Ok(())
    }

    #[test]
    fn rejects_wrong_field_count() {
        let err = decode("C001,Toyota,Corolla,30.0").unwrap_err();
        assert!(matches!(err, FleetError::MalformedRecord { .. }));

        // A delimiter inside the model shifts every field to the right.
        let lossy = encode(&Vehicle::new("C004", "Tesla", "Model 3, LR", 80.0));
        assert!(matches!(
            decode(&lossy),
            Err(FleetError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn rejects_bad_numbers_and_flags() {
        for line in [
            "C001,Toyota,Corolla,thirty,true",
            "C001,Toyota,Corolla,-1.0,true",
            "C001,Toyota,Corolla,NaN,true",
            "C001,Toyota,Corolla,30.0,yes",
        ] {
            assert!(
                matches!(decode(line), Err(FleetError::MalformedRecord { .. })),
                "accepted {line}"
            );
        }
    }

    #[test]
    fn renter_names_may_contain_the_delimiter() -> FleetResult<()> {
        let record = LedgerRecord::Renter(Renter {
            id: "CUS4".to_string(),
            name: "Smith, Jane".to_string(),
        });
        let line = encode_ledger(&record);
        assert_eq!(line, "renter,CUS4,Smith, Jane");
        assert_eq!(decode_ledger(&line)?, record);
        Ok(())
    }

    #[test]
    fn decodes_rental_records() -> FleetResult<()> {
        let record = decode_ledger("rental,C001,CUS1,3,2026-10-17T09:30:00+00:00")?;
        match record {
            LedgerRecord::Rental {
                vehicle_id,
                renter_id,
                days,
                opened_at,
            } => {
                assert_eq!(vehicle_id, "C001");
                assert_eq!(renter_id, "CUS1");
                assert_eq!(days.get(), 3);
                assert_eq!(opened_at.to_rfc3339(), "2026-10-17T09:30:00+00:00");
            }
            other => panic!("unexpected record {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn rejects_bad_ledger_lines() {
        for line in [
            "rental,C001,CUS1,0,2026-10-17T09:30:00+00:00",
            "rental,C001,CUS1,3",
            "rental,C001,CUS1,3,yesterday",
            "renter,CUS1",
            "customer,CUS1,Alice",
            "",
        ] {
            assert!(
                matches!(decode_ledger(line), Err(FleetError::MalformedRecord { .. })),
                "accepted {line:?}"
            );
        }
    }
}
