//! Rental pricing.

use std::num::NonZeroU32;

/// Signature of a pricing rule: daily rate and duration to total.
pub type PriceFn = fn(f64, NonZeroU32) -> f64;

/// Flat pricing: the daily rate times the number of days.
pub fn price(base_rate_per_day: f64, days: NonZeroU32) -> f64 {
    base_rate_per_day * f64::from(days.get())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplies_rate_by_days() {
        let three = NonZeroU32::new(3).expect("non-zero");
        assert_eq!(price(30.0, three), 90.0);
        assert_eq!(price(0.0, three), 0.0);
    }
}
