//! Pricing calculator.
//!
//! Pure functions from a reservation plus the catalog base rate to a
//! `(unit_rate, total_price)` quote. Never fails for valid numeric inputs;
//! date ordering is the caller's contract (`Reservation::validate`).

use crate::catalog::RatePeriod;
use crate::item::Reservation;
use crate::money::Money;

/// Derived pricing for one line item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quote {
    /// Per-unit rate: per night for lodging, per participant for
    /// activities, per rented unit over the whole rental for equipment.
    pub unit_rate: Money,
    /// Total for the line.
    pub total_price: Money,
}

/// Prices a reservation against the catalog base rate.
///
/// - Lodging: `total = base_rate * nights` (minimum one night); guests do
///   not affect the price.
/// - Activity: `total = base_rate * participants`.
/// - Equipment: the base rate is normalized to a per-unit rate for the whole
///   rental, then multiplied by the unit count:
///   - `hour` period: effective daily rate is `base_rate * 24`.
///   - `day` period: `base_rate * rental_days`.
///   - `week` period: prorated as `base_rate * rental_days / 7`.
#[must_use]
pub fn price(reservation: &Reservation, base_rate: Money, rate_period: RatePeriod) -> Quote {
    match reservation {
        Reservation::Lodging { .. } => {
            let nights = reservation.span_days();
            Quote {
                unit_rate: base_rate,
                total_price: base_rate.saturating_mul(nights),
            }
        }
        Reservation::Activity { participants, .. } => Quote {
            unit_rate: base_rate,
            total_price: base_rate.saturating_mul(u64::from(*participants)),
        },
        Reservation::Equipment { quantity, .. } => {
            let rental_days = reservation.span_days();
            let unit_rate = match rate_period {
                RatePeriod::Hour => base_rate.saturating_mul(24).saturating_mul(rental_days),
                RatePeriod::Day => base_rate.saturating_mul(rental_days),
                RatePeriod::Week => base_rate.prorate(rental_days, 7),
            };
            Quote {
                unit_rate,
                total_price: unit_rate.saturating_mul(u64::from(*quantity)),
            }
        }
    }
}
