//! Line items: reservations of catalog items over dates and quantities.
//!
//! A line item's id is a deterministic composite of its type, catalog id,
//! and temporal fields, so re-adding the same catalog item for the same
//! dates replaces the existing entry instead of duplicating it. Changing
//! only the count (guests/participants/quantity) keeps the id stable.

use crate::catalog::{CatalogItem, CatalogItemId};
use crate::error::{CartError, Result};
use crate::money::Money;
use crate::pricing;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// The closed set of reservable item types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    /// A campsite or cabin stay with check-in/check-out dates.
    Lodging,
    /// A timed activity on a single date.
    Activity,
    /// An equipment rental over a date range.
    Equipment,
}

impl ItemType {
    /// Stable lowercase wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lodging => "lodging",
            Self::Activity => "activity",
            Self::Equipment => "equipment",
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "lodging" => Ok(Self::Lodging),
            "activity" => Ok(Self::Activity),
            "equipment" => Ok(Self::Equipment),
            other => Err(format!("unknown item type: {other}")),
        }
    }
}

/// Type-specific temporal fields of a reservation.
///
/// Serialized internally tagged on `itemType` so the wire shape matches the
/// remote cart API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "itemType", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Reservation {
    /// A stay spanning `[check_in, check_out)`.
    Lodging {
        /// Arrival date
        check_in: NaiveDate,
        /// Departure date (checkout day itself is free for the next guest)
        check_out: NaiveDate,
        /// Number of guests
        guests: u32,
    },
    /// A timed activity on a single calendar day.
    Activity {
        /// Activity date
        date: NaiveDate,
        /// Time of day (not consulted by the conflict detector)
        time: NaiveTime,
        /// Number of participants
        participants: u32,
    },
    /// An equipment rental spanning `[rental_start, rental_end)`.
    Equipment {
        /// First rental day
        rental_start: NaiveDate,
        /// Return day
        rental_end: NaiveDate,
        /// Number of units
        quantity: u32,
    },
}

impl Reservation {
    /// The item type of this reservation.
    #[must_use]
    pub const fn item_type(&self) -> ItemType {
        match self {
            Self::Lodging { .. } => ItemType::Lodging,
            Self::Activity { .. } => ItemType::Activity,
            Self::Equipment { .. } => ItemType::Equipment,
        }
    }

    /// The countable field: guests, participants, or rented units.
    #[must_use]
    pub const fn count(&self) -> u32 {
        match self {
            Self::Lodging { guests, .. } => *guests,
            Self::Activity { participants, .. } => *participants,
            Self::Equipment { quantity, .. } => *quantity,
        }
    }

    /// Returns the same reservation with its countable field replaced.
    ///
    /// The temporal fields are untouched, so the derived line item id does
    /// not change.
    #[must_use]
    pub fn with_count(&self, count: u32) -> Self {
        let mut updated = self.clone();
        match &mut updated {
            Self::Lodging { guests, .. } => *guests = count,
            Self::Activity { participants, .. } => *participants = count,
            Self::Equipment { quantity, .. } => *quantity = count,
        }
        updated
    }

    /// Duration in billable days: nights for lodging, rental days for
    /// equipment (minimum 1 each), and 1 for activities.
    #[must_use]
    pub fn span_days(&self) -> u64 {
        match self {
            Self::Lodging {
                check_in,
                check_out,
                ..
            } => day_span(*check_in, *check_out),
            Self::Activity { .. } => 1,
            Self::Equipment {
                rental_start,
                rental_end,
                ..
            } => day_span(*rental_start, *rental_end),
        }
    }

    /// Checks the caller contract: well-ordered dates and a count of at
    /// least 1.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidDateRange`] when `end <= start`, or
    /// [`CartError::InvalidQuantity`] when the count is zero.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Lodging {
                check_in,
                check_out,
                ..
            } if check_out <= check_in => Err(CartError::InvalidDateRange {
                start: *check_in,
                end: *check_out,
            }),
            Self::Equipment {
                rental_start,
                rental_end,
                ..
            } if rental_end <= rental_start => Err(CartError::InvalidDateRange {
                start: *rental_start,
                end: *rental_end,
            }),
            _ if self.count() == 0 => Err(CartError::InvalidQuantity),
            _ => Ok(()),
        }
    }
}

/// Whole days between two dates, minimum 1.
fn day_span(start: NaiveDate, end: NaiveDate) -> u64 {
    u64::try_from((end - start).num_days()).unwrap_or(0).max(1)
}

/// Deterministic composite key of a line item.
///
/// Derived from the item type, catalog id, and temporal fields only; two
/// reservations of the same catalog item for the same dates always map to
/// the same id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItemId(String);

impl LineItemId {
    /// Derives the id for a reservation of the given catalog item.
    #[must_use]
    pub fn derive(catalog_item_id: CatalogItemId, reservation: &Reservation) -> Self {
        let key = match reservation {
            Reservation::Lodging {
                check_in,
                check_out,
                ..
            } => format!("lodging:{catalog_item_id}:{check_in}:{check_out}"),
            Reservation::Activity { date, time, .. } => {
                format!("activity:{catalog_item_id}:{date}T{time}")
            }
            Reservation::Equipment {
                rental_start,
                rental_end,
                ..
            } => format!("equipment:{catalog_item_id}:{rental_start}:{rental_end}"),
        };
        Self(key)
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LineItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One reservable unit in the cart.
///
/// `unit_rate` and `total_price` are derived: they are recomputed whenever
/// the reservation changes and are never mutated independently.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Deterministic composite id
    pub id: LineItemId,
    /// Reference to the catalog entity
    pub catalog_item_id: CatalogItemId,
    /// Catalog display name snapshot
    pub name: String,
    /// Type-specific temporal fields
    #[serde(flatten)]
    pub reservation: Reservation,
    /// Derived per-unit rate
    pub unit_rate: Money,
    /// Derived total for this line
    pub total_price: Money,
}

impl LineItem {
    /// Builds a priced line item from a catalog snapshot and a reservation.
    ///
    /// The id is derived from the reservation's temporal fields; pricing
    /// comes from the catalog base rate and period. The reservation is
    /// assumed validated by the caller.
    #[must_use]
    pub fn priced(catalog_item: &CatalogItem, reservation: Reservation) -> Self {
        let id = LineItemId::derive(catalog_item.id, &reservation);
        let quote = pricing::price(&reservation, catalog_item.base_rate, catalog_item.rate_period);
        Self {
            id,
            catalog_item_id: catalog_item.id,
            name: catalog_item.name.clone(),
            reservation,
            unit_rate: quote.unit_rate,
            total_price: quote.total_price,
        }
    }

    /// The item type of this line.
    #[must_use]
    pub const fn item_type(&self) -> ItemType {
        self.reservation.item_type()
    }

    /// The countable field (guests/participants/quantity).
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.reservation.count()
    }
}
