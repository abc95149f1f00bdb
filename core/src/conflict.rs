//! Conflict detector.
//!
//! Pure predicate over the current cart: does a candidate reservation
//! overlap an existing line item for the same catalog item? Advisory only
//! for the local cart; the authoritative catalog availability check is a
//! separate collaborator call.

use crate::catalog::CatalogItemId;
use crate::item::{LineItem, Reservation};
use chrono::NaiveDate;

/// Half-open interval intersection: `[s1, e1)` and `[s2, e2)` conflict iff
/// `s1 < e2 && s2 < e1`. The shared boundary day is free (checkout day can
/// be the next guest's check-in).
#[must_use]
pub fn ranges_overlap(s1: NaiveDate, e1: NaiveDate, s2: NaiveDate, e2: NaiveDate) -> bool {
    s1 < e2 && s2 < e1
}

/// Whether a candidate reservation of `catalog_item_id` is free of conflicts
/// against the existing line items.
///
/// Only items sharing both the item type and the catalog id are considered.
/// Lodging and equipment compare date ranges half-open; activities conflict
/// on the same calendar day regardless of time (one activity booking per
/// day and catalog item).
///
/// When replacing an existing line item, the caller must exclude it from
/// `existing` first — an item never conflicts with the entry it replaces.
#[must_use]
pub fn is_available(
    existing: &[LineItem],
    catalog_item_id: CatalogItemId,
    candidate: &Reservation,
) -> bool {
    existing
        .iter()
        .filter(|item| {
            item.catalog_item_id == catalog_item_id
                && item.item_type() == candidate.item_type()
        })
        .all(|item| !conflicts(&item.reservation, candidate))
}

fn conflicts(existing: &Reservation, candidate: &Reservation) -> bool {
    match (existing, candidate) {
        (
            Reservation::Lodging {
                check_in: s1,
                check_out: e1,
                ..
            },
            Reservation::Lodging {
                check_in: s2,
                check_out: e2,
                ..
            },
        )
        | (
            Reservation::Equipment {
                rental_start: s1,
                rental_end: e1,
                ..
            },
            Reservation::Equipment {
                rental_start: s2,
                rental_end: e2,
                ..
            },
        ) => ranges_overlap(*s1, *e1, *s2, *e2),
        (
            Reservation::Activity { date: d1, .. },
            Reservation::Activity { date: d2, .. },
        ) => d1 == d2,
        _ => false,
    }
}
