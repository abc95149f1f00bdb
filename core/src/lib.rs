//! # Basecamp Cart Core
//!
//! Pure domain layer for the Basecamp shopping cart and booking-conflict
//! engine.
//!
//! This crate contains no I/O: reservable line items (lodging stays, timed
//! activities, equipment rentals), the pricing calculator, the conflict
//! detector, and the error taxonomy shared by the runtime layer.
//!
//! ## Core Concepts
//!
//! - **Catalog item**: a bookable entity owned by the external catalog
//!   service. The cart only reads catalog data (`Catalog` trait).
//! - **Line item**: one reservation of a catalog item over a specific
//!   date/time range and quantity, keyed by a deterministic composite id so
//!   re-adding the same dates replaces rather than duplicates.
//! - **Pricing**: `unit_rate`/`total_price` are derived values, recomputed on
//!   every mutation from the current reservation fields and the catalog base
//!   rate.
//! - **Conflict**: an overlap between a candidate reservation and an existing
//!   line item for the same catalog item.

pub mod catalog;
pub mod conflict;
pub mod error;
pub mod item;
pub mod money;
pub mod pricing;

pub use catalog::{Catalog, CatalogItem, CatalogItemId, RatePeriod};
pub use conflict::{is_available, ranges_overlap};
pub use error::{CartError, Result};
pub use item::{ItemType, LineItem, LineItemId, Reservation};
pub use money::Money;
pub use pricing::{price, Quote};
