//! Error types for cart operations.

use crate::catalog::CatalogItemId;
use crate::item::LineItemId;
use chrono::NaiveDate;
use thiserror::Error;

/// Result type alias for cart operations.
pub type Result<T> = std::result::Result<T, CartError>;

/// Error taxonomy for the cart engine.
///
/// Validation rejections are reported before any persistence attempt and
/// leave the cart unchanged. I/O-bearing failures are typed so callers can
/// distinguish recoverable transport faults from authentication failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    // ═══════════════════════════════════════════════════════════
    // Validation rejections (no state change, no persistence)
    // ═══════════════════════════════════════════════════════════
    /// Reservation dates are not well-ordered (`end` must be after `start`).
    #[error("invalid date range: {start} to {end}")]
    InvalidDateRange {
        /// Range start (check-in / rental start)
        start: NaiveDate,
        /// Range end (check-out / rental end)
        end: NaiveDate,
    },

    /// Guests, participants, or quantity must be at least 1.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// Requested count exceeds the catalog item's capacity.
    #[error("requested {requested} exceeds capacity {capacity}")]
    OverCapacity {
        /// Requested guests/participants/quantity
        requested: u32,
        /// Catalog item capacity
        capacity: u32,
    },

    /// Candidate reservation overlaps an existing line item for the same
    /// catalog item.
    #[error("dates conflict with an existing reservation for catalog item {catalog_item_id}")]
    Conflict {
        /// The contested catalog item
        catalog_item_id: CatalogItemId,
    },

    /// No line item with the given id is in the cart.
    #[error("no cart item with id {0}")]
    ItemNotFound(LineItemId),

    /// Catalog service has no entry for the given id.
    #[error("catalog item {0} not found")]
    CatalogLookup(CatalogItemId),

    // ═══════════════════════════════════════════════════════════
    // I/O failures (cart remains at its last committed value)
    // ═══════════════════════════════════════════════════════════
    /// Transient network failure; the same operation may be retried.
    #[error("network request failed: {0}")]
    Transport(String),

    /// Bounded wait elapsed; treated as failure for mutations, retried for
    /// idempotent reads.
    #[error("request timed out")]
    Timeout,

    /// Remote rejected the credential (401). The credential has been cleared
    /// and the caller must re-authenticate.
    #[error("authentication required")]
    Unauthorized,

    /// Remote cart backend returned an unexpected status.
    #[error("cart backend returned status {status}: {message}")]
    Backend {
        /// HTTP status code
        status: u16,
        /// Response body, if any
        message: String,
    },

    /// Device-local storage failed (read, write, or decode).
    #[error("device storage failed: {0}")]
    Storage(String),
}

impl CartError {
    /// Whether the failed operation may be retried as-is.
    ///
    /// Only transport faults and timeouts are recoverable; validation
    /// rejections and authentication failures are not.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout)
    }
}
