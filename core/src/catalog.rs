//! Catalog types and the read-only catalog seam.
//!
//! The catalog service owns bookable entities (campsites, activities,
//! equipment). The cart only reads them: every priced line item carries a
//! reference back to its catalog item, and the store looks the entry up at
//! mutation time so prices never go stale.

use crate::error::Result;
use crate::money::Money;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Identifier of a catalog entity, owned by the external catalog service.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CatalogItemId(u64);

impl CatalogItemId {
    /// Creates a catalog item id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for CatalogItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Billing period the catalog base rate is quoted in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatePeriod {
    /// Rate is per hour (normalized to a daily rate when pricing rentals).
    Hour,
    /// Rate is per day.
    Day,
    /// Rate is per week (prorated for shorter rentals).
    Week,
}

/// Read-only snapshot of a catalog entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    /// Catalog identifier
    pub id: CatalogItemId,
    /// Display name
    pub name: String,
    /// Base rate in the catalog's billing period
    pub base_rate: Money,
    /// Billing period for `base_rate`
    pub rate_period: RatePeriod,
    /// Maximum guests/participants/units; 0 means unbounded
    pub capacity: u32,
}

/// Catalog lookup seam.
///
/// The cart never writes catalog entities. Production implementations call
/// the catalog service; tests use an in-memory map.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Look up a catalog item by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CartError::CatalogLookup`] when the id is unknown,
    /// or a transport error when the catalog service is unreachable.
    async fn item(&self, id: CatalogItemId) -> Result<CatalogItem>;
}
