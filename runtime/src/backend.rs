//! The persistence contract shared by the ephemeral and durable backends.

use async_trait::async_trait;
use basecamp_cart_core::{LineItem, Result};
use std::sync::Arc;

/// Shared handle to a persistence backend.
pub type BackendHandle = Arc<dyn CartBackend>;

/// One read/write contract, two interchangeable implementations.
///
/// Mutating operations return the backend's canonical item list so the
/// store can adopt it wholesale after a successful commit (the remote cart
/// API responds with the updated list; the ephemeral backend echoes what it
/// just persisted). A failed operation must leave the backend's stored
/// state unchanged.
#[async_trait]
pub trait CartBackend: Send + Sync {
    /// Reads the current item list.
    ///
    /// # Errors
    ///
    /// Returns a storage or transport error when the backing medium is
    /// unreachable.
    async fn load(&self) -> Result<Vec<LineItem>>;

    /// Inserts or replaces one item, keyed by its composite id.
    ///
    /// # Errors
    ///
    /// Returns a storage, transport, or authentication error; the stored
    /// list is unchanged on failure.
    async fn put(&self, item: &LineItem) -> Result<Vec<LineItem>>;

    /// Replaces an existing item after a quantity change.
    ///
    /// # Errors
    ///
    /// Returns [`basecamp_cart_core::CartError::ItemNotFound`] when the id
    /// is absent, or a storage/transport/authentication error.
    async fn update(&self, item: &LineItem) -> Result<Vec<LineItem>>;

    /// Deletes one item.
    ///
    /// Takes the full line item because the remote API addresses items by
    /// catalog id and item type rather than by composite id.
    ///
    /// # Errors
    ///
    /// Returns a storage, transport, or authentication error.
    async fn delete(&self, item: &LineItem) -> Result<Vec<LineItem>>;

    /// Removes all items.
    ///
    /// # Errors
    ///
    /// Returns a storage, transport, or authentication error.
    async fn clear(&self) -> Result<()>;

    /// Bulk-imports a full item list, returning the canonical result.
    ///
    /// Called once per identity transition by the migration coordinator.
    /// Assumed idempotent within a call but not deduplicated across calls;
    /// the migration flag is what prevents repeats.
    ///
    /// # Errors
    ///
    /// Returns a storage, transport, or authentication error.
    async fn import(&self, items: &[LineItem]) -> Result<Vec<LineItem>>;
}
