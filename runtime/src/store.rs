//! The cart store: one owner for the in-memory cart.
//!
//! Every mutation runs validate → conflict check → price → commit through
//! the active backend → update memory → notify subscribers, in that order.
//! The in-memory snapshot only ever reflects committed state: a failed
//! commit changes nothing and subscribers hear nothing.
//!
//! The store owns identity transitions too. It starts on the ephemeral
//! backend; `sign_in` builds the durable backend, runs the one-shot
//! migration, and swaps backends only on success. Exactly one backend is
//! active at a time and the choice is never re-checked per call.

use crate::backend::{BackendHandle, CartBackend};
use crate::device::{DeviceStore, EphemeralBackend};
use crate::migration::MigrationCoordinator;
use crate::remote::{CredentialCell, RemoteBackend, RemoteConfig};
use basecamp_cart_core::{
    is_available, CartError, Catalog, CatalogItem, CatalogItemId, LineItem, LineItemId, Money,
    Reservation, Result,
};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};

/// Change notification emitted after every committed mutation.
///
/// Subscribers re-read [`CartStore::snapshot`] for the full state; the
/// event only says what kind of change happened.
#[derive(Clone, Debug)]
pub enum CartEvent {
    /// An item was added or replaced
    ItemUpserted(LineItemId),
    /// An item was removed
    ItemRemoved(LineItemId),
    /// The cart was emptied
    Cleared,
    /// The whole cart was reloaded (startup, sign-in, sign-out, migration)
    Reloaded,
}

type DurableFactory = Box<dyn Fn() -> BackendHandle + Send + Sync>;

/// The cart store.
///
/// Constructed once at application composition and shared by handle; no
/// other component mutates the cart.
pub struct CartStore {
    catalog: Arc<dyn Catalog>,
    ephemeral: Arc<EphemeralBackend>,
    durable: DurableFactory,
    migration: MigrationCoordinator,
    credential: CredentialCell,
    active: RwLock<BackendHandle>,
    items: RwLock<Vec<LineItem>>,
    changes: broadcast::Sender<CartEvent>,
    // Serializes mutations: one in-flight commit at a time, so two adds
    // racing on the same composite id resolve last-commit-wins.
    mutation: Mutex<()>,
}

impl CartStore {
    /// Creates a store from its parts. The ephemeral backend starts active.
    pub fn new<F>(
        catalog: Arc<dyn Catalog>,
        ephemeral: EphemeralBackend,
        migration: MigrationCoordinator,
        credential: CredentialCell,
        durable: F,
    ) -> Self
    where
        F: Fn() -> BackendHandle + Send + Sync + 'static,
    {
        let ephemeral = Arc::new(ephemeral);
        let (changes, _) = broadcast::channel(16);
        Self {
            catalog,
            active: RwLock::new(Arc::clone(&ephemeral) as BackendHandle),
            ephemeral,
            durable: Box::new(durable),
            migration,
            credential,
            items: RwLock::new(Vec::new()),
            changes,
            mutation: Mutex::new(()),
        }
    }

    /// Production wiring: device-local ephemeral storage plus a remote HTTP
    /// durable backend sharing one credential cell.
    #[must_use]
    pub fn with_remote(
        catalog: Arc<dyn Catalog>,
        device: DeviceStore,
        session: &str,
        remote: RemoteConfig,
    ) -> Self {
        let credential = CredentialCell::new();
        let cell = credential.clone();
        Self::new(
            catalog,
            EphemeralBackend::new(device.clone(), session),
            MigrationCoordinator::new(device),
            credential,
            move || Arc::new(RemoteBackend::new(remote.clone(), cell.clone())) as BackendHandle,
        )
    }

    /// The shared credential cell (set at sign-in, cleared on 401).
    #[must_use]
    pub const fn credential(&self) -> &CredentialCell {
        &self.credential
    }

    /// Loads the cart on application start.
    ///
    /// With a credential present this follows the sign-in path, including a
    /// pending migration; otherwise it reads the ephemeral cart.
    ///
    /// # Errors
    ///
    /// Returns storage or transport errors; the store stays usable on the
    /// ephemeral backend.
    pub async fn init(&self) -> Result<()> {
        let _guard = self.mutation.lock().await;
        if self.credential.is_present() {
            self.activate_durable().await
        } else {
            self.reload_ephemeral().await
        }
    }

    /// Switches to the durable backend for the given credential, migrating
    /// the ephemeral cart first if that is still pending.
    ///
    /// # Errors
    ///
    /// On migration or load failure the store keeps operating against the
    /// ephemeral backend and the flag stays unset; the next sign-in
    /// retries.
    pub async fn sign_in(&self, token: &str) -> Result<()> {
        let _guard = self.mutation.lock().await;
        self.credential.set(token);
        self.activate_durable().await
    }

    /// Clears the credential and reverts to the ephemeral backend.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the ephemeral cart cannot be read.
    pub async fn sign_out(&self) -> Result<()> {
        let _guard = self.mutation.lock().await;
        self.credential.clear();
        *self.active.write().await = Arc::clone(&self.ephemeral) as BackendHandle;
        self.reload_ephemeral().await
    }

    /// Adds a reservation to the cart.
    ///
    /// Re-adding the same catalog item for the same dates replaces the
    /// existing entry (that is how "change your dates or guests" is
    /// expressed); the conflict check runs against all *other* items.
    ///
    /// # Errors
    ///
    /// Validation rejections ([`CartError::InvalidDateRange`],
    /// [`CartError::InvalidQuantity`], [`CartError::OverCapacity`],
    /// [`CartError::Conflict`]) are reported before any persistence
    /// attempt. Commit failures leave the snapshot unchanged.
    pub async fn add(
        &self,
        catalog_item_id: CatalogItemId,
        reservation: Reservation,
    ) -> Result<LineItem> {
        let _guard = self.mutation.lock().await;
        reservation.validate()?;
        let catalog_item = self.catalog.item(catalog_item_id).await?;
        check_capacity(&catalog_item, reservation.count())?;

        let id = LineItemId::derive(catalog_item_id, &reservation);
        {
            let items = self.items.read().await;
            let others: Vec<LineItem> =
                items.iter().filter(|i| i.id != id).cloned().collect();
            if !is_available(&others, catalog_item_id, &reservation) {
                tracing::debug!(%id, "candidate reservation conflicts with cart");
                return Err(CartError::Conflict { catalog_item_id });
            }
        }

        let line = LineItem::priced(&catalog_item, reservation);
        let canonical = self.backend().await.put(&line).await?;
        tracing::debug!(id = %line.id, total = %line.total_price, "cart item committed");
        self.commit(canonical, CartEvent::ItemUpserted(line.id.clone()))
            .await;
        Ok(line)
    }

    /// Removes an item from the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] for an unknown id; commit
    /// failures leave the snapshot unchanged.
    pub async fn remove(&self, id: &LineItemId) -> Result<()> {
        let _guard = self.mutation.lock().await;
        self.remove_locked(id).await
    }

    /// Changes an item's guests/participants/quantity, repricing it.
    ///
    /// A quantity of zero is equivalent to [`CartStore::remove`].
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] for an unknown id,
    /// [`CartError::OverCapacity`] past the catalog capacity; commit
    /// failures leave the snapshot unchanged.
    pub async fn update_quantity(&self, id: &LineItemId, quantity: u32) -> Result<()> {
        let _guard = self.mutation.lock().await;
        if quantity == 0 {
            return self.remove_locked(id).await;
        }

        let current = self.find(id).await?;
        let catalog_item = self.catalog.item(current.catalog_item_id).await?;
        check_capacity(&catalog_item, quantity)?;

        // Repricing from scratch keeps totals consistent with the current
        // fields for every item type (a proportional shortcut would drift
        // for lodging, where price tracks nights rather than guests).
        let updated =
            LineItem::priced(&catalog_item, current.reservation.with_count(quantity));
        let canonical = self.backend().await.update(&updated).await?;
        self.commit(canonical, CartEvent::ItemUpserted(updated.id))
            .await;
        Ok(())
    }

    /// Empties the cart.
    ///
    /// # Errors
    ///
    /// Commit failures leave the snapshot unchanged.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.mutation.lock().await;
        self.backend().await.clear().await?;
        self.commit(Vec::new(), CartEvent::Cleared).await;
        Ok(())
    }

    /// Immutable copy of the current line items.
    pub async fn snapshot(&self) -> Vec<LineItem> {
        self.items.read().await.clone()
    }

    /// Sum of all line totals.
    pub async fn total(&self) -> Money {
        self.items.read().await.iter().map(|i| i.total_price).sum()
    }

    /// Sum of all countable units (guests, participants, quantities).
    pub async fn count(&self) -> u32 {
        self.items
            .read()
            .await
            .iter()
            .map(LineItem::quantity)
            .fold(0, u32::saturating_add)
    }

    /// Subscribes to change notifications. Dropping the receiver
    /// unsubscribes; other subscribers are unaffected.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.changes.subscribe()
    }

    async fn activate_durable(&self) -> Result<()> {
        let durable = (self.durable)();
        match self.migration.run(&self.ephemeral, durable.as_ref()).await {
            Ok(canonical) => {
                *self.active.write().await = durable;
                self.commit(canonical, CartEvent::Reloaded).await;
                Ok(())
            }
            Err(error) => {
                // Still on the ephemeral backend: the snapshot must show its
                // cart, or the conflict check runs against an empty list.
                if let Err(load_error) = self.reload_ephemeral().await {
                    tracing::warn!(%load_error, "failed to reload ephemeral cart");
                }
                Err(error)
            }
        }
    }

    /// Resyncs memory with the ephemeral backend. An unreadable device
    /// store empties the snapshot rather than leaving stale items behind.
    async fn reload_ephemeral(&self) -> Result<()> {
        let (items, result) = match self.ephemeral.load().await {
            Ok(items) => (items, Ok(())),
            Err(error) => (Vec::new(), Err(error)),
        };
        self.commit(items, CartEvent::Reloaded).await;
        result
    }

    async fn remove_locked(&self, id: &LineItemId) -> Result<()> {
        let item = self.find(id).await?;
        let canonical = self.backend().await.delete(&item).await?;
        self.commit(canonical, CartEvent::ItemRemoved(item.id)).await;
        Ok(())
    }

    async fn find(&self, id: &LineItemId) -> Result<LineItem> {
        self.items
            .read()
            .await
            .iter()
            .find(|i| i.id == *id)
            .cloned()
            .ok_or_else(|| CartError::ItemNotFound(id.clone()))
    }

    async fn backend(&self) -> BackendHandle {
        Arc::clone(&*self.active.read().await)
    }

    async fn commit(&self, items: Vec<LineItem>, event: CartEvent) {
        *self.items.write().await = items;
        // No receivers is fine; a failing subscriber must not affect the
        // commit or other subscribers.
        let _ = self.changes.send(event);
    }
}

fn check_capacity(catalog_item: &CatalogItem, requested: u32) -> Result<()> {
    if catalog_item.capacity > 0 && requested > catalog_item.capacity {
        return Err(CartError::OverCapacity {
            requested,
            capacity: catalog_item.capacity,
        });
    }
    Ok(())
}
