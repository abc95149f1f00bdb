//! Device-local persistence: the ephemeral cart backend and the key-value
//! store behind it.
//!
//! The device store is a directory of small JSON files, scoped to one
//! device/session the way browser local storage is. It survives process
//! restarts but not account changes; the migration coordinator clears the
//! cart file once its contents have moved to the durable backend, and
//! persists the migration flag through the same store.

use crate::backend::CartBackend;
use async_trait::async_trait;
use basecamp_cart_core::{CartError, LineItem, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::PathBuf;

/// JSON-file key-value store rooted at a device-scoped directory.
#[derive(Clone, Debug)]
pub struct DeviceStore {
    root: PathBuf,
}

impl DeviceStore {
    /// Creates a store rooted at `root`. The directory is created lazily on
    /// first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    /// Reads and decodes a value, or `None` when the key has never been
    /// written.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] on I/O or decode failure.
    pub async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match tokio::fs::read(self.path(key)).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| CartError::Storage(e.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CartError::Storage(e.to_string())),
        }
    }

    /// Encodes and writes a value.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] on I/O or encode failure.
    pub async fn write<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| CartError::Storage(e.to_string()))?;
        let bytes =
            serde_json::to_vec_pretty(value).map_err(|e| CartError::Storage(e.to_string()))?;
        tokio::fs::write(self.path(key), bytes)
            .await
            .map_err(|e| CartError::Storage(e.to_string()))
    }

    /// Removes a key. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] on I/O failure.
    pub async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CartError::Storage(e.to_string())),
        }
    }
}

/// Cart backend for the anonymous identity, backed by the device store.
pub struct EphemeralBackend {
    store: DeviceStore,
    key: String,
}

impl EphemeralBackend {
    /// Creates the backend for one session key.
    #[must_use]
    pub fn new(store: DeviceStore, session: &str) -> Self {
        Self {
            store,
            key: format!("cart-{session}"),
        }
    }

    async fn items(&self) -> Result<Vec<LineItem>> {
        self.store
            .read(&self.key)
            .await
            .map(Option::unwrap_or_default)
    }

    async fn persist(&self, items: &[LineItem]) -> Result<()> {
        self.store.write(&self.key, &items).await
    }
}

#[async_trait]
impl CartBackend for EphemeralBackend {
    async fn load(&self) -> Result<Vec<LineItem>> {
        self.items().await
    }

    async fn put(&self, item: &LineItem) -> Result<Vec<LineItem>> {
        let mut items = self.items().await?;
        if let Some(existing) = items.iter_mut().find(|i| i.id == item.id) {
            *existing = item.clone();
        } else {
            items.push(item.clone());
        }
        self.persist(&items).await?;
        Ok(items)
    }

    async fn update(&self, item: &LineItem) -> Result<Vec<LineItem>> {
        let mut items = self.items().await?;
        let existing = items
            .iter_mut()
            .find(|i| i.id == item.id)
            .ok_or_else(|| CartError::ItemNotFound(item.id.clone()))?;
        *existing = item.clone();
        self.persist(&items).await?;
        Ok(items)
    }

    async fn delete(&self, item: &LineItem) -> Result<Vec<LineItem>> {
        let mut items = self.items().await?;
        items.retain(|i| i.id != item.id);
        self.persist(&items).await?;
        Ok(items)
    }

    async fn clear(&self) -> Result<()> {
        self.store.remove(&self.key).await
    }

    async fn import(&self, items: &[LineItem]) -> Result<Vec<LineItem>> {
        self.persist(items).await?;
        Ok(items.to_vec())
    }
}
