//! Durable cart backend: authenticated HTTP calls to the remote cart API.
//!
//! Every mutating call carries the bearer credential. A `401` response
//! clears the stored credential and surfaces `CartError::Unauthorized`
//! without retrying; the caller must re-authenticate. Each call has a
//! bounded wait, and only the idempotent `GET /cart` read is retried on
//! transient failure.

use crate::backend::CartBackend;
use crate::retry::{retry_idempotent, RetryPolicy};
use async_trait::async_trait;
use basecamp_cart_core::{CartError, CatalogItemId, ItemType, LineItem, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Shared slot for the bearer credential.
///
/// The remote backend reads it per call and clears it on a `401`; the
/// application layer sets it at sign-in and clears it at sign-out. Cloning
/// shares the slot.
#[derive(Clone, Debug, Default)]
pub struct CredentialCell {
    token: Arc<RwLock<Option<String>>>,
}

impl CredentialCell {
    /// Creates an empty cell.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a credential.
    pub fn set(&self, token: impl Into<String>) {
        *write_lock(&self.token) = Some(token.into());
    }

    /// Clears the credential.
    pub fn clear(&self) {
        *write_lock(&self.token) = None;
    }

    /// Returns the current credential, if any.
    #[must_use]
    pub fn get(&self) -> Option<String> {
        read_lock(&self.token).clone()
    }

    /// Whether a credential is currently stored.
    #[must_use]
    pub fn is_present(&self) -> bool {
        read_lock(&self.token).is_some()
    }
}

// A poisoned lock can only mean a panicked writer mid-swap of an Option;
// the value is still usable, so recover it instead of propagating.
fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Remote cart API configuration.
#[derive(Clone, Debug)]
pub struct RemoteConfig {
    /// Base URL of the cart API (no trailing slash required)
    pub base_url: String,
    /// Bounded wait per call
    pub timeout: Duration,
    /// Retry policy for idempotent reads
    pub retry: RetryPolicy,
}

impl RemoteConfig {
    /// Creates a config with a 10 second per-call timeout and the default
    /// read retry policy.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

/// Body of `PUT /cart/item`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuantityUpdate {
    catalog_item_id: CatalogItemId,
    item_type: ItemType,
    quantity: u32,
}

/// Body of `POST /cart/migrate`.
#[derive(Debug, Serialize)]
struct BulkImport<'a> {
    items: &'a [LineItem],
}

/// Cart backend for the authenticated identity.
pub struct RemoteBackend {
    client: Client,
    config: RemoteConfig,
    credential: CredentialCell,
}

impl RemoteBackend {
    /// Creates a backend sharing the given credential cell.
    #[must_use]
    pub fn new(config: RemoteConfig, credential: CredentialCell) -> Self {
        Self {
            client: Client::new(),
            config,
            credential,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    async fn dispatch(&self, request: RequestBuilder) -> Result<Response> {
        let token = self.credential.get().ok_or(CartError::Unauthorized)?;
        let response = request
            .bearer_auth(token)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CartError::Timeout
                } else {
                    CartError::Transport(e.to_string())
                }
            })?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!("cart backend rejected credential, clearing it");
            self.credential.clear();
            return Err(CartError::Unauthorized);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(CartError::Backend { status, message });
        }
        Ok(response)
    }

    async fn items_from(&self, request: RequestBuilder) -> Result<Vec<LineItem>> {
        let response = self.dispatch(request).await?;
        response
            .json()
            .await
            .map_err(|e| CartError::Transport(e.to_string()))
    }

    async fn fetch_cart(&self) -> Result<Vec<LineItem>> {
        self.items_from(self.client.get(self.url("/cart"))).await
    }
}

#[async_trait]
impl CartBackend for RemoteBackend {
    async fn load(&self) -> Result<Vec<LineItem>> {
        retry_idempotent(&self.config.retry, || self.fetch_cart()).await
    }

    async fn put(&self, item: &LineItem) -> Result<Vec<LineItem>> {
        self.items_from(self.client.post(self.url("/cart")).json(item))
            .await
    }

    async fn update(&self, item: &LineItem) -> Result<Vec<LineItem>> {
        let body = QuantityUpdate {
            catalog_item_id: item.catalog_item_id,
            item_type: item.item_type(),
            quantity: item.quantity(),
        };
        self.items_from(self.client.put(self.url("/cart/item")).json(&body))
            .await
    }

    async fn delete(&self, item: &LineItem) -> Result<Vec<LineItem>> {
        let path = format!("/cart/item/{}/{}", item.catalog_item_id, item.item_type());
        self.items_from(self.client.delete(self.url(&path))).await
    }

    async fn clear(&self) -> Result<()> {
        self.dispatch(self.client.delete(self.url("/cart/clear")))
            .await
            .map(|_| ())
    }

    async fn import(&self, items: &[LineItem]) -> Result<Vec<LineItem>> {
        self.items_from(
            self.client
                .post(self.url("/cart/migrate"))
                .json(&BulkImport { items }),
        )
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn credential_cell_is_shared_across_clones() {
        let cell = CredentialCell::new();
        let clone = cell.clone();
        cell.set("token-123");
        assert_eq!(clone.get().as_deref(), Some("token-123"));
        clone.clear();
        assert!(!cell.is_present());
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let backend = RemoteBackend::new(
            RemoteConfig::new("http://localhost:9000/"),
            CredentialCell::new(),
        );
        assert_eq!(backend.url("/cart"), "http://localhost:9000/cart");
    }

    #[test]
    fn quantity_update_wire_shape() {
        let body = QuantityUpdate {
            catalog_item_id: CatalogItemId::new(42),
            item_type: ItemType::Equipment,
            quantity: 3,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["catalogItemId"], 42);
        assert_eq!(value["itemType"], "equipment");
        assert_eq!(value["quantity"], 3);
    }
}
