//! # Basecamp Cart Testing
//!
//! Test doubles and helpers for the cart engine:
//!
//! - [`MockBackend`]: in-memory [`CartBackend`] with scripted failure
//!   injection and call recording.
//! - [`InMemoryCatalog`]: map-backed [`Catalog`].
//! - [`builders`]: terse constructors for reservations and catalog items.
//! - [`init_tracing`]: opt-in log output for tests (`RUST_LOG=debug`).

use async_trait::async_trait;
use basecamp_cart_core::{
    CartError, Catalog, CatalogItem, CatalogItemId, LineItem, Money, RatePeriod, Result,
};
use basecamp_cart_runtime::CartBackend;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, Once};

pub mod builders;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// In-memory cart backend with failure injection.
///
/// Clones share storage, so a test can keep one handle for assertions while
/// the store owns another. Each operation first pops the scripted failure
/// queue; a popped error is returned without touching stored state, which
/// is exactly the atomicity the real backends promise.
///
/// `import` deliberately *appends* rather than replaces: the remote bulk
/// import is not deduplicated across calls, so a migration-flag bug shows
/// up in tests as duplicated items.
#[derive(Clone, Default)]
pub struct MockBackend {
    items: Arc<Mutex<Vec<LineItem>>>,
    failures: Arc<Mutex<VecDeque<CartError>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the next operation to fail with `error`.
    pub fn fail_next(&self, error: CartError) {
        lock(&self.failures).push_back(error);
    }

    /// Seeds the stored item list (e.g. a pre-existing remote cart).
    pub fn seed(&self, items: Vec<LineItem>) {
        *lock(&self.items) = items;
    }

    /// Stored items, for assertions.
    #[must_use]
    pub fn stored(&self) -> Vec<LineItem> {
        lock(&self.items).clone()
    }

    /// Operation names in call order, for assertions.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// Number of calls to one operation.
    #[must_use]
    pub fn call_count(&self, operation: &str) -> usize {
        lock(&self.calls).iter().filter(|c| *c == operation).count()
    }

    fn begin(&self, operation: &str) -> Result<()> {
        lock(&self.calls).push(operation.to_string());
        match lock(&self.failures).pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CartBackend for MockBackend {
    async fn load(&self) -> Result<Vec<LineItem>> {
        self.begin("load")?;
        Ok(lock(&self.items).clone())
    }

    async fn put(&self, item: &LineItem) -> Result<Vec<LineItem>> {
        self.begin("put")?;
        let mut items = lock(&self.items);
        if let Some(existing) = items.iter_mut().find(|i| i.id == item.id) {
            *existing = item.clone();
        } else {
            items.push(item.clone());
        }
        Ok(items.clone())
    }

    async fn update(&self, item: &LineItem) -> Result<Vec<LineItem>> {
        self.begin("update")?;
        let mut items = lock(&self.items);
        let existing = items
            .iter_mut()
            .find(|i| i.id == item.id)
            .ok_or_else(|| CartError::ItemNotFound(item.id.clone()))?;
        *existing = item.clone();
        Ok(items.clone())
    }

    async fn delete(&self, item: &LineItem) -> Result<Vec<LineItem>> {
        self.begin("delete")?;
        let mut items = lock(&self.items);
        items.retain(|i| i.id != item.id);
        Ok(items.clone())
    }

    async fn clear(&self) -> Result<()> {
        self.begin("clear")?;
        lock(&self.items).clear();
        Ok(())
    }

    async fn import(&self, imported: &[LineItem]) -> Result<Vec<LineItem>> {
        self.begin("import")?;
        let mut items = lock(&self.items);
        items.extend(imported.iter().cloned());
        Ok(items.clone())
    }
}

/// Map-backed catalog for tests.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    items: HashMap<CatalogItemId, CatalogItem>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a catalog item, builder-style.
    #[must_use]
    pub fn with(mut self, item: CatalogItem) -> Self {
        self.items.insert(item.id, item);
        self
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn item(&self, id: CatalogItemId) -> Result<CatalogItem> {
        self.items
            .get(&id)
            .cloned()
            .ok_or(CartError::CatalogLookup(id))
    }
}

/// Shorthand catalog entry.
#[must_use]
pub fn catalog_item(
    id: u64,
    name: &str,
    rate_dollars: u64,
    rate_period: RatePeriod,
    capacity: u32,
) -> CatalogItem {
    CatalogItem {
        id: CatalogItemId::new(id),
        name: name.to_string(),
        base_rate: Money::from_dollars(rate_dollars),
        rate_period,
        capacity,
    }
}

/// Initializes log output for tests, honoring `RUST_LOG`. Safe to call
/// from every test.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
