//! Anonymous-to-authenticated cart migration, end to end.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use basecamp_cart_core::{CartError, CatalogItemId, RatePeriod};
use basecamp_cart_runtime::{
    CartStore, CredentialCell, DeviceStore, EphemeralBackend, MigrationCoordinator,
};
use basecamp_cart_testing::builders::{date, equipment, lodging};
use basecamp_cart_testing::{catalog_item, init_tracing, InMemoryCatalog, MockBackend};
use std::sync::Arc;
use tempfile::TempDir;

fn test_catalog() -> InMemoryCatalog {
    InMemoryCatalog::new()
        .with(catalog_item(1, "Riverside Site", 45, RatePeriod::Day, 6))
        .with(catalog_item(3, "Canoe", 70, RatePeriod::Week, 4))
}

fn store_on(dir: &TempDir, durable: MockBackend) -> CartStore {
    init_tracing();
    let device = DeviceStore::new(dir.path());
    CartStore::new(
        Arc::new(test_catalog()),
        EphemeralBackend::new(device.clone(), "test-session"),
        MigrationCoordinator::new(device),
        CredentialCell::new(),
        move || Arc::new(durable.clone()),
    )
}

#[tokio::test]
async fn sign_in_transfers_the_ephemeral_cart_once() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockBackend::new();
    let store = store_on(&dir, mock.clone());

    store
        .add(
            CatalogItemId::new(1),
            lodging(date(2024, 8, 1), date(2024, 8, 5), 2),
        )
        .await
        .unwrap();
    store
        .add(
            CatalogItemId::new(3),
            equipment(date(2024, 8, 1), date(2024, 8, 4), 1),
        )
        .await
        .unwrap();

    store.sign_in("token").await.unwrap();

    assert_eq!(mock.call_count("import"), 1);
    assert_eq!(mock.stored().len(), 2);
    assert_eq!(store.snapshot().await.len(), 2);

    // The ephemeral cart was handed over, not copied.
    let device = DeviceStore::new(dir.path());
    let leftover = EphemeralBackend::new(device, "test-session");
    use basecamp_cart_runtime::CartBackend;
    assert!(leftover.load().await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_ephemeral_cart_skips_the_import() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockBackend::new();
    let store = store_on(&dir, mock.clone());

    store.sign_in("token").await.unwrap();

    assert_eq!(mock.call_count("import"), 0);
    assert_eq!(mock.call_count("load"), 1);
    assert!(store.snapshot().await.is_empty());
}

#[tokio::test]
async fn double_sign_in_never_duplicates_items() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockBackend::new();
    let store = store_on(&dir, mock.clone());

    store
        .add(
            CatalogItemId::new(1),
            lodging(date(2024, 8, 1), date(2024, 8, 5), 2),
        )
        .await
        .unwrap();
    store.sign_in("token").await.unwrap();
    assert_eq!(mock.stored().len(), 1);

    // Simulated double login event: the flag short-circuits the transfer.
    store.sign_out().await.unwrap();
    store.sign_in("token").await.unwrap();

    assert_eq!(mock.call_count("import"), 1);
    assert_eq!(mock.stored().len(), 1);
    assert_eq!(store.snapshot().await.len(), 1);
}

#[tokio::test]
async fn failed_migration_keeps_the_user_on_the_ephemeral_cart() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockBackend::new();
    let store = store_on(&dir, mock.clone());

    let item = store
        .add(
            CatalogItemId::new(1),
            lodging(date(2024, 8, 1), date(2024, 8, 5), 2),
        )
        .await
        .unwrap();

    mock.fail_next(CartError::Transport("gateway down".to_string()));
    let failed = store.sign_in("token").await;
    assert!(matches!(failed.unwrap_err(), CartError::Transport(_)));

    // Nothing reached the durable cart, nothing was lost locally.
    assert!(mock.stored().is_empty());
    assert_eq!(store.snapshot().await, vec![item.clone()]);

    // The cart keeps working against the ephemeral backend; the durable
    // backend sees none of it.
    store
        .add(
            CatalogItemId::new(3),
            equipment(date(2024, 8, 1), date(2024, 8, 4), 1),
        )
        .await
        .unwrap();
    assert_eq!(mock.call_count("put"), 0);

    // The next qualifying sign-in retries and picks up both items.
    store.sign_in("token").await.unwrap();
    assert_eq!(mock.call_count("import"), 2);
    assert_eq!(mock.stored().len(), 2);
}

#[tokio::test]
async fn failed_init_still_shows_the_ephemeral_cart() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockBackend::new();

    {
        let store = store_on(&dir, mock.clone());
        store
            .add(
                CatalogItemId::new(1),
                lodging(date(2024, 8, 1), date(2024, 8, 5), 2),
            )
            .await
            .unwrap();
    }

    // New process with a credential present, but the import fails: the
    // store stays on the ephemeral backend and must reload its cart.
    let store = store_on(&dir, mock.clone());
    store.credential().set("token");
    mock.fail_next(CartError::Transport("gateway down".to_string()));
    assert!(store.init().await.is_err());
    assert_eq!(store.snapshot().await.len(), 1);

    // With the cart visible again, an overlapping stay is still rejected.
    let overlapping = store
        .add(
            CatalogItemId::new(1),
            lodging(date(2024, 8, 3), date(2024, 8, 7), 2),
        )
        .await;
    assert!(matches!(overlapping.unwrap_err(), CartError::Conflict { .. }));
    assert_eq!(store.snapshot().await.len(), 1);
}

#[tokio::test]
async fn migrated_flag_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockBackend::new();

    {
        let store = store_on(&dir, mock.clone());
        store
            .add(
                CatalogItemId::new(1),
                lodging(date(2024, 8, 1), date(2024, 8, 5), 2),
            )
            .await
            .unwrap();
        store.sign_in("token").await.unwrap();
        assert_eq!(mock.call_count("import"), 1);
    }

    // New process, credential still present: init follows the durable path
    // and must not re-import.
    let store = store_on(&dir, mock.clone());
    store.credential().set("token");
    store.init().await.unwrap();

    assert_eq!(mock.call_count("import"), 1);
    assert_eq!(store.snapshot().await.len(), 1);
}
