//! Cart store flows against the device-local ephemeral backend.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use basecamp_cart_core::{
    price, CartError, CatalogItemId, LineItem, Money, RatePeriod, Reservation,
};
use basecamp_cart_runtime::{
    CartEvent, CartStore, CredentialCell, DeviceStore, EphemeralBackend, MigrationCoordinator,
};
use basecamp_cart_testing::builders::{activity, date, equipment, lodging, time};
use basecamp_cart_testing::{catalog_item, init_tracing, InMemoryCatalog, MockBackend};
use std::sync::Arc;
use tempfile::TempDir;

fn test_catalog() -> InMemoryCatalog {
    InMemoryCatalog::new()
        .with(catalog_item(1, "Riverside Site", 45, RatePeriod::Day, 6))
        .with(catalog_item(2, "Guided Kayak Tour", 25, RatePeriod::Hour, 8))
        .with(catalog_item(3, "Canoe", 70, RatePeriod::Week, 4))
}

/// Store pinned to the ephemeral backend; the durable factory is a mock
/// that sign-in tests can reach through the returned handle.
fn anonymous_store(dir: &TempDir) -> (CartStore, MockBackend) {
    init_tracing();
    let device = DeviceStore::new(dir.path());
    let mock = MockBackend::new();
    let durable = mock.clone();
    let store = CartStore::new(
        Arc::new(test_catalog()),
        EphemeralBackend::new(device.clone(), "test-session"),
        MigrationCoordinator::new(device),
        CredentialCell::new(),
        move || Arc::new(durable.clone()),
    );
    (store, mock)
}

#[tokio::test]
async fn re_adding_same_dates_replaces_the_item() {
    let dir = tempfile::tempdir().unwrap();
    let (store, _) = anonymous_store(&dir);

    let first = store
        .add(
            CatalogItemId::new(1),
            lodging(date(2024, 8, 1), date(2024, 8, 5), 2),
        )
        .await
        .unwrap();
    let second = store
        .add(
            CatalogItemId::new(1),
            lodging(date(2024, 8, 1), date(2024, 8, 5), 4),
        )
        .await
        .unwrap();
    assert_eq!(first.id, second.id);

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].quantity(), 4);
}

#[tokio::test]
async fn overlapping_stay_is_rejected_at_the_half_open_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let (store, _) = anonymous_store(&dir);

    store
        .add(
            CatalogItemId::new(1),
            lodging(date(2024, 8, 1), date(2024, 8, 5), 2),
        )
        .await
        .unwrap();

    let overlapping = store
        .add(
            CatalogItemId::new(1),
            lodging(date(2024, 8, 3), date(2024, 8, 7), 2),
        )
        .await;
    assert_eq!(
        overlapping.unwrap_err(),
        CartError::Conflict {
            catalog_item_id: CatalogItemId::new(1)
        }
    );

    // Checkout day is free: back-to-back stays are fine.
    store
        .add(
            CatalogItemId::new(1),
            lodging(date(2024, 8, 5), date(2024, 8, 8), 2),
        )
        .await
        .unwrap();
    assert_eq!(store.snapshot().await.len(), 2);
}

#[tokio::test]
async fn same_day_activities_conflict_at_different_times() {
    let dir = tempfile::tempdir().unwrap();
    let (store, _) = anonymous_store(&dir);

    store
        .add(
            CatalogItemId::new(2),
            activity(date(2024, 9, 10), time(9, 0), 2),
        )
        .await
        .unwrap();

    let afternoon = store
        .add(
            CatalogItemId::new(2),
            activity(date(2024, 9, 10), time(14, 0), 2),
        )
        .await;
    assert!(matches!(afternoon, Err(CartError::Conflict { .. })));
}

#[tokio::test]
async fn weekly_equipment_rate_is_prorated() {
    let dir = tempfile::tempdir().unwrap();
    let (store, _) = anonymous_store(&dir);

    let item = store
        .add(
            CatalogItemId::new(3),
            equipment(date(2024, 8, 1), date(2024, 8, 4), 2),
        )
        .await
        .unwrap();
    assert_eq!(item.unit_rate, Money::from_dollars(30));
    assert_eq!(item.total_price, Money::from_dollars(60));
}

#[tokio::test]
async fn update_quantity_reprices_and_zero_removes() {
    let dir = tempfile::tempdir().unwrap();
    let (store, _) = anonymous_store(&dir);

    let item = store
        .add(
            CatalogItemId::new(2),
            activity(date(2024, 9, 10), time(9, 0), 2),
        )
        .await
        .unwrap();
    assert_eq!(item.total_price, Money::from_dollars(50));

    store.update_quantity(&item.id, 5).await.unwrap();
    let snapshot = store.snapshot().await;
    assert_eq!(snapshot[0].quantity(), 5);
    assert_eq!(snapshot[0].total_price, Money::from_dollars(125));

    store.update_quantity(&item.id, 0).await.unwrap();
    assert!(store.snapshot().await.is_empty());
}

#[tokio::test]
async fn over_capacity_and_bad_input_are_rejected_without_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let (store, _) = anonymous_store(&dir);

    let too_many = store
        .add(
            CatalogItemId::new(1),
            lodging(date(2024, 8, 1), date(2024, 8, 5), 9),
        )
        .await;
    assert_eq!(
        too_many.unwrap_err(),
        CartError::OverCapacity {
            requested: 9,
            capacity: 6
        }
    );

    let reversed = store
        .add(
            CatalogItemId::new(1),
            lodging(date(2024, 8, 5), date(2024, 8, 1), 2),
        )
        .await;
    assert!(matches!(
        reversed.unwrap_err(),
        CartError::InvalidDateRange { .. }
    ));

    let unknown = store
        .add(
            CatalogItemId::new(99),
            lodging(date(2024, 8, 1), date(2024, 8, 5), 2),
        )
        .await;
    assert!(matches!(unknown.unwrap_err(), CartError::CatalogLookup(_)));

    assert!(store.snapshot().await.is_empty());
}

#[tokio::test]
async fn totals_never_drift_from_fresh_pricing() {
    let dir = tempfile::tempdir().unwrap();
    let (store, _) = anonymous_store(&dir);
    let catalog = test_catalog();

    store
        .add(
            CatalogItemId::new(1),
            lodging(date(2024, 8, 1), date(2024, 8, 5), 2),
        )
        .await
        .unwrap();
    let tour = store
        .add(
            CatalogItemId::new(2),
            activity(date(2024, 9, 10), time(9, 0), 3),
        )
        .await
        .unwrap();
    let canoe = store
        .add(
            CatalogItemId::new(3),
            equipment(date(2024, 8, 1), date(2024, 8, 4), 1),
        )
        .await
        .unwrap();
    store.update_quantity(&tour.id, 4).await.unwrap();
    store.update_quantity(&canoe.id, 2).await.unwrap();

    let snapshot = store.snapshot().await;
    let fresh: Money = {
        use basecamp_cart_core::Catalog;
        let mut sum = Money::ZERO;
        for item in &snapshot {
            let entry = catalog.item(item.catalog_item_id).await.unwrap();
            let quote = price(&item.reservation, entry.base_rate, entry.rate_period);
            assert_eq!(item.total_price, quote.total_price);
            sum = sum.saturating_add(quote.total_price);
        }
        sum
    };
    assert_eq!(store.total().await, fresh);
    assert_eq!(store.count().await, 2 + 4 + 2);
}

#[tokio::test]
async fn ephemeral_cart_survives_a_new_store_instance() {
    let dir = tempfile::tempdir().unwrap();
    let item_id;
    {
        let (store, _) = anonymous_store(&dir);
        let item = store
            .add(
                CatalogItemId::new(1),
                lodging(date(2024, 8, 1), date(2024, 8, 5), 2),
            )
            .await
            .unwrap();
        item_id = item.id;
    }

    let (reopened, _) = anonymous_store(&dir);
    assert!(reopened.snapshot().await.is_empty());
    reopened.init().await.unwrap();
    let snapshot = reopened.snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id, item_id);
}

#[tokio::test]
async fn subscribers_hear_committed_mutations_only() {
    let dir = tempfile::tempdir().unwrap();
    let (store, _) = anonymous_store(&dir);
    let mut events = store.subscribe();

    let item = store
        .add(
            CatalogItemId::new(1),
            lodging(date(2024, 8, 1), date(2024, 8, 5), 2),
        )
        .await
        .unwrap();
    assert!(matches!(
        events.try_recv().unwrap(),
        CartEvent::ItemUpserted(id) if id == item.id
    ));

    // A rejected add commits nothing and notifies nobody.
    let _ = store
        .add(
            CatalogItemId::new(1),
            lodging(date(2024, 8, 3), date(2024, 8, 7), 2),
        )
        .await
        .unwrap_err();
    assert!(events.try_recv().is_err());

    store.remove(&item.id).await.unwrap();
    assert!(matches!(
        events.try_recv().unwrap(),
        CartEvent::ItemRemoved(_)
    ));

    store.clear().await.unwrap();
    assert!(matches!(events.try_recv().unwrap(), CartEvent::Cleared));
}

#[tokio::test]
async fn failed_commit_leaves_snapshot_identical() {
    let dir = tempfile::tempdir().unwrap();
    let (store, mock) = anonymous_store(&dir);

    // Move onto the mock (durable) backend via the empty-cart fast path.
    store.sign_in("token").await.unwrap();

    store
        .add(
            CatalogItemId::new(1),
            lodging(date(2024, 8, 1), date(2024, 8, 5), 2),
        )
        .await
        .unwrap();
    let before: Vec<LineItem> = store.snapshot().await;

    mock.fail_next(CartError::Transport("connection reset".to_string()));
    let failed = store
        .add(
            CatalogItemId::new(3),
            equipment(date(2024, 8, 1), date(2024, 8, 4), 1),
        )
        .await;
    assert!(matches!(failed.unwrap_err(), CartError::Transport(_)));
    assert_eq!(store.snapshot().await, before);

    mock.fail_next(CartError::Timeout);
    assert_eq!(
        store.clear().await.unwrap_err(),
        CartError::Timeout
    );
    assert_eq!(store.snapshot().await, before);
}

#[tokio::test]
async fn sign_out_reverts_to_the_ephemeral_cart() {
    let dir = tempfile::tempdir().unwrap();
    let (store, mock) = anonymous_store(&dir);

    store.sign_in("token").await.unwrap();
    store
        .add(
            CatalogItemId::new(1),
            lodging(date(2024, 8, 1), date(2024, 8, 5), 2),
        )
        .await
        .unwrap();
    assert_eq!(mock.stored().len(), 1);

    store.sign_out().await.unwrap();
    assert!(!store.credential().is_present());
    // The durable cart stays server-side; the local ephemeral cart is empty.
    assert!(store.snapshot().await.is_empty());
}

#[tokio::test]
async fn sign_out_never_leaves_durable_items_in_the_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let (store, _) = anonymous_store(&dir);

    store.sign_in("token").await.unwrap();
    store
        .add(
            CatalogItemId::new(1),
            lodging(date(2024, 8, 1), date(2024, 8, 5), 2),
        )
        .await
        .unwrap();

    // An unreadable ephemeral cart surfaces the error but still empties
    // the snapshot: durable items must not linger once signed out.
    std::fs::write(dir.path().join("cart-test-session.json"), b"not json").unwrap();
    assert!(matches!(
        store.sign_out().await.unwrap_err(),
        CartError::Storage(_)
    ));
    assert!(!store.credential().is_present());
    assert!(store.snapshot().await.is_empty());
}
