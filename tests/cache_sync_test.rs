//! Startup reconciliation between the primary store and the cache: cold
//! rebuild, warm idempotence, and failure tolerance.

mod common;

use common::{harness, seed_product};
use storefront_core::cache::{sync, CacheStore};
use storefront_core::models::{Pagination, ProductFilter};

#[tokio::test]
async fn cold_cache_is_rebuilt_from_the_primary_store() {
    let h = harness();
    h.health.set_healthy(false);
    let a = seed_product(&h.store, "rebuilt item one", 5, 20, true).await;
    let b = seed_product(&h.store, "rebuilt item two", 3, 40, true).await;

    sync::reconcile(h.store.as_ref(), h.cache.as_ref(), &h.health).await;

    assert!(h.health.is_healthy());
    assert!(h.cache.index_created());
    assert!(h.cache.get(a.product_id).await.expect("get").is_some());
    assert!(h.cache.get(b.product_id).await.expect("get").is_some());

    // The rebuilt cache serves the read path.
    let page = h
        .catalog
        .list_products(&ProductFilter::default(), Pagination::default())
        .await
        .expect("list");
    assert_eq!(page.total_items, 2);
}

#[tokio::test]
async fn warm_cache_is_trusted_as_is() {
    let h = harness();
    let product = seed_product(&h.store, "preexisting entry", 5, 20, true).await;
    h.cache.set(&product).await.expect("warm the cache");

    // Seed a second product only in the primary store: a warm reconcile
    // must NOT pick it up, because no diffing happens at startup.
    let straggler = seed_product(&h.store, "straggler product", 1, 10, true).await;

    h.health.set_healthy(false);
    let writes_before = h.cache.write_count();
    sync::reconcile(h.store.as_ref(), h.cache.as_ref(), &h.health).await;

    assert_eq!(h.cache.write_count(), writes_before, "no writes when warm");
    assert!(!h.health.is_healthy(), "health is left untouched");
    assert!(h.cache.get(straggler.product_id).await.expect("get").is_none());
}

#[tokio::test]
async fn reconcile_is_idempotent() {
    let h = harness();
    seed_product(&h.store, "idempotent item", 5, 20, true).await;

    sync::reconcile(h.store.as_ref(), h.cache.as_ref(), &h.health).await;
    let writes_after_first = h.cache.write_count();

    sync::reconcile(h.store.as_ref(), h.cache.as_ref(), &h.health).await;
    assert_eq!(h.cache.write_count(), writes_after_first);
    assert!(h.health.is_healthy());
}

#[tokio::test]
async fn reconcile_failure_is_absorbed() {
    let h = harness();
    seed_product(&h.store, "unreachable cache item", 5, 20, true).await;
    h.cache.set_failing(true);

    // Must not panic or propagate; the process keeps serving
    // primary-store-backed reads.
    sync::reconcile(h.store.as_ref(), h.cache.as_ref(), &h.health).await;
    assert!(!h.health.is_healthy());

    let page = h
        .catalog
        .list_products(&ProductFilter::default(), Pagination::default())
        .await
        .expect("primary reads still work");
    assert_eq!(page.total_items, 1);
}
