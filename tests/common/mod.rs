//! Shared builders for the integration suites.

#![allow(dead_code)]

use std::sync::Arc;

use storefront_core::cache::{CacheHealth, MemoryCacheStore};
use storefront_core::catalog::CatalogService;
use storefront_core::models::product::ProductDraft;
use storefront_core::models::{Category, NewProduct, Product, Vendor};
use storefront_core::orders::OrderService;
use storefront_core::store::{MemoryStore, ProductStore};

/// All collaborators wired over in-memory stores, with the cache healthy
/// (as after a successful connect).
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub cache: Arc<MemoryCacheStore>,
    pub health: CacheHealth,
    pub catalog: CatalogService,
    pub orders: OrderService,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let cache = Arc::new(MemoryCacheStore::new());
    let health = CacheHealth::new();
    health.set_healthy(true);

    let catalog = CatalogService::new(store.clone(), cache.clone(), health.clone());
    let orders = OrderService::new(store.clone(), store.clone());

    Harness {
        store,
        cache,
        health,
        catalog,
        orders,
    }
}

pub fn new_product(name: &str, quantity: i64, price: f64, is_active: bool) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        quantity,
        category: Some(Category::Tech),
        tags: vec!["gadget".to_string()],
        price: Some(price),
        is_active,
        vendor: Some(Vendor {
            name: "acme supplies".to_string(),
            bio: None,
        }),
    }
}

/// Insert straight into the store, bypassing the catalog service and its
/// write-through mirror.
pub async fn seed_product(
    store: &MemoryStore,
    name: &str,
    quantity: i64,
    price: i64,
    is_active: bool,
) -> Product {
    store
        .insert(ProductDraft {
            name: name.to_string(),
            quantity,
            category: Some(Category::Kitchen),
            tags: vec!["seeded".to_string()],
            price: Some(price),
            is_active,
            vendor: None,
        })
        .await
        .expect("seed product")
}
