//! # In-Memory Cache Store
//!
//! An in-process [`CacheStore`] with the same observable behavior as the
//! Redis store: keyed product snapshots, an explicit index flag, and
//! filter semantics shared with the primary read path.
//!
//! Two test affordances are built in: `set_failing` makes every subsequent
//! call fail (simulating an unreachable cache), and `write_count` exposes
//! how many mutations the store has seen (to assert that warm-cache
//! reconciliation performs none).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::cache::{CacheError, CacheSearchResult, CacheStore};
use crate::models::{Product, ProductFilter};

/// In-process cache store with fault injection
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<Uuid, Product>>,
    index_created: AtomicBool,
    failing: AtomicBool,
    writes: AtomicU64,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail, as an unreachable backend would
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }

    /// Number of mutating calls (set/delete/flush) observed
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Acquire)
    }

    /// Whether `create_index` has been called since the last flush
    pub fn index_created(&self) -> bool {
        self.index_created.load(Ordering::Acquire)
    }

    fn check_available(&self) -> Result<(), CacheError> {
        if self.failing.load(Ordering::Acquire) {
            Err(CacheError::Backend("injected cache failure".to_string()))
        } else {
            Ok(())
        }
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::AcqRel);
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn ping(&self) -> Result<(), CacheError> {
        self.check_available()
    }

    async fn get(&self, product_id: Uuid) -> Result<Option<Product>, CacheError> {
        self.check_available()?;
        Ok(self.entries.read().get(&product_id).cloned())
    }

    async fn set(&self, product: &Product) -> Result<(), CacheError> {
        self.check_available()?;
        self.record_write();
        self.entries
            .write()
            .insert(product.product_id, product.clone());
        Ok(())
    }

    async fn delete(&self, product_id: Uuid) -> Result<(), CacheError> {
        self.check_available()?;
        self.record_write();
        self.entries.write().remove(&product_id);
        Ok(())
    }

    async fn has_any_entries(&self) -> Result<bool, CacheError> {
        self.check_available()?;
        Ok(!self.entries.read().is_empty())
    }

    async fn flush_all(&self) -> Result<(), CacheError> {
        self.check_available()?;
        self.record_write();
        self.entries.write().clear();
        self.index_created.store(false, Ordering::Release);
        Ok(())
    }

    async fn create_index(&self) -> Result<(), CacheError> {
        self.check_available()?;
        self.index_created.store(true, Ordering::Release);
        Ok(())
    }

    async fn search(
        &self,
        filter: &ProductFilter,
        offset: u64,
        limit: u64,
    ) -> Result<CacheSearchResult, CacheError> {
        self.check_available()?;

        let mut matching: Vec<Product> = self
            .entries
            .read()
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        // Same listing order as the primary path so the two read paths are
        // indistinguishable to callers.
        matching.sort_by(|a, b| {
            let price_a = a.price.unwrap_or(i64::MIN);
            let price_b = b.price.unwrap_or(i64::MIN);
            price_b
                .cmp(&price_a)
                .then_with(|| a.product_id.cmp(&b.product_id))
        });

        let total = matching.len() as u64;
        let products = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok(CacheSearchResult { total, products })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn product(name: &str, price: i64) -> Product {
        Product {
            product_id: Uuid::new_v4(),
            name: name.to_string(),
            quantity: 1,
            category: Some(Category::Tech),
            tags: vec!["gadget".to_string()],
            price: Some(price),
            is_active: true,
            vendor: None,
            created_at: chrono::Utc::now().naive_utc(),
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }

    #[tokio::test]
    async fn injected_failure_fails_every_call() {
        let store = MemoryCacheStore::new();
        store.set(&product("usb hub", 25)).await.expect("set");

        store.set_failing(true);
        assert!(store.ping().await.is_err());
        assert!(store.search(&ProductFilter::default(), 0, 10).await.is_err());

        store.set_failing(false);
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn search_paginates_after_sorting() {
        let store = MemoryCacheStore::new();
        for (name, price) in [("alpha cable", 10), ("beta cable", 30), ("gamma cable", 20)] {
            store.set(&product(name, price)).await.expect("set");
        }

        let page = store
            .search(&ProductFilter::default(), 1, 1)
            .await
            .expect("search");
        assert_eq!(page.total, 3);
        assert_eq!(page.products.len(), 1);
        assert_eq!(page.products[0].name, "gamma cable");
    }

    #[tokio::test]
    async fn flush_clears_entries_and_index() {
        let store = MemoryCacheStore::new();
        store.set(&product("usb hub", 25)).await.expect("set");
        store.create_index().await.expect("index");
        assert!(store.index_created());

        store.flush_all().await.expect("flush");
        assert!(!store.index_created());
        assert!(!store.has_any_entries().await.expect("probe"));
    }
}
