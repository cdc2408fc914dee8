//! # Catalog Read Strategies
//!
//! Two interchangeable implementations of one query interface: a
//! cache-backed indexed search and a direct primary-store query with
//! equivalent filter semantics. The service selects one per request based
//! on cache health; both produce the same [`Page`] shape so callers are
//! oblivious to which path served them.

use async_trait::async_trait;

use crate::cache::{CacheError, CacheStore};
use crate::error::StoreError;
use crate::models::{Page, Pagination, Product, ProductFilter};
use crate::store::ProductStore;

/// Failure of a read strategy, keeping the origin distinguishable so the
/// caller can absorb cache failures into the health flag while letting
/// primary-store failures propagate.
#[derive(Debug, thiserror::Error)]
pub enum ReadPathError {
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One catalog query strategy
#[async_trait]
pub trait CatalogReader: Send + Sync {
    async fn search(
        &self,
        filter: &ProductFilter,
        pagination: Pagination,
    ) -> Result<Page<Product>, ReadPathError>;
}

/// Indexed search against the cache
pub struct CachedCatalogReader<'a> {
    cache: &'a dyn CacheStore,
}

impl<'a> CachedCatalogReader<'a> {
    pub fn new(cache: &'a dyn CacheStore) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl CatalogReader for CachedCatalogReader<'_> {
    async fn search(
        &self,
        filter: &ProductFilter,
        pagination: Pagination,
    ) -> Result<Page<Product>, ReadPathError> {
        let (_, page_size) = pagination.resolve();
        let result = self
            .cache
            .search(filter, pagination.offset(), u64::from(page_size))
            .await?;
        Ok(Page::new(result.products, result.total, pagination))
    }
}

/// Direct query against the primary store
pub struct PrimaryCatalogReader<'a> {
    store: &'a dyn ProductStore,
}

impl<'a> PrimaryCatalogReader<'a> {
    pub fn new(store: &'a dyn ProductStore) -> Self {
        Self { store }
    }

    /// Query the primary store directly. Exposed separately so the service
    /// can fall back here after a cache failure without re-wrapping the
    /// error type.
    pub async fn query(
        &self,
        filter: &ProductFilter,
        pagination: Pagination,
    ) -> Result<Page<Product>, StoreError> {
        self.store.search(filter, pagination).await
    }
}

#[async_trait]
impl CatalogReader for PrimaryCatalogReader<'_> {
    async fn search(
        &self,
        filter: &ProductFilter,
        pagination: Pagination,
    ) -> Result<Page<Product>, ReadPathError> {
        Ok(self.query(filter, pagination).await?)
    }
}
