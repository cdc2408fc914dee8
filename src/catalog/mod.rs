//! # Catalog Service
//!
//! Product reads and writes over the primary store, with the cache as a
//! best-effort read accelerator.
//!
//! ## Write-Through
//!
//! Every successful product create/update/delete is mirrored into the
//! cache within the same logical operation - but never the same atomic
//! unit. Mirroring runs only while the cache is healthy, and a mirror
//! failure flips the health flag and is swallowed; it can never fail the
//! primary write.
//!
//! ## Read Path
//!
//! `list_products` picks one of two interchangeable [`CatalogReader`]
//! strategies per request: the indexed cache search while healthy, the
//! primary store otherwise. A cache failure mid-request flips health and
//! is served by the primary path within the same call, so callers never
//! observe a cache error.

pub mod read_path;

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::cache::{CacheHealth, CacheStore};
use crate::error::ProductError;
use crate::logging::log_cache_operation;
use crate::models::{NewProduct, Page, Pagination, Product, ProductFilter, UpdateProduct};
use crate::store::ProductStore;

pub use read_path::{CachedCatalogReader, CatalogReader, PrimaryCatalogReader, ReadPathError};

/// Product catalog operations
#[derive(Clone)]
pub struct CatalogService {
    products: Arc<dyn ProductStore>,
    cache: Arc<dyn CacheStore>,
    health: CacheHealth,
}

impl CatalogService {
    pub fn new(
        products: Arc<dyn ProductStore>,
        cache: Arc<dyn CacheStore>,
        health: CacheHealth,
    ) -> Self {
        Self {
            products,
            cache,
            health,
        }
    }

    /// Filtered, paginated product listing.
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        pagination: Pagination,
    ) -> Result<Page<Product>, ProductError> {
        let primary = PrimaryCatalogReader::new(self.products.as_ref());
        let cached = CachedCatalogReader::new(self.cache.as_ref());
        let reader: &dyn CatalogReader = if self.health.is_healthy() {
            &cached
        } else {
            &primary
        };

        match reader.search(filter, pagination).await {
            Ok(page) => Ok(page),
            Err(ReadPathError::Store(err)) => Err(err.into()),
            Err(ReadPathError::Cache(err)) => {
                // Degrade within the same request; the caller never sees
                // the cache failure.
                self.health.set_healthy(false);
                log_cache_operation("search", "degraded", Some(&err.to_string()));
                Ok(primary.query(filter, pagination).await?)
            }
        }
    }

    /// Create a product, enforcing model invariants and name uniqueness.
    pub async fn create_product(&self, payload: NewProduct) -> Result<Product, ProductError> {
        let draft = payload.validate().map_err(ProductError::Invalid)?;

        if self.products.find_by_name(&draft.name).await?.is_some() {
            return Err(ProductError::NameTaken(draft.name));
        }

        let product = self.products.insert(draft).await?;
        info!(name = %product.name, product_id = %product.product_id,
              "product has been saved successfully");

        self.mirror_upsert(&product).await;
        Ok(product)
    }

    /// Query-first update: the product must exist and must not be active;
    /// a changed name is re-checked for uniqueness.
    pub async fn update_product(
        &self,
        product_id: Uuid,
        payload: UpdateProduct,
    ) -> Result<Product, ProductError> {
        let draft = payload.validate().map_err(ProductError::Invalid)?;

        let existing = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or(ProductError::NotFound)?;
        if existing.is_active {
            return Err(ProductError::ActiveImmutable);
        }
        if draft.name != existing.name
            && self.products.find_by_name(&draft.name).await?.is_some()
        {
            return Err(ProductError::NameTaken(draft.name));
        }

        let updated = self
            .products
            .update(product_id, draft)
            .await?
            .ok_or(ProductError::NotFound)?;
        info!(name = %updated.name, product_id = %updated.product_id,
              "product has been saved successfully");

        self.mirror_upsert(&updated).await;
        Ok(updated)
    }

    /// Delete a product, returning the removed record.
    pub async fn delete_product(&self, product_id: Uuid) -> Result<Product, ProductError> {
        let deleted = self
            .products
            .delete(product_id)
            .await?
            .ok_or(ProductError::NotFound)?;

        self.mirror_delete(product_id).await;
        Ok(deleted)
    }

    /// Point read from the primary store.
    pub async fn get_product(&self, product_id: Uuid) -> Result<Product, ProductError> {
        self.products
            .find_by_id(product_id)
            .await?
            .ok_or(ProductError::NotFound)
    }

    async fn mirror_upsert(&self, product: &Product) {
        if !self.health.is_healthy() {
            return;
        }
        if let Err(err) = self.cache.set(product).await {
            self.health.set_healthy(false);
            log_cache_operation("mirror_upsert", "failed", Some(&err.to_string()));
        }
    }

    async fn mirror_delete(&self, product_id: Uuid) {
        if !self.health.is_healthy() {
            return;
        }
        if let Err(err) = self.cache.delete(product_id).await {
            self.health.set_healthy(false);
            log_cache_operation("mirror_delete", "failed", Some(&err.to_string()));
        }
    }
}
