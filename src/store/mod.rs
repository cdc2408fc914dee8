//! # Primary Store Seam
//!
//! Capability traits over the durable, authoritative record system plus the
//! two implementations this crate ships:
//!
//! - [`PgStore`] - the production PostgreSQL store. The atomic order unit
//!   is a real database transaction: order insert plus one conditional
//!   stock decrement per line item, committed or rolled back together.
//! - [`MemoryStore`] - an in-process store with the same observable
//!   semantics, used by the test suites and available to embedding
//!   applications as a fake.
//!
//! Services depend on the traits, never on a concrete store, so every
//! business rule in this crate is exercised against both.

pub mod memory;
pub mod pg;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    NewOrder, Order, Page, Pagination, Product, ProductFilter, ProductProjection,
};
use crate::models::product::ProductDraft;

/// Point reads/writes and filtered queries over products.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Persist a validated draft as a new product
    async fn insert(&self, draft: ProductDraft) -> Result<Product, StoreError>;

    /// Replace the mutable fields of an existing product, refreshing
    /// `updated_at`; `None` when the id does not resolve
    async fn update(&self, product_id: Uuid, draft: ProductDraft)
        -> Result<Option<Product>, StoreError>;

    /// Remove a product, returning the deleted record
    async fn delete(&self, product_id: Uuid) -> Result<Option<Product>, StoreError>;

    async fn find_by_id(&self, product_id: Uuid) -> Result<Option<Product>, StoreError>;

    /// Lookup by normalized name; used for the uniqueness pre-check
    async fn find_by_name(&self, name: &str) -> Result<Option<Product>, StoreError>;

    /// Minimal projection used by order validation
    async fn fetch_projection(
        &self,
        product_id: Uuid,
    ) -> Result<Option<ProductProjection>, StoreError>;

    /// Filtered, paginated listing sorted by price descending. This is the
    /// cache-unavailable read path; its filter semantics must match the
    /// cache search exactly.
    async fn search(
        &self,
        filter: &ProductFilter,
        pagination: Pagination,
    ) -> Result<Page<Product>, StoreError>;

    /// Every product, for cache rebuilds
    async fn all(&self) -> Result<Vec<Product>, StoreError>;
}

/// Order persistence, including the multi-record atomic unit.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert the order and decrement stock for every line item in one
    /// atomic unit. Each decrement is conditional on sufficient remaining
    /// stock; any failed decrement aborts the whole unit with
    /// [`StoreError::InsufficientStock`].
    async fn create_with_decrements(&self, order: NewOrder) -> Result<Order, StoreError>;

    async fn find_order(&self, order_id: Uuid) -> Result<Option<Order>, StoreError>;

    async fn list_orders(&self, pagination: Pagination) -> Result<Page<Order>, StoreError>;
}

pub use memory::MemoryStore;
pub use pg::PgStore;
