//! # Read Cache
//!
//! The cache side of the catalog: a fast, disposable, secondary-indexed
//! mirror of product data used only to accelerate reads.
//!
//! ## Failure Model
//!
//! Every [`CacheStore`] method returns a [`CacheError`] instead of raising,
//! and no cache failure may propagate past a call site: callers route
//! failures into [`CacheHealth`] and fall back to the primary store. An
//! order or a product write can never fail because the cache did.
//!
//! ## Modules
//!
//! - [`health`] - the process-wide health flag
//! - [`redis`] - RedisJSON/RediSearch production store
//! - [`memory`] - in-process store with fault injection for tests
//! - [`sync`] - startup reconciliation against the primary store

pub mod health;
pub mod memory;
pub mod redis;
pub mod sync;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Product, ProductFilter};

pub use health::CacheHealth;
pub use memory::MemoryCacheStore;
pub use redis::RedisCacheStore;

/// Failures raised by cache operations. Call sites absorb these into
/// [`CacheHealth`]; they never surface to API callers.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The cache backend rejected or failed the operation
    #[error("cache backend error: {0}")]
    Backend(String),

    /// A cache entry could not be serialized or deserialized
    #[error("cache entry could not be encoded: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A search reply did not have the expected shape
    #[error("cache search reply was malformed: {0}")]
    MalformedReply(String),
}

impl From<::redis::RedisError> for CacheError {
    fn from(err: ::redis::RedisError) -> Self {
        CacheError::Backend(err.to_string())
    }
}

/// One page of an indexed cache search
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSearchResult {
    /// Total matches across all pages
    pub total: u64,
    pub products: Vec<Product>,
}

/// Capability interface over the indexed cache: key-value product entries
/// plus a secondary index for filtered search.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Liveness probe
    async fn ping(&self) -> Result<(), CacheError>;

    async fn get(&self, product_id: Uuid) -> Result<Option<Product>, CacheError>;

    /// Upsert the serialized product snapshot under its id
    async fn set(&self, product: &Product) -> Result<(), CacheError>;

    async fn delete(&self, product_id: Uuid) -> Result<(), CacheError>;

    /// Whether any product entry exists (namespace probe, not a count)
    async fn has_any_entries(&self) -> Result<bool, CacheError>;

    /// Destroy the entire cache namespace, entries and index alike
    async fn flush_all(&self) -> Result<(), CacheError>;

    /// (Re)create the secondary search index over name/price/tags/category
    async fn create_index(&self) -> Result<(), CacheError>;

    /// Indexed search with offset/limit pagination
    async fn search(
        &self,
        filter: &ProductFilter,
        offset: u64,
        limit: u64,
    ) -> Result<CacheSearchResult, CacheError>;
}
