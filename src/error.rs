//! # Error Taxonomy
//!
//! Structured error types for the order and catalog paths.
//!
//! Three families of failure exist in this core:
//!
//! - **Validation failures** are caller-correctable and are detected before
//!   any mutation. Order validation aggregates one message per offending
//!   product id instead of stopping at the first problem.
//! - **Infrastructure failures** ([`StoreError`]) abort the in-flight atomic
//!   unit entirely; the caller may retry the whole operation.
//! - **Cache degradation** is deliberately absent here: cache failures live
//!   in [`crate::cache::CacheError`] and are absorbed into the health flag
//!   at every call site, never surfaced to callers.

use std::collections::BTreeMap;

use uuid::Uuid;

/// Failures raised by the primary store.
///
/// `InsufficientStock` is the one domain-shaped member of this family: it is
/// produced by the conditional decrement inside the order transaction when a
/// concurrent order drained the stock between the pre-check and the commit.
/// The order engine translates it back into a per-product validation error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying database failure (connection, constraint, transaction abort)
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Conditional decrement found less stock than requested inside the
    /// atomic unit; the whole transaction has been rolled back
    #[error("insufficient stock for product {product_id}: {available} available")]
    InsufficientStock { product_id: Uuid, available: i64 },

    /// A stored row could not be mapped back into a domain type
    #[error("stored record could not be decoded: {0}")]
    Decode(String),
}

/// Failures raised by product catalog writes and reads.
#[derive(Debug, thiserror::Error)]
pub enum ProductError {
    /// The product id does not resolve to an existing product
    #[error("product not found")]
    NotFound,

    /// Another product already owns this (normalized) name
    #[error("a product named {0:?} already exists")]
    NameTaken(String),

    /// Active products are immutable through the update path
    #[error("product is active and cannot be modified")]
    ActiveImmutable,

    /// Field-level invariant violations, one message per field
    #[error("invalid product: {0:?}")]
    Invalid(BTreeMap<String, String>),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures raised by order creation and lookup.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    /// An order requires at least one line item
    #[error("an order requires at least one line item")]
    NoLineItems,

    /// Per-product validation failures, keyed by the offending product id
    #[error("order validation failed for {} product(s)", .0.len())]
    Validation(BTreeMap<Uuid, String>),

    /// The order id does not resolve to an existing order
    #[error("order not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl OrderError {
    /// Whether this failure is caller-correctable (a 400-class outcome)
    /// rather than a retryable infrastructure fault.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            OrderError::NoLineItems | OrderError::Validation(_) | OrderError::NotFound
        )
    }
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
