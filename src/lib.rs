#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, RediSearch in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Storefront Core
//!
//! The order-fulfillment and catalog-read core of a storefront service.
//!
//! ## Overview
//!
//! This crate owns the two parts of the system with real invariants and
//! failure coupling:
//!
//! - **The inventory transaction engine**: order creation that validates
//!   every requested line item against live stock, snapshots price and name
//!   at the moment of sale, and atomically persists the order together with
//!   all stock decrements - all-or-nothing, never a partial state.
//! - **The cache consistency manager**: a search-indexed Redis mirror of the
//!   product catalog that accelerates reads, tracked by a process-wide
//!   health flag. Cache failures silently degrade reads to the primary
//!   PostgreSQL store and silently skip write mirroring; they can never
//!   fail an order or a product write.
//!
//! HTTP routing, authentication, and input-schema validation live in the
//! embedding application; this crate consumes validated payloads and
//! returns domain results or typed failures.
//!
//! ## Module Organization
//!
//! - [`models`] - domain types and invariant validation
//! - [`store`] - primary-store traits plus PostgreSQL and in-memory stores
//! - [`cache`] - cache capability, health flag, Redis store, reconciliation
//! - [`catalog`] - product service: writes with write-through, strategy-based reads
//! - [`orders`] - the order-creation transaction engine
//! - [`database`] - connection pool management and migrations
//! - [`config`] - typed, layered configuration
//! - [`error`] - structured error taxonomy
//! - [`logging`] - environment-aware structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use storefront_core::cache::{sync, CacheHealth, RedisCacheStore};
//! use storefront_core::catalog::CatalogService;
//! use storefront_core::config::ConfigManager;
//! use storefront_core::database::DatabaseConnection;
//! use storefront_core::orders::OrderService;
//! use storefront_core::store::PgStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let health = CacheHealth::new();
//!
//! let db = DatabaseConnection::connect(&manager.config().database).await?;
//! let store = Arc::new(PgStore::new(db.pool().clone()));
//!
//! let cache = Arc::new(RedisCacheStore::connect(&manager.config().cache).await?);
//! health.set_healthy(true);
//! sync::reconcile(store.as_ref(), cache.as_ref(), &health).await;
//!
//! let catalog = CatalogService::new(store.clone(), cache, health);
//! let orders = OrderService::new(store.clone(), store);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod orders;
pub mod store;

pub use cache::{CacheError, CacheHealth, CacheStore};
pub use catalog::CatalogService;
pub use config::{CacheConfig, ConfigManager, DatabaseConfig, StorefrontConfig};
pub use error::{OrderError, ProductError, StoreError};
pub use models::{
    Category, LineItemRequest, NewProduct, Order, OrderLineItem, OrderStatus, Page, Pagination,
    Product, ProductFilter, UpdateProduct, Vendor,
};
pub use orders::OrderService;
pub use store::{MemoryStore, OrderStore, PgStore, ProductStore};
