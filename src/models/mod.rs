//! # Domain Models
//!
//! Plain domain types for the catalog and order paths, independent of any
//! storage backend. Row mapping lives with the stores; these types only
//! carry the invariants:
//!
//! - product names are trimmed, lower-cased, 5-255 chars, unique
//! - quantity is never negative; at least one tag is required
//! - price is integer cents, rounded on write, >= 10, required when active
//! - an order holds at least one line item, each with a frozen
//!   name/price snapshot taken at creation time

pub mod order;
pub mod pagination;
pub mod product;

pub use order::{LineItemRequest, NewOrder, Order, OrderLineItem, OrderStatus};
pub use pagination::{Page, Pagination};
pub use product::{
    Category, NewProduct, Product, ProductFilter, ProductProjection, UpdateProduct, Vendor,
};
