//! # Inventory Transaction Engine
//!
//! Order creation against live stock, plus order lookup and listing.
//!
//! ## Order Creation
//!
//! `create_order` runs in three phases:
//!
//! 1. **Concurrent reads** - a minimal projection (id, name, price,
//!    active flag, quantity) is fetched for every requested line item at
//!    once; the reads are independent and only their completion matters.
//! 2. **Aggregated validation** - every item is checked against the fetched
//!    projection (exists, active, enough stock, sane quantity) and all
//!    failures are collected into one map keyed by product id. Any failure
//!    aborts before a single mutation.
//! 3. **Atomic write** - the order insert and all stock decrements form one
//!    atomic unit in the store. Decrements are conditional on remaining
//!    stock, so a concurrent order that drained a product between phase 1
//!    and the commit aborts the whole unit instead of over-committing.
//!
//! The captured name/price snapshot is taken from the phase-1 projection;
//! price does not depend on quantity, so capturing before the decrement is
//! purely an atomicity concern.
//!
//! Duplicate product ids within one request are validated independently
//! against the live stock (not adjusted for sibling items); the
//! conditional decrement inside the atomic unit is what prevents oversell.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::try_join_all;
use uuid::Uuid;

use crate::error::{OrderError, StoreError};
use crate::logging::log_order_operation;
use crate::models::{
    LineItemRequest, NewOrder, Order, OrderLineItem, OrderStatus, Page, Pagination,
};
use crate::store::{OrderStore, ProductStore};

/// Order operations
#[derive(Clone)]
pub struct OrderService {
    products: Arc<dyn ProductStore>,
    orders: Arc<dyn OrderStore>,
}

impl OrderService {
    pub fn new(products: Arc<dyn ProductStore>, orders: Arc<dyn OrderStore>) -> Self {
        Self { products, orders }
    }

    /// Create an order for an authenticated customer.
    ///
    /// Validation failures carry one message per offending product id and
    /// are returned before any mutation. Infrastructure failures abort the
    /// atomic unit entirely; the caller may retry the whole operation.
    pub async fn create_order(
        &self,
        customer: Uuid,
        requests: &[LineItemRequest],
    ) -> Result<Order, OrderError> {
        if requests.is_empty() {
            return Err(OrderError::NoLineItems);
        }

        // Phase 1: independent reads, all awaited before anything else.
        let projections = try_join_all(
            requests
                .iter()
                .map(|request| self.products.fetch_projection(request.product_id)),
        )
        .await?;

        // Phase 2: collect every validation failure, keyed by product id.
        let mut errors: BTreeMap<Uuid, String> = BTreeMap::new();
        let mut line_items = Vec::with_capacity(requests.len());
        for (request, projection) in requests.iter().zip(projections.iter()) {
            let id = request.product_id;
            match projection {
                None => {
                    errors.insert(id, format!("product with this id doesn't exist: {id}"));
                }
                Some(product) if !product.is_active => {
                    errors.insert(id, format!("product with this id is inactive: {id}"));
                }
                Some(_) if request.ordered_quantity < 1 => {
                    errors.insert(
                        id,
                        format!("ordered quantity must be at least 1 for product: {id}"),
                    );
                }
                Some(product) if product.quantity - request.ordered_quantity < 0 => {
                    errors.insert(
                        id,
                        format!(
                            "product with this id doesn't have enough quantity: {id}, \
                             current quantity available: {}",
                            product.quantity
                        ),
                    );
                }
                Some(product) => match product.price {
                    Some(price) => line_items.push(OrderLineItem {
                        product: product.product_id,
                        captured_name: product.name.clone(),
                        captured_price: price,
                        ordered_quantity: request.ordered_quantity,
                    }),
                    // An active product always carries a price; a missing one
                    // means the record predates the invariant.
                    None => {
                        errors.insert(id, format!("product with this id has no price set: {id}"));
                    }
                },
            }
        }
        if !errors.is_empty() {
            return Err(OrderError::Validation(errors));
        }

        // Phase 3: one atomic unit - order insert plus all decrements.
        let order = self
            .orders
            .create_with_decrements(NewOrder {
                customer,
                status: OrderStatus::default(),
                line_items,
            })
            .await
            .map_err(|err| match err {
                StoreError::InsufficientStock {
                    product_id,
                    available,
                } => {
                    let mut errors = BTreeMap::new();
                    errors.insert(
                        product_id,
                        format!(
                            "product with this id doesn't have enough quantity: {product_id}, \
                             current quantity available: {available}"
                        ),
                    );
                    OrderError::Validation(errors)
                }
                other => OrderError::Store(other),
            })?;

        log_order_operation(
            "create_order",
            Some(order.order_id),
            Some(customer),
            order.status.as_str(),
            Some(&format!("{} line item(s)", order.products.len())),
        );
        Ok(order)
    }

    /// Paginated order listing, newest first.
    pub async fn list_orders(&self, pagination: Pagination) -> Result<Page<Order>, OrderError> {
        Ok(self.orders.list_orders(pagination).await?)
    }

    /// Point read by order id.
    pub async fn get_order(&self, order_id: Uuid) -> Result<Order, OrderError> {
        self.orders
            .find_order(order_id)
            .await?
            .ok_or(OrderError::NotFound)
    }
}
