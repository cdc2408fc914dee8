//! # Order Model
//!
//! The durable order entity and its creation payloads.
//!
//! An order is created once and is append-mostly afterwards; only its status
//! may transition. Each line item carries `captured_name`/`captured_price`,
//! a point-in-time snapshot of the product at order-creation time. Those
//! snapshots are never recomputed from the live product - an order is a
//! record of what was sold, not a join.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order lifecycle states: `waitingDelivery -> {canceled, delivering} -> delivered`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderStatus {
    WaitingDelivery,
    Canceled,
    Delivering,
    Delivered,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::WaitingDelivery => "waitingDelivery",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Delivering => "delivering",
            OrderStatus::Delivered => "delivered",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::WaitingDelivery
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waitingDelivery" => Ok(OrderStatus::WaitingDelivery),
            "canceled" => Ok(OrderStatus::Canceled),
            "delivering" => Ok(OrderStatus::Delivering),
            "delivered" => Ok(OrderStatus::Delivered),
            other => Err(format!("{other} is not a supported order status")),
        }
    }
}

/// One product-and-quantity entry within an order, with its frozen snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineItem {
    /// Reference to the product by id; never populated inline
    pub product: Uuid,
    /// Product name at order-creation time
    pub captured_name: String,
    /// Product price (integer cents) at order-creation time
    pub captured_price: i64,
    pub ordered_quantity: i64,
}

/// A persisted order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: Uuid,
    pub date: NaiveDateTime,
    pub status: OrderStatus,
    pub customer: Uuid,
    pub products: Vec<OrderLineItem>,
}

/// A validated order ready for the atomic insert-and-decrement unit
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer: Uuid,
    pub status: OrderStatus,
    pub line_items: Vec<OrderLineItem>,
}

/// One requested line item, as supplied by the caller
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LineItemRequest {
    pub product_id: Uuid,
    pub ordered_quantity: i64,
}
