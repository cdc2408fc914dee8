//! # PostgreSQL Store
//!
//! Production implementation of [`ProductStore`] and [`OrderStore`] against
//! the `storefront_products` and `storefront_orders` tables.
//!
//! ## Database Schema
//!
//! ```sql
//! CREATE TABLE storefront_products (
//!   product_id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!   name VARCHAR(255) NOT NULL UNIQUE,
//!   quantity BIGINT NOT NULL CHECK (quantity >= 0),
//!   category TEXT,
//!   tags JSONB NOT NULL,
//!   price BIGINT,
//!   is_active BOOLEAN NOT NULL DEFAULT FALSE,
//!   vendor JSONB,
//!   created_at TIMESTAMP NOT NULL DEFAULT NOW(),
//!   updated_at TIMESTAMP NOT NULL DEFAULT NOW()
//! );
//!
//! CREATE TABLE storefront_orders (
//!   order_id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!   date TIMESTAMP NOT NULL DEFAULT NOW(),
//!   status TEXT NOT NULL,
//!   customer UUID NOT NULL,
//!   products JSONB NOT NULL
//! );
//! ```
//!
//! Line items are embedded in the order row as JSONB; tags and vendor are
//! JSONB on the product row. The order transaction decrements stock with
//! `WHERE quantity >= $n` so a concurrent order that drained the stock
//! aborts the whole unit instead of driving quantity negative. A request
//! canceled mid-flight drops the transaction, which rolls back every
//! pending write.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::product::ProductDraft;
use crate::models::{
    NewOrder, Order, OrderLineItem, OrderStatus, Page, Pagination, Product, ProductFilter,
    ProductProjection, Vendor,
};
use crate::store::{OrderStore, ProductStore};

const PRODUCT_COLUMNS: &str = "product_id, name, quantity, category, tags, price, is_active, \
                               vendor, created_at, updated_at";
const ORDER_COLUMNS: &str = "order_id, date, status, customer, products";

/// PostgreSQL-backed primary store
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(Debug, FromRow)]
struct ProductRow {
    product_id: Uuid,
    name: String,
    quantity: i64,
    category: Option<String>,
    tags: Json<Vec<String>>,
    price: Option<i64>,
    is_active: bool,
    vendor: Option<Json<Vendor>>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let category = row
            .category
            .map(|raw| raw.parse().map_err(StoreError::Decode))
            .transpose()?;
        Ok(Product {
            product_id: row.product_id,
            name: row.name,
            quantity: row.quantity,
            category,
            tags: row.tags.0,
            price: row.price,
            is_active: row.is_active,
            vendor: row.vendor.map(|json| json.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ProjectionRow {
    product_id: Uuid,
    name: String,
    price: Option<i64>,
    is_active: bool,
    quantity: i64,
}

impl From<ProjectionRow> for ProductProjection {
    fn from(row: ProjectionRow) -> Self {
        ProductProjection {
            product_id: row.product_id,
            name: row.name,
            price: row.price,
            is_active: row.is_active,
            quantity: row.quantity,
        }
    }
}

#[derive(Debug, FromRow)]
struct OrderRow {
    order_id: Uuid,
    date: NaiveDateTime,
    status: String,
    customer: Uuid,
    products: Json<Vec<OrderLineItem>>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row.status.parse().map_err(StoreError::Decode)?;
        Ok(Order {
            order_id: row.order_id,
            date: row.date,
            status,
            customer: row.customer,
            products: row.products.0,
        })
    }
}

/// Append the WHERE clause for a catalog filter. Conditions are conjunctive;
/// an empty filter appends nothing.
fn push_product_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    let mut has_conditions = false;
    let mut separated = |builder: &mut QueryBuilder<'_, Postgres>| {
        if has_conditions {
            builder.push(" AND ");
        } else {
            builder.push(" WHERE ");
            has_conditions = true;
        }
    };

    if let Some(name) = filter.name.as_ref().map(|name| name.trim()).filter(|n| !n.is_empty()) {
        separated(&mut *builder);
        builder.push("name ILIKE ");
        builder.push_bind(format!("%{name}%"));
    }

    if let Some((low, high)) = filter.price {
        separated(&mut *builder);
        builder.push("price BETWEEN ");
        builder.push_bind(low);
        builder.push(" AND ");
        builder.push_bind(high);
    }

    if let Some(categories) = filter.categories.as_ref().filter(|c| !c.is_empty()) {
        let names: Vec<String> = categories.iter().map(|c| c.as_str().to_string()).collect();
        separated(&mut *builder);
        builder.push("category = ANY(");
        builder.push_bind(names);
        builder.push(")");
    }

    if let Some(tags) = filter.tags.as_ref().filter(|t| !t.is_empty()) {
        separated(&mut *builder);
        builder.push("tags ?| ");
        builder.push_bind(tags.clone());
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn insert(&self, draft: ProductDraft) -> Result<Product, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            INSERT INTO storefront_products
                (name, quantity, category, tags, price, is_active, vendor, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&draft.name)
        .bind(draft.quantity)
        .bind(draft.category.map(|c| c.as_str()))
        .bind(Json(&draft.tags))
        .bind(draft.price)
        .bind(draft.is_active)
        .bind(draft.vendor.as_ref().map(Json))
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn update(
        &self,
        product_id: Uuid,
        draft: ProductDraft,
    ) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            UPDATE storefront_products
            SET name = $2, quantity = $3, category = $4, tags = $5, price = $6,
                is_active = $7, vendor = $8, updated_at = NOW()
            WHERE product_id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product_id)
        .bind(&draft.name)
        .bind(draft.quantity)
        .bind(draft.category.map(|c| c.as_str()))
        .bind(Json(&draft.tags))
        .bind(draft.price)
        .bind(draft.is_active)
        .bind(draft.vendor.as_ref().map(Json))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    async fn delete(&self, product_id: Uuid) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "DELETE FROM storefront_products WHERE product_id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    async fn find_by_id(&self, product_id: Uuid) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront_products WHERE product_id = $1"
        ))
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront_products WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    async fn fetch_projection(
        &self,
        product_id: Uuid,
    ) -> Result<Option<ProductProjection>, StoreError> {
        let row = sqlx::query_as::<_, ProjectionRow>(
            "SELECT product_id, name, price, is_active, quantity \
             FROM storefront_products WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ProductProjection::from))
    }

    async fn search(
        &self,
        filter: &ProductFilter,
        pagination: Pagination,
    ) -> Result<Page<Product>, StoreError> {
        let (_, page_size) = pagination.resolve();

        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM storefront_products");
        push_product_filter(&mut count_builder, filter);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront_products"
        ));
        push_product_filter(&mut builder, filter);
        builder.push(" ORDER BY price DESC NULLS LAST, product_id ASC");
        builder.push(" LIMIT ");
        builder.push_bind(i64::from(page_size));
        builder.push(" OFFSET ");
        builder.push_bind(pagination.offset() as i64);

        let rows: Vec<ProductRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        let items = rows
            .into_iter()
            .map(Product::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, total.max(0) as u64, pagination))
    }

    async fn all(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront_products ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn create_with_decrements(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO storefront_orders (date, status, customer, products)
            VALUES (NOW(), $1, $2, $3)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order.status.as_str())
        .bind(order.customer)
        .bind(Json(&order.line_items))
        .fetch_one(&mut *tx)
        .await?;

        for item in &order.line_items {
            let result = sqlx::query(
                "UPDATE storefront_products \
                 SET quantity = quantity - $2, updated_at = NOW() \
                 WHERE product_id = $1 AND quantity >= $2",
            )
            .bind(item.product)
            .bind(item.ordered_quantity)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                // Either the product vanished or a concurrent order drained
                // the stock after our pre-check. Abort the whole unit.
                let available: Option<i64> = sqlx::query_scalar(
                    "SELECT quantity FROM storefront_products WHERE product_id = $1",
                )
                .bind(item.product)
                .fetch_optional(&mut *tx)
                .await?;

                tx.rollback().await?;
                return Err(StoreError::InsufficientStock {
                    product_id: item.product,
                    available: available.unwrap_or(0),
                });
            }
        }

        tx.commit().await?;
        row.try_into()
    }

    async fn find_order(&self, order_id: Uuid) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront_orders WHERE order_id = $1"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    async fn list_orders(&self, pagination: Pagination) -> Result<Page<Order>, StoreError> {
        let (_, page_size) = pagination.resolve();

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM storefront_orders")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront_orders \
             ORDER BY date DESC, order_id ASC LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(page_size))
        .bind(pagination.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(Order::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, total.max(0) as u64, pagination))
    }
}
