//! # In-Memory Store
//!
//! An in-process implementation of [`ProductStore`] and [`OrderStore`] with
//! the same observable semantics as the PostgreSQL store. The order unit is
//! made atomic by staging every decrement against a scratch view under one
//! write lock and committing only when all of them fit - a failed decrement
//! leaves nothing applied.
//!
//! Used by the test suites; also a convenient fake for embedding
//! applications.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::product::ProductDraft;
use crate::models::{
    NewOrder, Order, Page, Pagination, Product, ProductFilter, ProductProjection,
};
use crate::store::{OrderStore, ProductStore};

#[derive(Debug, Default)]
struct Inner {
    products: HashMap<Uuid, Product>,
    orders: HashMap<Uuid, Order>,
}

/// In-process primary store
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn duplicate_name_error(name: &str) -> StoreError {
        // Mirrors the unique constraint the real schema enforces.
        StoreError::Database(sqlx::Error::Protocol(format!(
            "duplicate key value violates unique constraint on name: {name}"
        )))
    }

    /// Sort like the primary query path: price descending with missing
    /// prices last, then id for a stable order.
    fn sort_for_listing(products: &mut [Product]) {
        products.sort_by(|a, b| {
            let price_a = a.price.unwrap_or(i64::MIN);
            let price_b = b.price.unwrap_or(i64::MIN);
            price_b
                .cmp(&price_a)
                .then_with(|| a.product_id.cmp(&b.product_id))
        });
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn insert(&self, draft: ProductDraft) -> Result<Product, StoreError> {
        let mut inner = self.inner.write();
        if inner.products.values().any(|p| p.name == draft.name) {
            return Err(Self::duplicate_name_error(&draft.name));
        }

        let now = Utc::now().naive_utc();
        let product = Product {
            product_id: Uuid::new_v4(),
            name: draft.name,
            quantity: draft.quantity,
            category: draft.category,
            tags: draft.tags,
            price: draft.price,
            is_active: draft.is_active,
            vendor: draft.vendor,
            created_at: now,
            updated_at: now,
        };
        inner.products.insert(product.product_id, product.clone());
        Ok(product)
    }

    async fn update(
        &self,
        product_id: Uuid,
        draft: ProductDraft,
    ) -> Result<Option<Product>, StoreError> {
        let mut inner = self.inner.write();
        if inner
            .products
            .values()
            .any(|p| p.product_id != product_id && p.name == draft.name)
        {
            return Err(Self::duplicate_name_error(&draft.name));
        }

        let Some(product) = inner.products.get_mut(&product_id) else {
            return Ok(None);
        };
        product.name = draft.name;
        product.quantity = draft.quantity;
        product.category = draft.category;
        product.tags = draft.tags;
        product.price = draft.price;
        product.is_active = draft.is_active;
        product.vendor = draft.vendor;
        product.updated_at = Utc::now().naive_utc();
        Ok(Some(product.clone()))
    }

    async fn delete(&self, product_id: Uuid) -> Result<Option<Product>, StoreError> {
        Ok(self.inner.write().products.remove(&product_id))
    }

    async fn find_by_id(&self, product_id: Uuid) -> Result<Option<Product>, StoreError> {
        Ok(self.inner.read().products.get(&product_id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Product>, StoreError> {
        Ok(self
            .inner
            .read()
            .products
            .values()
            .find(|p| p.name == name)
            .cloned())
    }

    async fn fetch_projection(
        &self,
        product_id: Uuid,
    ) -> Result<Option<ProductProjection>, StoreError> {
        Ok(self.inner.read().products.get(&product_id).map(|p| {
            ProductProjection {
                product_id: p.product_id,
                name: p.name.clone(),
                price: p.price,
                is_active: p.is_active,
                quantity: p.quantity,
            }
        }))
    }

    async fn search(
        &self,
        filter: &ProductFilter,
        pagination: Pagination,
    ) -> Result<Page<Product>, StoreError> {
        let (_, page_size) = pagination.resolve();
        let mut matching: Vec<Product> = self
            .inner
            .read()
            .products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        Self::sort_for_listing(&mut matching);

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(page_size as usize)
            .collect();
        Ok(Page::new(items, total, pagination))
    }

    async fn all(&self) -> Result<Vec<Product>, StoreError> {
        let mut products: Vec<Product> = self.inner.read().products.values().cloned().collect();
        products.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.product_id.cmp(&b.product_id))
        });
        Ok(products)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_with_decrements(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut inner = self.inner.write();

        // Stage every decrement first; sibling line items for the same
        // product see each other's staged quantity, exactly as sequential
        // conditional updates inside one transaction would.
        let mut staged: HashMap<Uuid, i64> = HashMap::new();
        for item in &order.line_items {
            let available = match staged.get(&item.product) {
                Some(remaining) => *remaining,
                None => match inner.products.get(&item.product) {
                    Some(product) => product.quantity,
                    None => {
                        return Err(StoreError::InsufficientStock {
                            product_id: item.product,
                            available: 0,
                        })
                    }
                },
            };
            if available < item.ordered_quantity {
                return Err(StoreError::InsufficientStock {
                    product_id: item.product,
                    available,
                });
            }
            staged.insert(item.product, available - item.ordered_quantity);
        }

        let now = Utc::now().naive_utc();
        for (product_id, remaining) in staged {
            if let Some(product) = inner.products.get_mut(&product_id) {
                product.quantity = remaining;
                product.updated_at = now;
            }
        }

        let order = Order {
            order_id: Uuid::new_v4(),
            date: now,
            status: order.status,
            customer: order.customer,
            products: order.line_items,
        };
        inner.orders.insert(order.order_id, order.clone());
        Ok(order)
    }

    async fn find_order(&self, order_id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.inner.read().orders.get(&order_id).cloned())
    }

    async fn list_orders(&self, pagination: Pagination) -> Result<Page<Order>, StoreError> {
        let (_, page_size) = pagination.resolve();
        let mut orders: Vec<Order> = self.inner.read().orders.values().cloned().collect();
        orders.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.order_id.cmp(&b.order_id)));

        let total = orders.len() as u64;
        let items = orders
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(page_size as usize)
            .collect();
        Ok(Page::new(items, total, pagination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::product::{Category, ProductDraft};
    use crate::models::{OrderLineItem, OrderStatus};

    fn draft(name: &str, quantity: i64, price: i64) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            quantity,
            category: Some(Category::Tech),
            tags: vec!["gadget".to_string()],
            price: Some(price),
            is_active: true,
            vendor: None,
        }
    }

    fn line_item(product: &Product, quantity: i64) -> OrderLineItem {
        OrderLineItem {
            product: product.product_id,
            captured_name: product.name.clone(),
            captured_price: product.price.unwrap_or(0),
            ordered_quantity: quantity,
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_names() {
        let store = MemoryStore::new();
        store.insert(draft("gaming mouse", 3, 50)).await.unwrap();
        assert!(store.insert(draft("gaming mouse", 1, 60)).await.is_err());
    }

    #[tokio::test]
    async fn failed_decrement_leaves_nothing_applied() {
        let store = MemoryStore::new();
        let a = store.insert(draft("first widget", 5, 20)).await.unwrap();
        let b = store.insert(draft("second widget", 1, 30)).await.unwrap();

        let result = store
            .create_with_decrements(NewOrder {
                customer: Uuid::new_v4(),
                status: OrderStatus::WaitingDelivery,
                line_items: vec![line_item(&a, 3), line_item(&b, 2)],
            })
            .await;

        assert!(matches!(
            result,
            Err(StoreError::InsufficientStock { available: 1, .. })
        ));
        let a_after = store.find_by_id(a.product_id).await.unwrap().unwrap();
        assert_eq!(a_after.quantity, 5);
        assert_eq!(
            store.list_orders(Pagination::default()).await.unwrap().total_items,
            0
        );
    }

    #[tokio::test]
    async fn duplicate_line_items_share_staged_stock() {
        let store = MemoryStore::new();
        let product = store.insert(draft("usb charger", 5, 20)).await.unwrap();

        let result = store
            .create_with_decrements(NewOrder {
                customer: Uuid::new_v4(),
                status: OrderStatus::WaitingDelivery,
                line_items: vec![line_item(&product, 3), line_item(&product, 3)],
            })
            .await;

        // 3 + 3 > 5: the second sibling sees the staged remainder of 2.
        assert!(matches!(
            result,
            Err(StoreError::InsufficientStock { available: 2, .. })
        ));
        let after = store.find_by_id(product.product_id).await.unwrap().unwrap();
        assert_eq!(after.quantity, 5);
    }

    #[tokio::test]
    async fn search_orders_by_price_descending() {
        let store = MemoryStore::new();
        store.insert(draft("cheap cable", 1, 15)).await.unwrap();
        store.insert(draft("pricey cable", 1, 90)).await.unwrap();

        let page = store
            .search(&ProductFilter::default(), Pagination::default())
            .await
            .unwrap();
        assert_eq!(page.total_items, 2);
        assert_eq!(page.items[0].name, "pricey cable");
    }
}
