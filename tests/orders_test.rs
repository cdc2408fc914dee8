//! Inventory transaction engine: validation aggregation, snapshots, and
//! the all-or-nothing atomic unit.

mod common;

use common::{harness, seed_product};
use proptest::prelude::*;
use storefront_core::error::OrderError;
use storefront_core::models::{LineItemRequest, OrderStatus, Pagination};
use storefront_core::store::ProductStore;
use uuid::Uuid;

fn item(product_id: Uuid, ordered_quantity: i64) -> LineItemRequest {
    LineItemRequest {
        product_id,
        ordered_quantity,
    }
}

#[tokio::test]
async fn order_within_stock_succeeds_and_decrements() {
    let h = harness();
    let product = seed_product(&h.store, "stove top kettle", 5, 20, true).await;
    let customer = Uuid::new_v4();

    let order = h
        .orders
        .create_order(customer, &[item(product.product_id, 3)])
        .await
        .expect("order");

    assert_eq!(order.customer, customer);
    assert_eq!(order.status, OrderStatus::WaitingDelivery);
    assert_eq!(order.products.len(), 1);
    assert_eq!(order.products[0].captured_name, "stove top kettle");
    assert_eq!(order.products[0].captured_price, 20);
    assert_eq!(order.products[0].ordered_quantity, 3);

    let after = h
        .store
        .find_by_id(product.product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.quantity, 2);
}

#[tokio::test]
async fn order_beyond_stock_fails_without_mutation() {
    let h = harness();
    let product = seed_product(&h.store, "stove top kettle", 5, 20, true).await;

    let err = h
        .orders
        .create_order(Uuid::new_v4(), &[item(product.product_id, 6)])
        .await
        .expect_err("over stock");

    match err {
        OrderError::Validation(errors) => {
            let message = errors.get(&product.product_id).expect("keyed by id");
            assert!(message.contains("doesn't have enough quantity"));
            assert!(message.contains(&product.product_id.to_string()));
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let after = h
        .store
        .find_by_id(product.product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.quantity, 5);
    assert_eq!(
        h.orders.list_orders(Pagination::default()).await.unwrap().total_items,
        0
    );
}

#[tokio::test]
async fn all_failures_are_aggregated_and_nothing_is_mutated() {
    let h = harness();
    let in_stock = seed_product(&h.store, "healthy stock item", 10, 30, true).await;
    let inactive = seed_product(&h.store, "inactive old item", 10, 30, false).await;
    let low_stock = seed_product(&h.store, "nearly sold out item", 1, 30, true).await;
    let missing = Uuid::new_v4();

    let err = h
        .orders
        .create_order(
            Uuid::new_v4(),
            &[
                item(in_stock.product_id, 2),
                item(inactive.product_id, 1),
                item(low_stock.product_id, 3),
                item(missing, 1),
            ],
        )
        .await
        .expect_err("mixed failures");

    match err {
        OrderError::Validation(errors) => {
            assert_eq!(errors.len(), 3);
            assert!(errors[&inactive.product_id].contains("inactive"));
            assert!(errors[&low_stock.product_id].contains("doesn't have enough quantity"));
            assert!(errors[&missing].contains("doesn't exist"));
            assert!(!errors.contains_key(&in_stock.product_id));
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    // Zero orders, zero decrements - including for the valid line item.
    let untouched = h
        .store
        .find_by_id(in_stock.product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched.quantity, 10);
    assert_eq!(
        h.orders.list_orders(Pagination::default()).await.unwrap().total_items,
        0
    );
}

#[tokio::test]
async fn empty_order_is_rejected() {
    let h = harness();
    let err = h
        .orders
        .create_order(Uuid::new_v4(), &[])
        .await
        .expect_err("empty");
    assert!(matches!(err, OrderError::NoLineItems));
}

#[tokio::test]
async fn snapshots_survive_later_product_edits() {
    let h = harness();
    let product = seed_product(&h.store, "limited run poster", 5, 40, true).await;

    let order = h
        .orders
        .create_order(Uuid::new_v4(), &[item(product.product_id, 1)])
        .await
        .expect("order");

    // Repricing and renaming the product afterwards must not leak into the
    // recorded order.
    let draft = storefront_core::models::product::ProductDraft {
        name: "reissued poster".to_string(),
        quantity: 4,
        category: product.category,
        tags: product.tags.clone(),
        price: Some(99),
        is_active: true,
        vendor: None,
    };
    h.store
        .update(product.product_id, draft)
        .await
        .expect("update")
        .expect("exists");

    let reread = h.orders.get_order(order.order_id).await.expect("get");
    assert_eq!(reread.products[0].captured_name, "limited run poster");
    assert_eq!(reread.products[0].captured_price, 40);
}

#[tokio::test]
async fn duplicate_line_items_cannot_oversell() {
    let h = harness();
    let product = seed_product(&h.store, "popular widget set", 5, 20, true).await;

    // Each duplicate validates against live stock, but the atomic unit
    // stages sibling decrements, so 3 + 3 cannot fit in 5.
    let err = h
        .orders
        .create_order(
            Uuid::new_v4(),
            &[item(product.product_id, 3), item(product.product_id, 3)],
        )
        .await
        .expect_err("oversell");
    assert!(matches!(err, OrderError::Validation(_)));

    let after = h
        .store
        .find_by_id(product.product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.quantity, 5);

    // 2 + 3 fits exactly.
    h.orders
        .create_order(
            Uuid::new_v4(),
            &[item(product.product_id, 2), item(product.product_id, 3)],
        )
        .await
        .expect("exact fit");
    let drained = h
        .store
        .find_by_id(product.product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(drained.quantity, 0);
}

#[tokio::test]
async fn concurrent_orders_for_the_same_product_never_oversell() {
    let h = harness();
    let product = seed_product(&h.store, "contended hot item", 5, 20, true).await;

    let first_items = [item(product.product_id, 3)];
    let second_items = [item(product.product_id, 3)];
    let first = h.orders.create_order(Uuid::new_v4(), &first_items);
    let second = h.orders.create_order(Uuid::new_v4(), &second_items);
    let (first, second) = tokio::join!(first, second);

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one of the racing orders must win");

    let loser = if first.is_err() { first } else { second };
    assert!(loser.expect_err("loser").is_validation());

    let after = h
        .store
        .find_by_id(product.product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.quantity, 2);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Conservation: whenever an order commits, the total decrement equals
    /// the total ordered quantity and no stock goes negative; whenever it
    /// fails, nothing changes.
    #[test]
    fn decrements_conserve_stock(
        stock_a in 0i64..20,
        stock_b in 0i64..20,
        order_a in 1i64..10,
        order_b in 1i64..10,
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        rt.block_on(async {
            let h = harness();
            let a = seed_product(&h.store, "property item alpha", stock_a, 15, true).await;
            let b = seed_product(&h.store, "property item beta", stock_b, 25, true).await;

            let result = h
                .orders
                .create_order(
                    Uuid::new_v4(),
                    &[item(a.product_id, order_a), item(b.product_id, order_b)],
                )
                .await;

            let after_a = h.store.find_by_id(a.product_id).await.unwrap().unwrap();
            let after_b = h.store.find_by_id(b.product_id).await.unwrap().unwrap();

            match result {
                Ok(order) => {
                    let ordered: i64 = order.products.iter().map(|li| li.ordered_quantity).sum();
                    let decremented = (stock_a - after_a.quantity) + (stock_b - after_b.quantity);
                    prop_assert_eq!(decremented, ordered);
                    prop_assert!(after_a.quantity >= 0);
                    prop_assert!(after_b.quantity >= 0);
                }
                Err(_) => {
                    prop_assert_eq!(after_a.quantity, stock_a);
                    prop_assert_eq!(after_b.quantity, stock_b);
                }
            }
            Ok(())
        }).unwrap();
    }
}
