mod common;

use bigdecimal::BigDecimal;
use std::str::FromStr;

use commerce_core::db::models::OrderStatus;
use commerce_core::error::AppError;
use commerce_core::services::cart::CartService;
use commerce_core::services::orders::OrderService;

use common::{order_count, seed_product, seed_user, setup_test_db, stock_of};

#[tokio::test]
#[ignore]
async fn test_checkout_of_empty_cart_creates_nothing() {
    let pool = setup_test_db().await;
    let user_id = seed_user(&pool).await;
    let orders = OrderService::new(pool.clone());

    let result = orders
        .create_from_cart(user_id, "123 St".to_string(), "123 St".to_string())
        .await;
    assert!(matches!(result, Err(AppError::EmptyCart)));
    assert_eq!(order_count(&pool, user_id).await, 0);
}

#[tokio::test]
#[ignore]
async fn test_successful_checkout_snapshots_reserves_and_clears() {
    let pool = setup_test_db().await;
    let user_id = seed_user(&pool).await;
    let product_a = seed_product(&pool, "10.00", 5).await;
    let product_b = seed_product(&pool, "5.00", 2).await;
    let cart = CartService::new(pool.clone());
    let orders = OrderService::new(pool.clone());

    cart.add_item(user_id, product_a, 2).await.unwrap();
    cart.add_item(user_id, product_b, 1).await.unwrap();

    let order = orders
        .create_from_cart(user_id, "123 St".to_string(), "123 St".to_string())
        .await
        .unwrap();

    assert_eq!(order.order.status, OrderStatus::Pending);
    assert_eq!(order.items.len(), 2);
    assert_eq!(
        order.order.total_amount,
        BigDecimal::from_str("25.00").unwrap()
    );

    // The total must equal the sum of the frozen line prices.
    let items_total = order.items.iter().fold(BigDecimal::from(0), |acc, item| {
        acc + &item.unit_price * BigDecimal::from(item.quantity)
    });
    assert_eq!(order.order.total_amount, items_total);

    // Stock decreased by exactly the ordered quantities.
    assert_eq!(stock_of(&pool, product_a).await, 3);
    assert_eq!(stock_of(&pool, product_b).await, 1);

    // The cart is empty afterwards.
    let view = cart.view(user_id).await.unwrap();
    assert!(view.items.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_order_total_is_immune_to_later_price_changes() {
    let pool = setup_test_db().await;
    let user_id = seed_user(&pool).await;
    let product_id = seed_product(&pool, "10.00", 5).await;
    let cart = CartService::new(pool.clone());
    let orders = OrderService::new(pool.clone());

    cart.add_item(user_id, product_id, 2).await.unwrap();
    let order = orders
        .create_from_cart(user_id, "123 St".to_string(), "123 St".to_string())
        .await
        .unwrap();

    sqlx::query("UPDATE products SET price = $2 WHERE id = $1")
        .bind(product_id)
        .bind(BigDecimal::from_str("99.99").unwrap())
        .execute(&pool)
        .await
        .unwrap();

    let reread = orders.get_order(order.order.id).await.unwrap();
    assert_eq!(
        reread.order.total_amount,
        BigDecimal::from_str("20.00").unwrap()
    );
    assert_eq!(
        reread.items[0].unit_price,
        BigDecimal::from_str("10.00").unwrap()
    );
}

#[tokio::test]
#[ignore]
async fn test_stock_shortfall_aborts_the_whole_order() {
    let pool = setup_test_db().await;
    let user_id = seed_user(&pool).await;
    let product_a = seed_product(&pool, "10.00", 5).await;
    let product_b = seed_product(&pool, "5.00", 3).await;
    let cart = CartService::new(pool.clone());
    let orders = OrderService::new(pool.clone());

    cart.add_item(user_id, product_a, 2).await.unwrap();
    cart.add_item(user_id, product_b, 3).await.unwrap();

    // Someone else takes product B before checkout commits.
    sqlx::query("UPDATE products SET stock_quantity = 1 WHERE id = $1")
        .bind(product_b)
        .execute(&pool)
        .await
        .unwrap();

    let result = orders
        .create_from_cart(user_id, "123 St".to_string(), "123 St".to_string())
        .await;
    assert!(matches!(
        result,
        Err(AppError::ProductUnavailable { product_id: p }) if p == product_b
    ));

    // No order, no stock mutation, cart intact.
    assert_eq!(order_count(&pool, user_id).await, 0);
    assert_eq!(stock_of(&pool, product_a).await, 5);
    assert_eq!(stock_of(&pool, product_b).await, 1);
    let view = cart.view(user_id).await.unwrap();
    assert_eq!(view.items.len(), 2);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_checkouts_for_last_unit() {
    let pool = setup_test_db().await;
    let user_a = seed_user(&pool).await;
    let user_b = seed_user(&pool).await;
    let product_id = seed_product(&pool, "10.00", 1).await;
    let cart = CartService::new(pool.clone());
    let orders = OrderService::new(pool.clone());

    // Both carts claim the last unit; cart adds are advisory only.
    cart.add_item(user_a, product_id, 1).await.unwrap();
    cart.add_item(user_b, product_id, 1).await.unwrap();

    let (first, second) = tokio::join!(
        orders.create_from_cart(user_a, "123 St".to_string(), "123 St".to_string()),
        orders.create_from_cart(user_b, "456 Ave".to_string(), "456 Ave".to_string()),
    );

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one checkout may win the last unit");

    let loser = if first.is_ok() { second } else { first };
    assert!(matches!(
        loser,
        Err(AppError::InsufficientStock { .. }) | Err(AppError::ProductUnavailable { .. })
    ));

    assert_eq!(stock_of(&pool, product_id).await, 0);
}
