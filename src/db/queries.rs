use crate::db::models::{Cart, CartItem, CartLine, Order, OrderItem, OrderStatus, Product, User};
use sqlx::{PgPool, Postgres, Result, Transaction as SqlxTransaction};
use uuid::Uuid;

// --- User Queries ---

pub async fn get_user(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

// --- Product Queries ---

pub async fn get_product(pool: &PgPool, id: Uuid) -> Result<Option<Product>> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_stock_quantity(
    executor: impl sqlx::PgExecutor<'_>,
    product_id: Uuid,
) -> Result<Option<i32>> {
    let row: Option<(i32,)> =
        sqlx::query_as("SELECT stock_quantity FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(executor)
            .await?;
    Ok(row.map(|r| r.0))
}

/// Guarded decrement: touches the row only when enough stock remains, so the
/// check and the write are one atomic statement. Returns the number of rows
/// updated (0 = nothing decremented).
pub async fn decrement_stock(
    executor: impl sqlx::PgExecutor<'_>,
    product_id: Uuid,
    quantity: i32,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock_quantity = stock_quantity - $2, updated_at = NOW()
        WHERE id = $1 AND stock_quantity >= $2
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

// --- Cart Queries ---

pub async fn get_or_create_cart(pool: &PgPool, user_id: Uuid) -> Result<Cart> {
    sqlx::query("INSERT INTO carts (id, user_id) VALUES ($1, $2) ON CONFLICT (user_id) DO NOTHING")
        .bind(Uuid::new_v4())
        .bind(user_id)
        .execute(pool)
        .await?;

    sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

pub async fn get_cart_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Cart>> {
    sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn get_cart_item(
    pool: &PgPool,
    cart_id: Uuid,
    product_id: Uuid,
) -> Result<Option<CartItem>> {
    sqlx::query_as::<_, CartItem>(
        "SELECT * FROM cart_items WHERE cart_id = $1 AND product_id = $2",
    )
    .bind(cart_id)
    .bind(product_id)
    .fetch_optional(pool)
    .await
}

/// Stores an absolute quantity for the line, creating it if absent.
pub async fn upsert_cart_item(
    pool: &PgPool,
    cart_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> Result<CartItem> {
    sqlx::query_as::<_, CartItem>(
        r#"
        INSERT INTO cart_items (id, cart_id, product_id, quantity)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (cart_id, product_id)
        DO UPDATE SET quantity = EXCLUDED.quantity
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(pool)
    .await
}

pub async fn delete_cart_item(pool: &PgPool, cart_id: Uuid, product_id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
        .bind(cart_id)
        .bind(product_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn clear_cart_items(executor: impl sqlx::PgExecutor<'_>, cart_id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(cart_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Cart lines joined against products, subtotals derived from the current
/// price. Read path for the cart view.
pub async fn cart_lines(pool: &PgPool, cart_id: Uuid) -> Result<Vec<CartLine>> {
    sqlx::query_as::<_, CartLine>(
        r#"
        SELECT ci.product_id, p.name AS product_name, ci.quantity,
               p.price AS unit_price, p.price * ci.quantity AS subtotal
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.cart_id = $1
        ORDER BY p.name
        "#,
    )
    .bind(cart_id)
    .fetch_all(pool)
    .await
}

/// One cart line as seen by checkout: quantity plus the current product
/// price. This read is advisory; the decrement in `decrement_stock` is the
/// arbiter when two checkouts race.
#[derive(Debug, sqlx::FromRow)]
pub struct CheckoutLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: bigdecimal::BigDecimal,
}

pub async fn cart_lines_for_checkout(
    executor: &mut SqlxTransaction<'_, Postgres>,
    cart_id: Uuid,
) -> Result<Vec<CheckoutLine>> {
    sqlx::query_as::<_, CheckoutLine>(
        r#"
        SELECT ci.product_id, ci.quantity, p.price
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.cart_id = $1
        ORDER BY ci.product_id
        "#,
    )
    .bind(cart_id)
    .fetch_all(&mut **executor)
    .await
}

// --- Order Queries ---

pub async fn insert_order(
    executor: &mut SqlxTransaction<'_, Postgres>,
    order: &Order,
) -> Result<Order> {
    sqlx::query_as::<_, Order>(
        r#"
        INSERT INTO orders (
            id, user_id, total_amount, shipping_address, billing_address,
            status, payment_intent_id, payment_status, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(order.id)
    .bind(order.user_id)
    .bind(&order.total_amount)
    .bind(&order.shipping_address)
    .bind(&order.billing_address)
    .bind(order.status)
    .bind(&order.payment_intent_id)
    .bind(&order.payment_status)
    .bind(order.created_at)
    .bind(order.updated_at)
    .fetch_one(&mut **executor)
    .await
}

pub async fn insert_order_item(
    executor: &mut SqlxTransaction<'_, Postgres>,
    item: &OrderItem,
) -> Result<OrderItem> {
    sqlx::query_as::<_, OrderItem>(
        r#"
        INSERT INTO order_items (id, order_id, product_id, quantity, unit_price)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(item.id)
    .bind(item.order_id)
    .bind(item.product_id)
    .bind(item.quantity)
    .bind(&item.unit_price)
    .fetch_one(&mut **executor)
    .await
}

pub async fn get_order(pool: &PgPool, id: Uuid) -> Result<Option<Order>> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn order_items(pool: &PgPool, order_id: Uuid) -> Result<Vec<OrderItem>> {
    sqlx::query_as::<_, OrderItem>(
        "SELECT * FROM order_items WHERE order_id = $1 ORDER BY product_id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await
}

pub async fn orders_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Order>> {
    sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn update_order_status(
    pool: &PgPool,
    id: Uuid,
    status: OrderStatus,
) -> Result<Option<Order>> {
    sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status)
    .fetch_optional(pool)
    .await
}

pub async fn set_order_payment_intent(
    pool: &PgPool,
    order_id: Uuid,
    payment_intent_id: &str,
    payment_status: &str,
) -> Result<Option<Order>> {
    sqlx::query_as::<_, Order>(
        r#"
        UPDATE orders
        SET payment_intent_id = $2, payment_status = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(order_id)
    .bind(payment_intent_id)
    .bind(payment_status)
    .fetch_optional(pool)
    .await
}

/// Order lookup by provider intent id, locked so the status transition that
/// follows cannot interleave with a concurrent delivery of the same event.
pub async fn get_order_by_intent_for_update(
    executor: &mut SqlxTransaction<'_, Postgres>,
    payment_intent_id: &str,
) -> Result<Option<Order>> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE payment_intent_id = $1 FOR UPDATE")
        .bind(payment_intent_id)
        .fetch_optional(&mut **executor)
        .await
}

pub async fn apply_payment_outcome(
    executor: &mut SqlxTransaction<'_, Postgres>,
    order_id: Uuid,
    payment_status: &str,
    status: OrderStatus,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE orders
        SET payment_status = $2, status = $3, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(order_id)
    .bind(payment_status)
    .bind(status)
    .execute(&mut **executor)
    .await?;
    Ok(())
}
