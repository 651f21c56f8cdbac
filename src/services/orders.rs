use bigdecimal::BigDecimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::{Order, OrderItem, OrderStatus};
use crate::db::queries;
use crate::error::AppError;
use crate::services::stock::StockLedger;

#[derive(Debug, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Creates immutable orders out of mutable carts and answers order reads.
#[derive(Clone)]
pub struct OrderService {
    pool: PgPool,
}

impl OrderService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The checkout transaction. Snapshots prices, materializes order items,
    /// reserves stock and clears the cart as one atomic unit; any failure
    /// rolls back every step and leaves no visible order.
    pub async fn create_from_cart(
        &self,
        user_id: Uuid,
        shipping_address: String,
        billing_address: String,
    ) -> Result<OrderWithItems, AppError> {
        queries::get_user(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("user", user_id))?;
        let cart = queries::get_or_create_cart(&self.pool, user_id).await?;

        let mut tx = self.pool.begin().await?;

        // Single price read; both the total and the frozen item prices come
        // from it.
        let lines = queries::cart_lines_for_checkout(&mut tx, cart.id).await?;
        if lines.is_empty() {
            return Err(AppError::EmptyCart);
        }

        let total_amount = lines.iter().fold(BigDecimal::from(0), |acc, line| {
            acc + &line.price * BigDecimal::from(line.quantity)
        });

        let order = queries::insert_order(
            &mut tx,
            &Order::new(user_id, total_amount, shipping_address, billing_address),
        )
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            if !StockLedger::check_available(&mut tx, line.product_id, line.quantity).await? {
                return Err(AppError::ProductUnavailable {
                    product_id: line.product_id,
                });
            }
            let item = OrderItem {
                id: Uuid::new_v4(),
                order_id: order.id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.price.clone(),
            };
            items.push(queries::insert_order_item(&mut tx, &item).await?);
        }

        for line in &lines {
            StockLedger::reserve(&mut tx, line.product_id, line.quantity).await?;
        }

        queries::clear_cart_items(&mut *tx, cart.id).await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            %user_id,
            total = %order.total_amount,
            items = items.len(),
            "order created from cart"
        );

        Ok(OrderWithItems { order, items })
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderWithItems, AppError> {
        let order = queries::get_order(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::not_found("order", order_id))?;
        let items = queries::order_items(&self.pool, order_id).await?;
        Ok(OrderWithItems { order, items })
    }

    /// A user's orders, newest first.
    pub async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, AppError> {
        queries::get_user(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("user", user_id))?;
        Ok(queries::orders_for_user(&self.pool, user_id).await?)
    }

    pub async fn update_status(
        &self,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<Order, AppError> {
        let order = queries::update_order_status(&self.pool, order_id, status)
            .await?
            .ok_or_else(|| AppError::not_found("order", order_id))?;
        tracing::info!(order_id = %order.id, status = ?order.status, "order status updated");
        Ok(order)
    }
}
