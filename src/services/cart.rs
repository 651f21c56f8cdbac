use bigdecimal::BigDecimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::{Cart, CartLine, Product};
use crate::db::queries;
use crate::error::AppError;

/// A user's cart with live subtotals. Prices come from the product rows at
/// read time; nothing here is snapshotted.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub cart_id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<CartLine>,
    pub total: BigDecimal,
    pub total_items: i32,
}

impl CartView {
    fn assemble(cart: Cart, items: Vec<CartLine>) -> Self {
        let total = items
            .iter()
            .fold(BigDecimal::from(0), |acc, line| acc + &line.subtotal);
        let total_items = items.iter().map(|line| line.quantity).sum();
        CartView {
            cart_id: cart.id,
            user_id: cart.user_id,
            items,
            total,
            total_items,
        }
    }
}

/// Owns the user -> cart -> line-item mapping and enforces the quantity and
/// advisory-stock rules on every mutation. Nothing in here reserves stock.
#[derive(Clone)]
pub struct CartService {
    pool: PgPool,
}

impl CartService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the user's cart, creating an empty one on first use.
    pub async fn get_or_create(&self, user_id: Uuid) -> Result<Cart, AppError> {
        queries::get_user(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("user", user_id))?;
        Ok(queries::get_or_create_cart(&self.pool, user_id).await?)
    }

    pub async fn view(&self, user_id: Uuid) -> Result<CartView, AppError> {
        let cart = self.get_or_create(user_id).await?;
        let items = queries::cart_lines(&self.pool, cart.id).await?;
        Ok(CartView::assemble(cart, items))
    }

    /// Adds `quantity` of a product, summing with any existing line. The
    /// combined quantity is validated against current stock; failure leaves
    /// the existing line untouched.
    pub async fn add_item(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartView, AppError> {
        if quantity <= 0 {
            return Err(AppError::InvalidInput(
                "quantity must be positive".to_string(),
            ));
        }

        let cart = self.get_or_create(user_id).await?;
        let product = self.load_product(product_id).await?;

        let existing = queries::get_cart_item(&self.pool, cart.id, product_id).await?;
        let combined = existing.as_ref().map_or(0, |item| item.quantity) + quantity;

        if product.stock_quantity < combined {
            return Err(AppError::InsufficientStock { product_id });
        }

        queries::upsert_cart_item(&self.pool, cart.id, product_id, combined).await?;
        tracing::debug!(%user_id, %product_id, quantity = combined, "cart line set");

        self.view(user_id).await
    }

    /// Replaces a line's quantity outright. Zero or negative removes the
    /// line; an absent line is left alone.
    pub async fn update_item(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartView, AppError> {
        let cart = self.get_or_create(user_id).await?;
        let product = self.load_product(product_id).await?;

        if quantity <= 0 {
            queries::delete_cart_item(&self.pool, cart.id, product_id).await?;
        } else if queries::get_cart_item(&self.pool, cart.id, product_id)
            .await?
            .is_some()
        {
            if product.stock_quantity < quantity {
                return Err(AppError::InsufficientStock { product_id });
            }
            queries::upsert_cart_item(&self.pool, cart.id, product_id, quantity).await?;
        }

        self.view(user_id).await
    }

    pub async fn remove_item(&self, user_id: Uuid, product_id: Uuid) -> Result<CartView, AppError> {
        let cart = self.get_or_create(user_id).await?;
        self.load_product(product_id).await?;
        queries::delete_cart_item(&self.pool, cart.id, product_id).await?;
        self.view(user_id).await
    }

    /// Deletes every line item. The cart row itself persists.
    pub async fn clear(&self, user_id: Uuid) -> Result<(), AppError> {
        let cart = self.get_or_create(user_id).await?;
        queries::clear_cart_items(&self.pool, cart.id).await?;
        Ok(())
    }

    async fn load_product(&self, product_id: Uuid) -> Result<Product, AppError> {
        queries::get_product(&self.pool, product_id)
            .await?
            .ok_or_else(|| AppError::not_found("product", product_id))
    }
}
