use crate::db::queries;
use crate::error::AppError;
use sqlx::{Postgres, Transaction as SqlxTransaction};
use uuid::Uuid;

/// The only path through which product stock is decremented. Both operations
/// run on the caller's transaction so order creation can fold them into its
/// own atomic unit.
pub struct StockLedger;

impl StockLedger {
    /// Advisory check: current stock covers `quantity`. Says nothing about
    /// what stock will be by the time a reservation is attempted.
    pub async fn check_available(
        tx: &mut SqlxTransaction<'_, Postgres>,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<bool, AppError> {
        let stock = queries::get_stock_quantity(&mut **tx, product_id)
            .await?
            .ok_or_else(|| AppError::not_found("product", product_id))?;
        Ok(stock >= quantity)
    }

    /// Permanently decrements stock. The availability re-check happens inside
    /// the UPDATE itself, so two reservations racing for the last unit can
    /// never both succeed and stock can never go negative.
    pub async fn reserve(
        tx: &mut SqlxTransaction<'_, Postgres>,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), AppError> {
        let updated = queries::decrement_stock(&mut **tx, product_id, quantity).await?;
        if updated == 1 {
            return Ok(());
        }
        match queries::get_stock_quantity(&mut **tx, product_id).await? {
            Some(_) => Err(AppError::InsufficientStock { product_id }),
            None => Err(AppError::not_found("product", product_id)),
        }
    }
}
