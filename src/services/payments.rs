use bigdecimal::{BigDecimal, ToPrimitive};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::models::OrderStatus;
use crate::db::queries;
use crate::error::AppError;
use crate::payments::{EventKind, IntentMetadata, PaymentIntentRef, PaymentProvider, ProviderEvent};

const CURRENCY: &str = "usd";

/// Maps provider payment-intent lifecycles onto order state. Synchronous
/// calls (initiate, confirm, retrieve) never change order status; only
/// `apply_provider_event` does.
#[derive(Clone)]
pub struct PaymentReconciler {
    pool: PgPool,
    provider: Arc<dyn PaymentProvider>,
}

impl PaymentReconciler {
    pub fn new(pool: PgPool, provider: Arc<dyn PaymentProvider>) -> Self {
        Self { pool, provider }
    }

    /// Creates a provider intent sized to the order total and records the
    /// intent reference on the order. The order stays `pending`.
    pub async fn initiate_payment(&self, order_id: Uuid) -> Result<PaymentIntentRef, AppError> {
        let order = queries::get_order(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::not_found("order", order_id))?;

        let amount = to_minor_units(&order.total_amount)?;
        let intent = self
            .provider
            .create_intent(
                amount,
                CURRENCY,
                IntentMetadata {
                    order_id: order.id,
                    user_id: order.user_id,
                },
            )
            .await
            .map_err(|e| AppError::Provider(e.to_string()))?;

        queries::set_order_payment_intent(&self.pool, order.id, &intent.id, "created")
            .await?
            .ok_or_else(|| AppError::not_found("order", order_id))?;

        tracing::info!(%order_id, intent_id = %intent.id, amount, "payment intent created");
        Ok(intent)
    }

    /// Client-driven confirmation. Delegates to the provider and reports its
    /// answer; the status change, if any, arrives later through the event
    /// path so both paths agree on who mutates orders.
    pub async fn confirm(&self, intent_id: &str) -> Result<PaymentIntentRef, AppError> {
        self.provider
            .confirm_intent(intent_id)
            .await
            .map_err(|e| AppError::Provider(e.to_string()))
    }

    pub async fn retrieve(&self, intent_id: &str) -> Result<PaymentIntentRef, AppError> {
        self.provider
            .retrieve_intent(intent_id)
            .await
            .map_err(|e| AppError::Provider(e.to_string()))
    }

    /// The one place order status changes. Idempotent under provider
    /// redelivery: terminal orders are never touched again, and events for
    /// unknown intents are swallowed.
    pub async fn apply_provider_event(&self, event: &ProviderEvent) -> Result<(), AppError> {
        let (payment_status, target) = match &event.kind {
            EventKind::Succeeded => ("succeeded", OrderStatus::Confirmed),
            EventKind::Failed => ("failed", OrderStatus::Cancelled),
            EventKind::Other(event_type) => {
                tracing::info!(%event_type, "ignoring unhandled provider event type");
                return Ok(());
            }
        };

        let mut tx = self.pool.begin().await?;

        let Some(order) = queries::get_order_by_intent_for_update(&mut tx, &event.intent_id).await?
        else {
            tracing::info!(intent_id = %event.intent_id, "event for unknown payment intent, ignoring");
            return Ok(());
        };

        if order.status.is_terminal() {
            if order.status != target {
                tracing::warn!(
                    order_id = %order.id,
                    current = ?order.status,
                    requested = ?target,
                    "conflicting event for settled order, ignoring"
                );
            }
            return Ok(());
        }

        queries::apply_payment_outcome(&mut tx, order.id, payment_status, target).await?;
        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            intent_id = %event.intent_id,
            status = ?target,
            payment_status,
            "order reconciled with provider event"
        );
        Ok(())
    }
}

/// Converts a decimal major-unit amount into the provider's integer
/// minor-unit representation. Rejects amounts that do not land exactly on a
/// minor unit.
fn to_minor_units(amount: &BigDecimal) -> Result<i64, AppError> {
    let minor = amount * BigDecimal::from(100);
    if !minor.is_integer() {
        return Err(AppError::AmountConversion);
    }
    minor.to_i64().ok_or(AppError::AmountConversion)
}
