use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::error::AppError;
use crate::payments::{PaymentIntentRef, ProviderEvent, signature};
use crate::services::payments::PaymentReconciler;

#[derive(Debug, Deserialize)]
pub struct CreateIntentRequest {
    pub order_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub payment_intent_id: String,
}

/// What clients need to drive the provider's payment UI.
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub payment_intent_id: String,
    pub client_secret: Option<String>,
    pub status: String,
}

impl From<PaymentIntentRef> for PaymentResponse {
    fn from(intent: PaymentIntentRef) -> Self {
        PaymentResponse {
            payment_intent_id: intent.id,
            client_secret: intent.client_secret,
            status: intent.status,
        }
    }
}

fn reconciler(state: AppState) -> PaymentReconciler {
    PaymentReconciler::new(state.db, state.payments)
}

pub async fn create_intent(
    State(state): State<AppState>,
    Json(payload): Json<CreateIntentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let intent = reconciler(state).initiate_payment(payload.order_id).await?;
    Ok(Json(PaymentResponse::from(intent)))
}

pub async fn confirm_payment(
    State(state): State<AppState>,
    Json(payload): Json<ConfirmPaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let intent = reconciler(state)
        .confirm(&payload.payment_intent_id)
        .await?;
    Ok(Json(PaymentResponse::from(intent)))
}

pub async fn get_intent(
    State(state): State<AppState>,
    Path(intent_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let intent = reconciler(state).retrieve(&intent_id).await?;
    Ok(Json(PaymentResponse::from(intent)))
}

/// Provider webhook deliveries. The signature is checked against the raw
/// body before anything is parsed or looked up; unverifiable deliveries are
/// rejected outright.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let header = headers
        .get("Stripe-Signature")
        .and_then(|value| value.to_str().ok())
        .ok_or(AppError::InvalidSignature)?;

    if !signature::verify_signature(&state.webhook_secret, &body, header) {
        return Err(AppError::InvalidSignature);
    }

    let event = ProviderEvent::from_payload(&body)
        .map_err(|e| AppError::InvalidInput(format!("undecodable event payload: {e}")))?;

    reconciler(state).apply_provider_event(&event).await?;
    Ok(StatusCode::OK)
}
