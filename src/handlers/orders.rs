use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use crate::db::models::OrderStatus;
use crate::error::AppError;
use crate::services::orders::OrderService;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: Uuid,
    pub shipping_address: String,
    pub billing_address: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.shipping_address.trim().is_empty() || payload.billing_address.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "shipping and billing addresses are required".to_string(),
        ));
    }

    let order = OrderService::new(state.db)
        .create_from_cart(
            payload.user_id,
            payload.shipping_address,
            payload.billing_address,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let order = OrderService::new(state.db).get_order(order_id).await?;
    Ok(Json(order))
}

pub async fn orders_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let orders = OrderService::new(state.db).orders_for_user(user_id).await?;
    Ok(Json(orders))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let order = OrderService::new(state.db)
        .update_status(order_id, payload.status)
        .await?;
    Ok(Json(order))
}
