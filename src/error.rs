use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Insufficient stock for product {product_id}")]
    InsufficientStock { product_id: Uuid },

    #[error("Cannot create order from empty cart")]
    EmptyCart,

    #[error("Product {product_id} is not available in the required quantity")]
    ProductUnavailable { product_id: Uuid },

    #[error("Order total cannot be represented in minor currency units")]
    AmountConversion,

    #[error("Payment provider error: {0}")]
    Provider(String),

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        AppError::NotFound { entity, id }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::InsufficientStock { .. } | AppError::ProductUnavailable { .. } => {
                StatusCode::CONFLICT
            }
            AppError::EmptyCart | AppError::InvalidInput(_) | AppError::InvalidSignature => {
                StatusCode::BAD_REQUEST
            }
            AppError::AmountConversion => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Provider(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, AppError::Database(_)) {
            tracing::error!(error = %self, "request failed");
        }

        let status = self.status_code();
        // Internal details stay out of the response body
        let message = match &self {
            AppError::Database(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
