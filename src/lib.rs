pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod payments;
pub mod services;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::payments::PaymentProvider;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub payments: Arc<dyn PaymentProvider>,
    pub webhook_secret: String,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/cart/:user_id",
            get(handlers::cart::get_cart).delete(handlers::cart::clear_cart),
        )
        .route("/cart/:user_id/items", post(handlers::cart::add_item))
        .route(
            "/cart/:user_id/items/:product_id",
            put(handlers::cart::update_item).delete(handlers::cart::remove_item),
        )
        .route("/orders", post(handlers::orders::create_order))
        .route("/orders/:order_id", get(handlers::orders::get_order))
        .route(
            "/orders/:order_id/status",
            put(handlers::orders::update_status),
        )
        .route(
            "/users/:user_id/orders",
            get(handlers::orders::orders_for_user),
        )
        .route(
            "/payments/create-intent",
            post(handlers::payments::create_intent),
        )
        .route(
            "/payments/confirm",
            post(handlers::payments::confirm_payment),
        )
        .route(
            "/payments/intent/:intent_id",
            get(handlers::payments::get_intent),
        )
        .route("/payments/webhook", post(handlers::payments::webhook))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
