#![allow(dead_code)]

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

use commerce_core::payments::{
    IntentMetadata, PaymentIntentRef, PaymentProvider, ProviderError,
};

pub async fn setup_test_db() -> PgPool {
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test DB");
    let migrator = Migrator::new(Path::new("./migrations"))
        .await
        .expect("Failed to load migrations");
    migrator
        .run(&pool)
        .await
        .expect("Failed to run migrations on test DB");
    pool
}

pub async fn seed_user(pool: &PgPool) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, email, full_name) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(format!("{id}@example.com"))
        .bind("Test User")
        .execute(pool)
        .await
        .expect("Failed to seed user");
    id
}

pub async fn seed_product(pool: &PgPool, price: &str, stock: i32) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO products (id, name, price, stock_quantity) VALUES ($1, $2, $3, $4)",
    )
    .bind(id)
    .bind(format!("product-{id}"))
    .bind(BigDecimal::from_str(price).unwrap())
    .bind(stock)
    .execute(pool)
    .await
    .expect("Failed to seed product");
    id
}

pub async fn stock_of(pool: &PgPool, product_id: Uuid) -> i32 {
    let (stock,): (i32,) =
        sqlx::query_as("SELECT stock_quantity FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_one(pool)
            .await
            .expect("Failed to read stock");
    stock
}

pub async fn order_count(pool: &PgPool, user_id: Uuid) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .expect("Failed to count orders");
    count
}

/// Provider double: hands out deterministic intents and counts calls so
/// tests can assert nothing was charged twice.
pub struct MockProvider {
    create_calls: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            create_calls: AtomicUsize::new(0),
        }
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    fn intent(id: String, status: &str, amount: i64) -> PaymentIntentRef {
        PaymentIntentRef {
            client_secret: Some(format!("{id}_secret")),
            id,
            status: status.to_string(),
            amount,
            currency: "usd".to_string(),
        }
    }
}

#[async_trait]
impl PaymentProvider for MockProvider {
    async fn create_intent(
        &self,
        amount_minor_units: i64,
        _currency: &str,
        metadata: IntentMetadata,
    ) -> Result<PaymentIntentRef, ProviderError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::intent(
            format!("pi_{}", metadata.order_id.simple()),
            "requires_payment_method",
            amount_minor_units,
        ))
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntentRef, ProviderError> {
        Ok(Self::intent(intent_id.to_string(), "requires_payment_method", 0))
    }

    async fn confirm_intent(&self, intent_id: &str) -> Result<PaymentIntentRef, ProviderError> {
        Ok(Self::intent(intent_id.to_string(), "processing", 0))
    }
}
