use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Provider rejected the request ({status}): {message}")]
    Api { status: u16, message: String },
}

/// A payment intent as reported by the provider. Its status lifecycle is the
/// provider's own and independent of the order status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentRef {
    pub id: String,
    pub client_secret: Option<String>,
    pub status: String,
    pub amount: i64,
    pub currency: String,
}

/// Metadata attached to every intent so provider-side records point back at
/// the order.
#[derive(Debug, Clone, Copy)]
pub struct IntentMetadata {
    pub order_id: Uuid,
    pub user_id: Uuid,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_intent(
        &self,
        amount_minor_units: i64,
        currency: &str,
        metadata: IntentMetadata,
    ) -> Result<PaymentIntentRef, ProviderError>;

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntentRef, ProviderError>;

    async fn confirm_intent(&self, intent_id: &str) -> Result<PaymentIntentRef, ProviderError>;
}

/// HTTP client for the Stripe payment-intents API.
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    base_url: String,
    secret_key: String,
}

// Wire shape of Stripe error responses: {"error": {"message": "..."}}
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

impl StripeClient {
    pub fn new(base_url: String, secret_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        StripeClient {
            client,
            base_url,
            secret_key,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn parse_response(
        &self,
        response: reqwest::Response,
    ) -> Result<PaymentIntentRef, ProviderError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json::<PaymentIntentRef>().await?)
        } else {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error.message)
                .unwrap_or_else(|| "unknown provider error".to_string());
            Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_intent(
        &self,
        amount_minor_units: i64,
        currency: &str,
        metadata: IntentMetadata,
    ) -> Result<PaymentIntentRef, ProviderError> {
        let response = self
            .client
            .post(self.url("/v1/payment_intents"))
            .bearer_auth(&self.secret_key)
            .form(&[
                ("amount", amount_minor_units.to_string()),
                ("currency", currency.to_string()),
                ("description", format!("Order #{}", metadata.order_id)),
                ("metadata[order_id]", metadata.order_id.to_string()),
                ("metadata[user_id]", metadata.user_id.to_string()),
                ("automatic_payment_methods[enabled]", "true".to_string()),
            ])
            .send()
            .await?;

        self.parse_response(response).await
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntentRef, ProviderError> {
        let response = self
            .client
            .get(self.url(&format!("/v1/payment_intents/{intent_id}")))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        self.parse_response(response).await
    }

    async fn confirm_intent(&self, intent_id: &str) -> Result<PaymentIntentRef, ProviderError> {
        let response = self
            .client
            .post(self.url(&format!("/v1/payment_intents/{intent_id}/confirm")))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        self.parse_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent_body(id: &str, status: &str) -> String {
        format!(
            r#"{{
                "id": "{id}",
                "client_secret": "{id}_secret_abc",
                "status": "{status}",
                "amount": 2500,
                "currency": "usd"
            }}"#
        )
    }

    #[tokio::test]
    async fn test_create_intent() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/payment_intents")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(intent_body("pi_123", "requires_payment_method"))
            .create_async()
            .await;

        let client = StripeClient::new(server.url(), "sk_test_123".to_string());
        let metadata = IntentMetadata {
            order_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
        };
        let intent = client.create_intent(2500, "usd", metadata).await.unwrap();

        assert_eq!(intent.id, "pi_123");
        assert_eq!(intent.amount, 2500);
        assert_eq!(intent.status, "requires_payment_method");
        assert_eq!(intent.client_secret.as_deref(), Some("pi_123_secret_abc"));
    }

    #[tokio::test]
    async fn test_retrieve_intent() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/payment_intents/pi_123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(intent_body("pi_123", "succeeded"))
            .create_async()
            .await;

        let client = StripeClient::new(server.url(), "sk_test_123".to_string());
        let intent = client.retrieve_intent("pi_123").await.unwrap();
        assert_eq!(intent.status, "succeeded");
    }

    #[tokio::test]
    async fn test_confirm_intent() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/payment_intents/pi_123/confirm")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(intent_body("pi_123", "processing"))
            .create_async()
            .await;

        let client = StripeClient::new(server.url(), "sk_test_123".to_string());
        let intent = client.confirm_intent("pi_123").await.unwrap();
        assert_eq!(intent.status, "processing");
    }

    #[tokio::test]
    async fn test_api_error_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/payment_intents")
            .with_status(402)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": {"message": "Your card was declined."}}"#)
            .create_async()
            .await;

        let client = StripeClient::new(server.url(), "sk_test_123".to_string());
        let metadata = IntentMetadata {
            order_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
        };
        let result = client.create_intent(2500, "usd", metadata).await;

        match result {
            Err(ProviderError::Api { status, message }) => {
                assert_eq!(status, 402);
                assert_eq!(message, "Your card was declined.");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }
}
