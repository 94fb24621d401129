//! Payment gateway client
//!
//! `GET {base_url}/transaction/verify/{reference}` with the secret key as a
//! bearer token. The gateway wraps the transaction in an envelope:
//!
//! ```json
//! { "status": true, "message": "Verification successful",
//!   "data": { "reference": "R-1", "status": "success", "amount": 10000 } }
//! ```
//!
//! `amount` is in minor units, like [`Money`](shared::money::Money).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use shared::order::GatewayTransaction;
use std::time::Duration;
use thiserror::Error;

use crate::core::config::PaymentGatewayConfig;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Payment gateway is not configured")]
    NotConfigured,

    #[error("Gateway request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Gateway returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Gateway rejected verification: {0}")]
    Rejected(String),
}

/// Source of truth for a transaction's state
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn verify(&self, reference: &str) -> Result<GatewayTransaction, GatewayError>;
}

#[derive(Debug, Deserialize)]
struct VerifyEnvelope {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<GatewayTransaction>,
}

/// reqwest-backed gateway client
pub struct HttpPaymentGateway {
    client: Client,
    base_url: String,
    secret_key: String,
}

impl HttpPaymentGateway {
    pub fn new(
        base_url: impl Into<String>,
        secret_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        })
    }

    pub fn from_config(config: &PaymentGatewayConfig) -> Result<Self, GatewayError> {
        match (&config.base_url, &config.secret_key) {
            (Some(url), Some(key)) => {
                Self::new(url.clone(), key.clone(), Duration::from_millis(config.timeout_ms))
            }
            _ => Err(GatewayError::NotConfigured),
        }
    }

    fn verify_url(&self, reference: &str) -> String {
        format!("{}/transaction/verify/{}", self.base_url, reference)
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn verify(&self, reference: &str) -> Result<GatewayTransaction, GatewayError> {
        let response = self
            .client
            .get(self.verify_url(reference))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status { status, body });
        }

        let envelope: VerifyEnvelope = response.json().await?;
        match (envelope.status, envelope.data) {
            (true, Some(data)) => Ok(data),
            (_, _) => Err(GatewayError::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| "no transaction data".to_string()),
            )),
        }
    }
}
