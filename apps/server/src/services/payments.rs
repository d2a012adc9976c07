//! Payment gateway bridge (Razorpay).
//!
//! Two operations: create an order (amounts move in minor currency units,
//! rupees in, paise out) and verify a checkout signature. Signature
//! verification is HMAC-SHA256 over `"{order_id}|{payment_id}"` with the
//! shared key secret; a mismatch is its own error kind and is never
//! silently accepted.

use crate::{config::PaymentConfig, Error, Result};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha256;
use std::sync::Arc;
use validator::Validate;

type HmacSha256 = Hmac<Sha256>;

fn default_currency() -> String {
    "INR".to_string()
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaymentRequest {
    /// Amount in rupees; converted to paise on the wire.
    #[validate(range(min = 1))]
    pub amount: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[validate(length(min = 1))]
    pub receipt: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VerifyPaymentRequest {
    #[validate(length(min = 1))]
    pub razorpay_order_id: String,
    #[validate(length(min = 1))]
    pub razorpay_payment_id: String,
    #[validate(length(min = 1))]
    pub razorpay_signature: String,
}

#[derive(Clone)]
pub struct PaymentClient {
    http: Client,
    config: Arc<PaymentConfig>,
}

impl PaymentClient {
    pub fn new(http: Client, config: Arc<PaymentConfig>) -> Self {
        Self { http, config }
    }

    /// Create an order with immediate capture. Returns the gateway response
    /// body (callers pick out `id`).
    pub async fn create_order(&self, request: &PaymentRequest) -> Result<Value> {
        let body = json!({
            "amount": request.amount * 100,
            "currency": request.currency,
            "receipt": request.receipt,
            "payment_capture": 1
        });

        let response = self
            .http
            .post(format!("{}/v1/orders", self.config.base_url))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Payment(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Payment(format!(
                "order creation failed: {status} {text}"
            )));
        }

        response.json().await.map_err(|e| Error::Payment(e.to_string()))
    }

    /// Check a checkout signature. `Err(Error::PaymentSignature)` on any
    /// mismatch, including signatures that are not valid hex.
    pub fn verify_signature(&self, request: &VerifyPaymentRequest) -> Result<()> {
        verify(
            &self.config.key_secret,
            &request.razorpay_order_id,
            &request.razorpay_payment_id,
            &request.razorpay_signature,
        )
    }
}

fn verify(secret: &str, order_id: &str, payment_id: &str, signature: &str) -> Result<()> {
    let expected = hex::decode(signature).map_err(|_| Error::PaymentSignature)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::Internal(format!("HMAC init: {e}")))?;
    mac.update(format!("{order_id}|{payment_id}").as_bytes());

    // verify_slice is constant-time.
    mac.verify_slice(&expected).map_err(|_| Error::PaymentSignature)
}
