//! Payment endpoints.

use crate::{
    services::payments::{PaymentRequest, VerifyPaymentRequest},
    state::AppState,
    Result,
};
use axum::{extract::State, Json};
use serde_json::{json, Value};
use validator::Validate;

/// Create a payment order. The amount arrives in rupees and is converted to
/// paise by the bridge; the gateway's order id comes back to the caller.
pub async fn create_order(
    State(state): State<AppState>,
    Json(payment): Json<PaymentRequest>,
) -> Result<Json<Value>> {
    payment.validate()?;

    let order = state.payments.create_order(&payment).await?;

    Ok(Json(json!({
        "success": true,
        "order_id": order.get("id"),
        "amount": payment.amount,
        "currency": payment.currency
    })))
}

/// Verify a checkout signature. A mismatch is a 400 with a fixed message.
pub async fn verify_payment(
    State(state): State<AppState>,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Json<Value>> {
    request.validate()?;
    state.payments.verify_signature(&request)?;

    Ok(Json(json!({
        "success": true,
        "message": "Payment verified successfully"
    })))
}
