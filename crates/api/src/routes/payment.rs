//! Payment gateway handlers.
//!
//! `create_order` opens a gateway intent for an existing local order;
//! `verify` is the trust boundary that turns a client's "I paid" claim
//! into a paid order, and it does so only on a verified signature.

use axum::{Json, extract::State};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use olive_edge_core::OrderId;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Order, PaymentResult};
use crate::services::orders::OrderService;
use crate::state::AppState;

/// Request for creating a gateway payment intent.
#[derive(Debug, Deserialize)]
pub struct CreateIntentRequest {
    /// The local order to pay for; doubles as the gateway receipt.
    pub order_id: OrderId,
    /// Amount in major units; must equal the order's stored total.
    pub amount: Decimal,
}

/// Response carrying the gateway intent the checkout widget needs.
#[derive(Debug, Serialize)]
pub struct CreateIntentResponse {
    /// Gateway order id.
    pub id: String,
    /// Amount in minor currency units.
    pub amount: i64,
    /// ISO currency code.
    pub currency: String,
}

/// Request for verifying a completed payment.
///
/// The three `razorpay_*` fields are exactly what the checkout widget
/// hands back; `order_id` names the local order they settle.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub order_id: OrderId,
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

/// Response for a successful verification.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub verified: bool,
    pub order: Order,
}

/// POST /api/payment/create-order - Create a gateway intent (auth).
///
/// # Errors
///
/// 400 if the amount doesn't match the order total, 403 on ownership
/// mismatch, 502 on gateway failure (surfaced, not retried).
pub async fn create_order(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<CreateIntentRequest>,
) -> Result<Json<CreateIntentResponse>> {
    let order = OrderService::new(state.pool(), state.email())
        .get_authorized(body.order_id, &user)
        .await?;

    // A tampered client must not be able to open an underpriced intent.
    if body.amount != order.total_price {
        return Err(AppError::Validation(format!(
            "amount must equal the order total of {}",
            order.total_price
        )));
    }

    let intent = state
        .razorpay()
        .create_intent(order.total_price, &order.id.to_string())
        .await?;

    Ok(Json(CreateIntentResponse {
        id: intent.id,
        amount: intent.amount,
        currency: intent.currency,
    }))
}

/// POST /api/payment/verify - Verify a payment signature (auth).
///
/// Recomputes the HMAC over the gateway order and payment ids; only a
/// verified signature marks the order paid. Any failure - mismatch,
/// malformed hex, wrong ids - fails closed with 400 and no state change.
///
/// # Errors
///
/// 400 `SignatureInvalid` on any verification failure, 403 on ownership
/// mismatch, 404 if the order doesn't exist.
pub async fn verify(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>> {
    let service = OrderService::new(state.pool(), state.email());

    // Ownership check before touching the signature, so a 403 cannot be
    // used to probe signature validity for someone else's order.
    service.get_authorized(body.order_id, &user).await?;

    state
        .razorpay()
        .verify_signature(
            &body.razorpay_order_id,
            &body.razorpay_payment_id,
            &body.razorpay_signature,
        )
        .map_err(|_| AppError::SignatureInvalid)?;

    let payment = PaymentResult {
        payment_id: body.razorpay_payment_id,
        status: "captured".to_owned(),
        update_time: Some(Utc::now().to_rfc3339()),
        payer_email: Some(user.email.as_str().to_owned()),
    };

    let order = service.mark_paid(body.order_id, &user, payment).await?;
    tracing::info!(order_id = %order.id, "Payment verified and recorded");

    Ok(Json(VerifyResponse {
        verified: true,
        order,
    }))
}
