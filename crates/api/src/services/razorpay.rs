//! Razorpay integration via REST API (no SDK dependency).
//!
//! Two responsibilities:
//! - creating a gateway order ("payment intent") for a checkout attempt
//! - verifying the HMAC-SHA256 signature the gateway hands the client
//!   after a completed payment
//!
//! The signature check is the single trust boundary between "the client
//! claims it paid" and "the gateway proved it paid": an order is marked
//! paid only after [`RazorpayClient::verify_signature`] returns `Ok`.

use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use crate::config::RazorpayConfig;

const ORDERS_URL: &str = "https://api.razorpay.com/v1/orders";

type HmacSha256 = Hmac<Sha256>;

/// Errors from the payment gateway adapter.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Transport-level failure talking to the gateway.
    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The gateway answered with an error status.
    #[error("gateway rejected the request: {status}")]
    Rejected {
        /// HTTP status the gateway returned.
        status: u16,
    },

    /// The gateway response could not be interpreted.
    #[error("unexpected gateway response: {0}")]
    Malformed(String),

    /// The amount does not fit in the gateway's integer minor units.
    #[error("amount out of range for gateway")]
    AmountOutOfRange,

    /// The payment signature did not verify.
    #[error("signature verification failed")]
    SignatureInvalid,
}

/// A gateway-side order: the intent to collect a payment.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    /// Gateway order id (`order_...`).
    pub id: String,
    /// Amount in minor currency units.
    pub amount: i64,
    /// ISO currency code.
    pub currency: String,
    /// Receipt we passed in: the local order id.
    pub receipt: Option<String>,
}

/// Razorpay API client.
#[derive(Clone)]
pub struct RazorpayClient {
    http: reqwest::Client,
    key_id: String,
    key_secret: SecretString,
    currency: String,
}

impl RazorpayClient {
    /// Create a client from gateway configuration.
    #[must_use]
    pub fn new(config: &RazorpayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
            currency: config.currency.clone(),
        }
    }

    /// The currency this deployment charges in.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Create a payment intent for `amount` major units, correlated to the
    /// local order via `receipt`.
    ///
    /// The conversion to minor units (x100) happens here and nowhere else.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError` on transport failure, a non-2xx gateway
    /// response, an uninterpretable body, or an amount that does not fit
    /// the gateway's integer representation. Never retried here; the
    /// caller decides whether to resubmit.
    pub async fn create_intent(
        &self,
        amount: Decimal,
        receipt: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        let minor_units = to_minor_units(amount).ok_or(PaymentError::AmountOutOfRange)?;

        let response = self
            .http
            .post(ORDERS_URL)
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .json(&serde_json::json!({
                "amount": minor_units,
                "currency": self.currency,
                "receipt": receipt,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, receipt = receipt, "Gateway rejected intent creation");
            return Err(PaymentError::Rejected {
                status: status.as_u16(),
            });
        }

        let intent: PaymentIntent = response
            .json()
            .await
            .map_err(|e| PaymentError::Malformed(e.to_string()))?;

        tracing::info!(intent_id = %intent.id, receipt = receipt, "Payment intent created");
        Ok(intent)
    }

    /// Verify the signature Razorpay issues after a completed checkout.
    ///
    /// Recomputes HMAC-SHA256 over `"{gateway_order_id}|{payment_id}"`
    /// keyed with the API secret and compares against the supplied hex
    /// signature. The comparison runs through `Mac::verify_slice`, which
    /// is constant-time; malformed hex fails closed.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::SignatureInvalid` on any mismatch.
    pub fn verify_signature(
        &self,
        gateway_order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<(), PaymentError> {
        verify_payment_signature(
            gateway_order_id,
            payment_id,
            signature,
            self.key_secret.expose_secret(),
        )
    }
}

/// Convert a major-unit amount to the gateway's integer minor units.
fn to_minor_units(amount: Decimal) -> Option<i64> {
    (amount * Decimal::ONE_HUNDRED).round_dp(0).to_i64()
}

/// Signature verification, free-standing so it is testable without a
/// client or configuration.
pub fn verify_payment_signature(
    gateway_order_id: &str,
    payment_id: &str,
    signature: &str,
    secret: &str,
) -> Result<(), PaymentError> {
    let payload = format!("{gateway_order_id}|{payment_id}");

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| PaymentError::SignatureInvalid)?;
    mac.update(payload.as_bytes());

    // Decode hex signature and use constant-time comparison via verify_slice
    let sig_bytes = hex::decode(signature).map_err(|_| PaymentError::SignatureInvalid)?;
    mac.verify_slice(&sig_bytes)
        .map_err(|_| PaymentError::SignatureInvalid)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const SECRET: &str = "test_secret_key_for_hmac";

    /// Compute a valid signature the way the gateway does.
    fn sign(order_id: &str, payment_id: &str, secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{order_id}|{payment_id}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_valid_signature_verifies() {
        let sig = sign("order_abc123", "pay_def456", SECRET);
        assert!(verify_payment_signature("order_abc123", "pay_def456", &sig, SECRET).is_ok());
    }

    #[test]
    fn test_every_single_bit_flip_is_rejected() {
        let sig = sign("order_abc123", "pay_def456", SECRET);
        let mut bytes = hex::decode(&sig).unwrap();

        for byte_index in 0..bytes.len() {
            for bit in 0..8 {
                bytes[byte_index] ^= 1 << bit;
                let mutated = hex::encode(&bytes);
                assert!(
                    verify_payment_signature("order_abc123", "pay_def456", &mutated, SECRET)
                        .is_err(),
                    "bit {bit} of byte {byte_index} flipped but signature still verified"
                );
                bytes[byte_index] ^= 1 << bit;
            }
        }
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let sig = sign("order_abc123", "pay_def456", "a_different_secret");
        assert!(verify_payment_signature("order_abc123", "pay_def456", &sig, SECRET).is_err());
    }

    #[test]
    fn test_swapped_ids_rejected() {
        let sig = sign("order_abc123", "pay_def456", SECRET);
        assert!(verify_payment_signature("pay_def456", "order_abc123", &sig, SECRET).is_err());
    }

    #[test]
    fn test_malformed_hex_fails_closed() {
        assert!(
            verify_payment_signature("order_abc123", "pay_def456", "not-hex-at-all", SECRET)
                .is_err()
        );
        assert!(verify_payment_signature("order_abc123", "pay_def456", "", SECRET).is_err());
    }

    #[test]
    fn test_minor_unit_conversion() {
        assert_eq!(to_minor_units(Decimal::from_str("1250.00").unwrap()), Some(125_000));
        assert_eq!(to_minor_units(Decimal::from_str("0.5").unwrap()), Some(50));
        assert_eq!(to_minor_units(Decimal::from_str("99.99").unwrap()), Some(9_999));
    }
}
