//! Signature verification against gateway-style signatures.
//!
//! These tests play the gateway: they sign the exact payload Razorpay
//! signs (`"{order_id}|{payment_id}"` under the shared secret) and check
//! that the adapter accepts only that signature.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use olive_edge_api::services::razorpay::verify_payment_signature;

const SECRET: &str = "rzp_integration_secret_9f2c";

/// Sign the payload the way the gateway does.
fn gateway_sign(order_id: &str, payment_id: &str, secret: &str) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[test]
fn test_gateway_signature_round_trip() {
    let sig = gateway_sign("order_Nxq7e2", "pay_Kd81mA", SECRET);
    assert!(verify_payment_signature("order_Nxq7e2", "pay_Kd81mA", &sig, SECRET).is_ok());
}

#[test]
fn test_signature_bound_to_both_ids() {
    let sig = gateway_sign("order_Nxq7e2", "pay_Kd81mA", SECRET);

    // Same signature presented for any other order/payment pair fails.
    assert!(verify_payment_signature("order_OTHER", "pay_Kd81mA", &sig, SECRET).is_err());
    assert!(verify_payment_signature("order_Nxq7e2", "pay_OTHER", &sig, SECRET).is_err());
}

#[test]
fn test_signature_bound_to_secret() {
    let sig = gateway_sign("order_Nxq7e2", "pay_Kd81mA", "some_other_secret");
    assert!(verify_payment_signature("order_Nxq7e2", "pay_Kd81mA", &sig, SECRET).is_err());
}

#[test]
fn test_truncated_signature_rejected() {
    let sig = gateway_sign("order_Nxq7e2", "pay_Kd81mA", SECRET);
    let truncated = &sig[..sig.len() - 2];
    assert!(verify_payment_signature("order_Nxq7e2", "pay_Kd81mA", truncated, SECRET).is_err());
}

#[test]
fn test_garbage_signatures_fail_closed() {
    for garbage in ["", "zz", "deadbeef", "not hex at all", "|"] {
        assert!(
            verify_payment_signature("order_Nxq7e2", "pay_Kd81mA", garbage, SECRET).is_err(),
            "garbage signature {garbage:?} verified"
        );
    }
}
