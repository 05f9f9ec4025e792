//! Pricing rules exercised across the crate boundary.
//!
//! The totals here are authoritative: the API computes them from product
//! rows and ignores anything price-shaped a client sends (the create
//! request type has no price fields at all, which the last test pins
//! down at compile time via deserialization).

use rust_decimal::Decimal;
use std::str::FromStr;

use olive_edge_core::{FLAT_SHIPPING, FREE_SHIPPING_THRESHOLD, OrderTotals};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).expect("valid decimal literal")
}

#[test]
fn test_reference_scenario_below_threshold() {
    // Two units at 500: subtotal 1000, 15% tax, flat shipping.
    let totals = OrderTotals::compute([(dec("500"), 2)]);

    assert_eq!(totals.items_price, dec("1000.00"));
    assert_eq!(totals.shipping_price, dec("100.00"));
    assert_eq!(totals.tax_price, dec("150.00"));
    assert_eq!(totals.total_price, dec("1250.00"));
}

#[test]
fn test_reference_scenario_free_shipping() {
    // Subtotal above 2000 ships free.
    let totals = OrderTotals::compute([(dec("1050"), 2)]);

    assert_eq!(totals.items_price, dec("2100.00"));
    assert_eq!(totals.shipping_price, dec("0.00"));
    assert_eq!(totals.total_price, dec("2100.00") + totals.tax_price);
}

#[test]
fn test_totals_always_reconcile() {
    let cases = [
        vec![(dec("19.99"), 1)],
        vec![(dec("500"), 2), (dec("249.50"), 3)],
        vec![(dec("2000"), 1)],
        vec![(dec("0.01"), 1)],
    ];

    for lines in cases {
        let totals = OrderTotals::compute(lines.clone());
        assert_eq!(
            totals.total_price,
            totals.items_price + totals.tax_price + totals.shipping_price,
            "breakdown does not sum for {lines:?}"
        );
        assert!(totals.shipping_price == FLAT_SHIPPING || totals.shipping_price == Decimal::ZERO);
        assert_eq!(
            totals.shipping_price == Decimal::ZERO,
            totals.items_price > FREE_SHIPPING_THRESHOLD,
        );
    }
}

#[test]
fn test_create_request_carries_no_price_fields() {
    // A checkout request that tries to smuggle totals still deserializes,
    // and the price-shaped fields simply have nowhere to land.
    let body = serde_json::json!({
        "items": [{ "product_id": 3, "qty": 2, "size": "M" }],
        "shipping_address": {
            "full_name": "A. Shopper",
            "line1": "12 Hill Road",
            "city": "Mumbai",
            "postal_code": "400050",
            "country": "IN"
        },
        "payment_method": "razorpay",
        "items_price": "1.00",
        "total_price": "1.00"
    });

    let request: olive_edge_api::routes::orders::CreateOrderRequest =
        serde_json::from_value(body).expect("request deserializes, extra fields ignored");

    assert_eq!(request.items.len(), 1);
    assert_eq!(request.payment_method, "razorpay");
}
