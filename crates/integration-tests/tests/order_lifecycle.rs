//! Order lifecycle guards and the tracking projection, composed the way
//! the service layer composes them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

use olive_edge_api::models::{Order, OrderItem, OrderStateError, ShippingAddress};
use olive_edge_core::tracking;
use olive_edge_core::{OrderId, OrderStatus, ProductId, UserId};

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).expect("valid timestamp")
}

fn placed_order() -> Order {
    Order {
        id: OrderId::new(501),
        user_id: UserId::new(42),
        items: vec![OrderItem {
            product_id: ProductId::new(3),
            name: "Olive Track Jacket".to_owned(),
            price: Decimal::from_str("2499.00").expect("valid decimal"),
            qty: 1,
            image: "/images/track-jacket.jpg".to_owned(),
            size: Some("L".to_owned()),
        }],
        shipping_address: ShippingAddress {
            full_name: "A. Shopper".to_owned(),
            line1: "12 Hill Road".to_owned(),
            line2: None,
            city: "Mumbai".to_owned(),
            postal_code: "400050".to_owned(),
            country: "IN".to_owned(),
            phone: Some("+91 98200 00000".to_owned()),
        },
        payment_method: "razorpay".to_owned(),
        items_price: Decimal::from_str("2499.00").expect("valid decimal"),
        tax_price: Decimal::from_str("374.85").expect("valid decimal"),
        shipping_price: Decimal::ZERO,
        total_price: Decimal::from_str("2873.85").expect("valid decimal"),
        status: OrderStatus::Pending,
        is_paid: false,
        paid_at: None,
        payment_result: None,
        shipped_at: None,
        is_delivered: false,
        delivered_at: None,
        is_cancelled: false,
        cancelled_at: None,
        is_return_requested: false,
        return_requested_at: None,
        created_at: at(10_000),
        updated_at: at(10_000),
    }
}

#[test]
fn test_cancel_succeeds_exactly_once() {
    let mut order = placed_order();

    assert!(order.ensure_can_cancel().is_ok());

    // Apply the transition the way the repository records it.
    order.is_cancelled = true;
    order.cancelled_at = Some(at(11_000));
    order.status = OrderStatus::Cancelled;

    assert_eq!(
        order.ensure_can_cancel(),
        Err(OrderStateError::AlreadyCancelled)
    );
}

#[test]
fn test_delivered_order_cannot_cancel_but_can_return_once() {
    let mut order = placed_order();
    order.status = OrderStatus::Delivered;
    order.is_delivered = true;
    order.delivered_at = Some(at(12_000));

    assert_eq!(
        order.ensure_can_cancel(),
        Err(OrderStateError::AlreadyDelivered)
    );

    assert!(order.ensure_can_request_return().is_ok());
    order.is_return_requested = true;
    assert_eq!(
        order.ensure_can_request_return(),
        Err(OrderStateError::ReturnAlreadyRequested)
    );
}

#[test]
fn test_return_before_delivery_rejected() {
    let order = placed_order();
    assert_eq!(
        order.ensure_can_request_return(),
        Err(OrderStateError::NotYetDelivered)
    );
}

#[test]
fn test_timeline_follows_fulfillment() {
    let mut order = placed_order();

    let stages = tracking::timeline(&order.timeline_inputs());
    assert_eq!(stages.len(), 4);
    assert!(stages.first().expect("placed stage").completed);
    assert_eq!(stages.iter().filter(|s| s.completed).count(), 1);

    order.status = OrderStatus::Shipped;
    order.shipped_at = Some(at(13_000));
    let stages = tracking::timeline(&order.timeline_inputs());
    assert_eq!(stages.iter().filter(|s| s.completed).count(), 3);
    assert_eq!(stages.get(2).expect("shipped stage").timestamp, Some(at(13_000)));

    order.status = OrderStatus::Delivered;
    order.is_delivered = true;
    order.delivered_at = Some(at(14_000));
    let stages = tracking::timeline(&order.timeline_inputs());
    assert!(stages.iter().all(|s| s.completed));
}

#[test]
fn test_ownership_gates_access() {
    let order = placed_order();

    // Owner and admin can see it; a stranger cannot.
    assert!(order.accessible_by(UserId::new(42), false));
    assert!(order.accessible_by(UserId::new(1), true));
    assert!(!order.accessible_by(UserId::new(1), false));
}
