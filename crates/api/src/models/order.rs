//! Order aggregate and its state transition guards.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use olive_edge_core::tracking::TimelineInputs;
use olive_edge_core::{OrderId, OrderStatus, ProductId, UserId};

/// A state transition an order cannot make.
///
/// These are the business rules of the lifecycle, independent of storage:
/// they are checked on an in-memory [`Order`] before any write is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OrderStateError {
    /// Cancel requested after delivery.
    #[error("order has already been delivered and can no longer be cancelled")]
    AlreadyDelivered,

    /// Cancel requested twice.
    #[error("order is already cancelled")]
    AlreadyCancelled,

    /// Return requested before delivery.
    #[error("order has not been delivered yet")]
    NotYetDelivered,

    /// Return requested twice.
    #[error("a return has already been requested for this order")]
    ReturnAlreadyRequested,
}

/// A requested line item, before product snapshots are taken.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub qty: i32,
    #[serde(default)]
    pub size: Option<String>,
}

/// Everything the checkout submits to place an order.
///
/// Note what is absent: prices. Totals are computed server-side from the
/// product rows inside the creation transaction.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub items: Vec<NewOrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub idempotency_key: Option<uuid::Uuid>,
}

/// A line item snapshot inside an order.
///
/// Immutable once placed: name and price record what the shopper saw,
/// regardless of later catalog edits.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub qty: i32,
    pub image: String,
    pub size: Option<String>,
}

/// Shipping address snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// The gateway's record of a completed payment, stored on the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResult {
    /// Gateway payment id.
    pub payment_id: String,
    /// Gateway-reported status (e.g. "captured").
    pub status: String,
    /// Gateway-reported update time, opaque to us.
    #[serde(default)]
    pub update_time: Option<String>,
    /// Payer email as the gateway reported it.
    #[serde(default)]
    pub payer_email: Option<String>,
}

/// An order aggregate: line-item snapshots plus the lifecycle state.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,

    pub items_price: Decimal,
    pub tax_price: Decimal,
    pub shipping_price: Decimal,
    pub total_price: Decimal,

    pub status: OrderStatus,

    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_result: Option<PaymentResult>,

    pub shipped_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,

    pub is_cancelled: bool,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub is_return_requested: bool,
    pub return_requested_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Whether `user` may read or act on this order.
    #[must_use]
    pub fn accessible_by(&self, user_id: UserId, is_admin: bool) -> bool {
        is_admin || self.user_id == user_id
    }

    /// Guard for the cancel transition.
    ///
    /// # Errors
    ///
    /// `AlreadyDelivered` once the order has been delivered,
    /// `AlreadyCancelled` on a repeat cancel.
    pub const fn ensure_can_cancel(&self) -> Result<(), OrderStateError> {
        if self.is_delivered {
            return Err(OrderStateError::AlreadyDelivered);
        }
        if self.is_cancelled {
            return Err(OrderStateError::AlreadyCancelled);
        }
        Ok(())
    }

    /// Guard for the return-request transition.
    ///
    /// # Errors
    ///
    /// `NotYetDelivered` before delivery, `ReturnAlreadyRequested` on a
    /// repeat request.
    pub const fn ensure_can_request_return(&self) -> Result<(), OrderStateError> {
        if !self.is_delivered {
            return Err(OrderStateError::NotYetDelivered);
        }
        if self.is_return_requested {
            return Err(OrderStateError::ReturnAlreadyRequested);
        }
        Ok(())
    }

    /// The slice of state the tracking projection reads.
    #[must_use]
    pub const fn timeline_inputs(&self) -> TimelineInputs {
        TimelineInputs {
            status: self.status,
            created_at: self.created_at,
            shipped_at: self.shipped_at,
            delivered_at: self.delivered_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample_order() -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::new(1),
            user_id: UserId::new(7),
            items: vec![OrderItem {
                product_id: ProductId::new(3),
                name: "Track Jacket".to_owned(),
                price: Decimal::from_str("500").unwrap(),
                qty: 2,
                image: "/images/track-jacket.jpg".to_owned(),
                size: Some("M".to_owned()),
            }],
            shipping_address: ShippingAddress {
                full_name: "A. Shopper".to_owned(),
                line1: "12 Hill Road".to_owned(),
                line2: None,
                city: "Mumbai".to_owned(),
                postal_code: "400050".to_owned(),
                country: "IN".to_owned(),
                phone: None,
            },
            payment_method: "razorpay".to_owned(),
            items_price: Decimal::from_str("1000").unwrap(),
            tax_price: Decimal::from_str("150").unwrap(),
            shipping_price: Decimal::from_str("100").unwrap(),
            total_price: Decimal::from_str("1250").unwrap(),
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
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_cancel_allowed_before_delivery() {
        let order = sample_order();
        assert!(order.ensure_can_cancel().is_ok());
    }

    #[test]
    fn test_cancel_rejected_after_delivery() {
        let mut order = sample_order();
        order.is_delivered = true;
        assert_eq!(
            order.ensure_can_cancel(),
            Err(OrderStateError::AlreadyDelivered)
        );
    }

    #[test]
    fn test_cancel_rejected_twice() {
        let mut order = sample_order();
        order.is_cancelled = true;
        assert_eq!(
            order.ensure_can_cancel(),
            Err(OrderStateError::AlreadyCancelled)
        );
    }

    #[test]
    fn test_return_requires_delivery() {
        let order = sample_order();
        assert_eq!(
            order.ensure_can_request_return(),
            Err(OrderStateError::NotYetDelivered)
        );
    }

    #[test]
    fn test_return_allowed_once_after_delivery() {
        let mut order = sample_order();
        order.is_delivered = true;
        assert!(order.ensure_can_request_return().is_ok());

        order.is_return_requested = true;
        assert_eq!(
            order.ensure_can_request_return(),
            Err(OrderStateError::ReturnAlreadyRequested)
        );
    }

    #[test]
    fn test_access_owner_and_admin_only() {
        let order = sample_order();
        assert!(order.accessible_by(UserId::new(7), false));
        assert!(order.accessible_by(UserId::new(99), true));
        assert!(!order.accessible_by(UserId::new(99), false));
    }
}
