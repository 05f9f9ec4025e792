//! Order status state machine.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown order status.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid order status: {0}")]
pub struct InvalidStatus(pub String);

/// Fulfillment status of an order.
///
/// Forward progression is `Pending -> Processing -> Shipped -> Delivered`;
/// `Cancelled` is a terminal side branch reachable from any state before
/// delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "order_status", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// All statuses an admin may set, in forward order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Position on the forward fulfillment path; `None` for `Cancelled`.
    #[must_use]
    pub const fn progress(self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Processing => Some(1),
            Self::Shipped => Some(2),
            Self::Delivered => Some(3),
            Self::Cancelled => None,
        }
    }

    /// Whether the forward path has reached `at_least` (cancelled never has).
    #[must_use]
    pub fn reached(self, at_least: Self) -> bool {
        match (self.progress(), at_least.progress()) {
            (Some(mine), Some(theirs)) => mine >= theirs,
            _ => false,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(InvalidStatus(other.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_statuses() {
        for status in OrderStatus::ALL {
            let parsed: OrderStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("returned".parse::<OrderStatus>().is_err());
        assert!("Shipped".parse::<OrderStatus>().is_err());
        assert!("".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_forward_progress() {
        assert!(OrderStatus::Delivered.reached(OrderStatus::Processing));
        assert!(OrderStatus::Processing.reached(OrderStatus::Processing));
        assert!(!OrderStatus::Pending.reached(OrderStatus::Shipped));
    }

    #[test]
    fn test_cancelled_is_off_path() {
        assert!(!OrderStatus::Cancelled.reached(OrderStatus::Pending));
        assert!(!OrderStatus::Delivered.reached(OrderStatus::Cancelled));
        assert_eq!(OrderStatus::Cancelled.progress(), None);
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&OrderStatus::Shipped).unwrap();
        assert_eq!(json, "\"shipped\"");
    }
}
