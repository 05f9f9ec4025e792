//! Order tracking timeline projection.
//!
//! A pure mapping from an order's status and timestamps to the fixed
//! four-stage timeline the tracking endpoint returns. Kept separate from
//! all mutation logic so it can only ever read state, never change it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::OrderStatus;

/// The four fixed tracking stages, in order.
pub const STAGE_LABELS: [&str; 4] = ["Order Placed", "Processing", "Shipped", "Delivered"];

/// One entry in an order's tracking timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingStage {
    /// Human-readable stage label.
    pub label: String,
    /// Whether the order has reached this stage.
    pub completed: bool,
    /// When the stage was reached, where a timestamp exists.
    pub timestamp: Option<DateTime<Utc>>,
}

/// The inputs the projection reads off an order.
#[derive(Debug, Clone, Copy)]
pub struct TimelineInputs {
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

/// Project an order's state into the four-stage tracking timeline.
///
/// The first stage is always completed (the order exists). Later stages
/// complete as the forward status path reaches them; a cancelled order
/// keeps only the stages it had reached before cancellation, which the
/// surviving timestamps encode.
#[must_use]
pub fn timeline(inputs: &TimelineInputs) -> Vec<TrackingStage> {
    let processing_reached = inputs.status.reached(OrderStatus::Processing);
    let shipped_reached =
        inputs.status.reached(OrderStatus::Shipped) || inputs.shipped_at.is_some();
    let delivered_reached =
        inputs.status.reached(OrderStatus::Delivered) || inputs.delivered_at.is_some();

    vec![
        TrackingStage {
            label: STAGE_LABELS[0].to_owned(),
            completed: true,
            timestamp: Some(inputs.created_at),
        },
        TrackingStage {
            label: STAGE_LABELS[1].to_owned(),
            completed: processing_reached || shipped_reached || delivered_reached,
            timestamp: None,
        },
        TrackingStage {
            label: STAGE_LABELS[2].to_owned(),
            completed: shipped_reached || delivered_reached,
            timestamp: inputs.shipped_at,
        },
        TrackingStage {
            label: STAGE_LABELS[3].to_owned(),
            completed: delivered_reached,
            timestamp: inputs.delivered_at,
        },
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_fresh_order_only_placed() {
        let stages = timeline(&TimelineInputs {
            status: OrderStatus::Pending,
            created_at: at(1_000),
            shipped_at: None,
            delivered_at: None,
        });

        assert_eq!(stages.len(), 4);
        assert!(stages[0].completed);
        assert_eq!(stages[0].timestamp, Some(at(1_000)));
        assert!(stages.iter().skip(1).all(|s| !s.completed));
    }

    #[test]
    fn test_processing_marks_second_stage() {
        let stages = timeline(&TimelineInputs {
            status: OrderStatus::Processing,
            created_at: at(1_000),
            shipped_at: None,
            delivered_at: None,
        });

        assert!(stages[1].completed);
        assert!(!stages[2].completed);
    }

    #[test]
    fn test_delivered_completes_all() {
        let stages = timeline(&TimelineInputs {
            status: OrderStatus::Delivered,
            created_at: at(1_000),
            shipped_at: Some(at(2_000)),
            delivered_at: Some(at(3_000)),
        });

        assert!(stages.iter().all(|s| s.completed));
        assert_eq!(stages[2].timestamp, Some(at(2_000)));
        assert_eq!(stages[3].timestamp, Some(at(3_000)));
    }

    #[test]
    fn test_cancelled_after_shipping_keeps_reached_stages() {
        let stages = timeline(&TimelineInputs {
            status: OrderStatus::Cancelled,
            created_at: at(1_000),
            shipped_at: Some(at(2_000)),
            delivered_at: None,
        });

        assert!(stages[0].completed);
        assert!(stages[1].completed);
        assert!(stages[2].completed);
        assert!(!stages[3].completed);
    }

    #[test]
    fn test_cancelled_before_processing() {
        let stages = timeline(&TimelineInputs {
            status: OrderStatus::Cancelled,
            created_at: at(1_000),
            shipped_at: None,
            delivered_at: None,
        });

        assert!(stages[0].completed);
        assert!(stages.iter().skip(1).all(|s| !s.completed));
    }
}
