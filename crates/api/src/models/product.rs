//! Product and review domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use olive_edge_core::{ProductId, ReviewId, UserId};

/// A catalog product.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub brand: String,
    pub category: String,
    pub image: String,
    /// Unit price in major currency units.
    pub price: Decimal,
    /// Units available for reservation. Never negative.
    pub count_in_stock: i32,
    pub sizes: Vec<String>,
    /// Average of review ratings, zero while unreviewed.
    pub rating: Decimal,
    pub num_reviews: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether a requested quantity could currently be reserved.
    ///
    /// Advisory only: the authoritative check is the guarded decrement at
    /// write time.
    #[must_use]
    pub const fn has_stock(&self, qty: i32) -> bool {
        self.count_in_stock >= qty
    }
}

/// Fields accepted when creating or replacing a catalog product.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: String,
    pub price: Decimal,
    #[serde(default)]
    pub count_in_stock: i32,
    #[serde(default)]
    pub sizes: Vec<String>,
}

/// A shopper's review of a product.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    /// Reviewer display name, snapshotted at review time.
    pub user_name: String,
    /// Star rating, 1 to 5.
    pub rating: i32,
    pub comment: String,
    pub helpful_votes: i32,
    pub created_at: DateTime<Utc>,
}
