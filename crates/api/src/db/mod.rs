//! Database operations for the Olive Edge `PostgreSQL` instance.
//!
//! ## Tables
//!
//! - `users` - Shopper accounts and the admin flag
//! - `tower_sessions.session` - Session storage
//! - `products` / `product_reviews` - Catalog with stock counters
//! - `orders` / `order_items` - Order aggregates and their line-item snapshots
//! - `wishlist_items` - Per-user product wishlists
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p olive-edge-cli -- migrate
//! ```

pub mod orders;
pub mod products;
pub mod users;
pub mod wishlist;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use users::UserRepository;
pub use wishlist::WishlistRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate email or review).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A guarded stock decrement found less stock than requested.
    #[error("insufficient stock for \"{product_name}\"")]
    InsufficientStock {
        /// Name of the product that could not be reserved.
        product_name: String,
    },
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
