//! Seed the catalog with demo products.
//!
//! # Usage
//!
//! ```bash
//! olive-cli seed
//! ```
//!
//! Idempotent: products are matched by name and skipped when present, so
//! re-running the command on a seeded database changes nothing.

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur during seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

struct DemoProduct {
    name: &'static str,
    description: &'static str,
    brand: &'static str,
    category: &'static str,
    image: &'static str,
    price: Decimal,
    count_in_stock: i32,
    sizes: &'static [&'static str],
}

fn demo_products() -> Vec<DemoProduct> {
    vec![
        DemoProduct {
            name: "Olive Track Jacket",
            description: "Water-repellent shell with a relaxed fit.",
            brand: "Olive Edge",
            category: "jackets",
            image: "/images/track-jacket.jpg",
            price: Decimal::new(249_900, 2),
            count_in_stock: 40,
            sizes: &["S", "M", "L", "XL"],
        },
        DemoProduct {
            name: "Edge Runner Sneakers",
            description: "Lightweight knit upper on a recycled sole.",
            brand: "Olive Edge",
            category: "shoes",
            image: "/images/edge-runner.jpg",
            price: Decimal::new(189_900, 2),
            count_in_stock: 25,
            sizes: &["7", "8", "9", "10", "11"],
        },
        DemoProduct {
            name: "Everyday Tee",
            description: "Heavyweight organic cotton, boxy cut.",
            brand: "Olive Edge",
            category: "tees",
            image: "/images/everyday-tee.jpg",
            price: Decimal::new(49_900, 2),
            count_in_stock: 120,
            sizes: &["XS", "S", "M", "L", "XL"],
        },
        DemoProduct {
            name: "Canvas Tote",
            description: "Single-compartment tote with internal pocket.",
            brand: "Olive Edge",
            category: "accessories",
            image: "/images/canvas-tote.jpg",
            price: Decimal::new(79_900, 2),
            count_in_stock: 60,
            sizes: &[],
        },
    ]
}

/// Seed demo products.
///
/// # Errors
///
/// Returns `SeedError` if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let database_url = super::database_url().map_err(SeedError::MissingEnvVar)?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(&database_url).await?;

    let mut inserted = 0_u32;
    for product in demo_products() {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM products WHERE name = $1)")
                .bind(product.name)
                .fetch_one(&pool)
                .await?;

        if exists {
            tracing::debug!(name = product.name, "Product already seeded, skipping");
            continue;
        }

        let sizes: Vec<String> = product.sizes.iter().map(ToString::to_string).collect();
        sqlx::query(
            r"
            INSERT INTO products (name, description, brand, category, image, price, count_in_stock, sizes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(product.name)
        .bind(product.description)
        .bind(product.brand)
        .bind(product.category)
        .bind(product.image)
        .bind(product.price)
        .bind(product.count_in_stock)
        .bind(&sizes)
        .execute(&pool)
        .await?;

        inserted += 1;
    }

    tracing::info!("Seeding complete, {inserted} products inserted");
    Ok(())
}
