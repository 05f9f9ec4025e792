//! Product and review repository.
//!
//! The guarded stock decrement lives here: it is the single statement that
//! makes overselling impossible, because the `count_in_stock >= qty`
//! condition is evaluated by the database at write time.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use olive_edge_core::{ProductId, ReviewId, UserId};

use super::RepositoryError;
use crate::models::{Product, ProductInput, Review};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: String,
    brand: String,
    category: String,
    image: String,
    price: Decimal,
    count_in_stock: i32,
    sizes: Vec<String>,
    rating: Decimal,
    num_reviews: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            brand: row.brand,
            category: row.category,
            image: row.image,
            price: row.price,
            count_in_stock: row.count_in_stock,
            sizes: row.sizes,
            rating: row.rating,
            num_reviews: row.num_reviews,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Internal row type for review queries.
#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i32,
    product_id: i32,
    user_id: i32,
    user_name: String,
    rating: i32,
    comment: String,
    helpful_votes: i32,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: ReviewId::new(row.id),
            product_id: ProductId::new(row.product_id),
            user_id: UserId::new(row.user_id),
            user_name: row.user_name,
            rating: row.rating,
            comment: row.comment,
            helpful_votes: row.helpful_votes,
            created_at: row.created_at,
        }
    }
}

/// The product fields an order snapshots, read inside the order-creation
/// transaction.
#[derive(Debug, sqlx::FromRow)]
pub struct ProductSnapshot {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub count_in_stock: i32,
}

const PRODUCT_COLUMNS: &str = "id, name, description, brand, category, image, price, \
     count_in_stock, sizes, rating, num_reviews, created_at, updated_at";

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List catalog products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Create a catalog product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products (name, description, brand, category, image, price, count_in_stock, sizes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.brand)
        .bind(&input.category)
        .bind(&input.image)
        .bind(input.price)
        .bind(input.count_in_stock)
        .bind(&input.sizes)
        .fetch_one(self.pool)
        .await?;

        Ok(Product::from(row))
    }

    /// Replace a product's catalog fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products
             SET name = $1, description = $2, brand = $3, category = $4, image = $5,
                 price = $6, count_in_stock = $7, sizes = $8, updated_at = now()
             WHERE id = $9
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.brand)
        .bind(&input.category)
        .bind(&input.image)
        .bind(input.price)
        .bind(input.count_in_stock)
        .bind(&input.sizes)
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::from).ok_or(RepositoryError::NotFound)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    /// List a product's reviews, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn reviews(&self, product_id: ProductId) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r"
            SELECT id, product_id, user_id, user_name, rating, comment, helpful_votes, created_at
            FROM product_reviews
            WHERE product_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(product_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    /// Add a review and refresh the product's derived rating fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already reviewed the
    /// product, `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn add_review(
        &self,
        product_id: ProductId,
        user_id: UserId,
        user_name: &str,
        rating: i32,
        comment: &str,
    ) -> Result<Review, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ReviewRow>(
            r"
            INSERT INTO product_reviews (product_id, user_id, user_name, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, product_id, user_id, user_name, rating, comment, helpful_votes, created_at
            ",
        )
        .bind(product_id.as_i32())
        .bind(user_id.as_i32())
        .bind(user_name)
        .bind(rating)
        .bind(comment)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return RepositoryError::Conflict(
                        "product already reviewed by this user".to_owned(),
                    );
                }
                if db_err.is_foreign_key_violation() {
                    return RepositoryError::NotFound;
                }
            }
            RepositoryError::Database(e)
        })?;

        // Refresh the denormalized rating fields from the review table.
        sqlx::query(
            r"
            UPDATE products
            SET rating = sub.avg_rating,
                num_reviews = sub.review_count,
                updated_at = now()
            FROM (
                SELECT COALESCE(AVG(rating), 0) AS avg_rating,
                       COUNT(*)::int AS review_count
                FROM product_reviews
                WHERE product_id = $1
            ) AS sub
            WHERE id = $1
            ",
        )
        .bind(product_id.as_i32())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Review::from(row))
    }

    /// Count a helpful vote on a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist on
    /// that product.
    pub async fn mark_review_helpful(
        &self,
        product_id: ProductId,
        review_id: ReviewId,
    ) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r"
            UPDATE product_reviews
            SET helpful_votes = helpful_votes + 1
            WHERE id = $1 AND product_id = $2
            RETURNING id, product_id, user_id, user_name, rating, comment, helpful_votes, created_at
            ",
        )
        .bind(review_id.as_i32())
        .bind(product_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(Review::from).ok_or(RepositoryError::NotFound)
    }

    // =========================================================================
    // Stock reservation (order-creation transaction)
    // =========================================================================

    /// Read the snapshot fields an order copies, inside the caller's
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the query fails.
    pub async fn snapshot(
        conn: &mut PgConnection,
        id: ProductId,
    ) -> Result<Option<ProductSnapshot>, sqlx::Error> {
        sqlx::query_as::<_, ProductSnapshot>(
            "SELECT id, name, price, image, count_in_stock FROM products WHERE id = $1",
        )
        .bind(id.as_i32())
        .fetch_optional(conn)
        .await
    }

    /// Conditionally decrement stock.
    ///
    /// The guard (`count_in_stock >= qty`) rides in the UPDATE itself, so
    /// two orders racing on the last units cannot both win: whichever
    /// statement runs second sees the decremented count and affects zero
    /// rows. Returns whether the reservation was admitted.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the statement fails.
    pub async fn try_reserve_stock(
        conn: &mut PgConnection,
        id: ProductId,
        qty: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET count_in_stock = count_in_stock - $1, updated_at = now()
            WHERE id = $2 AND count_in_stock >= $1
            ",
        )
        .bind(qty)
        .bind(id.as_i32())
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
