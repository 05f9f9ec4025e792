//! Catalog and review handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use olive_edge_core::{ProductId, ReviewId};

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{Product, ProductInput, Review};
use crate::state::AppState;

/// GET /api/products - Product listing.
///
/// # Errors
///
/// Database errors only.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list().await?;
    Ok(Json(products))
}

/// GET /api/products/{id} - Product detail.
///
/// # Errors
///
/// 404 if the product doesn't exist.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id} not found")))?;

    Ok(Json(product))
}

/// POST /api/products - Create a product (admin).
///
/// # Errors
///
/// 400 on a non-positive price or negative stock.
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    validate_product_input(&input)?;

    let product = ProductRepository::new(state.pool()).create(&input).await?;
    tracing::info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/products/{id} - Update a product (admin).
///
/// # Errors
///
/// 404 if the product doesn't exist, 400 on invalid fields.
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>> {
    validate_product_input(&input)?;

    let product = ProductRepository::new(state.pool())
        .update(ProductId::new(id), &input)
        .await?;
    Ok(Json(product))
}

/// DELETE /api/products/{id} - Delete a product (admin).
///
/// # Errors
///
/// 404 if the product doesn't exist.
pub async fn remove(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool())
        .delete(ProductId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Reviews
// =============================================================================

/// Request for posting a review.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
}

/// GET /api/products/{id}/reviews - List reviews.
///
/// # Errors
///
/// Database errors only.
pub async fn reviews(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<Review>>> {
    let reviews = ProductRepository::new(state.pool())
        .reviews(ProductId::new(id))
        .await?;
    Ok(Json(reviews))
}

/// POST /api/products/{id}/reviews - Add a review (auth, one per user).
///
/// # Errors
///
/// 400 on an out-of-range rating, 404 on a missing product, 409 if the
/// user already reviewed this product.
pub async fn add_review(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<ReviewRequest>,
) -> Result<(StatusCode, Json<Review>)> {
    if !(1..=5).contains(&body.rating) {
        return Err(AppError::Validation(
            "rating must be between 1 and 5".to_owned(),
        ));
    }

    let review = ProductRepository::new(state.pool())
        .add_review(
            ProductId::new(id),
            user.id,
            &user.name,
            body.rating,
            &body.comment,
        )
        .await?;

    tracing::info!(product_id = id, review_id = %review.id, "Review added");
    Ok((StatusCode::CREATED, Json(review)))
}

/// POST /api/products/{id}/reviews/{review_id}/helpful - Helpful vote (auth).
///
/// # Errors
///
/// 404 if the review doesn't exist on that product.
pub async fn mark_review_helpful(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path((id, review_id)): Path<(i32, i32)>,
) -> Result<Json<Review>> {
    let review = ProductRepository::new(state.pool())
        .mark_review_helpful(ProductId::new(id), ReviewId::new(review_id))
        .await?;
    Ok(Json(review))
}

fn validate_product_input(input: &ProductInput) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("product name is required".to_owned()));
    }
    if input.price.is_sign_negative() || input.price.is_zero() {
        return Err(AppError::Validation("price must be positive".to_owned()));
    }
    if input.count_in_stock < 0 {
        return Err(AppError::Validation(
            "stock count cannot be negative".to_owned(),
        ));
    }
    Ok(())
}
