//! Wishlist handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use olive_edge_core::ProductId;

use crate::db::WishlistRepository;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Product;
use crate::state::AppState;

/// GET /api/wishlist - List wishlisted products (auth).
///
/// # Errors
///
/// Database errors only.
pub async fn index(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>> {
    let products = WishlistRepository::new(state.pool()).list(user.id).await?;
    Ok(Json(products))
}

/// POST /api/wishlist/{product_id} - Add a product (auth, idempotent).
///
/// # Errors
///
/// 404 if the product doesn't exist.
pub async fn add(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> Result<StatusCode> {
    WishlistRepository::new(state.pool())
        .add(user.id, ProductId::new(product_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/wishlist/{product_id} - Remove a product (auth).
///
/// # Errors
///
/// 404 if the product wasn't wishlisted.
pub async fn remove(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> Result<StatusCode> {
    WishlistRepository::new(state.pool())
        .remove(user.id, ProductId::new(product_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
