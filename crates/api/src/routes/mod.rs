//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (verifies database)
//!
//! # Auth
//! POST /auth/register           - Create an account
//! POST /auth/login              - Login
//! POST /auth/logout             - Logout
//!
//! # Catalog
//! GET    /api/products                              - Product listing
//! GET    /api/products/{id}                         - Product detail
//! POST   /api/products                              - Create product (admin)
//! PUT    /api/products/{id}                         - Update product (admin)
//! DELETE /api/products/{id}                         - Delete product (admin)
//! GET    /api/products/{id}/reviews                 - List reviews
//! POST   /api/products/{id}/reviews                 - Add review (auth)
//! POST   /api/products/{id}/reviews/{rid}/helpful   - Helpful vote (auth)
//!
//! # Orders
//! POST /api/orders                 - Place order (auth)
//! GET  /api/orders                 - All orders (admin)
//! GET  /api/orders/mine            - Own orders (auth)
//! GET  /api/orders/{id}            - Order detail (owner or admin)
//! PUT  /api/orders/{id}/pay        - Record payment (owner or admin)
//! PUT  /api/orders/{id}/deliver    - Mark delivered (admin)
//! PUT  /api/orders/{id}/status     - Set status (admin)
//! PUT  /api/orders/{id}/cancel     - Cancel (owner)
//! PUT  /api/orders/{id}/return     - Request return (owner)
//! GET  /api/orders/{id}/tracking   - Tracking timeline (owner or admin)
//!
//! # Payment
//! POST /api/payment/create-order   - Create gateway intent (auth)
//! POST /api/payment/verify         - Verify signature, mark paid (auth)
//!
//! # Wishlist
//! GET    /api/wishlist              - List (auth)
//! POST   /api/wishlist/{product_id} - Add (auth)
//! DELETE /api/wishlist/{product_id} - Remove (auth)
//! ```

pub mod auth;
pub mod orders;
pub mod payment;
pub mod products;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::remove),
        )
        .route(
            "/{id}/reviews",
            get(products::reviews).post(products::add_review),
        )
        .route(
            "/{id}/reviews/{review_id}/helpful",
            post(products::mark_review_helpful),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::create).get(orders::index))
        .route("/mine", get(orders::mine))
        .route("/{id}", get(orders::show))
        .route("/{id}/pay", put(orders::pay))
        .route("/{id}/deliver", put(orders::deliver))
        .route("/{id}/status", put(orders::set_status))
        .route("/{id}/cancel", put(orders::cancel))
        .route("/{id}/return", put(orders::request_return))
        .route("/{id}/tracking", get(orders::tracking))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/create-order", post(payment::create_order))
        .route("/verify", post(payment::verify))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::index))
        .route(
            "/{product_id}",
            post(wishlist::add).delete(wishlist::remove),
        )
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/api/products", product_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/payment", payment_routes())
        .nest("/api/wishlist", wishlist_routes())
}
