//! Order lifecycle handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use olive_edge_core::tracking::TrackingStage;
use olive_edge_core::{Email, OrderId, UserId};

use crate::db::UserRepository;
use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{NewOrder, NewOrderItem, Order, PaymentResult, ShippingAddress};
use crate::services::orders::OrderService;
use crate::state::AppState;

/// Request for placing an order.
///
/// Price fields are deliberately absent: totals are computed server-side
/// from the product rows. `idempotency_key` lets a client resubmit a
/// timed-out checkout without double-ordering.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<NewOrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    #[serde(default)]
    pub idempotency_key: Option<Uuid>,
}

/// Request for setting the fulfillment status.
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

/// POST /api/orders - Place an order (auth).
///
/// # Errors
///
/// 400 on an empty item list or non-positive quantity, 404 on a vanished
/// product, 409 when stock is insufficient.
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let service = OrderService::new(state.pool(), state.email());

    let order = service
        .create_order(
            NewOrder {
                user_id: user.id,
                items: body.items,
                shipping_address: body.shipping_address,
                payment_method: body.payment_method,
                idempotency_key: body.idempotency_key,
            },
            user.email.as_str(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/orders - All orders (admin).
///
/// # Errors
///
/// Database errors only.
pub async fn index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderService::new(state.pool(), state.email())
        .list_all()
        .await?;
    Ok(Json(orders))
}

/// GET /api/orders/mine - The caller's orders (auth).
///
/// # Errors
///
/// Database errors only.
pub async fn mine(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderService::new(state.pool(), state.email())
        .list_for(&user)
        .await?;
    Ok(Json(orders))
}

/// Order detail with its owner populated.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub user: Option<OwnerSummary>,
}

/// The slice of the owning account the order detail exposes.
#[derive(Debug, Serialize)]
pub struct OwnerSummary {
    pub id: UserId,
    pub name: String,
    pub email: Email,
}

/// GET /api/orders/{id} - Order detail with user populated (owner or admin).
///
/// # Errors
///
/// 404 if missing, 403 on ownership mismatch.
pub async fn show(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<OrderDetail>> {
    let order = OrderService::new(state.pool(), state.email())
        .get_authorized(OrderId::new(id), &user)
        .await?;

    let owner = UserRepository::new(state.pool())
        .get_by_id(order.user_id)
        .await?
        .map(|owner| OwnerSummary {
            id: owner.id,
            name: owner.name,
            email: owner.email,
        });

    Ok(Json(OrderDetail { order, user: owner }))
}

/// PUT /api/orders/{id}/pay - Record a payment result (owner or admin).
///
/// The trust boundary is the payment verification endpoint; this handler
/// records whatever result the gateway flow produced.
///
/// # Errors
///
/// 404 if missing, 403 on ownership mismatch.
pub async fn pay(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payment): Json<PaymentResult>,
) -> Result<Json<Order>> {
    let order = OrderService::new(state.pool(), state.email())
        .mark_paid(OrderId::new(id), &user, payment)
        .await?;
    Ok(Json(order))
}

/// PUT /api/orders/{id}/deliver - Mark delivered (admin).
///
/// # Errors
///
/// 404 if missing.
pub async fn deliver(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Order>> {
    let order = OrderService::new(state.pool(), state.email())
        .deliver(OrderId::new(id))
        .await?;
    Ok(Json(order))
}

/// PUT /api/orders/{id}/status - Set fulfillment status (admin).
///
/// # Errors
///
/// 400 on a status outside the five-value enum, 404 if missing.
pub async fn set_status(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<SetStatusRequest>,
) -> Result<Json<Order>> {
    let order = OrderService::new(state.pool(), state.email())
        .set_status(OrderId::new(id), &body.status)
        .await?;
    Ok(Json(order))
}

/// PUT /api/orders/{id}/cancel - Cancel an order (owner).
///
/// # Errors
///
/// 409 if already delivered or already cancelled.
pub async fn cancel(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Order>> {
    let order = OrderService::new(state.pool(), state.email())
        .cancel(OrderId::new(id), &user)
        .await?;
    Ok(Json(order))
}

/// PUT /api/orders/{id}/return - Request a return (owner).
///
/// # Errors
///
/// 409 before delivery or on a repeat request.
pub async fn request_return(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Order>> {
    let order = OrderService::new(state.pool(), state.email())
        .request_return(OrderId::new(id), &user)
        .await?;
    Ok(Json(order))
}

/// GET /api/orders/{id}/tracking - Tracking timeline (owner or admin).
///
/// # Errors
///
/// 404 if missing, 403 on ownership mismatch.
pub async fn tracking(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<TrackingStage>>> {
    let stages = OrderService::new(state.pool(), state.email())
        .tracking(OrderId::new(id), &user)
        .await?;
    Ok(Json(stages))
}
