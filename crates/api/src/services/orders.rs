//! Order lifecycle controller.
//!
//! Orchestrates creation (validation, stock reservation, persistence,
//! confirmation email), the paid transition, admin status changes, and the
//! shopper-facing cancel/return/tracking operations. Stateless over a
//! connection pool; transition legality is checked on the loaded `Order`
//! via its pure guards before any write.

use sqlx::PgPool;
use tracing::instrument;

use olive_edge_core::tracking::{self, TrackingStage};
use olive_edge_core::{OrderId, OrderStatus};

use crate::db::{OrderRepository, RepositoryError, UserRepository};
use crate::error::{AppError, Result};
use crate::models::{CurrentUser, NewOrder, Order, PaymentResult};
use crate::services::notifications::{
    EmailService, dispatch_delivery_notice, dispatch_order_confirmation,
};

/// Order lifecycle service.
pub struct OrderService<'a> {
    pool: &'a PgPool,
    email: Option<&'a EmailService>,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, email: Option<&'a EmailService>) -> Self {
        Self { pool, email }
    }

    /// Place an order: validate, reserve stock, persist, notify.
    ///
    /// Stock reservation and persistence share one transaction (see
    /// `OrderRepository::create`); the confirmation email is dispatched
    /// fire-and-forget after commit and cannot affect the result.
    ///
    /// Replays carrying the same idempotency key return the original
    /// order instead of decrementing stock again.
    ///
    /// # Errors
    ///
    /// `Validation` for an empty item list or non-positive quantity,
    /// `NotFound` if a product vanished, `Conflict` when stock is
    /// insufficient.
    #[instrument(skip(self, new_order), fields(user_id = %new_order.user_id))]
    pub async fn create_order(&self, new_order: NewOrder, notify_to: &str) -> Result<Order> {
        if new_order.items.is_empty() {
            return Err(AppError::Validation(
                "order must contain at least one item".to_owned(),
            ));
        }
        if new_order.items.iter().any(|item| item.qty <= 0) {
            return Err(AppError::Validation(
                "item quantities must be positive".to_owned(),
            ));
        }

        let orders = OrderRepository::new(self.pool);

        // Idempotent replay: hand back the order this key already created.
        if let Some(key) = new_order.idempotency_key
            && let Some(existing) = orders
                .get_by_idempotency_key(new_order.user_id, key)
                .await?
        {
            tracing::info!(order_id = %existing.id, "Idempotency key replay, returning existing order");
            return Ok(existing);
        }

        let order = match orders.create(&new_order).await {
            Ok(order) => order,
            // Two replays raced past the lookup; the unique index caught
            // the loser, which now fetches the winner's order.
            Err(RepositoryError::Conflict(_)) if new_order.idempotency_key.is_some() => {
                let key = new_order
                    .idempotency_key
                    .ok_or_else(|| AppError::Internal("idempotency key vanished".to_owned()))?;
                orders
                    .get_by_idempotency_key(new_order.user_id, key)
                    .await?
                    .ok_or_else(|| {
                        AppError::Internal("idempotency conflict without stored order".to_owned())
                    })?
            }
            Err(RepositoryError::NotFound) => {
                return Err(AppError::NotFound("product no longer exists".to_owned()));
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            order_id = %order.id,
            total = %order.total_price,
            items = order.items.len(),
            "Order placed"
        );

        dispatch_order_confirmation(self.email, notify_to.to_owned(), order.clone());

        Ok(order)
    }

    /// Load an order the actor is allowed to see.
    ///
    /// # Errors
    ///
    /// `NotFound` if the order doesn't exist, `Forbidden` if the actor
    /// neither owns it nor holds admin privilege.
    pub async fn get_authorized(&self, id: OrderId, actor: &CurrentUser) -> Result<Order> {
        let order = OrderRepository::new(self.pool)
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;

        if !order.accessible_by(actor.id, actor.is_admin) {
            return Err(AppError::Forbidden(
                "order belongs to a different account".to_owned(),
            ));
        }

        Ok(order)
    }

    /// List the actor's own orders.
    ///
    /// # Errors
    ///
    /// Database errors only.
    pub async fn list_for(&self, actor: &CurrentUser) -> Result<Vec<Order>> {
        Ok(OrderRepository::new(self.pool)
            .list_for_user(actor.id)
            .await?)
    }

    /// List every order (admin).
    ///
    /// # Errors
    ///
    /// Database errors only.
    pub async fn list_all(&self) -> Result<Vec<Order>> {
        Ok(OrderRepository::new(self.pool).list_all().await?)
    }

    /// Record a completed payment.
    ///
    /// Idempotent in effect: re-applying sets the same fields. The caller
    /// is responsible for having verified the payment first - the trust
    /// boundary is the gateway adapter, not this method.
    ///
    /// # Errors
    ///
    /// `NotFound` if the order doesn't exist, `Forbidden` on ownership
    /// mismatch.
    #[instrument(skip(self, actor, payment))]
    pub async fn mark_paid(
        &self,
        id: OrderId,
        actor: &CurrentUser,
        payment: PaymentResult,
    ) -> Result<Order> {
        // Authorization first; also surfaces NotFound before any write.
        self.get_authorized(id, actor).await?;

        let order = OrderRepository::new(self.pool).mark_paid(id, &payment).await?;
        tracing::info!(order_id = %order.id, payment_id = %payment.payment_id, "Order marked paid");
        Ok(order)
    }

    /// Set the fulfillment status (admin).
    ///
    /// `shipped` stamps `shipped_at`; `delivered` additionally sets the
    /// delivered flag and fires the delivery notice exactly once, on the
    /// transition.
    ///
    /// # Errors
    ///
    /// `Validation` for a status outside the five-value enum, `NotFound`
    /// if the order doesn't exist.
    #[instrument(skip(self))]
    pub async fn set_status(&self, id: OrderId, status: &str) -> Result<Order> {
        let status: OrderStatus = status
            .parse()
            .map_err(|e: olive_edge_core::InvalidStatus| AppError::Validation(e.to_string()))?;

        let orders = OrderRepository::new(self.pool);
        let before = orders
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;

        let order = orders.set_status(id, status).await?;
        tracing::info!(order_id = %order.id, status = %status, "Order status updated");

        if status == OrderStatus::Delivered && !before.is_delivered {
            self.notify_owner_delivered(&order).await;
        }

        Ok(order)
    }

    /// Mark an order delivered (admin shortcut for the delivered status).
    ///
    /// # Errors
    ///
    /// `NotFound` if the order doesn't exist.
    pub async fn deliver(&self, id: OrderId) -> Result<Order> {
        self.set_status(id, "delivered").await
    }

    /// Cancel an order.
    ///
    /// # Errors
    ///
    /// `Forbidden` on ownership mismatch, `Conflict` if the order was
    /// already delivered or already cancelled.
    #[instrument(skip(self, actor))]
    pub async fn cancel(&self, id: OrderId, actor: &CurrentUser) -> Result<Order> {
        let order = self.get_authorized(id, actor).await?;
        order.ensure_can_cancel()?;

        let order = OrderRepository::new(self.pool).cancel(id).await?;
        tracing::info!(order_id = %order.id, "Order cancelled");
        Ok(order)
    }

    /// Request a return for a delivered order.
    ///
    /// # Errors
    ///
    /// `Forbidden` on ownership mismatch, `Conflict` before delivery or on
    /// a repeat request.
    #[instrument(skip(self, actor))]
    pub async fn request_return(&self, id: OrderId, actor: &CurrentUser) -> Result<Order> {
        let order = self.get_authorized(id, actor).await?;
        order.ensure_can_request_return()?;

        let order = OrderRepository::new(self.pool).request_return(id).await?;
        tracing::info!(order_id = %order.id, "Return requested");
        Ok(order)
    }

    /// Produce the four-stage tracking timeline.
    ///
    /// # Errors
    ///
    /// `NotFound` if the order doesn't exist, `Forbidden` if the actor may
    /// not see it.
    pub async fn tracking(&self, id: OrderId, actor: &CurrentUser) -> Result<Vec<TrackingStage>> {
        let order = self.get_authorized(id, actor).await?;
        Ok(tracking::timeline(&order.timeline_inputs()))
    }

    /// Best-effort delivery notice to the order's owner.
    async fn notify_owner_delivered(&self, order: &Order) {
        match UserRepository::new(self.pool).get_by_id(order.user_id).await {
            Ok(Some(owner)) => {
                dispatch_delivery_notice(
                    self.email,
                    owner.email.as_str().to_owned(),
                    order.clone(),
                );
            }
            Ok(None) => {
                tracing::warn!(order_id = %order.id, "Order owner vanished, skipping delivery notice");
            }
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "Could not load owner for delivery notice");
            }
        }
    }
}
