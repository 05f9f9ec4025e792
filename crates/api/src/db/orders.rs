//! Order repository.
//!
//! Order creation runs as one transaction: product snapshots, guarded
//! stock decrements, totals, and the order/item inserts either all commit
//! or none do. A failed guard aborts the whole transaction, so no order
//! row can exist whose reservation silently no-opped.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use olive_edge_core::{OrderId, OrderStatus, OrderTotals, ProductId, UserId};

use super::RepositoryError;
use super::products::ProductRepository;
use crate::models::{NewOrder, Order, OrderItem, PaymentResult, ShippingAddress};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    ship_full_name: String,
    ship_line1: String,
    ship_line2: Option<String>,
    ship_city: String,
    ship_postal_code: String,
    ship_country: String,
    ship_phone: Option<String>,
    payment_method: String,
    items_price: Decimal,
    tax_price: Decimal,
    shipping_price: Decimal,
    total_price: Decimal,
    status: OrderStatus,
    is_paid: bool,
    paid_at: Option<DateTime<Utc>>,
    payment_id: Option<String>,
    payment_status: Option<String>,
    payment_update_time: Option<String>,
    payer_email: Option<String>,
    shipped_at: Option<DateTime<Utc>>,
    is_delivered: bool,
    delivered_at: Option<DateTime<Utc>>,
    is_cancelled: bool,
    cancelled_at: Option<DateTime<Utc>>,
    is_return_requested: bool,
    return_requested_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Internal row type for order item queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    product_id: i32,
    name: String,
    price: Decimal,
    qty: i32,
    image: String,
    size: Option<String>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            product_id: ProductId::new(row.product_id),
            name: row.name,
            price: row.price,
            qty: row.qty,
            image: row.image,
            size: row.size,
        }
    }
}

fn assemble(row: OrderRow, items: Vec<OrderItem>) -> Order {
    let payment_result = row.payment_id.map(|payment_id| PaymentResult {
        payment_id,
        status: row.payment_status.unwrap_or_default(),
        update_time: row.payment_update_time,
        payer_email: row.payer_email,
    });

    Order {
        id: OrderId::new(row.id),
        user_id: UserId::new(row.user_id),
        items,
        shipping_address: ShippingAddress {
            full_name: row.ship_full_name,
            line1: row.ship_line1,
            line2: row.ship_line2,
            city: row.ship_city,
            postal_code: row.ship_postal_code,
            country: row.ship_country,
            phone: row.ship_phone,
        },
        payment_method: row.payment_method,
        items_price: row.items_price,
        tax_price: row.tax_price,
        shipping_price: row.shipping_price,
        total_price: row.total_price,
        status: row.status,
        is_paid: row.is_paid,
        paid_at: row.paid_at,
        payment_result,
        shipped_at: row.shipped_at,
        is_delivered: row.is_delivered,
        delivered_at: row.delivered_at,
        is_cancelled: row.is_cancelled,
        cancelled_at: row.cancelled_at,
        is_return_requested: row.is_return_requested,
        return_requested_at: row.return_requested_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

const ORDER_COLUMNS: &str = "id, user_id, ship_full_name, ship_line1, ship_line2, ship_city, \
     ship_postal_code, ship_country, ship_phone, payment_method, items_price, tax_price, \
     shipping_price, total_price, status, is_paid, paid_at, payment_id, payment_status, \
     payment_update_time, payer_email, shipped_at, is_delivered, delivered_at, is_cancelled, \
     cancelled_at, is_return_requested, return_requested_at, created_at, updated_at";

const ITEM_COLUMNS: &str = "product_id, name, price, qty, image, size";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an order, reserving stock for every line item.
    ///
    /// Runs in a single transaction. Each item's product is snapshotted and
    /// its stock conditionally decremented; any missing product or failed
    /// guard aborts the transaction and nothing is persisted. Totals are
    /// computed from the snapshotted prices, never from client input.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if a product vanished,
    /// `RepositoryError::InsufficientStock` naming the product whose guard
    /// failed, and `RepositoryError::Conflict` if the idempotency key was
    /// already used (the caller resolves that to the original order).
    pub async fn create(&self, new_order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Snapshot + reserve each line item. Order by product id so two
        // multi-item orders touching the same products lock rows in a
        // consistent order.
        let mut sorted: Vec<_> = new_order.items.iter().collect();
        sorted.sort_by_key(|item| item.product_id.as_i32());

        let mut items = Vec::with_capacity(sorted.len());
        for requested in sorted {
            let snapshot = ProductRepository::snapshot(&mut *tx, requested.product_id)
                .await?
                .ok_or(RepositoryError::NotFound)?;

            let admitted = ProductRepository::try_reserve_stock(
                &mut *tx,
                requested.product_id,
                requested.qty,
            )
            .await?;
            if !admitted {
                // Dropping the transaction rolls everything back.
                return Err(RepositoryError::InsufficientStock {
                    product_name: snapshot.name,
                });
            }

            items.push(OrderItem {
                product_id: requested.product_id,
                name: snapshot.name,
                price: snapshot.price,
                qty: requested.qty,
                image: snapshot.image,
                size: requested.size.clone(),
            });
        }

        let totals = OrderTotals::compute(items.iter().map(|item| (item.price, item.qty)));

        let addr = &new_order.shipping_address;
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders (user_id, ship_full_name, ship_line1, ship_line2, ship_city,
                 ship_postal_code, ship_country, ship_phone, payment_method,
                 items_price, tax_price, shipping_price, total_price, idempotency_key)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(new_order.user_id.as_i32())
        .bind(&addr.full_name)
        .bind(&addr.line1)
        .bind(&addr.line2)
        .bind(&addr.city)
        .bind(&addr.postal_code)
        .bind(&addr.country)
        .bind(&addr.phone)
        .bind(&new_order.payment_method)
        .bind(totals.items_price)
        .bind(totals.tax_price)
        .bind(totals.shipping_price)
        .bind(totals.total_price)
        .bind(new_order.idempotency_key)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("idempotency key already used".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        for item in &items {
            sqlx::query(
                r"
                INSERT INTO order_items (order_id, product_id, name, price, qty, image, size)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ",
            )
            .bind(row.id)
            .bind(item.product_id.as_i32())
            .bind(&item.name)
            .bind(item.price)
            .bind(item.qty)
            .bind(&item.image)
            .bind(&item.size)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(assemble(row, items))
    }

    /// Get an order with its line items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = self.items_for(OrderId::new(row.id)).await?;
        Ok(Some(assemble(row, items)))
    }

    /// Find the order previously created under an idempotency key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_idempotency_key(
        &self,
        user_id: UserId,
        key: Uuid,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 AND idempotency_key = $2"
        ))
        .bind(user_id.as_i32())
        .bind(key)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = self.items_for(OrderId::new(row.id)).await?;
        Ok(Some(assemble(row, items)))
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        self.assemble_all(rows).await
    }

    /// List every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        self.assemble_all(rows).await
    }

    /// Record a completed payment on an order.
    ///
    /// Idempotent in effect: re-applying the same payment result sets the
    /// same fields again.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn mark_paid(
        &self,
        id: OrderId,
        payment: &PaymentResult,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders
             SET is_paid = TRUE,
                 paid_at = COALESCE(paid_at, now()),
                 payment_id = $1,
                 payment_status = $2,
                 payment_update_time = $3,
                 payer_email = $4,
                 updated_at = now()
             WHERE id = $5
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(&payment.payment_id)
        .bind(&payment.status)
        .bind(&payment.update_time)
        .bind(&payment.payer_email)
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        self.finish_update(row).await
    }

    /// Set the fulfillment status, stamping the matching timestamps.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn set_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders
             SET status = $1,
                 shipped_at = CASE WHEN $1 IN ('shipped', 'delivered')
                              THEN COALESCE(shipped_at, now()) ELSE shipped_at END,
                 is_delivered = (is_delivered OR $1 = 'delivered'),
                 delivered_at = CASE WHEN $1 = 'delivered'
                                THEN COALESCE(delivered_at, now()) ELSE delivered_at END,
                 updated_at = now()
             WHERE id = $2
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(status)
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        self.finish_update(row).await
    }

    /// Flag an order cancelled.
    ///
    /// The status enum and the flag are set together so they cannot
    /// disagree. Transition legality is the service's concern.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn cancel(&self, id: OrderId) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders
             SET is_cancelled = TRUE,
                 cancelled_at = COALESCE(cancelled_at, now()),
                 status = 'cancelled',
                 updated_at = now()
             WHERE id = $1
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        self.finish_update(row).await
    }

    /// Flag a return request on a delivered order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn request_return(&self, id: OrderId) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders
             SET is_return_requested = TRUE,
                 return_requested_at = COALESCE(return_requested_at, now()),
                 updated_at = now()
             WHERE id = $1
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        self.finish_update(row).await
    }

    async fn items_for(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
        ))
        .bind(order_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    async fn assemble_all(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.items_for(OrderId::new(row.id)).await?;
            orders.push(assemble(row, items));
        }
        Ok(orders)
    }

    async fn finish_update(&self, row: Option<OrderRow>) -> Result<Order, RepositoryError> {
        let row = row.ok_or(RepositoryError::NotFound)?;
        let items = self.items_for(OrderId::new(row.id)).await?;
        Ok(assemble(row, items))
    }
}
