//! Order repository.
//!
//! Orders are created by the checkout backend. The storefront only reads a
//! customer's own orders; order numbers come from the `generate_order_number()`
//! column default.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use eyeric_core::order::{Order, OrderItem, OrderTotals, ShippingAddress};
use eyeric_core::{OrderId, OrderStatus, PaymentStatus, UserId};

use super::{RepositoryError, decode_json};

const ORDER_COLUMNS: &str = r"
    id, order_number, user_id, shipping_address, items,
    subtotal, shipping, tax, discount, total,
    payment_method, payment_status, status, created_at, updated_at
";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    order_number: String,
    user_id: UserId,
    shipping_address: serde_json::Value,
    items: serde_json::Value,
    subtotal: Decimal,
    shipping: Decimal,
    tax: Decimal,
    discount: Decimal,
    total: Decimal,
    payment_method: Option<String>,
    payment_status: PaymentStatus,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let shipping_address: ShippingAddress =
            decode_json(row.shipping_address, "shipping_address")?;
        let items: Vec<OrderItem> = decode_json(row.items, "items")?;

        Ok(Self {
            id: row.id,
            order_number: row.order_number,
            user_id: row.user_id,
            shipping_address,
            items,
            totals: OrderTotals {
                subtotal: row.subtotal,
                shipping: row.shipping,
                tax: row.tax,
                discount: row.discount,
                total: row.total,
            },
            payment_method: row.payment_method,
            payment_status: row.payment_status,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a JSON column does not decode.
    #[instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// One order, only if it belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a JSON column does not decode.
    #[instrument(skip(self))]
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2"
        ))
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }
}
