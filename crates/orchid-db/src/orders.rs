//! Database operations for the `orders` and `order_items` tables.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `orders` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub cart_total: Decimal,
    pub currency: String,
    pub payment_id: Option<String>,
    pub order_status: String,
    pub tracking_carrier: Option<String>,
    pub tracking_code: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub address: Option<String>,
    pub telephone: Option<String>,
}

/// A row from the `order_items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderItemRow {
    pub id: i64,
    pub order_id: i64,
    pub title: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

const ORDER_COLUMNS: &str = "id, created_at, cart_total, currency, payment_id, order_status, \
     tracking_carrier, tracking_code, customer_name, customer_email, address, telephone";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns the order whose tracking code matches `tracking_code` exactly,
/// or `None` if no order carries that code.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_order_by_tracking(
    pool: &PgPool,
    tracking_code: &str,
) -> Result<Option<OrderRow>, DbError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE tracking_code = $1 LIMIT 1"
    ))
    .bind(tracking_code)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns one page of orders, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_orders(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<Vec<OrderRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the line items of one order, in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_order_items(pool: &PgPool, order_id: i64) -> Result<Vec<OrderItemRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderItemRow>(
        "SELECT id, order_id, title, quantity, unit_price \
         FROM order_items WHERE order_id = $1 ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the line items of every order in `order_ids` in one round-trip.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_order_items_for(
    pool: &PgPool,
    order_ids: &[i64],
) -> Result<Vec<OrderItemRow>, DbError> {
    if order_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, OrderItemRow>(
        "SELECT id, order_id, title, quantity, unit_price \
         FROM order_items WHERE order_id = ANY($1) ORDER BY order_id, id",
    )
    .bind(order_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Sets the status of one order and returns the updated row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such order exists, [`DbError::Sqlx`]
/// if the query fails.
pub async fn update_order_status(
    pool: &PgPool,
    order_id: i64,
    status: &str,
) -> Result<OrderRow, DbError> {
    sqlx::query_as::<_, OrderRow>(&format!(
        "UPDATE orders SET order_status = $1, updated_at = NOW() \
         WHERE id = $2 RETURNING {ORDER_COLUMNS}"
    ))
    .bind(status)
    .bind(order_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Sets the shipping carrier and tracking code of one order and returns the
/// updated row. Either value may be `None` to clear the column.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such order exists, [`DbError::Sqlx`]
/// if the query fails.
pub async fn update_order_shipping(
    pool: &PgPool,
    order_id: i64,
    carrier: Option<&str>,
    tracking_code: Option<&str>,
) -> Result<OrderRow, DbError> {
    sqlx::query_as::<_, OrderRow>(&format!(
        "UPDATE orders SET tracking_carrier = $1, tracking_code = $2, updated_at = NOW() \
         WHERE id = $3 RETURNING {ORDER_COLUMNS}"
    ))
    .bind(carrier)
    .bind(tracking_code)
    .bind(order_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Deletes one order; line items go with it via `ON DELETE CASCADE`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such order exists, [`DbError::Sqlx`]
/// if the query fails.
pub async fn delete_order(pool: &PgPool, order_id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(order_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Sum of `cart_total` across all orders; zero when there are none.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn total_sales(pool: &PgPool) -> Result<Decimal, DbError> {
    let sum = sqlx::query_scalar::<_, Option<Decimal>>("SELECT SUM(cart_total) FROM orders")
        .fetch_one(pool)
        .await?;

    Ok(sum.unwrap_or_default())
}

/// Total number of orders.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_orders(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Number of distinct customers that have placed an order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_customers(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(DISTINCT customer_email) FROM orders WHERE customer_email IS NOT NULL",
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
