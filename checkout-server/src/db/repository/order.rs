//! Order Repository
//!
//! Read side only. Order creation and every state transition go through the
//! checkout engine, which owns the per-product critical sections.

use super::RepoResult;
use shared::models::{Order, OrderLine};
use shared::order::OrderStatus;
use sqlx::SqlitePool;

const ORDER_COLUMNS: &str =
    "id, user_id, status, total_amount, created_at, settled_at, hold_deadline";
const LINE_COLUMNS: &str = "id, order_id, product_id, quantity, unit_price, subtotal";

/// Find order by id
pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(order)
}

/// Fetch the lines of an order, in insertion order
pub async fn find_lines(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderLine>> {
    let lines = sqlx::query_as::<_, OrderLine>(&format!(
        "SELECT {LINE_COLUMNS} FROM order_line WHERE order_id = ? ORDER BY id"
    ))
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(lines)
}

/// List one user's orders, newest first
pub async fn find_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ? ORDER BY created_at DESC, id DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(orders)
}

/// List all orders, newest first
pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(orders)
}

/// IDs of HELD orders whose deadline has passed (bounded batch)
///
/// Uses the (status, hold_deadline) index; oldest deadlines first so
/// long-overdue holds are reclaimed before fresh ones.
pub async fn find_expired_held(
    pool: &SqlitePool,
    now_millis: i64,
    limit: i64,
) -> RepoResult<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM orders \
         WHERE status = ? AND hold_deadline IS NOT NULL AND hold_deadline < ? \
         ORDER BY hold_deadline ASC \
         LIMIT ?",
    )
    .bind(OrderStatus::Held)
    .bind(now_millis)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}
