//! CheckoutEngine - reservation, settlement, release
//!
//! The engine owns every mutation of the stock ledger and the order state
//! machine. All shared counters are touched only inside per-product critical
//! sections, and order transitions additionally serialize on a per-order
//! lock, so HELD flips into exactly one terminal state.
//!
//! # Reservation flow (create_order)
//!
//! ```text
//! create_order(user_id, items)
//!     ├─ 1. Validate input (non-empty, positive quantities, no duplicates)
//!     ├─ 2. Pre-check products exist and are active
//!     ├─ 3. Per product, ascending id:
//!     │       lock → re-read → available check → reserved += qty → unlock
//!     │       (failure compensates the increments already applied)
//!     ├─ 4. Persist order (HELD, deadline = now + TTL) + lines in one tx
//!     └─ 5. Return view with price snapshots
//! ```
//!
//! # Settlement flow (settle)
//!
//! ```text
//! settle(order_id)
//!     ├─ 1. Order lock → load → status must be HELD
//!     ├─ 2. Deadline re-check (late payment against an expired hold fails
//!     │      even before the sweeper has run)
//!     ├─ 3. Product locks, ascending id, all held together
//!     ├─ 4. One tx: guarded HELD → SETTLED flip (settled_at = now,
//!     │      deadline cleared), then per line re-read counters, defensive
//!     │      re-validation, stock -= qty, reserved -= qty (clamped at 0)
//!     └─ 5. Commit; any line failure rolls the whole tx back
//! ```
//!
//! Expiration and manual cancellation share the release path: same product
//! locks, same clamped decrement, different terminal state.

use super::error::{CheckoutError, CheckoutResult};
use super::locks::LockRegistry;
use super::money;
use crate::db::repository;
use shared::models::{Order, OrderLine};
use shared::order::{OrderLineInput, OrderStatus, OrderView};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Aggregate result of one sweep pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    pub succeeded: u64,
    pub failed: u64,
}

/// The reservation & settlement engine
///
/// Cheap to share: hold it in an `Arc` and call from any task. The lock
/// registries are in-process; this is sound because the store is an
/// embedded single-writer SQLite database owned by this process.
pub struct CheckoutEngine {
    pool: SqlitePool,
    product_locks: LockRegistry,
    order_locks: LockRegistry,
    hold_ttl_millis: i64,
}

impl CheckoutEngine {
    pub fn new(pool: SqlitePool, hold_ttl: Duration) -> Self {
        Self {
            pool,
            product_locks: LockRegistry::new(),
            order_locks: LockRegistry::new(),
            hold_ttl_millis: hold_ttl.as_millis() as i64,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ========================================================================
    // Reservation
    // ========================================================================

    /// Create an order, reserving stock for every line
    ///
    /// All-or-nothing: if any line fails validation or its availability
    /// check, no reservation survives and nothing is persisted.
    pub async fn create_order(
        &self,
        user_id: i64,
        items: &[OrderLineInput],
    ) -> CheckoutResult<OrderView> {
        // 1. Input validation
        if items.is_empty() {
            return Err(CheckoutError::Validation(
                "order must contain at least one item".into(),
            ));
        }
        let mut seen = HashSet::new();
        for item in items {
            money::validate_quantity(item.quantity)?;
            if !seen.insert(item.product_id) {
                return Err(CheckoutError::Validation(format!(
                    "duplicate product {} in order",
                    item.product_id
                )));
            }
        }

        // 2. Existence/active pre-check on a plain read. The authoritative
        //    availability check runs under each product's lock below.
        let ids: Vec<i64> = items.iter().map(|item| item.product_id).collect();
        let products = repository::product::find_by_ids(&self.pool, &ids).await?;
        let found: HashMap<i64, bool> =
            products.iter().map(|p| (p.id, p.is_active)).collect();
        for item in items {
            match found.get(&item.product_id) {
                None => return Err(CheckoutError::ProductNotFound(item.product_id)),
                Some(false) => return Err(CheckoutError::ProductInactive(item.product_id)),
                Some(true) => {}
            }
        }

        // 3. Check-then-increment per product, ascending id. Earlier
        //    increments are compensated when a later line fails, preserving
        //    "all reservations happen or none do" without one giant
        //    critical section spanning the whole order.
        let mut sorted: Vec<OrderLineInput> = items.to_vec();
        sorted.sort_by_key(|item| item.product_id);

        let mut applied: Vec<(i64, i64)> = Vec::with_capacity(sorted.len());
        let mut price_snapshots: HashMap<i64, f64> = HashMap::with_capacity(sorted.len());

        for item in &sorted {
            let guard = self.product_locks.acquire(item.product_id).await;
            let result = self.reserve_one(item.product_id, item.quantity).await;
            drop(guard);

            match result {
                Ok(unit_price) => {
                    applied.push((item.product_id, item.quantity));
                    price_snapshots.insert(item.product_id, unit_price);
                }
                Err(err) => {
                    self.rollback_reservations(&applied).await;
                    return Err(err);
                }
            }
        }

        // 4. Persist the order and its lines in one transaction
        let order_id = snowflake_id();
        let now = now_millis();
        let deadline = now + self.hold_ttl_millis;

        let lines: Vec<OrderLine> = items
            .iter()
            .map(|item| {
                let unit_price = price_snapshots[&item.product_id];
                OrderLine {
                    id: 0,
                    order_id,
                    product_id: item.product_id,
                    quantity: item.quantity,
                    unit_price,
                    subtotal: money::line_subtotal(unit_price, item.quantity),
                }
            })
            .collect();
        let total_amount = money::order_total(lines.iter().map(|line| line.subtotal));

        let persisted: Result<(), sqlx::Error> = async {
            let mut tx = self.pool.begin().await?;
            sqlx::query(
                "INSERT INTO orders (id, user_id, status, total_amount, created_at, hold_deadline) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(order_id)
            .bind(user_id)
            .bind(OrderStatus::Held)
            .bind(total_amount)
            .bind(now)
            .bind(deadline)
            .execute(&mut *tx)
            .await?;

            for line in &lines {
                sqlx::query(
                    "INSERT INTO order_line (order_id, product_id, quantity, unit_price, subtotal) \
                     VALUES (?, ?, ?, ?, ?)",
                )
                .bind(line.order_id)
                .bind(line.product_id)
                .bind(line.quantity)
                .bind(line.unit_price)
                .bind(line.subtotal)
                .execute(&mut *tx)
                .await?;
            }
            tx.commit().await
        }
        .await;

        if let Err(err) = persisted {
            tracing::error!(order_id, error = %err, "Failed to persist order; rolling back reservations");
            self.rollback_reservations(&applied).await;
            return Err(err.into());
        }

        tracing::info!(
            order_id,
            user_id,
            total_amount,
            hold_deadline = deadline,
            "Order created with stock hold"
        );

        let order = Order {
            id: order_id,
            user_id,
            status: OrderStatus::Held,
            total_amount,
            created_at: now,
            settled_at: None,
            hold_deadline: Some(deadline),
        };
        Ok(OrderView::from_parts(order, lines))
    }

    /// Availability check + reserved increment for one product.
    ///
    /// Caller must hold this product's lock. Returns the price snapshot.
    async fn reserve_one(&self, product_id: i64, quantity: i64) -> CheckoutResult<f64> {
        let product = repository::product::find_by_id(&self.pool, product_id)
            .await?
            .ok_or(CheckoutError::ProductNotFound(product_id))?;
        if !product.is_active {
            return Err(CheckoutError::ProductInactive(product_id));
        }

        let available = product.available();
        if quantity > available {
            tracing::warn!(
                product_id,
                requested = quantity,
                available,
                "Reservation rejected: insufficient stock"
            );
            return Err(CheckoutError::InsufficientStock {
                product_id,
                requested: quantity,
                available,
            });
        }

        sqlx::query("UPDATE product SET reserved = reserved + ?, updated_at = ? WHERE id = ?")
            .bind(quantity)
            .bind(now_millis())
            .bind(product_id)
            .execute(&self.pool)
            .await?;
        Ok(product.price)
    }

    /// Compensate reservation increments after a mid-order failure
    async fn rollback_reservations(&self, applied: &[(i64, i64)]) {
        for &(product_id, quantity) in applied.iter().rev() {
            let _guard = self.product_locks.acquire(product_id).await;
            if let Err(err) = self.release_one(product_id, quantity).await {
                tracing::error!(
                    product_id,
                    quantity,
                    error = %err,
                    "Failed to roll back reservation increment"
                );
            }
        }
    }

    /// Decrement one product's reserved counter, clamped at zero.
    ///
    /// Caller must hold this product's lock. A clamp means some earlier
    /// accounting went wrong; it is logged loudly but not propagated.
    async fn release_one(&self, product_id: i64, quantity: i64) -> CheckoutResult<()> {
        let row = sqlx::query_as::<_, (i64,)>("SELECT reserved FROM product WHERE id = ?")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some((reserved,)) = row else {
            tracing::error!(product_id, "Product missing while releasing reservation");
            return Ok(());
        };

        if reserved < quantity {
            tracing::error!(
                product_id,
                reserved,
                quantity,
                "Reserved counter clamped to zero; reservation accounting is inconsistent"
            );
        }
        let new_reserved = (reserved - quantity).max(0);

        sqlx::query("UPDATE product SET reserved = ?, updated_at = ? WHERE id = ?")
            .bind(new_reserved)
            .bind(now_millis())
            .bind(product_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ========================================================================
    // Settlement
    // ========================================================================

    /// Convert a HELD order into a SETTLED one (payment confirmed)
    ///
    /// All-or-nothing across lines: any failure rolls the whole transaction
    /// back, leaving counters and order untouched.
    pub async fn settle(&self, order_id: i64) -> CheckoutResult<OrderView> {
        let _order_guard = self.order_locks.acquire(order_id).await;

        let mut order = repository::order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))?;
        if order.status != OrderStatus::Held {
            return Err(CheckoutError::InvalidState {
                current: order.status,
            });
        }

        let now = now_millis();
        if order.is_hold_expired(now) {
            tracing::warn!(
                order_id,
                hold_deadline = order.hold_deadline,
                "Settlement attempted against an expired hold"
            );
            return Err(CheckoutError::HoldExpired);
        }

        let lines = repository::order::find_lines(&self.pool, order_id).await?;
        let product_ids: Vec<i64> = lines.iter().map(|line| line.product_id).collect();
        let _product_guards = self.product_locks.acquire_many(&product_ids).await;

        let mut tx = self.pool.begin().await?;

        // The order-row flip goes first so the transaction starts with a
        // write (no read-to-write lock upgrade mid-transaction); any line
        // failure below rolls it back together with the debits.
        let updated = sqlx::query(
            "UPDATE orders SET status = ?, settled_at = ?, hold_deadline = NULL \
             WHERE id = ? AND status = ?",
        )
        .bind(OrderStatus::Settled)
        .bind(now)
        .bind(order_id)
        .bind(OrderStatus::Held)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() != 1 {
            // Unreachable while the order lock is held; refuse rather than guess
            tracing::error!(order_id, "Order state changed underneath settlement");
            return Err(CheckoutError::InvalidState {
                current: order.status,
            });
        }

        for line in &lines {
            let row =
                sqlx::query_as::<_, (i64, i64)>("SELECT stock, reserved FROM product WHERE id = ?")
                    .bind(line.product_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            let Some((stock, reserved)) = row else {
                return Err(CheckoutError::ProductNotFound(line.product_id));
            };

            // `reserved` already contains this order's own hold; exclude it
            // before recomputing what this line may still debit.
            if reserved < line.quantity {
                tracing::error!(
                    product_id = line.product_id,
                    reserved,
                    quantity = line.quantity,
                    "Reserved counter below this order's hold; reservation accounting is inconsistent"
                );
            }
            let reserved_by_others = (reserved - line.quantity).max(0);
            let available = stock - reserved_by_others;
            if line.quantity > available {
                tracing::error!(
                    product_id = line.product_id,
                    requested = line.quantity,
                    available,
                    "Insufficient stock during settlement re-validation"
                );
                return Err(CheckoutError::InsufficientStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                    available,
                });
            }

            sqlx::query(
                "UPDATE product SET stock = stock - ?, reserved = ?, updated_at = ? WHERE id = ?",
            )
            .bind(line.quantity)
            .bind(reserved_by_others)
            .bind(now)
            .bind(line.product_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        tracing::info!(
            order_id,
            total_amount = order.total_amount,
            "Order settled; stock debited"
        );

        order.status = OrderStatus::Settled;
        order.settled_at = Some(now);
        order.hold_deadline = None;
        Ok(OrderView::from_parts(order, lines))
    }

    // ========================================================================
    // Release (cancel / expire)
    // ========================================================================

    /// Manually cancel a HELD order, releasing its reservations
    ///
    /// Privileged operation; `actor` is the caller-supplied identity stamped
    /// into the audit log line.
    pub async fn cancel(&self, order_id: i64, actor: Option<&str>) -> CheckoutResult<OrderView> {
        let _order_guard = self.order_locks.acquire(order_id).await;

        let mut order = repository::order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))?;
        if order.status != OrderStatus::Held {
            return Err(CheckoutError::InvalidState {
                current: order.status,
            });
        }

        let lines = repository::order::find_lines(&self.pool, order_id).await?;
        self.release_and_transition(&order, &lines, OrderStatus::Cancelled)
            .await?;

        tracing::info!(
            order_id,
            actor = actor.unwrap_or("unknown"),
            "Order cancelled; reservations released"
        );

        order.status = OrderStatus::Cancelled;
        order.hold_deadline = None;
        Ok(OrderView::from_parts(order, lines))
    }

    /// Expire a single overdue order. `Ok(false)` means it was skipped
    /// because it is no longer HELD (or its deadline has not passed) —
    /// re-running on an already-EXPIRED order is a no-op.
    pub async fn expire_order(&self, order_id: i64) -> CheckoutResult<bool> {
        let _order_guard = self.order_locks.acquire(order_id).await;

        let order = repository::order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))?;

        // Re-check immediately before mutating: the order may have settled
        // or been cancelled between the sweep query and this point.
        if order.status != OrderStatus::Held {
            tracing::debug!(
                order_id,
                status = %order.status,
                "Order no longer HELD, skipping expiration"
            );
            return Ok(false);
        }
        if !order.is_hold_expired(now_millis()) {
            return Ok(false);
        }

        let lines = repository::order::find_lines(&self.pool, order_id).await?;
        self.release_and_transition(&order, &lines, OrderStatus::Expired)
            .await?;

        tracing::info!(order_id, "Order expired; reservations reclaimed");
        Ok(true)
    }

    /// Release every line's reservation and flip HELD into `target`,
    /// atomically. Caller must hold the order lock and have verified the
    /// order is HELD.
    async fn release_and_transition(
        &self,
        order: &Order,
        lines: &[OrderLine],
        target: OrderStatus,
    ) -> CheckoutResult<()> {
        let product_ids: Vec<i64> = lines.iter().map(|line| line.product_id).collect();
        let _product_guards = self.product_locks.acquire_many(&product_ids).await;

        let now = now_millis();
        let mut tx = self.pool.begin().await?;

        // Write-first for the same reason as settlement: the guarded status
        // flip opens the transaction, the counter releases ride along, and
        // any failure rolls everything back together.
        let updated = sqlx::query(
            "UPDATE orders SET status = ?, hold_deadline = NULL WHERE id = ? AND status = ?",
        )
        .bind(target)
        .bind(order.id)
        .bind(OrderStatus::Held)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() != 1 {
            tracing::error!(order_id = order.id, "Order state changed underneath release");
            return Err(CheckoutError::InvalidState {
                current: order.status,
            });
        }

        for line in lines {
            let row = sqlx::query_as::<_, (i64,)>("SELECT reserved FROM product WHERE id = ?")
                .bind(line.product_id)
                .fetch_optional(&mut *tx)
                .await?;
            let Some((reserved,)) = row else {
                tracing::error!(
                    product_id = line.product_id,
                    order_id = order.id,
                    "Product missing while releasing hold"
                );
                continue;
            };

            if reserved < line.quantity {
                tracing::error!(
                    product_id = line.product_id,
                    reserved,
                    quantity = line.quantity,
                    "Reserved counter clamped to zero during release; reservation accounting is inconsistent"
                );
            }
            let new_reserved = (reserved - line.quantity).max(0);

            sqlx::query("UPDATE product SET reserved = ?, updated_at = ? WHERE id = ?")
                .bind(new_reserved)
                .bind(now)
                .bind(line.product_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    // ========================================================================
    // Sweep
    // ========================================================================

    /// One expiration pass: find overdue HELD orders (bounded batch) and
    /// reclaim them one by one. Per-order failures are counted and logged,
    /// never abort the batch.
    pub async fn sweep(&self, batch_size: i64) -> CheckoutResult<SweepOutcome> {
        let now = now_millis();
        let expired = repository::order::find_expired_held(&self.pool, now, batch_size).await?;

        let mut outcome = SweepOutcome::default();
        if expired.is_empty() {
            tracing::debug!("No expired holds found");
            return Ok(outcome);
        }

        tracing::info!(count = expired.len(), "Found expired holds, reclaiming");
        for order_id in expired {
            match self.expire_order(order_id).await {
                Ok(true) => outcome.succeeded += 1,
                // Settled or cancelled between query and processing
                Ok(false) => {}
                Err(err) => {
                    outcome.failed += 1;
                    tracing::error!(order_id, error = %err, "Failed to expire order");
                }
            }
        }

        tracing::info!(
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            "Expiration sweep finished"
        );
        Ok(outcome)
    }
}
