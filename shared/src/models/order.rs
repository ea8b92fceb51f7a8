//! Order Model

use crate::order::OrderStatus;
use serde::{Deserialize, Serialize};

/// Order row
///
/// Invariants maintained by the engine:
/// - `hold_deadline` is non-null iff `status == HELD`
/// - `settled_at` is non-null iff `status == SETTLED`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub status: OrderStatus,
    pub total_amount: f64,
    pub created_at: i64,
    pub settled_at: Option<i64>,
    pub hold_deadline: Option<i64>,
}

impl Order {
    /// A HELD order whose deadline has passed is logically expired even
    /// before the sweeper reclaims it.
    pub fn is_hold_expired(&self, now_millis: i64) -> bool {
        self.status == OrderStatus::Held
            && self.hold_deadline.is_some_and(|deadline| deadline < now_millis)
    }
}

/// Order line row
///
/// Immutable after creation; `unit_price` is the product price snapshot
/// taken when the order was created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
    pub subtotal: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held_order(deadline: Option<i64>) -> Order {
        Order {
            id: 1,
            user_id: 1,
            status: OrderStatus::Held,
            total_amount: 10.0,
            created_at: 0,
            settled_at: None,
            hold_deadline: deadline,
        }
    }

    #[test]
    fn hold_expiry_is_deadline_based() {
        let order = held_order(Some(1_000));
        assert!(!order.is_hold_expired(999));
        assert!(!order.is_hold_expired(1_000));
        assert!(order.is_hold_expired(1_001));
    }

    #[test]
    fn terminal_orders_are_never_expired() {
        let mut order = held_order(None);
        order.status = OrderStatus::Settled;
        order.settled_at = Some(500);
        assert!(!order.is_hold_expired(i64::MAX));
    }
}
