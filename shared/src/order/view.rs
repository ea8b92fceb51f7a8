//! Read-side order views returned by the API

use super::types::OrderStatus;
use crate::models::{Order, OrderLine};
use serde::{Deserialize, Serialize};

/// One order line as presented to callers
///
/// `unit_price` is the price snapshot taken at order creation; it does not
/// track later catalog changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineView {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
    pub subtotal: f64,
}

/// Full order view (order + lines)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    pub id: i64,
    pub user_id: i64,
    pub status: OrderStatus,
    pub total_amount: f64,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settled_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_deadline: Option<i64>,
    pub items: Vec<OrderLineView>,
}

impl OrderView {
    /// Assemble a view from the persisted order row and its lines
    pub fn from_parts(order: Order, lines: Vec<OrderLine>) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            status: order.status,
            total_amount: order.total_amount,
            created_at: order.created_at,
            settled_at: order.settled_at,
            hold_deadline: order.hold_deadline,
            items: lines
                .into_iter()
                .map(|line| OrderLineView {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    subtotal: line.subtotal,
                })
                .collect(),
        }
    }
}
