//! Product Model

use serde::{Deserialize, Serialize};

/// Product entity with its stock ledger counters
///
/// `stock` is the number of physical units owned; `reserved` is the number
/// currently held by non-terminal orders. The engine maintains
/// `0 <= reserved <= stock` across every committed mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Unit price; arithmetic is done in `Decimal`, storage is 2dp
    pub price: f64,
    /// Physical units owned
    pub stock: i64,
    /// Units held by non-terminal orders
    pub reserved: i64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Product {
    /// Quantity eligible for new reservations
    pub fn available(&self) -> i64 {
        self.stock - self.reserved
    }
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock: Option<i64>,
    pub is_active: Option<bool>,
}

/// Update product payload
///
/// `reserved` is deliberately absent: only the reservation engine mutates it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
    pub is_active: Option<bool>,
}
