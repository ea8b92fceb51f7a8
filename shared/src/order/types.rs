//! Order status state machine and request payloads

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Order Status
// ============================================================================

/// 订单状态
///
/// An order is created `Held` with a stock reservation and a deadline, and
/// transitions exactly once into one of the three terminal states:
///
/// ```text
/// HELD ──settle──► SETTLED
///   │────sweep───► EXPIRED
///   └───cancel───► CANCELLED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "UPPERCASE"))]
pub enum OrderStatus {
    /// 持有中 - 库存已预留，等待支付确认
    #[default]
    Held,
    /// 已结算 - 支付确认，库存已永久扣减
    Settled,
    /// 已取消 - 人工取消，预留已释放
    Cancelled,
    /// 已过期 - 超过持有期限，预留已回收
    Expired,
}

impl OrderStatus {
    /// Stable string form, matching the database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Held => "HELD",
            Self::Settled => "SETTLED",
            Self::Cancelled => "CANCELLED",
            Self::Expired => "EXPIRED",
        }
    }

    /// Terminal states admit no further transition
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Held)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HELD" => Ok(Self::Held),
            "SETTLED" => Ok(Self::Settled),
            "CANCELLED" => Ok(Self::Cancelled),
            "EXPIRED" => Ok(Self::Expired),
            other => Err(format!("Unknown order status: {}", other)),
        }
    }
}

// ============================================================================
// Request Payloads
// ============================================================================

/// One requested line of a new order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineInput {
    pub product_id: i64,
    pub quantity: i64,
}

/// Create order payload
///
/// `user_id` arrives from an already-authenticated edge; the engine does
/// not authenticate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: i64,
    pub items: Vec<OrderLineInput>,
}

/// Manual cancellation payload (privileged operation)
///
/// `actor` is a plain identity string stamped into the audit log line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelOrderRequest {
    #[serde(default)]
    pub actor: Option<String>,
}
