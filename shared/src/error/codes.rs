//! Unified error codes for the checkout platform
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 6xxx: Product / stock errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient
/// serialization and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 4xxx: Order ====================
    /// Order does not exist
    OrderNotFound = 4001,
    /// Operation not valid for the order's current status
    InvalidOrderState = 4002,
    /// Stock hold deadline has passed
    HoldExpired = 4003,

    // ==================== 6xxx: Product / Stock ====================
    /// Product does not exist
    ProductNotFound = 6001,
    /// Product exists but is not sellable
    ProductInactive = 6002,
    /// Available stock is below the requested quantity
    InsufficientStock = 6003,
    /// Stock counter update would violate `0 <= reserved <= stock`
    StockConflict = 6004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
}

impl ErrorCode {
    /// Default human-readable message for this code
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",

            Self::OrderNotFound => "Order not found",
            Self::InvalidOrderState => "Operation not valid for the order's current status",
            Self::HoldExpired => "Stock hold has expired",

            Self::ProductNotFound => "Product not found",
            Self::ProductInactive => "Product is not sellable",
            Self::InsufficientStock => "Insufficient stock",
            Self::StockConflict => "Stock counters would become inconsistent",

            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
            Self::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> u16 {
        code as u16
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Success),
            1 => Ok(Self::Unknown),
            2 => Ok(Self::ValidationFailed),
            3 => Ok(Self::NotFound),
            4 => Ok(Self::AlreadyExists),
            5 => Ok(Self::InvalidRequest),

            4001 => Ok(Self::OrderNotFound),
            4002 => Ok(Self::InvalidOrderState),
            4003 => Ok(Self::HoldExpired),

            6001 => Ok(Self::ProductNotFound),
            6002 => Ok(Self::ProductInactive),
            6003 => Ok(Self::InsufficientStock),
            6004 => Ok(Self::StockConflict),

            9001 => Ok(Self::InternalError),
            9002 => Ok(Self::DatabaseError),
            9003 => Ok(Self::ConfigError),

            other => Err(format!("Unknown error code: {}", other)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", *self as u16, self.message())
    }
}
