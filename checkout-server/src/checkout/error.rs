//! Checkout domain error taxonomy
//!
//! Every business rule violation gets its own variant so callers can react
//! to a distinct signal; infrastructure failures are wrapped as `Storage`
//! and always leave the store unchanged (all operations are all-or-nothing).

use crate::db::repository::RepoError;
use shared::order::OrderStatus;
use shared::{AppError, ErrorCode};
use thiserror::Error;

/// Domain errors of the reservation & settlement engine
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    #[error("Product is not sellable: {0}")]
    ProductInactive(i64),

    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: i64,
        requested: i64,
        available: i64,
    },

    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    #[error("Operation not valid while order is {current}")]
    InvalidState { current: OrderStatus },

    #[error("Stock hold has expired")]
    HoldExpired,

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] RepoError),
}

/// Result type for engine operations
pub type CheckoutResult<T> = Result<T, CheckoutError>;

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        CheckoutError::Storage(RepoError::from(err))
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::ProductNotFound(id) => {
                AppError::with_message(ErrorCode::ProductNotFound, format!("Product {id} not found"))
                    .with_detail("product_id", id)
            }
            CheckoutError::ProductInactive(id) => AppError::with_message(
                ErrorCode::ProductInactive,
                format!("Product {id} is not sellable"),
            )
            .with_detail("product_id", id),
            CheckoutError::InsufficientStock {
                product_id,
                requested,
                available,
            } => AppError::with_message(
                ErrorCode::InsufficientStock,
                format!(
                    "Insufficient stock for product {product_id}: requested {requested}, available {available}"
                ),
            )
            .with_detail("product_id", product_id)
            .with_detail("requested", requested)
            .with_detail("available", available),
            CheckoutError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, format!("Order {id} not found"))
                    .with_detail("order_id", id)
            }
            CheckoutError::InvalidState { current } => AppError::with_message(
                ErrorCode::InvalidOrderState,
                format!("Operation not valid while order is {current}"),
            )
            .with_detail("current_status", current.as_str()),
            CheckoutError::HoldExpired => AppError::new(ErrorCode::HoldExpired),
            CheckoutError::Validation(msg) => AppError::validation(msg),
            CheckoutError::Storage(e) => match e {
                RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
                RepoError::Validation(msg) => AppError::validation(msg),
                RepoError::Database(msg) => AppError::database(msg),
            },
        }
    }
}
