//! Unified error handling for the checkout platform
//!
//! Error codes are shared between the server and any client so that the
//! presentation layer can map every failure to a distinct signal instead
//! of string-matching messages.

mod codes;
mod http;
mod types;

pub use codes::ErrorCode;
pub use types::{ApiResponse, AppError, AppResult};
