//! 工具模块 - 日志和响应辅助
//!
//! Error types live in `shared::error` and are re-exported here so server
//! code has one import path.

pub mod logger;

use axum::Json;
use serde::Serialize;

// Re-export error types from shared
pub use shared::{ApiResponse, AppError, AppResult, ErrorCode};

/// Create a successful response envelope
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::ok(data))
}
