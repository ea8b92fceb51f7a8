//! Product API Handlers
//!
//! Catalog management only. `reserved` is never writable here, and `stock`
//! updates are guarded by the repository so they can never undercut live
//! reservations.

use axum::{
    Json,
    extract::{Path, State},
};

use shared::models::{Product, ProductCreate, ProductUpdate};
use shared::{ApiResponse, AppError, AppResult, ErrorCode};

use crate::checkout::money;
use crate::core::ServerState;
use crate::db::repository;
use crate::utils::ok;

/// GET /api/products - 获取所有在售商品
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<ApiResponse<Vec<Product>>>> {
    let products = repository::product::find_all(state.pool()).await?;
    Ok(ok(products))
}

/// GET /api/products/:id - 获取单个商品
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let product = repository::product::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::ProductNotFound, format!("Product {id} not found"))
                .with_detail("product_id", id)
        })?;
    Ok(ok(product))
}

/// POST /api/products - 创建商品
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<ApiResponse<Product>>> {
    money::validate_price(payload.price)?;
    let product = repository::product::create(state.pool(), payload).await?;
    Ok(ok(product))
}

/// PUT /api/products/:id - 更新商品
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<ApiResponse<Product>>> {
    if let Some(price) = payload.price {
        money::validate_price(price)?;
    }
    let product = repository::product::update(state.pool(), id, payload).await?;
    Ok(ok(product))
}
