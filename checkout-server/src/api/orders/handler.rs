//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use shared::order::{CancelOrderRequest, CreateOrderRequest, OrderView};
use shared::{ApiResponse, AppError, AppResult, ErrorCode};

use crate::core::ServerState;
use crate::db::repository;
use crate::utils::ok;

/// POST /api/orders - 创建订单（校验并预留库存）
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderView>>> {
    let view = state
        .checkout
        .create_order(payload.user_id, &payload.items)
        .await?;
    Ok(ok(view))
}

/// GET /api/orders/:id - 获取单个订单（含明细）
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<OrderView>>> {
    let order = repository::order::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::OrderNotFound, format!("Order {id} not found"))
                .with_detail("order_id", id)
        })?;
    let lines = repository::order::find_lines(state.pool(), id).await?;
    Ok(ok(OrderView::from_parts(order, lines)))
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    /// Restrict the listing to one user's orders
    pub user_id: Option<i64>,
}

/// GET /api/orders?user_id= - 订单列表（最新优先）
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListOrdersQuery>,
) -> AppResult<Json<ApiResponse<Vec<OrderView>>>> {
    let orders = match query.user_id {
        Some(user_id) => repository::order::find_by_user(state.pool(), user_id).await?,
        None => repository::order::find_all(state.pool()).await?,
    };

    let mut views = Vec::with_capacity(orders.len());
    for order in orders {
        let lines = repository::order::find_lines(state.pool(), order.id).await?;
        views.push(OrderView::from_parts(order, lines));
    }
    Ok(ok(views))
}

/// POST /api/orders/:id/pay - 支付确认，结算订单
pub async fn pay(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<OrderView>>> {
    let view = state.checkout.settle(id).await?;
    Ok(ok(view))
}

/// POST /api/orders/:id/cancel - 人工取消（仅 HELD 订单）
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    payload: Option<Json<CancelOrderRequest>>,
) -> AppResult<Json<ApiResponse<OrderView>>> {
    let actor = payload.as_ref().and_then(|p| p.actor.as_deref());
    let view = state.checkout.cancel(id, actor).await?;
    Ok(ok(view))
}
