//! Health API Handler

use axum::{Json, extract::State};
use serde::Serialize;

use shared::{ApiResponse, AppError, AppResult};

use crate::checkout::sweeper::SweeperStatsSnapshot;
use crate::core::ServerState;
use crate::utils::ok;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub environment: String,
    /// Aggregate expiration sweeper counters
    pub sweeper: SweeperStatsSnapshot,
}

/// GET /api/health - 健康检查（数据库连通性 + 清扫计数器）
pub async fn health(State(state): State<ServerState>) -> AppResult<Json<ApiResponse<HealthStatus>>> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(state.pool())
        .await
        .map_err(|e| AppError::database(format!("Database ping failed: {e}")))?;

    Ok(ok(HealthStatus {
        status: "ok",
        environment: state.config.environment.clone(),
        sweeper: state.sweeper_stats.snapshot(),
    }))
}
