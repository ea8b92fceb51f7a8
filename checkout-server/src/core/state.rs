//! 服务器状态 - 持有所有服务的单例引用
//!
//! `ServerState` 是整个服务的核心数据结构，使用 `Arc` 实现浅拷贝，
//! 所有权成本极低，可以安全地在请求处理器和后台任务之间共享。

use std::sync::Arc;

use shared::AppError;
use sqlx::SqlitePool;

use crate::checkout::{CheckoutEngine, SweeperStats};
use crate::core::Config;
use crate::db::DbService;

/// Shared server state handed to every handler and background task
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | db | SQLite 连接池 |
/// | checkout | 预留/结算引擎 |
/// | sweeper_stats | 清扫任务聚合计数器 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 数据库服务
    pub db: DbService,
    /// 预留与结算引擎
    pub checkout: Arc<CheckoutEngine>,
    /// 清扫任务计数器
    pub sweeper_stats: Arc<SweeperStats>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构 (确保目录存在)
    /// 2. 数据库 (work_dir/database/checkout.db，自动迁移)
    /// 3. 预留/结算引擎
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        config
            .ensure_work_dir_structure()
            .map_err(|e| AppError::internal(format!("Failed to create work directory: {e}")))?;

        let db_path = config.database_path();
        let db = DbService::new(&db_path.to_string_lossy()).await?;

        let checkout = Arc::new(CheckoutEngine::new(db.pool.clone(), config.hold_ttl()));
        let sweeper_stats = Arc::new(SweeperStats::new());

        Ok(Self {
            config: config.clone(),
            db,
            checkout,
            sweeper_stats,
        })
    }

    /// 获取数据库连接池
    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }
}
