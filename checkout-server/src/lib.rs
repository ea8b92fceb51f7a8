//! Checkout Server - 库存预留与结算服务
//!
//! # 架构概述
//!
//! 本服务解决并发下单场景中的超卖问题：下单时临时预留库存
//! (HELD + TTL)，支付确认时在独占锁下复核并永久扣减，后台任务
//! 周期性回收过期持有。
//!
//! # 模块结构
//!
//! ```text
//! checkout-server/src/
//! ├── core/          # 配置、状态、服务器引导、后台任务
//! ├── checkout/      # 预留/结算引擎（核心不变量都在这里）
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 数据库层 (SQLite + sqlx)
//! └── utils/         # 日志等工具
//! ```

pub mod api;
pub mod checkout;
pub mod core;
pub mod db;
pub mod utils;

// Re-export 公共类型
pub use crate::checkout::{
    CheckoutEngine, CheckoutError, ExpirationSweeper, SweepOutcome, SweeperStats,
};
pub use crate::core::{Config, Server, ServerState};
pub use crate::db::DbService;
pub use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode};

// Re-export logger functions
pub use crate::utils::logger::{init_logger, init_logger_with_file};

/// 设置进程环境 (dotenv + 日志)
///
/// 必须在读取 [`Config`] 之前调用
pub fn setup_environment() {
    // .env is optional; real deployments configure through the environment
    let _ = dotenv::dotenv();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());
}

pub fn print_banner() {
    println!(
        r#"
   ________              __               __
  / ____/ /_  ___  _____/ /______  __  __/ /_
 / /   / __ \/ _ \/ ___/ //_/ __ \/ / / / __/
/ /___/ / / /  __/ /__/ ,< / /_/ / /_/ / /_
\____/_/ /_/\___/\___/_/|_|\____/\__,_/\__/
"#
    );
}
