//! 服务器配置
//!
//! # 环境变量
//!
//! 所有配置项都可以通过环境变量覆盖：
//!
//! | 环境变量 | 默认值 | 说明 |
//! |----------|--------|------|
//! | WORK_DIR | /var/lib/checkout | 工作目录 |
//! | HTTP_PORT | 3000 | HTTP 服务端口 |
//! | ENVIRONMENT | development | 运行环境 |
//! | RESERVATION_TTL_MINUTES | 10 | 库存预留 TTL（分钟） |
//! | SWEEP_INTERVAL_SECS | 60 | 过期清扫周期（秒） |
//! | SWEEP_INITIAL_DELAY_SECS | 30 | 清扫启动延迟（秒） |
//! | SWEEP_BATCH_SIZE | 100 | 单次清扫最大订单数 |
//!
//! # 示例
//!
//! ```ignore
//! WORK_DIR=/data/checkout HTTP_PORT=8080 cargo run
//! ```

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,

    // === 预留与清扫配置 ===
    /// 库存预留 TTL（分钟），超时后订单可被清扫回收
    pub reservation_ttl_minutes: u64,
    /// 清扫周期（秒）
    pub sweep_interval_secs: u64,
    /// 进程启动后首次清扫的延迟（秒）
    pub sweep_initial_delay_secs: u64,
    /// 单次清扫处理的最大订单数
    pub sweep_batch_size: i64,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/checkout".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),

            reservation_ttl_minutes: std::env::var("RESERVATION_TTL_MINUTES")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10),
            sweep_interval_secs: std::env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(60),
            sweep_initial_delay_secs: std::env::var("SWEEP_INITIAL_DELAY_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30),
            sweep_batch_size: std::env::var("SWEEP_BATCH_SIZE")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(100),
        }
    }

    /// 数据库目录 (work_dir/database)
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// 数据库文件路径
    pub fn database_path(&self) -> PathBuf {
        self.database_dir().join("checkout.db")
    }

    /// 日志目录 (work_dir/logs)
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.log_dir())?;
        Ok(())
    }

    /// 预留持有时长
    pub fn hold_ttl(&self) -> Duration {
        Duration::from_secs(self.reservation_ttl_minutes * 60)
    }

    /// 清扫周期
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// 清扫启动延迟
    pub fn sweep_initial_delay(&self) -> Duration {
        Duration::from_secs(self.sweep_initial_delay_secs)
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
