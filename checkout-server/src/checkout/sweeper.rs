//! 过期清扫调度器
//!
//! 周期性回收超过持有期限的订单：释放库存预留，状态置为 EXPIRED。
//! 注册为 `TaskKind::Periodic`，在 `Server::run()` 中启动。
//!
//! Deadlines are advisory data, not live timers: nothing happens to an
//! overdue hold until this task (or an explicit settle/cancel attempt)
//! observes it.

use super::manager::{CheckoutEngine, SweepOutcome};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use shared::util::now_millis;

// ============================================================================
// Sweeper Stats
// ============================================================================

/// Aggregate sweeper counters, exposed for observability
#[derive(Debug, Default)]
pub struct SweeperStats {
    runs: AtomicU64,
    orders_expired: AtomicU64,
    orders_failed: AtomicU64,
    last_run_millis: AtomicI64,
}

/// Point-in-time copy of [`SweeperStats`] for serialization
#[derive(Debug, Clone, Serialize)]
pub struct SweeperStatsSnapshot {
    pub runs: u64,
    pub orders_expired: u64,
    pub orders_failed: u64,
    pub last_run_millis: i64,
}

impl SweeperStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed sweep pass
    pub fn record(&self, outcome: &SweepOutcome) {
        self.runs.fetch_add(1, Ordering::Relaxed);
        self.orders_expired
            .fetch_add(outcome.succeeded, Ordering::Relaxed);
        self.orders_failed
            .fetch_add(outcome.failed, Ordering::Relaxed);
        self.last_run_millis.store(now_millis(), Ordering::Relaxed);
    }

    /// Record a pass that failed before producing an outcome
    pub fn record_error(&self) {
        self.runs.fetch_add(1, Ordering::Relaxed);
        self.last_run_millis.store(now_millis(), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SweeperStatsSnapshot {
        SweeperStatsSnapshot {
            runs: self.runs.load(Ordering::Relaxed),
            orders_expired: self.orders_expired.load(Ordering::Relaxed),
            orders_failed: self.orders_failed.load(Ordering::Relaxed),
            last_run_millis: self.last_run_millis.load(Ordering::Relaxed),
        }
    }
}

// ============================================================================
// ExpirationSweeper
// ============================================================================

/// Periodic task that reclaims expired stock holds
pub struct ExpirationSweeper {
    engine: Arc<CheckoutEngine>,
    stats: Arc<SweeperStats>,
    interval: Duration,
    initial_delay: Duration,
    batch_size: i64,
    shutdown: CancellationToken,
}

impl ExpirationSweeper {
    pub fn new(
        engine: Arc<CheckoutEngine>,
        stats: Arc<SweeperStats>,
        interval: Duration,
        initial_delay: Duration,
        batch_size: i64,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            engine,
            stats,
            interval,
            initial_delay,
            batch_size,
            shutdown,
        }
    }

    /// 主循环：启动延迟 → 周期触发
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            initial_delay_secs = self.initial_delay.as_secs(),
            batch_size = self.batch_size,
            "Expiration sweeper started"
        );

        // Initial delay keeps the sweeper out of process startup
        tokio::select! {
            _ = tokio::time::sleep(self.initial_delay) => {}
            _ = self.shutdown.cancelled() => {
                tracing::info!("Expiration sweeper stopped before first pass");
                return;
            }
        }

        loop {
            match self.engine.sweep(self.batch_size).await {
                Ok(outcome) => {
                    self.stats.record(&outcome);
                }
                Err(err) => {
                    // One failed pass must not kill the task; the next tick retries
                    self.stats.record_error();
                    tracing::error!(error = %err, "Expiration sweep pass failed");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Expiration sweeper received shutdown signal");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_accumulate_across_passes() {
        let stats = SweeperStats::new();
        stats.record(&SweepOutcome {
            succeeded: 3,
            failed: 1,
        });
        stats.record(&SweepOutcome {
            succeeded: 2,
            failed: 0,
        });
        stats.record_error();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.runs, 3);
        assert_eq!(snapshot.orders_expired, 5);
        assert_eq!(snapshot.orders_failed, 1);
        assert!(snapshot.last_run_millis > 0);
    }
}
