//! Server Implementation
//!
//! HTTP 服务器启动和管理

use std::net::SocketAddr;
use std::time::Duration;

use shared::AppError;

use crate::api;
use crate::checkout::ExpirationSweeper;
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::{Config, ServerState};

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state (for sharing with tests/tooling)
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<(), AppError> {
        // Create application state if not provided
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config).await?,
        };

        // Register background tasks
        let mut tasks = BackgroundTasks::new();
        let sweeper = ExpirationSweeper::new(
            state.checkout.clone(),
            state.sweeper_stats.clone(),
            self.config.sweep_interval(),
            self.config.sweep_initial_delay(),
            self.config.sweep_batch_size,
            tasks.shutdown_token(),
        );
        tasks.spawn("expiration_sweeper", TaskKind::Periodic, sweeper.run());
        tasks.log_summary();

        // Build the application with middleware + state
        let app = api::build_app().with_state(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
        tracing::info!("Checkout server listening on {}", addr);

        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

        // Stop background tasks after the listener has drained
        tokio::time::timeout(Duration::from_secs(10), tasks.shutdown())
            .await
            .unwrap_or_else(|_| tracing::warn!("Background task shutdown timed out"));

        Ok(())
    }
}
