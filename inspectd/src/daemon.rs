//! Daemon: Main runtime orchestrator.
//!
//! The Daemon ties together all components:
//! - Action Registry (event type → action)
//! - Job Runner (background execution)
//! - Event Bus (job lifecycle notifications)
//! - API Server (HTTP endpoints)
//!
//! # Lifecycle
//!
//! 1. Load configuration
//! 2. Initialize components and build the dispatch table
//! 3. Start API server
//! 4. Main event loop (log job lifecycle)
//! 5. Graceful shutdown on SIGINT, a `Shutdown` event, or cancellation

use std::net::SocketAddr;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use inspect_exec::{
    ActionRegistry, ColumnDescriptiveMetricsAction, StubBatchInspector, StubDataContext,
};
use inspect_store::{MemoryStore, MetricRunRepository};

use crate::api::{create_router, ApiState};
use crate::config::{Config, Environment};
use crate::error::{DaemonError, DaemonResult};
use crate::event_bus::{DaemonEvent, EventBus};
use crate::job_runner::{JobRunner, JobStatus};

/// Datasource registered by the stub daemon outside production.
pub const DEMO_DATASOURCE: &str = "demo_db";
/// Asset registered under [`DEMO_DATASOURCE`].
pub const DEMO_ASSET: &str = "orders";

// =============================================================================
// Daemon
// =============================================================================

/// The main inspect daemon.
pub struct Daemon<R: MetricRunRepository + 'static> {
    /// Configuration
    config: Config,
    /// Job runner
    runner: Arc<JobRunner>,
    /// Event bus
    event_bus: Arc<EventBus>,
    /// Artifact store
    repository: Arc<R>,
    /// Cancels the main loop and the runner
    shutdown_token: CancellationToken,
}

impl Daemon<MemoryStore> {
    /// Create a new daemon with stub collaborators (for testing/development).
    ///
    /// Fails in production, where no data context backend is available.
    pub fn new_stub(config: Config) -> DaemonResult<Self> {
        if config.environment == Environment::Production {
            return Err(DaemonError::Config(
                "no data context backend configured for production".to_string(),
            ));
        }

        let context = Arc::new(StubDataContext::new());
        context.add_asset(DEMO_DATASOURCE, DEMO_ASSET, "demo-orders");
        context.add_batch(DEMO_DATASOURCE, DEMO_ASSET, "demo-batch-1");
        let inspector = Arc::new(StubBatchInspector::new(
            &["id", "customer_id", "amount"],
            Decimal::new(1000, 0),
        ));
        let store = Arc::new(MemoryStore::new());

        let registry = ActionRegistry::new().register(Arc::new(
            ColumnDescriptiveMetricsAction::new(context, inspector, store.clone()),
        ));

        Self::new(config, Arc::new(registry), store)
    }
}

impl<R: MetricRunRepository + 'static> Daemon<R> {
    /// Create a new daemon around a dispatch table and artifact store.
    ///
    /// Fails if the runner limits in `config` are out of range.
    pub fn new(
        config: Config,
        registry: Arc<ActionRegistry>,
        repository: Arc<R>,
    ) -> DaemonResult<Self> {
        config.validate()?;

        let event_bus = Arc::new(EventBus::new(config.runner.event_bus_capacity));
        let shutdown_token = CancellationToken::new();
        let runner = Arc::new(JobRunner::new(
            registry,
            event_bus.clone(),
            config.runner.max_concurrent_jobs,
            shutdown_token.child_token(),
        )
        .with_retention(config.runner.retained_jobs));

        Ok(Self {
            config,
            runner,
            event_bus,
            repository,
            shutdown_token,
        })
    }

    /// Job runner shared with the API.
    pub fn runner(&self) -> &Arc<JobRunner> {
        &self.runner
    }

    /// Event bus carrying job lifecycle events.
    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// Token that stops the daemon when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Run the daemon.
    ///
    /// This method blocks until shutdown is requested.
    pub async fn run(self) -> DaemonResult<()> {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            environment = %self.config.environment,
            event_types = ?self.runner.registry().event_types(),
            "Starting inspect daemon"
        );

        // 1. Subscribe before anything can publish
        let mut event_receiver = self.event_bus.subscribe();

        // 2. Start API server
        let api_addr = self.start_api_server().await?;
        info!(%api_addr, "API server started");

        // 3. Main event loop
        info!("Entering main event loop");
        loop {
            tokio::select! {
                event_result = event_receiver.recv() => {
                    match event_result {
                        Some(Ok(event)) => match self.handle_event(event) {
                            Err(DaemonError::Shutdown) => break,
                            Err(e) => error!(error = %e, "Error handling event"),
                            Ok(()) => {},
                        },
                        Some(Err(lag_msg)) => {
                            warn!(%lag_msg, "Event receiver lagged");
                        },
                        None => break,
                    }
                }

                _ = self.shutdown_token.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }

                // Handle shutdown signals
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        // 4. Graceful shutdown
        self.shutdown().await
    }

    /// Start the API server.
    async fn start_api_server(&self) -> DaemonResult<SocketAddr> {
        let state = Arc::new(ApiState {
            runner: self.runner.clone(),
            repository: self.repository.clone(),
        });

        let router = create_router(state);
        let addr = format!("{}:{}", self.config.api.host, self.config.api.port);

        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            DaemonError::Config(format!("Failed to bind to {}: {}", addr, e))
        })?;

        let local_addr = listener.local_addr().map_err(|e| {
            DaemonError::Config(format!("Failed to get local address: {}", e))
        })?;

        let shutdown = self.shutdown_token.clone();
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
            {
                error!(error = %e, "API server error");
            }
        });

        Ok(local_addr)
    }

    /// Handle an event from the event bus.
    fn handle_event(&self, event: DaemonEvent) -> DaemonResult<()> {
        match event {
            DaemonEvent::JobSubmitted { id, event, .. } => {
                info!(%id, event_type = %event.event_type(), "Job submitted");
            },

            DaemonEvent::JobStarted { id, event_type, .. } => {
                info!(%id, %event_type, "Job started");
            },

            DaemonEvent::JobCompleted(completion) => match completion.status {
                JobStatus::Completed { result } => {
                    info!(
                        id = %completion.id,
                        event_type = %completion.event_type,
                        created = result.created_resources.len(),
                        "Job completed"
                    );
                },
                JobStatus::Failed { error_type, error_message } => {
                    warn!(
                        id = %completion.id,
                        event_type = %completion.event_type,
                        %error_type,
                        %error_message,
                        "Job failed"
                    );
                },
                other => {
                    warn!(id = %completion.id, status = ?other, "Job completed in non-terminal state");
                },
            },

            DaemonEvent::Shutdown => {
                info!("Shutdown event received");
                return Err(DaemonError::Shutdown);
            },
        }

        Ok(())
    }

    /// Graceful shutdown.
    async fn shutdown(&self) -> DaemonResult<()> {
        info!("Initiating graceful shutdown");

        // Stops new submissions and abandons jobs still waiting for a slot
        self.runner.shutdown();
        self.shutdown_token.cancel();

        let pending = self.runner.pending_count().await;
        info!(pending_jobs = pending, "Shutdown complete");

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
