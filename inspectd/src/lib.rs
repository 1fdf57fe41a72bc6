//! Inspect Daemon Library
//!
//! Local host for the action dispatch table.
//!
//! # Architecture
//!
//! ```text
//! HTTP API → Job Runner → ActionRegistry → Action → Store
//!                 ↓
//!            Event Bus (job lifecycle)
//!                 ↓
//!              Daemon (logging, shutdown)
//! ```
//!
//! # Components
//!
//! - **Daemon**: Main runtime orchestrator
//! - **Job Runner**: Bounded background execution with status tracking
//! - **Event Bus**: Internal communication (job submitted, started, completed)
//! - **API**: HTTP endpoints for running events and reading artifacts
//! - **Config**: Environment-based configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use inspectd::{Config, Daemon};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env().expect("Failed to load config");
//!     let daemon = Daemon::new_stub(config).expect("Failed to build daemon");
//!     daemon.run().await.expect("Daemon error");
//! }
//! ```

#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod daemon;
pub mod error;
pub mod event_bus;
pub mod job_runner;

// Re-exports for convenience
pub use api::{create_router, ApiState};
pub use config::{ApiConfig, Config, Environment, LogFormat, RunnerConfig};
pub use daemon::{Daemon, DEMO_ASSET, DEMO_DATASOURCE};
pub use error::{DaemonError, DaemonResult};
pub use event_bus::{DaemonEvent, EventBus, EventReceiver, JobCompletion};
pub use job_runner::{JobRunner, JobStatus};
