//! Inspect Daemon
//!
//! Hosts the action dispatch table behind a local HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Start with default configuration
//! cargo run -p inspectd
//!
//! # Start with custom environment
//! INSPECT_ENV=test INSPECT_API_PORT=8081 cargo run -p inspectd
//! ```
//!
//! # Environment Variables
//!
//! - `INSPECT_ENV`: Environment (test, development, production)
//! - `INSPECT_API_HOST`: API host (default: 0.0.0.0)
//! - `INSPECT_API_PORT`: API port (default: 8080)
//! - `INSPECT_MAX_CONCURRENT_JOBS`: Jobs running at once (default: 4)
//! - `INSPECT_EVENT_BUS_CAPACITY`: Event bus buffer (default: 1000)
//! - `INSPECT_LOG_FORMAT`: pretty or json (default: pretty)

use inspectd::{Config, Daemon, LogFormat};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::from_default_env().add_directive("inspectd=info".parse()?);
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        api_host = %config.api.host,
        api_port = config.api.port,
        max_concurrent_jobs = config.runner.max_concurrent_jobs,
        "Inspect Daemon"
    );

    // Create and run daemon
    let daemon = Daemon::new_stub(config)?;
    daemon.run().await?;

    Ok(())
}
