//! Daemon configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{DaemonError, DaemonResult};
use std::env;
use std::str::FromStr;
use tokio::sync::Semaphore;

/// Upper bound for `INSPECT_MAX_CONCURRENT_JOBS`.
pub const MAX_CONCURRENT_JOBS_LIMIT: usize = Semaphore::MAX_PERMITS;
/// Upper bound for `INSPECT_EVENT_BUS_CAPACITY`; the ring is allocated up front.
pub const EVENT_BUS_CAPACITY_LIMIT: usize = 1 << 20;
/// Upper bound for `INSPECT_RETAINED_JOBS`.
pub const RETAINED_JOBS_LIMIT: usize = 1_000_000;

// =============================================================================
// Configuration
// =============================================================================

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Job runner configuration
    pub runner: RunnerConfig,

    /// Log output format
    pub log_format: LogFormat,

    /// Environment (test, development, production)
    pub environment: Environment,
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

/// Job runner configuration.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Maximum number of actions running at once
    pub max_concurrent_jobs: usize,
    /// Event bus buffer size before slow receivers start lagging
    pub event_bus_capacity: usize,
    /// Finished jobs kept for status queries before the oldest are dropped
    pub retained_jobs: usize,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    Pretty,
    /// One JSON object per line
    Json,
}

/// Environment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Test environment (uses stubs)
    Test,
    /// Development environment (uses stubs with sample data)
    Development,
    /// Production environment
    Production,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> DaemonResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DaemonResult<Self> {
        let environment = load_environment(&lookup)?;
        let api = load_api_config(&lookup)?;
        let runner = load_runner_config(&lookup)?;
        let log_format = load_log_format(&lookup)?;

        Ok(Self {
            api,
            runner,
            log_format,
            environment,
        })
    }

    /// Create test configuration.
    pub fn test() -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
            },
            runner: RunnerConfig {
                max_concurrent_jobs: 2,
                event_bus_capacity: 100,
                retained_jobs: 100,
            },
            log_format: LogFormat::Pretty,
            environment: Environment::Test,
        }
    }

    /// Check runner limits against the ranges the runtime accepts.
    pub fn validate(&self) -> DaemonResult<()> {
        check_range(
            "INSPECT_MAX_CONCURRENT_JOBS",
            self.runner.max_concurrent_jobs,
            MAX_CONCURRENT_JOBS_LIMIT,
        )?;
        check_range(
            "INSPECT_EVENT_BUS_CAPACITY",
            self.runner.event_bus_capacity,
            EVENT_BUS_CAPACITY_LIMIT,
        )?;
        check_range("INSPECT_RETAINED_JOBS", self.runner.retained_jobs, RETAINED_JOBS_LIMIT)
    }
}

// =============================================================================
// Loaders
// =============================================================================

fn load_environment(lookup: &impl Fn(&str) -> Option<String>) -> DaemonResult<Environment> {
    let env_str = lookup("INSPECT_ENV").unwrap_or_else(|| "development".to_string());

    match env_str.to_lowercase().as_str() {
        "test" => Ok(Environment::Test),
        "development" | "dev" => Ok(Environment::Development),
        "production" | "prod" => Ok(Environment::Production),
        other => Err(DaemonError::Config(format!(
            "Invalid INSPECT_ENV: {}. Expected: test, development, production",
            other
        ))),
    }
}

fn load_api_config(lookup: &impl Fn(&str) -> Option<String>) -> DaemonResult<ApiConfig> {
    let host = lookup("INSPECT_API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
    let port = load_parsed(lookup, "INSPECT_API_PORT", 8080u16)?;

    Ok(ApiConfig { host, port })
}

fn load_runner_config(lookup: &impl Fn(&str) -> Option<String>) -> DaemonResult<RunnerConfig> {
    let max_concurrent_jobs = load_bounded(
        lookup,
        "INSPECT_MAX_CONCURRENT_JOBS",
        4,
        MAX_CONCURRENT_JOBS_LIMIT,
    )?;
    let event_bus_capacity = load_bounded(
        lookup,
        "INSPECT_EVENT_BUS_CAPACITY",
        1000,
        EVENT_BUS_CAPACITY_LIMIT,
    )?;
    let retained_jobs =
        load_bounded(lookup, "INSPECT_RETAINED_JOBS", 10_000, RETAINED_JOBS_LIMIT)?;

    Ok(RunnerConfig {
        max_concurrent_jobs,
        event_bus_capacity,
        retained_jobs,
    })
}

fn load_log_format(lookup: &impl Fn(&str) -> Option<String>) -> DaemonResult<LogFormat> {
    match lookup("INSPECT_LOG_FORMAT") {
        Some(val) => LogFormat::from_str(&val),
        None => Ok(LogFormat::Pretty),
    }
}

fn load_parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> DaemonResult<T> {
    match lookup(key) {
        Some(val) => val
            .parse::<T>()
            .map_err(|_| DaemonError::Config(format!("Invalid {} value: {}", key, val))),
        None => Ok(default),
    }
}

fn load_bounded(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: usize,
    max: usize,
) -> DaemonResult<usize> {
    let value = load_parsed(lookup, key, default)?;
    check_range(key, value, max)?;
    Ok(value)
}

fn check_range(key: &str, value: usize, max: usize) -> DaemonResult<()> {
    if value == 0 || value > max {
        return Err(DaemonError::Config(format!(
            "{} must be between 1 and {}, got {}",
            key, max, value
        )));
    }
    Ok(())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            runner: RunnerConfig {
                max_concurrent_jobs: 4,
                event_bus_capacity: 1000,
                retained_jobs: 10_000,
            },
            log_format: LogFormat::Pretty,
            environment: Environment::Development,
        }
    }
}

impl FromStr for LogFormat {
    type Err = DaemonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(DaemonError::Config(format!(
                "Invalid INSPECT_LOG_FORMAT: {}. Expected: pretty, json",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Test => write!(f, "test"),
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
