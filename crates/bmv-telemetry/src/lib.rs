//! # BMV Telemetry
//!
//! Logging and metrics for the BTP block message verifier.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` with an `EnvFilter` and either a
//!   human-readable or JSON formatter
//! - **Metrics**: Prometheus counters, gauges and histograms in a dedicated
//!   registry, rendered with [`gather_metrics`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bmv_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     init_telemetry(&TelemetryConfig::from_env()).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BMV_SERVICE_NAME` | `btp-bmv` | Service name in logs |
//! | `BMV_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `BMV_CONSOLE_OUTPUT` | `true` | Write log lines |
//! | `BMV_JSON_LOGS` | `false` | JSON formatted logs |

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{init_logging, init_test_logging};
pub use metrics::{
    gather_metrics, register_metrics, BLOCK_UPDATES_VERIFIED, LINK_HEIGHT, MESSAGES_EXTRACTED,
    QUORUM_SIGNATURES, RELAY_MESSAGES, VALIDATOR_ROTATIONS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// A metric could not be registered or encoded.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Configuration rejected.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install the global log subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
