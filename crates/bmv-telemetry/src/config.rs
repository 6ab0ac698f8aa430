//! Telemetry configuration from environment variables.

use std::env;

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive
    pub log_level: String,

    /// Whether to write log lines at all
    pub console_output: bool,

    /// Whether to format log lines as JSON
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "btp-bmv".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `BMV_SERVICE_NAME`: Service name (default: btp-bmv)
    /// - `BMV_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `BMV_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `BMV_JSON_LOGS`: Enable JSON logs (default: false)
    pub fn from_env() -> Self {
        Self {
            service_name: env::var("BMV_SERVICE_NAME").unwrap_or_else(|_| "btp-bmv".to_string()),

            log_level: env::var("BMV_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("BMV_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v, true))
                .unwrap_or(true),

            json_logs: env::var("BMV_JSON_LOGS")
                .map(|v| parse_flag(&v, false))
                .unwrap_or(false),
        }
    }

    /// Debug-level configuration for tests.
    pub fn for_testing() -> Self {
        Self {
            service_name: "btp-bmv-test".to_string(),
            log_level: "debug".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

fn parse_flag(value: &str, default: bool) -> bool {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}
