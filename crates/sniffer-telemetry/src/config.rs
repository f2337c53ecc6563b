//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for sniffer logging.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter directive (trace, debug, info, warn, error, or a full
    /// `EnvFilter` directive such as `cosmos_streaming=debug,info`)
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Whether to include the module target in each line
    pub with_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "cosmos-sniffer".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            with_target: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SNIFFER_SERVICE_NAME`: Service name (default: cosmos-sniffer)
    /// - `SNIFFER_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `SNIFFER_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    /// - `SNIFFER_LOG_TARGET`: Include module targets (default: true)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("SNIFFER_SERVICE_NAME")
                .unwrap_or_else(|_| "cosmos-sniffer".to_string()),

            log_level: env::var("SNIFFER_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("SNIFFER_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(is_container),

            with_target: env::var("SNIFFER_LOG_TARGET")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),
        }
    }

    /// Override the log level, e.g. from a `--log-level` flag.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Force JSON output on or off.
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}
