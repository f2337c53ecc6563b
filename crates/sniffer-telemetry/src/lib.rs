//! # Sniffer Telemetry
//!
//! Logging bootstrap for the replay tool and for hosts embedding the sniffer.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sniffer_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _logger = init_logging(&config).expect("Failed to init logging");
//!
//!     // Lifecycle hooks now log through the installed subscriber
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SNIFFER_SERVICE_NAME` | `cosmos-sniffer` | Service name in logs |
//! | `SNIFFER_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `SNIFFER_JSON_LOGS` | `false` | JSON output (defaults on inside containers) |
//! | `SNIFFER_LOG_TARGET` | `true` | Include module targets |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging, StructuredLogger};

#[doc(hidden)]
pub use tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to install log subscriber: {0}")]
    LoggingInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
