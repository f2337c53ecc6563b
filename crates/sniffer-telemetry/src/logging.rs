//! Structured logging setup.
//!
//! Logs carry consistent fields so they can be shipped and queried:
//! - `timestamp`, `level`, `target`
//! - `height`: block height for block-scoped events
//! - `hook`: lifecycle hook that emitted the event
//! - `txs`, `events`, `call_traces`: counts on the snapshot-sent line

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Handle returned once the global subscriber is installed.
pub struct StructuredLogger {
    service_name: String,
}

impl StructuredLogger {
    /// Service name the subscriber was installed for.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

/// Build the `EnvFilter` for a config without installing anything.
pub fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(format!("invalid log level '{}': {e}", config.log_level)))
}

/// Install the global tracing subscriber.
///
/// Output goes to stderr so stdout stays free for data (the replay tool
/// writes snapshots there). Fails if a global subscriber already exists.
pub fn init_logging(config: &TelemetryConfig) -> Result<StructuredLogger, TelemetryError> {
    let filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(config.with_target)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(config.with_target)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    installed.map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::debug!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Structured logging configured"
    );

    Ok(StructuredLogger {
        service_name: config.service_name.clone(),
    })
}

/// Log a block-lifecycle event with the standard `hook` and `height` fields.
///
/// ```rust,ignore
/// log_block_event!(info, "end_block", "EndBlock", height, validator_updates = 2);
/// ```
#[macro_export]
macro_rules! log_block_event {
    ($level:ident, $hook:expr, $msg:expr, $height:expr $(, $($field:tt)*)?) => {
        $crate::tracing::$level!(
            hook = $hook,
            height = $height,
            $($($field)*,)?
            $msg
        )
    };
}
