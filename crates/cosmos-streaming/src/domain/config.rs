//! Streaming service configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use cosmos_streaming::domain::StreamingConfigBuilder;
//!
//! let config = StreamingConfigBuilder::new()
//!     .enabled(true)
//!     .validator_address_prefix("evmosvaloper")
//!     .queued_delivery(128)
//!     .build()?;
//! ```

use serde::{Deserialize, Serialize};
use std::env;

use super::call_frame::DEFAULT_MAX_TRACE_BLOB_BYTES;
use crate::error::StreamingError;

/// Default bech32 prefix for validator operator addresses.
pub const DEFAULT_VALOPER_PREFIX: &str = "cosmosvaloper";

/// Default number of snapshots buffered between commit and the sink.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Largest queue the delivery worker will buffer.
pub const MAX_QUEUE_CAPACITY: usize = 1 << 16;

/// How `seq` values are assigned to events and attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventSequencing {
    /// Every event and attribute carries the block height.
    #[default]
    BlockHeight,
    /// Events get a block-local counter and attributes point at their event.
    PerEvent,
}

/// Which call frames are attached to a transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallTraceScope {
    /// Every frame recorded in the block is attached to every transaction.
    #[default]
    BlockWide,
    /// Only the frames read after a transaction's own delivery.
    PerTransaction,
}

/// How finished snapshots reach the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryMode {
    /// Call the sink on the commit path.
    Inline,
    /// Hand off to a bounded queue drained by a background worker. When the
    /// queue is full the oldest snapshot is dropped.
    Queued { capacity: usize },
}

impl Default for DeliveryMode {
    fn default() -> Self {
        DeliveryMode::Queued {
            capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Master switch for the sink readiness check
    pub enabled: bool,
    /// Bech32 prefix used to render validator addresses
    pub validator_address_prefix: String,
    pub event_sequencing: EventSequencing,
    pub call_trace_scope: CallTraceScope,
    pub delivery: DeliveryMode,
    /// Largest call-frame blob that will be decoded
    pub max_trace_blob_bytes: u64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            validator_address_prefix: DEFAULT_VALOPER_PREFIX.to_string(),
            event_sequencing: EventSequencing::default(),
            call_trace_scope: CallTraceScope::default(),
            delivery: DeliveryMode::default(),
            max_trace_blob_bytes: DEFAULT_MAX_TRACE_BLOB_BYTES,
        }
    }
}

impl StreamingConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SNIFFER_ENABLE`: Enable delivery to the sink (default: false)
    /// - `SNIFFER_VALOPER_PREFIX`: Validator address prefix (default: cosmosvaloper)
    /// - `SNIFFER_EVENT_SEQ`: `block-height` or `per-event` (default: block-height)
    /// - `SNIFFER_CALL_TRACE_SCOPE`: `block-wide` or `per-transaction` (default: block-wide)
    /// - `SNIFFER_DELIVERY`: `inline` or `queued` (default: queued)
    /// - `SNIFFER_QUEUE_CAPACITY`: Queue size for queued delivery (default: 64, max: 65536)
    /// - `SNIFFER_MAX_TRACE_BYTES`: Call-frame blob limit (default: 16 MiB)
    pub fn from_env() -> Result<Self, StreamingError> {
        let mut builder = StreamingConfigBuilder::new();

        if let Ok(v) = env::var("SNIFFER_ENABLE") {
            builder = builder.enabled(v.eq_ignore_ascii_case("true") || v == "1");
        }
        if let Ok(v) = env::var("SNIFFER_VALOPER_PREFIX") {
            builder = builder.validator_address_prefix(v);
        }
        if let Ok(v) = env::var("SNIFFER_EVENT_SEQ") {
            builder = builder.event_sequencing(parse_event_sequencing(&v)?);
        }
        if let Ok(v) = env::var("SNIFFER_CALL_TRACE_SCOPE") {
            builder = builder.call_trace_scope(parse_call_trace_scope(&v)?);
        }

        let capacity = match env::var("SNIFFER_QUEUE_CAPACITY") {
            Ok(v) => v.parse().map_err(|_| {
                StreamingError::Config(format!("SNIFFER_QUEUE_CAPACITY is not a number: {v}"))
            })?,
            Err(_) => DEFAULT_QUEUE_CAPACITY,
        };
        builder = match env::var("SNIFFER_DELIVERY").as_deref() {
            Ok("inline") => builder.inline_delivery(),
            Ok("queued") | Err(_) => builder.queued_delivery(capacity),
            Ok(other) => {
                return Err(StreamingError::Config(format!(
                    "unknown SNIFFER_DELIVERY mode: {other}"
                )))
            }
        };

        if let Ok(v) = env::var("SNIFFER_MAX_TRACE_BYTES") {
            let limit = v.parse().map_err(|_| {
                StreamingError::Config(format!("SNIFFER_MAX_TRACE_BYTES is not a number: {v}"))
            })?;
            builder = builder.max_trace_blob_bytes(limit);
        }

        builder.build()
    }

    pub fn validate(&self) -> Result<(), StreamingError> {
        let prefix = &self.validator_address_prefix;
        if prefix.is_empty() {
            return Err(StreamingError::Config(
                "validator_address_prefix cannot be empty".to_string(),
            ));
        }
        // bech32 forbids mixed case and non-printable HRP characters.
        if prefix.chars().any(|c| !('!'..='~').contains(&c)) || prefix.to_lowercase() != *prefix
        {
            return Err(StreamingError::Config(format!(
                "validator_address_prefix must be lowercase printable ASCII: {prefix}"
            )));
        }

        if let DeliveryMode::Queued { capacity } = self.delivery {
            if capacity == 0 {
                return Err(StreamingError::Config(
                    "queue capacity must be at least 1".to_string(),
                ));
            }
            if capacity > MAX_QUEUE_CAPACITY {
                return Err(StreamingError::Config(format!(
                    "queue capacity {capacity} exceeds maximum {MAX_QUEUE_CAPACITY}"
                )));
            }
        }

        if self.max_trace_blob_bytes == 0 {
            return Err(StreamingError::Config(
                "max_trace_blob_bytes cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_event_sequencing(value: &str) -> Result<EventSequencing, StreamingError> {
    match value {
        "block-height" => Ok(EventSequencing::BlockHeight),
        "per-event" => Ok(EventSequencing::PerEvent),
        other => Err(StreamingError::Config(format!(
            "unknown event sequencing: {other}"
        ))),
    }
}

fn parse_call_trace_scope(value: &str) -> Result<CallTraceScope, StreamingError> {
    match value {
        "block-wide" => Ok(CallTraceScope::BlockWide),
        "per-transaction" => Ok(CallTraceScope::PerTransaction),
        other => Err(StreamingError::Config(format!(
            "unknown call trace scope: {other}"
        ))),
    }
}

/// Builder for StreamingConfig with validation
#[derive(Default)]
pub struct StreamingConfigBuilder {
    config: StreamingConfig,
}

impl StreamingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn validator_address_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.validator_address_prefix = prefix.into();
        self
    }

    pub fn event_sequencing(mut self, sequencing: EventSequencing) -> Self {
        self.config.event_sequencing = sequencing;
        self
    }

    pub fn call_trace_scope(mut self, scope: CallTraceScope) -> Self {
        self.config.call_trace_scope = scope;
        self
    }

    pub fn inline_delivery(mut self) -> Self {
        self.config.delivery = DeliveryMode::Inline;
        self
    }

    pub fn queued_delivery(mut self, capacity: usize) -> Self {
        self.config.delivery = DeliveryMode::Queued { capacity };
        self
    }

    pub fn max_trace_blob_bytes(mut self, limit: u64) -> Self {
        self.config.max_trace_blob_bytes = limit;
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<StreamingConfig, StreamingError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
