//! Error types for the streaming service
//!
//! None of these ever leave a lifecycle hook: the hooks log them and return
//! success so a sniffer problem can never stall consensus.

use thiserror::Error;

/// Failure reading the host's side key-value store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Store read failed: {0}")]
pub struct StoreError(pub String);

/// Errors from the call-trace store reader
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("Trace store error: {0}")]
    Store(#[from] StoreError),

    #[error("Malformed call-frame blob: {0}")]
    Decode(String),

    #[error("Call-frame encoding failed: {0}")]
    Encode(String),
}

/// Errors from the sink gateway
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SinkError {
    #[error("Sniffer is disabled")]
    Disabled,

    #[error("Sink connection failed: {0}")]
    Connect(String),
}

/// Errors surfaced by the streaming service API
#[derive(Debug, Error)]
pub enum StreamingError {
    #[error("Call trace error: {0}")]
    Trace(#[from] TraceError),

    #[error("No Tokio runtime available to run the delivery worker")]
    NoRuntime,

    #[error("Invalid configuration: {0}")]
    Config(String),
}
