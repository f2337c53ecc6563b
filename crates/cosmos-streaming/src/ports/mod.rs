//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - lifecycle API the host calls
//! - Driven Ports (outbound) - host store, sink, and listener hooks

pub mod inbound;
pub mod outbound;

pub use inbound::{BlockStreamingApi, ListenerMap, StreamingContext};
pub use outbound::{ClientConnector, KvStore, SnifferClient, StoreKey, SyncStatus, WriteListener};
