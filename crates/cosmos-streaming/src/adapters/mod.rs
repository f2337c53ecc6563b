//! # Adapters Module
//!
//! Concrete implementations behind the ports plus the host-shape mapping.
//!
//! ## Modules
//!
//! - `lifecycle`: host request/response → snapshot record mapping
//! - `trace_store`: call-frame reader over the transient store
//! - `memory_store`: in-memory store and write listener
//! - `sniffer`: sink gateway (readiness + memoized client)
//! - `dispatch`: inline or queued snapshot delivery
//! - `json_sink`: JSON-lines sink client

pub mod dispatch;
pub mod json_sink;
pub mod lifecycle;
pub mod memory_store;
pub mod sniffer;
pub mod trace_store;

pub use dispatch::{Delivery, DeliveryWorker, SnapshotQueue};
pub use json_sink::JsonLinesClient;
pub use lifecycle::{tx_hash, EventSequencer, ValidatorAddressCodec};
pub use memory_store::{InMemoryKvStore, MemoryListener, StoreKvPair};
pub use sniffer::{Sniffer, StaticConnector};
pub use trace_store::CallTraceReader;
