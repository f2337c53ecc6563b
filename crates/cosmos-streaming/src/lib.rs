//! # Cosmos Block Streaming (cosmos-streaming)
//!
//! Observes the ABCI block lifecycle of a Cosmos SDK application and turns
//! each block into one `CosmosSnapshot` for an external analysis sink.
//!
//! ## Lifecycle
//!
//! ```text
//! BeginBlock ──→ ┐
//! DeliverTx* ──→ ├──→ BlockMetadata ──Commit──→ CosmosCtxBuilder ──→ Sniffer
//! EndBlock ────→ ┘        ↑
//!                 call frames from the transient store
//! ```
//!
//! ## Guarantees
//!
//! | Property | Behavior |
//! |----------|----------|
//! | Block isolation | BeginBlock replaces the block record wholesale |
//! | Order | Transactions and events keep host delivery order |
//! | Inert sink | Absent or unready sink: Commit does no assembly |
//! | Non-blocking commit | Queued delivery drops the oldest snapshot when full |
//! | Host safety | Lifecycle hooks always return `Ok(())` |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Host types, block record, snapshot records, builder, config
//! - `ports/` - Port traits (inbound lifecycle API, outbound store/sink)
//! - `adapters/` - Mapping, trace reader, sink gateway, delivery
//! - `service/` - The block accumulator implementing the lifecycle API
//! - `replay` - JSON block fixtures driven through the hooks
//!
//! ## Usage
//!
//! ```ignore
//! use cosmos_streaming::{Sniffer, StreamingConfig, StreamingService};
//!
//! let config = StreamingConfig::from_env()?;
//! let sniffer = Sniffer::new(config.enabled, connector);
//! let mut service = StreamingService::new(config, Some(Arc::new(sniffer)));
//! service.stream()?;
//!
//! service.listen_begin_block(&ctx, req, res)?;
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod replay;
pub mod service;

pub use adapters::{InMemoryKvStore, JsonLinesClient, MemoryListener, Sniffer, StaticConnector};
pub use domain::{
    CallFrame, CallTraceScope, CosmosCtxBuilder, CosmosSnapshot, DeliveryMode, EventSequencing,
    Statistics, StreamingConfig, StreamingConfigBuilder,
};
pub use error::{SinkError, StoreError, StreamingError, TraceError};
pub use metrics::{MetricsSnapshot, StreamingMetrics};
pub use ports::{
    BlockStreamingApi, ClientConnector, KvStore, ListenerMap, SnifferClient, StoreKey,
    StreamingContext, SyncStatus, WriteListener,
};
pub use service::StreamingService;
