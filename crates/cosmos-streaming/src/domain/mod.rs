//! Domain Layer
//!
//! Pure types and logic with no I/O:
//! - `abci`: host lifecycle request/response shapes
//! - `metadata`: the block-scoped record being accumulated
//! - `call_frame`: EVM call frames and their stored layout
//! - `snapshot`: normalized records sent to the sink
//! - `builder`: single-use snapshot assembly
//! - `config`: service configuration

pub mod abci;
pub mod builder;
pub mod call_frame;
pub mod config;
pub mod metadata;
pub mod snapshot;

pub use builder::CosmosCtxBuilder;
pub use call_frame::{
    decode_call_frames, encode_call_frames, trace_key, CallFrame, CURRENT_TRACER_KEY,
};
pub use config::{
    CallTraceScope, DeliveryMode, EventSequencing, StreamingConfig, StreamingConfigBuilder,
};
pub use metadata::{BlockMetadata, BlockPhase, DeliveredTx};
pub use snapshot::{CosmosSnapshot, Statistics};
