//! # Call Frames
//!
//! Execution trace entries recorded by the host's EVM tracer during
//! transaction delivery, and the binary layout they are stored in.
//!
//! ## Storage Layout
//!
//! The tracer writes into the transient store:
//!
//! ```text
//! call_trace/current              -> tracer id (opaque bytes)
//! call_trace/<height>/<tracer id> -> bincode(Vec<CallFrame>)
//! ```
//!
//! Blobs use bincode with fixed-width little-endian integers. Trailing bytes
//! are rejected and decoding is size-limited, so a malformed blob fails
//! closed instead of allocating or panicking.

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::error::TraceError;

/// Key holding the tracer id for the block currently being executed.
pub const CURRENT_TRACER_KEY: &[u8] = b"call_trace/current";

/// Prefix shared by every call-trace key.
pub const TRACE_KEY_PREFIX: &[u8] = b"call_trace/";

/// Default upper bound for a single call-frame blob (16 MiB).
pub const DEFAULT_MAX_TRACE_BLOB_BYTES: u64 = 16 * 1024 * 1024;

/// One recorded contract call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallFrame {
    /// Index of the transaction within the EVM block.
    pub tx_index: u32,
    /// Call depth, 0 for the top-level call.
    pub depth: u32,
    /// Call type (CALL, DELEGATECALL, STATICCALL, CREATE, ...).
    pub call_type: String,
    pub from: String,
    pub to: String,
    /// Transferred value as a decimal string.
    pub value: String,
    /// Gas limit of the frame.
    pub gas: u64,
    pub gas_used: u64,
    pub input: Vec<u8>,
    pub output: Vec<u8>,
    pub error: String,
    pub revert_reason: String,
}

/// Derive the store key for the frames of `tracer_id` at `block_height`.
pub fn trace_key(block_height: i64, tracer_id: &[u8]) -> Vec<u8> {
    let height = block_height.to_string();
    let mut key = Vec::with_capacity(TRACE_KEY_PREFIX.len() + height.len() + 1 + tracer_id.len());
    key.extend_from_slice(TRACE_KEY_PREFIX);
    key.extend_from_slice(height.as_bytes());
    key.push(b'/');
    key.extend_from_slice(tracer_id);
    key
}

fn codec(limit: u64) -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(limit)
}

/// Decode a stored blob into call frames.
///
/// An empty blob means the tracer recorded nothing.
pub fn decode_call_frames(blob: &[u8], max_bytes: u64) -> Result<Vec<CallFrame>, TraceError> {
    if blob.is_empty() {
        return Ok(Vec::new());
    }
    if blob.len() as u64 > max_bytes {
        return Err(TraceError::Decode(format!(
            "blob of {} bytes exceeds limit of {max_bytes}",
            blob.len()
        )));
    }
    codec(max_bytes)
        .deserialize(blob)
        .map_err(|e| TraceError::Decode(e.to_string()))
}

/// Encode call frames the way the tracer stores them.
pub fn encode_call_frames(frames: &[CallFrame]) -> Result<Vec<u8>, TraceError> {
    codec(DEFAULT_MAX_TRACE_BLOB_BYTES)
        .serialize(frames)
        .map_err(|e| TraceError::Encode(e.to_string()))
}
