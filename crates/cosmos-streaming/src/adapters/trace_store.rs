//! # Call-Trace Store Reader
//!
//! Pulls the call frames the host's EVM tracer recorded for the current
//! block out of the transient store.
//!
//! 1. Read the current tracer id; absent means nothing was traced.
//! 2. Read the blob at `trace_key(height, tracer_id)`; absent means no frames.
//! 3. Decode the blob. Malformed input is an error, never a panic.

use crate::domain::call_frame::{decode_call_frames, trace_key, CallFrame, CURRENT_TRACER_KEY};
use crate::error::TraceError;
use crate::ports::outbound::KvStore;

#[derive(Debug, Clone, Copy)]
pub struct CallTraceReader {
    max_blob_bytes: u64,
}

impl CallTraceReader {
    pub fn new(max_blob_bytes: u64) -> Self {
        Self { max_blob_bytes }
    }

    /// Read the frames stored for `block_height` under the current tracer id.
    pub fn take_call_frames(
        &self,
        store: &dyn KvStore,
        block_height: i64,
    ) -> Result<Vec<CallFrame>, TraceError> {
        let Some(tracer_id) = store.get(CURRENT_TRACER_KEY)? else {
            return Ok(Vec::new());
        };

        let key = trace_key(block_height, &tracer_id);
        match store.get(&key)? {
            Some(blob) => decode_call_frames(&blob, self.max_blob_bytes),
            None => Ok(Vec::new()),
        }
    }
}
