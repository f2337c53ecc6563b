//! Block fixtures for driving the lifecycle hooks outside a node.
//!
//! A fixture carries the four request/response pairs of one block plus the
//! call frames the tracer would have recorded for each transaction.
//! `replay_block` seeds a fresh transient store per transaction the way
//! the host tracer does, then calls the hooks in order.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adapters::memory_store::InMemoryKvStore;
use crate::domain::abci::{
    RequestBeginBlock, RequestDeliverTx, RequestEndBlock, ResponseBeginBlock, ResponseCommit,
    ResponseDeliverTx, ResponseEndBlock,
};
use crate::domain::{encode_call_frames, trace_key, CallFrame, CURRENT_TRACER_KEY};
use crate::error::StreamingError;
use crate::ports::inbound::{BlockStreamingApi, StreamingContext};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TxFixture {
    pub request: RequestDeliverTx,
    #[serde(default)]
    pub response: ResponseDeliverTx,
    #[serde(default)]
    pub call_frames: Vec<CallFrame>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockFixture {
    pub begin_request: RequestBeginBlock,
    #[serde(default)]
    pub begin_response: ResponseBeginBlock,
    #[serde(default)]
    pub txs: Vec<TxFixture>,
    pub end_request: RequestEndBlock,
    #[serde(default)]
    pub end_response: ResponseEndBlock,
    #[serde(default)]
    pub commit: ResponseCommit,
}

/// Parse a JSON array of block fixtures.
pub fn parse_fixtures(json: &str) -> Result<Vec<BlockFixture>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Run one fixture through the lifecycle hooks.
pub fn replay_block<S: BlockStreamingApi + ?Sized>(
    service: &mut S,
    block: BlockFixture,
    tracer_id: &[u8],
) -> Result<(), StreamingError> {
    let height = block.begin_request.header.height;
    let detached = StreamingContext::detached();

    service.listen_begin_block(&detached, block.begin_request, block.begin_response)?;

    let mut store = InMemoryKvStore::new();
    for tx in block.txs {
        store.clear();
        if !tx.call_frames.is_empty() {
            store.put(CURRENT_TRACER_KEY, tracer_id);
            store.put(&trace_key(height, tracer_id), &encode_call_frames(&tx.call_frames)?);
        }
        debug!(height, frames = tx.call_frames.len(), "Seeded transient store");
        service.listen_deliver_tx(&StreamingContext::new(&store), tx.request, tx.response)?;
    }

    service.listen_end_block(&detached, block.end_request, block.end_response)?;
    service.listen_commit(&detached, block.commit)
}
