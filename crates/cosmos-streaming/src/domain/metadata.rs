//! # Block Metadata
//!
//! The block-scoped record the streaming service fills in as the host walks
//! through BeginBlock → DeliverTx* → EndBlock → Commit.
//!
//! ## Invariants
//!
//! - A fresh record is installed at every BeginBlock; nothing from the
//!   previous block survives.
//! - `deliver_txs` keeps delivery order.
//! - End-block and commit data are each written at most once per block.

use super::abci::{
    RequestBeginBlock, RequestDeliverTx, RequestEndBlock, ResponseBeginBlock, ResponseCommit,
    ResponseDeliverTx, ResponseEndBlock,
};
use super::call_frame::CallFrame;

/// Where the service is in the current block's lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlockPhase {
    /// No block has started yet.
    #[default]
    Idle,
    /// BeginBlock seen, Commit not yet.
    InBlock,
    /// Commit handled; waiting for the next BeginBlock.
    Finalized,
}

/// One delivered transaction plus the call frames read right after it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveredTx {
    pub request: RequestDeliverTx,
    pub response: ResponseDeliverTx,
    pub call_frames: Vec<CallFrame>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeginBlockRecord {
    pub request: RequestBeginBlock,
    pub response: ResponseBeginBlock,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndBlockRecord {
    pub request: RequestEndBlock,
    pub response: ResponseEndBlock,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockMetadata {
    pub begin_block: Option<BeginBlockRecord>,
    pub deliver_txs: Vec<DeliveredTx>,
    pub end_block: Option<EndBlockRecord>,
    pub commit: Option<ResponseCommit>,
}

impl BlockMetadata {
    /// Start a new block from its BeginBlock pair.
    pub fn new_block(request: RequestBeginBlock, response: ResponseBeginBlock) -> Self {
        Self {
            begin_block: Some(BeginBlockRecord { request, response }),
            ..Default::default()
        }
    }

    /// Height from the BeginBlock header, 0 when no block has started.
    pub fn begin_height(&self) -> i64 {
        self.begin_block
            .as_ref()
            .map(|b| b.request.header.height)
            .unwrap_or(0)
    }

    /// Every frame recorded so far in this block, in ingestion order.
    pub fn block_call_frames(&self) -> impl Iterator<Item = &CallFrame> {
        self.deliver_txs.iter().flat_map(|tx| tx.call_frames.iter())
    }

    pub fn call_frame_count(&self) -> usize {
        self.deliver_txs.iter().map(|tx| tx.call_frames.len()).sum()
    }

    /// Whether the record has everything needed to emit a snapshot.
    pub fn is_complete(&self) -> bool {
        self.begin_block.is_some() && self.end_block.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abci::Header;

    fn begin(height: i64) -> RequestBeginBlock {
        RequestBeginBlock {
            header: Header {
                height,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_new_block_starts_empty() {
        let metadata = BlockMetadata::new_block(begin(5), ResponseBeginBlock::default());
        assert_eq!(metadata.begin_height(), 5);
        assert!(metadata.deliver_txs.is_empty());
        assert!(metadata.end_block.is_none());
        assert!(!metadata.is_complete());
    }

    #[test]
    fn test_default_record_has_zero_height() {
        assert_eq!(BlockMetadata::default().begin_height(), 0);
    }

    #[test]
    fn test_block_call_frames_flatten_in_order() {
        let mut metadata = BlockMetadata::new_block(begin(1), ResponseBeginBlock::default());
        for depth in [0u32, 1] {
            metadata.deliver_txs.push(DeliveredTx {
                call_frames: vec![CallFrame {
                    depth,
                    ..Default::default()
                }],
                ..Default::default()
            });
        }
        let depths: Vec<u32> = metadata.block_call_frames().map(|f| f.depth).collect();
        assert_eq!(depths, vec![0, 1]);
        assert_eq!(metadata.call_frame_count(), 2);
    }
}
