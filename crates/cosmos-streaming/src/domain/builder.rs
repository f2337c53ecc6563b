//! # Snapshot Builder
//!
//! Fluent, single-use assembly of a `CosmosSnapshot`.
//!
//! The builder does no validation; callers hand it records that are already
//! normalized. `finish` consumes the builder, so nothing can be appended to
//! a snapshot after it has been produced.
//!
//! ```ignore
//! let mut builder = CosmosCtxBuilder::new();
//! builder
//!     .set_block(block)
//!     .append_txs(txs)
//!     .set_block_data("100", "ab12...")
//!     .set_statistics(1, 2, 0, 0);
//! let snapshot = builder.finish();
//! ```

use super::snapshot::{
    Block, BlockData, CosmosSnapshot, Event, EventAttribute, EvmCallTrace, Misbehavior,
    Statistics, Transaction, ValidatorUpdate, VoteInfo,
};

#[derive(Debug, Default)]
pub struct CosmosCtxBuilder {
    inner: CosmosSnapshot,
}

impl CosmosCtxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_block(&mut self, block: Block) -> &mut Self {
        self.inner.block = block;
        self
    }

    pub fn append_events(&mut self, events: impl IntoIterator<Item = Event>) -> &mut Self {
        self.inner.events.extend(events);
        self
    }

    pub fn append_event_attributes(
        &mut self,
        attributes: impl IntoIterator<Item = EventAttribute>,
    ) -> &mut Self {
        self.inner.event_attributes.extend(attributes);
        self
    }

    pub fn append_validator_updates(
        &mut self,
        updates: impl IntoIterator<Item = ValidatorUpdate>,
    ) -> &mut Self {
        self.inner.validator_updates.extend(updates);
        self
    }

    pub fn append_vote_infos(&mut self, votes: impl IntoIterator<Item = VoteInfo>) -> &mut Self {
        self.inner.vote_infos.extend(votes);
        self
    }

    pub fn append_misbehaviors(
        &mut self,
        misbehaviors: impl IntoIterator<Item = Misbehavior>,
    ) -> &mut Self {
        self.inner.misbehaviors.extend(misbehaviors);
        self
    }

    pub fn append_txs(&mut self, txs: impl IntoIterator<Item = Transaction>) -> &mut Self {
        self.inner.transactions.extend(txs);
        self
    }

    pub fn append_evm_call_traces(
        &mut self,
        traces: impl IntoIterator<Item = EvmCallTrace>,
    ) -> &mut Self {
        self.inner.call_traces.extend(traces);
        self
    }

    pub fn set_block_data(
        &mut self,
        block_id: impl Into<String>,
        block_hash: impl Into<String>,
    ) -> &mut Self {
        self.inner.block_data = BlockData {
            block_id: block_id.into(),
            block_hash: block_hash.into(),
        };
        self
    }

    pub fn set_statistics(
        &mut self,
        blocks: u64,
        transactions: u64,
        events: u64,
        call_traces: u64,
    ) -> &mut Self {
        self.inner.statistics = Statistics {
            blocks,
            transactions,
            events,
            call_traces,
        };
        self
    }

    /// Produce the immutable snapshot.
    pub fn finish(self) -> CosmosSnapshot {
        self.inner
    }
}
