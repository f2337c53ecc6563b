//! # Snapshot Assembly
//!
//! Folds the finished `BlockMetadata` into one `CosmosSnapshot`.
//!
//! Event order: BeginBlock events, then per transaction (in delivery
//! order) its record, its call traces and its events, then EndBlock events.

use super::StreamingService;
use crate::adapters::lifecycle::{
    block_record, call_traces, height_seq, misbehaviors, transaction, tx_hash,
    validator_updates, vote_infos, EventSequencer,
};
use crate::domain::abci;
use crate::domain::{CallTraceScope, CosmosCtxBuilder, CosmosSnapshot};

/// Running totals reported in the snapshot statistics.
#[derive(Default)]
struct Counts {
    txs: u64,
    events: u64,
    call_traces: u64,
}

impl StreamingService {
    /// Build the snapshot for the current block.
    ///
    /// Returns `None` when BeginBlock or EndBlock was never recorded.
    pub(crate) fn assemble_snapshot(&self) -> Option<CosmosSnapshot> {
        let begin = self.metadata.begin_block.as_ref()?;
        let end = self.metadata.end_block.as_ref()?;

        let seq = height_seq(end.request.height);
        let mut sequencer = EventSequencer::new(self.config.event_sequencing, seq);
        let mut counts = Counts::default();
        let mut builder = CosmosCtxBuilder::new();

        builder
            .set_block(block_record(&begin.request, end))
            .append_vote_infos(vote_infos(&begin.request.last_commit_info, seq, &self.codec))
            .append_misbehaviors(misbehaviors(
                &begin.request.byzantine_validators,
                seq,
                &self.codec,
            ))
            .append_validator_updates(validator_updates(&end.response.validator_updates, seq));

        append_events(&mut builder, &mut sequencer, &mut counts, &begin.response.events);

        for (index, delivered) in self.metadata.deliver_txs.iter().enumerate() {
            let hash = tx_hash(&delivered.request.tx);
            builder.append_txs([transaction(index, delivered, &hash, seq)]);
            counts.txs += 1;

            let traces = match self.config.call_trace_scope {
                CallTraceScope::BlockWide => {
                    call_traces(&hash, self.metadata.block_call_frames(), self.current_height)
                }
                CallTraceScope::PerTransaction => {
                    call_traces(&hash, &delivered.call_frames, self.current_height)
                }
            };
            counts.call_traces += traces.len() as u64;
            builder.append_evm_call_traces(traces);

            append_events(&mut builder, &mut sequencer, &mut counts, &delivered.response.events);
        }

        append_events(&mut builder, &mut sequencer, &mut counts, &end.response.events);

        builder
            .set_block_data(seq.to_string(), hex::encode(&begin.request.hash))
            .set_statistics(1, counts.txs, counts.events, counts.call_traces);

        Some(builder.finish())
    }
}

fn append_events(
    builder: &mut CosmosCtxBuilder,
    sequencer: &mut EventSequencer,
    counts: &mut Counts,
    events: &[abci::Event],
) {
    let (events, attributes) = sequencer.map_events(events);
    counts.events += events.len() as u64;
    builder.append_events(events).append_event_attributes(attributes);
}
