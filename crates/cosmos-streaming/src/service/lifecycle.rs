//! # Block Streaming API Implementation
//!
//! The four lifecycle hooks plus listener registration and start/stop.

use std::sync::Arc;
use sniffer_telemetry::log_block_event;
use tracing::{debug, error, info, warn};

use super::StreamingService;
use crate::adapters::dispatch::Delivery;
use crate::domain::abci::{
    RequestBeginBlock, RequestDeliverTx, RequestEndBlock, ResponseBeginBlock, ResponseCommit,
    ResponseDeliverTx, ResponseEndBlock,
};
use crate::domain::call_frame::CallFrame;
use crate::domain::metadata::{DeliveredTx, EndBlockRecord};
use crate::domain::{BlockMetadata, BlockPhase};
use crate::error::{StreamingError, TraceError};
use crate::metrics::SkipReason;
use crate::ports::inbound::{BlockStreamingApi, ListenerMap, StreamingContext};

impl StreamingService {
    /// Frames the host recorded for the current height, empty on any failure.
    fn take_call_frames(&self, ctx: &StreamingContext<'_>) -> Vec<CallFrame> {
        let Some(store) = ctx.transient_store() else {
            return Vec::new();
        };

        match self.reader.take_call_frames(store, self.current_height) {
            Ok(frames) => frames,
            Err(e) => {
                if matches!(e, TraceError::Decode(_)) {
                    self.metrics.record_trace_decode_failure();
                }
                error!(height = self.current_height, error = %e, "Failed to read call frames");
                Vec::new()
            }
        }
    }

    fn warn_outside_block(&self, hook: &'static str) {
        if self.phase != BlockPhase::InBlock {
            warn!(
                hook,
                phase = ?self.phase,
                height = self.current_height,
                "Lifecycle hook called outside a block"
            );
        }
    }
}

impl BlockStreamingApi for StreamingService {
    fn listen_begin_block(
        &mut self,
        _ctx: &StreamingContext<'_>,
        req: RequestBeginBlock,
        res: ResponseBeginBlock,
    ) -> Result<(), StreamingError> {
        if self.phase == BlockPhase::InBlock {
            warn!(
                height = self.current_height,
                txs = self.metadata.deliver_txs.len(),
                "BeginBlock before Commit, discarding unfinished block"
            );
        }

        self.current_height = req.header.height;
        self.metadata = BlockMetadata::new_block(req, res);
        self.phase = BlockPhase::InBlock;
        self.metrics.record_block_begun();

        log_block_event!(info, "begin_block", "BeginBlock", self.current_height);
        Ok(())
    }

    fn listen_deliver_tx(
        &mut self,
        ctx: &StreamingContext<'_>,
        req: RequestDeliverTx,
        res: ResponseDeliverTx,
    ) -> Result<(), StreamingError> {
        self.warn_outside_block("deliver_tx");

        let call_frames = self.take_call_frames(ctx);
        let added = call_frames.len();
        self.metrics.record_tx_delivered(added);

        self.metadata.deliver_txs.push(DeliveredTx {
            request: req,
            response: res,
            call_frames,
        });

        log_block_event!(
            debug,
            "deliver_tx",
            "DeliverTx",
            self.current_height,
            tx = self.metadata.deliver_txs.len() - 1,
            frames_added = added,
            block_frames = self.metadata.call_frame_count()
        );
        Ok(())
    }

    fn listen_end_block(
        &mut self,
        _ctx: &StreamingContext<'_>,
        req: RequestEndBlock,
        res: ResponseEndBlock,
    ) -> Result<(), StreamingError> {
        self.warn_outside_block("end_block");
        if self.metadata.end_block.is_some() {
            warn!(height = req.height, "EndBlock seen twice, keeping the latest");
        }

        log_block_event!(
            info,
            "end_block",
            "EndBlock",
            req.height,
            validator_updates = res.validator_updates.len()
        );
        self.metadata.end_block = Some(EndBlockRecord {
            request: req,
            response: res,
        });
        Ok(())
    }

    fn listen_commit(
        &mut self,
        _ctx: &StreamingContext<'_>,
        res: ResponseCommit,
    ) -> Result<(), StreamingError> {
        let ready = self
            .sniffer
            .as_ref()
            .filter(|sniffer| sniffer.check_requirements())
            .cloned();
        let Some(sniffer) = ready else {
            debug!(height = self.current_height, "Sniffer not ready, block not observed");
            self.metrics.record_commit_skipped(SkipReason::NotReady);
            self.phase = BlockPhase::Finalized;
            return Ok(());
        };

        if self.phase == BlockPhase::Finalized {
            warn!(height = self.current_height, "Commit for an already finalized block");
            self.metrics.record_commit_skipped(SkipReason::DuplicateCommit);
            return Ok(());
        }

        self.metadata.commit = Some(res);
        self.phase = BlockPhase::Finalized;

        let Some(snapshot) = self.assemble_snapshot() else {
            warn!(
                height = self.current_height,
                has_begin = self.metadata.begin_block.is_some(),
                has_end = self.metadata.end_block.is_some(),
                "Incomplete block at Commit, not observed"
            );
            self.metrics.record_commit_skipped(SkipReason::Incomplete);
            return Ok(());
        };

        let stats = snapshot.statistics();
        log_block_event!(
            info,
            "commit",
            "Snapshot sent",
            self.current_height,
            txs = stats.transactions,
            events = stats.events,
            call_traces = stats.call_traces
        );
        self.metrics.record_block_observed(stats.events);
        self.delivery.deliver(&sniffer, snapshot, &self.metrics);
        Ok(())
    }

    fn listeners(&self) -> ListenerMap {
        self.listeners.clone()
    }

    fn stream(&mut self) -> Result<(), StreamingError> {
        let Delivery::Queued(queue) = &mut self.delivery else {
            return Ok(());
        };
        let Some(sniffer) = &self.sniffer else {
            debug!("No sniffer configured, delivery worker not started");
            return Ok(());
        };

        if let Some(worker) = queue.start(Arc::clone(sniffer))? {
            self.worker = Some(worker);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), StreamingError> {
        if let Delivery::Queued(queue) = &mut self.delivery {
            queue.close();
        }
        info!(height = self.current_height, "Streaming service closed");
        Ok(())
    }
}
