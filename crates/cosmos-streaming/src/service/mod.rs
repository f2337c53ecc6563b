//! # Streaming Service
//!
//! The block snapshot accumulator behind the `BlockStreamingApi` hooks.
//!
//! ## Architecture
//!
//! This service:
//! 1. Owns exactly one `BlockMetadata`, replaced at every BeginBlock
//! 2. Reads call frames from the host's transient store after each DeliverTx
//! 3. At Commit, asks the sink gateway whether the block is wanted, then
//!    assembles a `CosmosSnapshot` and hands it to the configured delivery
//!
//! Lifecycle hooks never fail the host: every internal problem is logged
//! and counted in `StreamingMetrics`.

mod assembler;
mod lifecycle;

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::adapters::dispatch::Delivery;
use crate::adapters::lifecycle::ValidatorAddressCodec;
use crate::adapters::sniffer::Sniffer;
use crate::adapters::trace_store::CallTraceReader;
use crate::domain::{BlockMetadata, BlockPhase, StreamingConfig};
use crate::metrics::{MetricsSnapshot, StreamingMetrics};
use crate::ports::inbound::ListenerMap;
use crate::ports::outbound::{StoreKey, WriteListener};

pub struct StreamingService {
    pub(crate) config: StreamingConfig,
    /// `None` makes every commit a no-op.
    pub(crate) sniffer: Option<Arc<Sniffer>>,
    pub(crate) metadata: BlockMetadata,
    pub(crate) phase: BlockPhase,
    /// Height from the current block's BeginBlock header.
    pub(crate) current_height: i64,
    pub(crate) reader: CallTraceReader,
    pub(crate) codec: ValidatorAddressCodec,
    pub(crate) delivery: Delivery,
    pub(crate) listeners: ListenerMap,
    pub(crate) metrics: Arc<StreamingMetrics>,
    pub(crate) worker: Option<JoinHandle<()>>,
}

impl StreamingService {
    /// Service with no store listeners registered.
    pub fn new(config: StreamingConfig, sniffer: Option<Arc<Sniffer>>) -> Self {
        let metrics = Arc::new(StreamingMetrics::new());
        Self {
            reader: CallTraceReader::new(config.max_trace_blob_bytes),
            codec: ValidatorAddressCodec::new(config.validator_address_prefix.clone()),
            delivery: Delivery::from_mode(config.delivery, Arc::clone(&metrics)),
            config,
            sniffer,
            metadata: BlockMetadata::default(),
            phase: BlockPhase::Idle,
            current_height: 0,
            listeners: ListenerMap::new(),
            metrics,
            worker: None,
        }
    }

    /// Register a store-write listener for `store_key`.
    pub fn with_store_listener(mut self, store_key: StoreKey, listener: Arc<dyn WriteListener>) -> Self {
        self.listeners.entry(store_key).or_default().push(listener);
        self
    }

    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    pub fn phase(&self) -> BlockPhase {
        self.phase
    }

    pub fn current_height(&self) -> i64 {
        self.current_height
    }

    /// The in-progress block record.
    pub fn metadata(&self) -> &BlockMetadata {
        &self.metadata
    }

    /// Call frames collected so far in the current block.
    pub fn call_frame_count(&self) -> usize {
        self.metadata.call_frame_count()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Handle of the delivery worker started by `stream()`.
    ///
    /// After `close()` the worker drains the queue and the handle resolves.
    pub fn take_worker(&mut self) -> Option<JoinHandle<()>> {
        self.worker.take()
    }
}
