//! # Snapshot Delivery
//!
//! Moves finished snapshots from the commit path to the sink.
//!
//! - `Inline`: the commit path calls the sink directly.
//! - `Queued`: the commit path only enqueues. A background worker drains
//!   the queue and calls the sink.
//!
//! The queue is a `tokio::sync::broadcast` channel with one receiver. When
//! it is full the oldest snapshot is overwritten, which the worker sees as
//! `Lagged(n)` and counts as `n` dropped snapshots. Commit never waits on
//! the sink. Tokio rounds the capacity up to a power of two.
//!
//! The worker runs each sink call on the blocking pool, one at a time, so
//! a slow sink delays delivery but never a runtime worker thread.

use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::{self, JoinHandle};
use tracing::{debug, info, warn};

use super::sniffer::Sniffer;
use crate::domain::config::{DeliveryMode, MAX_QUEUE_CAPACITY};
use crate::domain::CosmosSnapshot;
use crate::error::StreamingError;
use crate::metrics::StreamingMetrics;

/// How the service hands snapshots to the sink.
pub enum Delivery {
    Inline,
    Queued(SnapshotQueue),
}

impl Delivery {
    pub fn from_mode(mode: DeliveryMode, metrics: Arc<StreamingMetrics>) -> Self {
        match mode {
            DeliveryMode::Inline => Delivery::Inline,
            DeliveryMode::Queued { capacity } => {
                Delivery::Queued(SnapshotQueue::new(capacity, metrics))
            }
        }
    }

    /// Deliver or enqueue `snapshot`.
    ///
    /// The sink handle is looked up again here, not at readiness time.
    pub fn deliver(&self, sniffer: &Sniffer, snapshot: CosmosSnapshot, metrics: &StreamingMetrics) {
        match self {
            Delivery::Inline => match sniffer.observe(&snapshot) {
                Ok(()) => metrics.record_snapshot_delivered(),
                Err(e) => {
                    debug!(error = %e, "Snapshot not delivered");
                    metrics.record_snapshots_dropped(1);
                }
            },
            Delivery::Queued(queue) => queue.enqueue(snapshot),
        }
    }
}

/// Bounded drop-oldest queue between commit and the delivery worker.
pub struct SnapshotQueue {
    sender: Option<broadcast::Sender<Arc<CosmosSnapshot>>>,
    /// Held until the worker starts so early snapshots are retained.
    receiver: Option<broadcast::Receiver<Arc<CosmosSnapshot>>>,
    capacity: usize,
    metrics: Arc<StreamingMetrics>,
}

impl SnapshotQueue {
    /// Capacity is clamped to `1..=MAX_QUEUE_CAPACITY`.
    pub fn new(capacity: usize, metrics: Arc<StreamingMetrics>) -> Self {
        let capacity = capacity.clamp(1, MAX_QUEUE_CAPACITY);
        let (sender, receiver) = broadcast::channel(capacity);
        Self {
            sender: Some(sender),
            receiver: Some(receiver),
            capacity,
            metrics,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_none()
    }

    pub fn enqueue(&self, snapshot: CosmosSnapshot) {
        let Some(sender) = &self.sender else {
            debug!("Snapshot queue closed, dropping snapshot");
            self.metrics.record_snapshots_dropped(1);
            return;
        };

        match sender.send(Arc::new(snapshot)) {
            Ok(_) => self.metrics.record_snapshot_enqueued(),
            Err(_) => {
                warn!("Delivery worker gone, dropping snapshot");
                self.metrics.record_snapshots_dropped(1);
            }
        }
    }

    /// Spawn the delivery worker on the current Tokio runtime.
    ///
    /// Returns `Ok(None)` if the worker was already started or the queue
    /// is closed.
    pub fn start(&mut self, sniffer: Arc<Sniffer>) -> Result<Option<JoinHandle<()>>, StreamingError> {
        let handle = Handle::try_current().map_err(|_| StreamingError::NoRuntime)?;
        let Some(receiver) = self.receiver.take() else {
            return Ok(None);
        };
        if self.sender.is_none() {
            return Ok(None);
        }

        let worker = DeliveryWorker::new(receiver, sniffer, Arc::clone(&self.metrics));
        info!(capacity = self.capacity, "Starting snapshot delivery worker");
        Ok(Some(handle.spawn(worker.run())))
    }

    /// Stop accepting snapshots. A running worker drains what is queued
    /// and exits.
    pub fn close(&mut self) {
        self.sender = None;
        self.receiver = None;
    }
}

/// Drains the snapshot queue into the sink.
pub struct DeliveryWorker {
    receiver: broadcast::Receiver<Arc<CosmosSnapshot>>,
    sniffer: Arc<Sniffer>,
    metrics: Arc<StreamingMetrics>,
}

impl DeliveryWorker {
    pub fn new(
        receiver: broadcast::Receiver<Arc<CosmosSnapshot>>,
        sniffer: Arc<Sniffer>,
        metrics: Arc<StreamingMetrics>,
    ) -> Self {
        Self {
            receiver,
            sniffer,
            metrics,
        }
    }

    pub async fn run(mut self) {
        loop {
            match self.receiver.recv().await {
                Ok(snapshot) => self.deliver(snapshot).await,
                Err(broadcast::error::RecvError::Lagged(dropped)) => {
                    warn!(dropped, "Snapshot queue overflowed, oldest snapshots dropped");
                    self.metrics.record_snapshots_dropped(dropped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        debug!("Snapshot delivery worker stopped");
    }

    async fn deliver(&self, snapshot: Arc<CosmosSnapshot>) {
        let height = snapshot.block().height;
        let sniffer = Arc::clone(&self.sniffer);
        match task::spawn_blocking(move || sniffer.observe(&snapshot)).await {
            Ok(Ok(())) => self.metrics.record_snapshot_delivered(),
            Ok(Err(e)) => {
                debug!(height, error = %e, "Snapshot not delivered");
                self.metrics.record_snapshots_dropped(1);
            }
            Err(e) => {
                warn!(height, error = %e, "Sniffer client call failed");
                self.metrics.record_snapshots_dropped(1);
            }
        }
    }
}
