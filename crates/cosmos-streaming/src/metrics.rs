//! Metrics hooks for the streaming service
//!
//! Counters for the commit path and the delivery worker. Every counter is
//! monotonic; `snapshot()` gives a consistent-enough view for logging and
//! tests.
//!
//! ## Usage
//!
//! ```ignore
//! use cosmos_streaming::metrics::StreamingMetrics;
//!
//! let metrics = StreamingMetrics::new();
//! metrics.record_block_observed(14);
//! assert_eq!(metrics.snapshot().blocks_observed, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Why a commit did not produce a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Sink absent, disabled, catching up, or unreachable.
    NotReady,
    /// BeginBlock or EndBlock was never seen for this block.
    Incomplete,
    /// The block was already finalized by an earlier commit.
    DuplicateCommit,
}

/// Thread-safe counters for the streaming service.
#[derive(Debug, Default)]
pub struct StreamingMetrics {
    /// Blocks opened by BeginBlock
    pub blocks_begun: AtomicU64,
    /// Blocks assembled into a snapshot
    pub blocks_observed: AtomicU64,
    pub commits_skipped_not_ready: AtomicU64,
    pub commits_skipped_incomplete: AtomicU64,
    pub commits_skipped_duplicate: AtomicU64,
    /// Transactions recorded by DeliverTx
    pub txs_delivered: AtomicU64,
    /// Call frames read from the transient store
    pub call_frames_ingested: AtomicU64,
    pub trace_decode_failures: AtomicU64,
    /// Events placed in snapshots
    pub events_emitted: AtomicU64,
    pub snapshots_enqueued: AtomicU64,
    pub snapshots_delivered: AtomicU64,
    /// Snapshots lost to queue overflow or a closed queue
    pub snapshots_dropped: AtomicU64,
}

impl StreamingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_block_begun(&self) {
        self.blocks_begun.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tx_delivered(&self, call_frames: usize) {
        self.txs_delivered.fetch_add(1, Ordering::Relaxed);
        self.call_frames_ingested
            .fetch_add(call_frames as u64, Ordering::Relaxed);
    }

    pub fn record_trace_decode_failure(&self) {
        self.trace_decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_commit_skipped(&self, reason: SkipReason) {
        let counter = match reason {
            SkipReason::NotReady => &self.commits_skipped_not_ready,
            SkipReason::Incomplete => &self.commits_skipped_incomplete,
            SkipReason::DuplicateCommit => &self.commits_skipped_duplicate,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an assembled snapshot carrying `events` events.
    pub fn record_block_observed(&self, events: u64) {
        self.blocks_observed.fetch_add(1, Ordering::Relaxed);
        self.events_emitted.fetch_add(events, Ordering::Relaxed);
    }

    pub fn record_snapshot_enqueued(&self) {
        self.snapshots_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_snapshot_delivered(&self) {
        self.snapshots_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_snapshots_dropped(&self, count: u64) {
        self.snapshots_dropped.fetch_add(count, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            blocks_begun: self.blocks_begun.load(Ordering::Relaxed),
            blocks_observed: self.blocks_observed.load(Ordering::Relaxed),
            commits_skipped_not_ready: self.commits_skipped_not_ready.load(Ordering::Relaxed),
            commits_skipped_incomplete: self.commits_skipped_incomplete.load(Ordering::Relaxed),
            commits_skipped_duplicate: self.commits_skipped_duplicate.load(Ordering::Relaxed),
            txs_delivered: self.txs_delivered.load(Ordering::Relaxed),
            call_frames_ingested: self.call_frames_ingested.load(Ordering::Relaxed),
            trace_decode_failures: self.trace_decode_failures.load(Ordering::Relaxed),
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            snapshots_enqueued: self.snapshots_enqueued.load(Ordering::Relaxed),
            snapshots_delivered: self.snapshots_delivered.load(Ordering::Relaxed),
            snapshots_dropped: self.snapshots_dropped.load(Ordering::Relaxed),
        }
    }

    /// Commits skipped for any reason.
    pub fn commits_skipped(&self) -> u64 {
        self.commits_skipped_not_ready.load(Ordering::Relaxed)
            + self.commits_skipped_incomplete.load(Ordering::Relaxed)
            + self.commits_skipped_duplicate.load(Ordering::Relaxed)
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub blocks_begun: u64,
    pub blocks_observed: u64,
    pub commits_skipped_not_ready: u64,
    pub commits_skipped_incomplete: u64,
    pub commits_skipped_duplicate: u64,
    pub txs_delivered: u64,
    pub call_frames_ingested: u64,
    pub trace_decode_failures: u64,
    pub events_emitted: u64,
    pub snapshots_enqueued: u64,
    pub snapshots_delivered: u64,
    pub snapshots_dropped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        let snapshot = StreamingMetrics::new().snapshot();
        assert_eq!(snapshot, MetricsSnapshot::default());
    }

    #[test]
    fn test_tx_delivery_counts_frames() {
        let metrics = StreamingMetrics::new();
        metrics.record_tx_delivered(3);
        metrics.record_tx_delivered(0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.txs_delivered, 2);
        assert_eq!(snapshot.call_frames_ingested, 3);
    }

    #[test]
    fn test_skip_reasons_are_separate() {
        let metrics = StreamingMetrics::new();
        metrics.record_commit_skipped(SkipReason::NotReady);
        metrics.record_commit_skipped(SkipReason::NotReady);
        metrics.record_commit_skipped(SkipReason::DuplicateCommit);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.commits_skipped_not_ready, 2);
        assert_eq!(snapshot.commits_skipped_incomplete, 0);
        assert_eq!(snapshot.commits_skipped_duplicate, 1);
        assert_eq!(metrics.commits_skipped(), 3);
    }

    #[test]
    fn test_delivery_counters() {
        let metrics = StreamingMetrics::new();
        metrics.record_snapshot_enqueued();
        metrics.record_snapshot_enqueued();
        metrics.record_snapshot_delivered();
        metrics.record_snapshots_dropped(1);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.snapshots_enqueued, 2);
        assert_eq!(snapshot.snapshots_delivered, 1);
        assert_eq!(snapshot.snapshots_dropped, 1);
    }
}
