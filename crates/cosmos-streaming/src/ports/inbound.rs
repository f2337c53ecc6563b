//! Inbound Ports (Driving Ports)
//!
//! The API the host runtime drives: one call per ABCI lifecycle hook plus
//! listener registration and service start/stop.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::outbound::{KvStore, StoreKey, WriteListener};
use crate::domain::abci::{
    RequestBeginBlock, RequestDeliverTx, RequestEndBlock, ResponseBeginBlock, ResponseCommit,
    ResponseDeliverTx, ResponseEndBlock,
};
use crate::error::StreamingError;

/// Registered store-write listeners keyed by store namespace.
pub type ListenerMap = BTreeMap<StoreKey, Vec<Arc<dyn WriteListener>>>;

/// Per-call context supplied by the host.
///
/// Carries the transient store scoped to the transaction being delivered.
#[derive(Clone, Copy, Default)]
pub struct StreamingContext<'a> {
    transient_store: Option<&'a dyn KvStore>,
}

impl<'a> StreamingContext<'a> {
    pub fn new(transient_store: &'a dyn KvStore) -> Self {
        Self {
            transient_store: Some(transient_store),
        }
    }

    /// Context without a transient store; call-frame reads are skipped.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn transient_store(&self) -> Option<&'a dyn KvStore> {
        self.transient_store
    }
}

/// Block streaming API (Driving Port)
///
/// The host calls these strictly in order for each block:
/// BeginBlock → DeliverTx* → EndBlock → Commit. Lifecycle hooks always
/// return `Ok(())`; internal failures are logged, never propagated.
pub trait BlockStreamingApi: Send {
    fn listen_begin_block(
        &mut self,
        ctx: &StreamingContext<'_>,
        req: RequestBeginBlock,
        res: ResponseBeginBlock,
    ) -> Result<(), StreamingError>;

    fn listen_deliver_tx(
        &mut self,
        ctx: &StreamingContext<'_>,
        req: RequestDeliverTx,
        res: ResponseDeliverTx,
    ) -> Result<(), StreamingError>;

    fn listen_end_block(
        &mut self,
        ctx: &StreamingContext<'_>,
        req: RequestEndBlock,
        res: ResponseEndBlock,
    ) -> Result<(), StreamingError>;

    fn listen_commit(
        &mut self,
        ctx: &StreamingContext<'_>,
        res: ResponseCommit,
    ) -> Result<(), StreamingError>;

    /// Store-write listeners to attach, keyed by store namespace.
    fn listeners(&self) -> ListenerMap;

    /// Start background delivery, if the service uses any.
    fn stream(&mut self) -> Result<(), StreamingError>;

    /// Stop accepting snapshots and release background resources.
    fn close(&mut self) -> Result<(), StreamingError>;
}
