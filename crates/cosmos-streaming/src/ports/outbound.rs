//! Outbound Ports (Driven Ports)
//!
//! Dependencies the streaming service needs from the host and from the
//! analysis sink:
//! - `KvStore`: read access to the host's transient store
//! - `SnifferClient`: the sink's observe call
//! - `ClientConnector` / `SyncStatus`: what the readiness check consults
//! - `WriteListener`: store-write hooks the host can attach to namespaces

use std::fmt;
use std::sync::Arc;

use crate::domain::CosmosSnapshot;
use crate::error::{SinkError, StoreError};

/// Read-only view of a host key-value store.
///
/// Production: the transient store of the current transaction context.
/// Testing: `InMemoryKvStore`.
pub trait KvStore: Send + Sync {
    /// Get a value by key, `None` when absent.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
}

/// Handle to the external analysis sink.
pub trait SnifferClient: Send + Sync {
    /// Hand a finished snapshot to the sink. Delivery is fire-and-forget.
    ///
    /// May block. Queued delivery calls this from Tokio's blocking pool,
    /// inline delivery from the commit path itself.
    fn observe_cosmos_data(&self, snapshot: &CosmosSnapshot);
}

/// Opens a sink handle.
pub trait ClientConnector: Send + Sync {
    fn connect(&self) -> Result<Arc<dyn SnifferClient>, SinkError>;
}

/// Node sync state; the sink is only fed once the node has caught up.
pub trait SyncStatus: Send + Sync {
    fn is_catching_up(&self) -> bool;
}

/// Identifier of a host store namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreKey(String);

impl StoreKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hook invoked by the host for every write into a store namespace.
pub trait WriteListener: Send + Sync {
    /// `value` is `None` for deletes.
    fn on_write(&self, store_key: &StoreKey, key: &[u8], value: Option<&[u8]>);
}
