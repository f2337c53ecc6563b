//! # Sink Gateway
//!
//! Wraps the connection to the analysis sink behind two questions the
//! service asks on every commit:
//!
//! - `check_requirements()`: may work be spent on this block at all?
//! - `client()`: is there a live handle to hand the snapshot to right now?
//!
//! Both are re-evaluated at point of use. Nothing here panics or blocks on
//! the sink; a failed connect is retried on the next readiness check.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::CosmosSnapshot;
use crate::error::SinkError;
use crate::ports::outbound::{ClientConnector, SnifferClient, SyncStatus};

pub struct Sniffer {
    enabled: bool,
    connector: Arc<dyn ClientConnector>,
    sync_status: Option<Arc<dyn SyncStatus>>,
    client: Mutex<Option<Arc<dyn SnifferClient>>>,
}

impl Sniffer {
    pub fn new(enabled: bool, connector: Arc<dyn ClientConnector>) -> Self {
        Self {
            enabled,
            connector,
            sync_status: None,
            client: Mutex::new(None),
        }
    }

    /// Enabled gateway around an already connected client.
    pub fn with_client(client: Arc<dyn SnifferClient>) -> Self {
        Self::new(true, Arc::new(StaticConnector::new(client)))
    }

    /// Gate readiness on the node having caught up.
    pub fn with_sync_status(mut self, sync_status: Arc<dyn SyncStatus>) -> Self {
        self.sync_status = Some(sync_status);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the sink can take a snapshot now.
    ///
    /// Connects lazily on first success and keeps the handle.
    pub fn check_requirements(&self) -> bool {
        if !self.enabled {
            debug!("Sniffer disabled");
            return false;
        }

        if let Some(status) = &self.sync_status {
            if status.is_catching_up() {
                debug!("Node is catching up, sniffer not ready");
                return false;
            }
        }

        if self.client.lock().is_some() {
            return true;
        }

        // Connect unlocked so delivery can keep reading the handle.
        match self.connector.connect() {
            Ok(handle) => {
                let mut client = self.client.lock();
                if client.is_none() {
                    info!("Sniffer client connected");
                    *client = Some(handle);
                }
                true
            }
            Err(e) => {
                warn!(error = %e, "Sniffer client unavailable");
                false
            }
        }
    }

    /// The connected handle, if any. Never connects.
    pub fn client(&self) -> Option<Arc<dyn SnifferClient>> {
        if !self.enabled {
            return None;
        }
        self.client.lock().clone()
    }

    /// Hand `snapshot` to the sink through the current handle.
    ///
    /// Both delivery modes go through here.
    pub fn observe(&self, snapshot: &CosmosSnapshot) -> Result<(), SinkError> {
        if !self.enabled {
            return Err(SinkError::Disabled);
        }
        let client = self
            .client()
            .ok_or_else(|| SinkError::Connect("no live sniffer client".to_string()))?;
        client.observe_cosmos_data(snapshot);
        Ok(())
    }
}

/// Connector that always yields the same pre-built client.
pub struct StaticConnector {
    client: Arc<dyn SnifferClient>,
}

impl StaticConnector {
    pub fn new(client: Arc<dyn SnifferClient>) -> Self {
        Self { client }
    }
}

impl ClientConnector for StaticConnector {
    fn connect(&self) -> Result<Arc<dyn SnifferClient>, SinkError> {
        Ok(Arc::clone(&self.client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{OnceLock, Weak};

    #[derive(Default)]
    struct CountingClient {
        observed: AtomicUsize,
    }

    impl SnifferClient for CountingClient {
        fn observe_cosmos_data(&self, _snapshot: &CosmosSnapshot) {
            self.observed.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Fails the first `failures` connects, then succeeds.
    struct FlakyConnector {
        failures: AtomicUsize,
        attempts: AtomicUsize,
    }

    impl ClientConnector for FlakyConnector {
        fn connect(&self) -> Result<Arc<dyn SnifferClient>, SinkError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(SinkError::Connect("license check failed".to_string()));
            }
            Ok(Arc::new(CountingClient::default()))
        }
    }

    struct Syncing(AtomicBool);

    impl SyncStatus for Syncing {
        fn is_catching_up(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_disabled_sniffer_is_never_ready() {
        let client = Arc::new(CountingClient::default());
        let sniffer = Sniffer::new(false, Arc::new(StaticConnector::new(client)));

        assert!(!sniffer.check_requirements());
        assert!(sniffer.client().is_none());
        assert_eq!(
            sniffer.observe(&CosmosSnapshot::default()),
            Err(SinkError::Disabled)
        );
    }

    #[test]
    fn test_client_absent_until_ready() {
        let sniffer = Sniffer::with_client(Arc::new(CountingClient::default()));

        assert!(sniffer.client().is_none());
        assert!(sniffer.check_requirements());
        assert!(sniffer.client().is_some());
    }

    #[test]
    fn test_connect_is_retried_then_memoized() {
        let connector = Arc::new(FlakyConnector {
            failures: AtomicUsize::new(1),
            attempts: AtomicUsize::new(0),
        });
        let sniffer = Sniffer::new(true, connector.clone());

        assert!(!sniffer.check_requirements());
        assert!(sniffer.check_requirements());
        assert!(sniffer.check_requirements());
        assert_eq!(connector.attempts.load(Ordering::SeqCst), 2);
    }

    /// Reads the gateway's handle from inside `connect`.
    #[derive(Default)]
    struct ReentrantConnector {
        sniffer: OnceLock<Weak<Sniffer>>,
        saw_client: AtomicBool,
        called: AtomicBool,
    }

    impl ClientConnector for ReentrantConnector {
        fn connect(&self) -> Result<Arc<dyn SnifferClient>, SinkError> {
            if let Some(sniffer) = self.sniffer.get().and_then(Weak::upgrade) {
                self.saw_client
                    .store(sniffer.client().is_some(), Ordering::SeqCst);
                self.called.store(true, Ordering::SeqCst);
            }
            Ok(Arc::new(CountingClient::default()))
        }
    }

    #[test]
    fn test_client_readable_while_connecting() {
        let connector = Arc::new(ReentrantConnector::default());
        let sniffer = Arc::new(Sniffer::new(true, connector.clone()));
        assert!(connector.sniffer.set(Arc::downgrade(&sniffer)).is_ok());

        assert!(sniffer.check_requirements());
        assert!(connector.called.load(Ordering::SeqCst));
        assert!(!connector.saw_client.load(Ordering::SeqCst));
        assert!(sniffer.client().is_some());
    }

    #[test]
    fn test_catching_up_blocks_readiness() {
        let status = Arc::new(Syncing(AtomicBool::new(true)));
        let sniffer = Sniffer::with_client(Arc::new(CountingClient::default()))
            .with_sync_status(status.clone());

        assert!(!sniffer.check_requirements());

        status.0.store(false, Ordering::SeqCst);
        assert!(sniffer.check_requirements());
    }

    #[test]
    fn test_observe_uses_live_client() {
        let client = Arc::new(CountingClient::default());
        let sniffer = Sniffer::with_client(client.clone());

        assert!(sniffer.observe(&CosmosSnapshot::default()).is_err());
        assert!(sniffer.check_requirements());
        sniffer.observe(&CosmosSnapshot::default()).unwrap();
        assert_eq!(client.observed.load(Ordering::SeqCst), 1);
    }
}
