use parking_lot::Mutex;
use std::collections::HashMap;

use crate::error::StoreError;
use crate::ports::outbound::{KvStore, StoreKey, WriteListener};

/// In-memory key-value store for tests and the replay tool.
///
/// Stands in for the host's transient store, which is reset by the host
/// between blocks.
#[derive(Default)]
pub struct InMemoryKvStore {
    data: HashMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: &[u8], value: &[u8]) {
        self.data.insert(key.to_vec(), value.to_vec());
    }

    pub fn delete(&mut self, key: &[u8]) {
        self.data.remove(key);
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl KvStore for InMemoryKvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.data.get(key).cloned())
    }
}

/// One observed store write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreKvPair {
    pub store_key: StoreKey,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub delete: bool,
}

/// Write listener that buffers every write to its namespace in memory.
pub struct MemoryListener {
    store_key: StoreKey,
    buffer: Mutex<Vec<StoreKvPair>>,
}

impl MemoryListener {
    pub fn new(store_key: StoreKey) -> Self {
        Self {
            store_key,
            buffer: Mutex::new(Vec::new()),
        }
    }

    pub fn store_key(&self) -> &StoreKey {
        &self.store_key
    }

    /// Take and clear the buffered writes.
    pub fn pop_state_cache(&self) -> Vec<StoreKvPair> {
        std::mem::take(&mut *self.buffer.lock())
    }
}

impl WriteListener for MemoryListener {
    fn on_write(&self, store_key: &StoreKey, key: &[u8], value: Option<&[u8]>) {
        self.buffer.lock().push(StoreKvPair {
            store_key: store_key.clone(),
            key: key.to_vec(),
            value: value.map(<[u8]>::to_vec).unwrap_or_default(),
            delete: value.is_none(),
        });
    }
}
