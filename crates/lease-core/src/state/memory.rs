// # Memory Lease Store
//
// In-memory implementation of LeaseStore.
//
// ## Purpose
//
// Holds the lease table in a HashMap shared by every session opened from the
// same store. Nothing survives the process, so this is only useful for tests
// and for embedding the dispatcher in a longer-lived program.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::config::StoreConfig;
use crate::record::LeaseRecord;
use crate::traits::lease_store::{
    LeaseSession, LeaseStore, LeaseStoreFactory, LeaseStream, stream_rows,
};

/// In-memory lease store implementation
///
/// # Example
///
/// ```rust,no_run
/// use lease_core::{LeaseRecord, LeaseStore, MemoryLeaseStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryLeaseStore::new();
///
///     let mut session = store.open().await?;
///     session.insert(&LeaseRecord::from_positional(["aa:bb:cc:dd:ee:ff"])?).await?;
///     session.close().await?;
///
///     assert_eq!(store.len().await, 1);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryLeaseStore {
    inner: Arc<RwLock<HashMap<String, LeaseRecord>>>,
}

impl MemoryLeaseStore {
    /// Create a new empty memory lease store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of rows in the table
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the table is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Get a copy of the row stored under `key`
    pub async fn get(&self, key: &str) -> Option<LeaseRecord> {
        self.inner.read().await.get(key).cloned()
    }
}

#[async_trait]
impl LeaseStore for MemoryLeaseStore {
    async fn open(&self) -> Result<Box<dyn LeaseSession>, Error> {
        Ok(Box::new(MemorySession {
            inner: Arc::clone(&self.inner),
        }))
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}

/// Session over a [`MemoryLeaseStore`]
struct MemorySession {
    inner: Arc<RwLock<HashMap<String, LeaseRecord>>>,
}

#[async_trait]
impl LeaseSession for MemorySession {
    async fn insert(&mut self, record: &LeaseRecord) -> Result<(), Error> {
        let key = record
            .key()
            .ok_or_else(|| Error::store("insert requires mac_address"))?;

        let mut guard = self.inner.write().await;
        if guard.contains_key(key) {
            return Err(Error::conflict(format!("a lease for {} already exists", key)));
        }
        guard.insert(key.to_string(), record.clone());
        Ok(())
    }

    async fn update(&mut self, key: &str, record: &LeaseRecord) -> Result<LeaseRecord, Error> {
        let mut guard = self.inner.write().await;
        let stored = guard.get_mut(key).ok_or_else(|| Error::not_found(key))?;
        stored.apply(record);
        Ok(stored.clone())
    }

    async fn delete(&mut self, key: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.remove(key).map(|_| ()).ok_or_else(|| Error::not_found(key))
    }

    async fn clear(&mut self) -> Result<(), Error> {
        self.inner.write().await.clear();
        Ok(())
    }

    async fn list(&mut self) -> Result<LeaseStream, Error> {
        let guard = self.inner.read().await;
        Ok(stream_rows(guard.values().cloned().collect()))
    }

    async fn close(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

/// Factory for creating memory lease stores
pub struct MemoryLeaseStoreFactory;

impl LeaseStoreFactory for MemoryLeaseStoreFactory {
    fn create(&self, config: &StoreConfig) -> Result<Box<dyn LeaseStore>, Error> {
        match config {
            StoreConfig::Memory => Ok(Box::new(MemoryLeaseStore::new())),
            _ => Err(Error::config("Invalid config for memory store")),
        }
    }
}
