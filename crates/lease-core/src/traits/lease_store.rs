// # Lease Store Trait
//
// Defines the interface to the lease table.
//
// ## Purpose
//
// The lease table is owned by an external database. An invocation opens one
// short-lived session against it, performs a single operation and closes the
// session again. Rows are keyed by `mac_address`.
//
// ## Implementations
//
// - Memory: `state::MemoryLeaseStore` (tests, single process)
// - OVSDB: `lease-store-ovsdb` crate
//
// ## Usage
//
// ```rust,ignore
// use lease_core::{LeaseRecord, LeaseStore};
//
// #[tokio::main]
// async fn main() -> lease_core::Result<()> {
//     let store = /* LeaseStore implementation */;
//
//     let mut session = store.open().await?;
//     let result = session.insert(&record).await;
//     session.close().await?;
//     result
// }
// ```

use async_trait::async_trait;
use std::pin::Pin;
use tokio_stream::Stream;

use crate::config::StoreConfig;
use crate::record::{LeaseRecord, LeaseRow};

/// Rows produced by [`LeaseSession::list`]
///
/// The stream is finite and can only be consumed once.
pub type LeaseStream = Pin<Box<dyn Stream<Item = LeaseRow> + Send + 'static>>;

/// Trait for lease store implementations
///
/// A store is a handle on the lease table that can open sessions. It holds
/// configuration only; connections belong to sessions.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. Concurrent writers on the same key
/// are resolved by the backing database, not by the store.
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Open a session against the lease table
    ///
    /// # Returns
    ///
    /// - `Ok(session)`: Session ready for one or more operations
    /// - `Err(Error::Connection)`: The table could not be reached
    async fn open(&self) -> Result<Box<dyn LeaseSession>, crate::Error>;

    /// Short backend name used in log output
    fn store_name(&self) -> &'static str;
}

/// A scoped session on the lease table
///
/// Callers must call [`LeaseSession::close`] once they are done, whether the
/// operation succeeded or not.
#[async_trait]
pub trait LeaseSession: Send {
    /// Insert a new row
    ///
    /// The backing store's uniqueness constraint on `mac_address` applies;
    /// no pre-check is expected from the caller.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Row created
    /// - `Err(Error)`: Rejected (e.g. duplicate key) or transport failure
    async fn insert(&mut self, record: &LeaseRecord) -> Result<(), crate::Error>;

    /// Update the row whose `mac_address` equals `key`
    ///
    /// Only fields set in `record` are written; unset fields keep their
    /// stored value.
    ///
    /// # Returns
    ///
    /// - `Ok(LeaseRecord)`: The row after the update
    /// - `Err(Error::NotFound)`: No row has this key
    /// - `Err(Error)`: Other failure
    async fn update(&mut self, key: &str, record: &LeaseRecord)
    -> Result<LeaseRecord, crate::Error>;

    /// Delete the row whose `mac_address` equals `key`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Row removed
    /// - `Err(Error::NotFound)`: No row has this key
    /// - `Err(Error)`: Other failure
    async fn delete(&mut self, key: &str) -> Result<(), crate::Error>;

    /// Remove every row
    async fn clear(&mut self) -> Result<(), crate::Error>;

    /// List every row, unset fields rendered as the placeholder
    ///
    /// Row order is whatever the backing store yields.
    async fn list(&mut self) -> Result<LeaseStream, crate::Error>;

    /// Close the session, releasing its connection
    async fn close(&mut self) -> Result<(), crate::Error>;
}

/// Helper trait for constructing lease stores from configuration
pub trait LeaseStoreFactory: Send + Sync {
    /// Create a LeaseStore instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Store configuration
    ///
    /// # Returns
    ///
    /// A boxed LeaseStore trait object
    fn create(&self, config: &StoreConfig) -> Result<Box<dyn LeaseStore>, crate::Error>;
}

/// Turn a snapshot of records into a [`LeaseStream`]
pub fn stream_rows(records: Vec<LeaseRecord>) -> LeaseStream {
    Box::pin(tokio_stream::iter(records.into_iter().map(LeaseRow::from)))
}
