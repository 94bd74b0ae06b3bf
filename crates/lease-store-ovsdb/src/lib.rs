// # OVSDB Lease Store
//
// This crate provides the OVSDB-backed lease table for the dhcp-leases
// synchronizer.
//
// ## Behavior
//
// - One connection per session, opened by `LeaseStore::open` and shut down
//   by `LeaseSession::close`
// - One `transact` request per lease operation
// - Connect and request timeouts from `OvsdbConfig::timeout_secs`
// - Server `echo` requests are answered while waiting for a response
// - NO retries: a failed operation is reported to the caller as-is
// - NO duplicate pre-check on insert: the table's `mac_address` index
//   rejects duplicates and the resulting constraint violation surfaces as
//   `Error::Conflict`
//
// ## Protocol Reference
//
// - RFC 7047, The Open vSwitch Database Management Protocol
// - `transact`: `{"method":"transact","params":[<db>, <op>...],"id":<n>}`

pub mod ops;
pub mod remote;
pub mod rpc;

use async_trait::async_trait;
use lease_core::config::{OvsdbConfig, StoreConfig};
use lease_core::traits::{LeaseSession, LeaseStore, LeaseStoreFactory, LeaseStream, stream_rows};
use lease_core::{Error, LeaseRecord, Result, StoreRegistry};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub use remote::{Remote, Transport};
pub use rpc::{Connection, RpcError};

/// OVSDB lease store
///
/// Holds connection settings only. Each call to `open` dials the server.
#[derive(Debug, Clone)]
pub struct OvsdbLeaseStore {
    remote: Remote,
    database: String,
    table: String,
    timeout: Duration,
}

impl OvsdbLeaseStore {
    /// Create a store from validated settings
    pub fn new(config: &OvsdbConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            remote: Remote::parse(&config.remote)?,
            database: config.database.clone(),
            table: config.table.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    pub fn remote(&self) -> &Remote {
        &self.remote
    }
}

#[async_trait]
impl LeaseStore for OvsdbLeaseStore {
    async fn open(&self) -> Result<Box<dyn LeaseSession>> {
        debug!(remote = %self.remote, "Connecting to OVSDB");
        let stream = self.remote.connect(self.timeout).await?;
        Ok(Box::new(OvsdbSession::new(
            Connection::new(stream),
            self.database.clone(),
            self.table.clone(),
            self.timeout,
        )))
    }

    fn store_name(&self) -> &'static str {
        "ovsdb"
    }
}

/// One connection to the OVSDB server
pub struct OvsdbSession {
    connection: Connection,
    database: String,
    table: String,
    timeout: Duration,
    closed: bool,
}

impl std::fmt::Debug for OvsdbSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OvsdbSession")
            .field("database", &self.database)
            .field("table", &self.table)
            .field("timeout", &self.timeout)
            .field("closed", &self.closed)
            .finish()
    }
}

impl OvsdbSession {
    /// Wrap an established connection
    pub fn new(
        connection: Connection,
        database: impl Into<String>,
        table: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            connection,
            database: database.into(),
            table: table.into(),
            timeout,
            closed: false,
        }
    }

    /// Run one transaction and check every operation result
    async fn transact(&mut self, operations: Vec<Value>) -> Result<Vec<Value>> {
        if self.closed {
            return Err(Error::connection("OVSDB session already closed"));
        }

        let expected = operations.len();
        let results = self
            .connection
            .transact(&self.database, operations, self.timeout)
            .await?;
        rpc::check_results(&results, expected)?;
        Ok(results)
    }
}

#[async_trait]
impl LeaseSession for OvsdbSession {
    async fn insert(&mut self, record: &LeaseRecord) -> Result<()> {
        let op = ops::insert(&self.table, record);
        self.transact(vec![op]).await?;
        Ok(())
    }

    async fn update(&mut self, key: &str, record: &LeaseRecord) -> Result<LeaseRecord> {
        let update = ops::update(&self.table, key, record);
        let select = ops::select_key(&self.table, key);
        let results = self.transact(vec![update, select]).await?;

        if ops::count(&results[0])? == 0 {
            return Err(Error::not_found(key));
        }

        ops::rows(&results[1])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::protocol(format!("updated row {} missing from select", key)))
    }

    async fn delete(&mut self, key: &str) -> Result<()> {
        let op = ops::delete(&self.table, key);
        let results = self.transact(vec![op]).await?;

        if ops::count(&results[0])? == 0 {
            return Err(Error::not_found(key));
        }
        Ok(())
    }

    async fn clear(&mut self) -> Result<()> {
        let op = ops::clear(&self.table);
        let results = self.transact(vec![op]).await?;
        debug!(deleted = ops::count(&results[0])?, "Cleared lease table");
        Ok(())
    }

    async fn list(&mut self) -> Result<LeaseStream> {
        let op = ops::select_all(&self.table);
        let results = self.transact(vec![op]).await?;
        Ok(stream_rows(ops::rows(&results[0])?))
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if let Err(e) = self.connection.shutdown().await {
            // The server may already have hung up
            warn!(error = %e, "Failed to shut down OVSDB connection");
        }
        Ok(())
    }
}

/// Factory for creating OVSDB lease stores
pub struct OvsdbLeaseStoreFactory;

impl LeaseStoreFactory for OvsdbLeaseStoreFactory {
    fn create(&self, config: &StoreConfig) -> Result<Box<dyn LeaseStore>> {
        match config {
            StoreConfig::Ovsdb(ovsdb) => Ok(Box::new(OvsdbLeaseStore::new(ovsdb)?)),
            _ => Err(Error::config("Invalid config for OVSDB lease store")),
        }
    }
}

/// Register the OVSDB store with a registry
pub fn register(registry: &StoreRegistry) {
    registry.register_store("ovsdb", Box::new(OvsdbLeaseStoreFactory));
}
