//! Test doubles and common utilities for contract tests
//!
//! `RecordingStore` wraps a `MemoryLeaseStore` and records every call made
//! through it, so tests can assert on exactly which store operations an
//! invocation performed.

#![allow(dead_code)]

use lease_core::error::{Error, Result};
use lease_core::traits::{LeaseSession, LeaseStore, LeaseStream};
use lease_core::{
    Dispatcher, Environment, InterpreterConfig, Invocation, LeaseRecord, MemoryLeaseStore,
    Outcome,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const MAC: &str = "AA:BB:CC:DD:EE:FF";

/// One call observed by the recording store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Open,
    Insert(LeaseRecord),
    Update(String, LeaseRecord),
    Delete(String),
    Clear,
    List,
    Close,
}

impl StoreCall {
    /// Whether this call is a table operation (not session lifecycle)
    pub fn is_operation(&self) -> bool {
        !matches!(self, StoreCall::Open | StoreCall::Close)
    }
}

/// Failure injection for the recording store
#[derive(Debug, Clone, Copy, Default)]
pub struct Failures {
    /// `open()` fails with a connection error
    pub open: bool,
    /// Every table operation fails with a store error
    pub operations: bool,
}

/// A LeaseStore that records calls and delegates to a memory store
#[derive(Clone)]
pub struct RecordingStore {
    inner: MemoryLeaseStore,
    calls: Arc<Mutex<Vec<StoreCall>>>,
    failures: Failures,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::with_failures(Failures::default())
    }

    pub fn with_failures(failures: Failures) -> Self {
        Self {
            inner: MemoryLeaseStore::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            failures,
        }
    }

    /// A store over the same table that no longer injects failures
    pub fn healthy(&self) -> Self {
        Self {
            failures: Failures::default(),
            ..self.clone()
        }
    }

    /// Calls observed so far
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Table operations observed so far
    pub fn operations(&self) -> Vec<StoreCall> {
        self.calls().into_iter().filter(StoreCall::is_operation).collect()
    }

    /// Forget the observed calls
    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// The backing memory table
    pub fn table(&self) -> &MemoryLeaseStore {
        &self.inner
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl LeaseStore for RecordingStore {
    async fn open(&self) -> Result<Box<dyn LeaseSession>> {
        self.record(StoreCall::Open);
        if self.failures.open {
            return Err(Error::connection("connection refused"));
        }
        Ok(Box::new(RecordingSession {
            store: self.clone(),
            inner: self.inner.open().await?,
        }))
    }

    fn store_name(&self) -> &'static str {
        "recording"
    }
}

struct RecordingSession {
    store: RecordingStore,
    inner: Box<dyn LeaseSession>,
}

impl RecordingSession {
    fn check(&self) -> Result<()> {
        if self.store.failures.operations {
            return Err(Error::store("transaction failed"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl LeaseSession for RecordingSession {
    async fn insert(&mut self, record: &LeaseRecord) -> Result<()> {
        self.store.record(StoreCall::Insert(record.clone()));
        self.check()?;
        self.inner.insert(record).await
    }

    async fn update(&mut self, key: &str, record: &LeaseRecord) -> Result<LeaseRecord> {
        self.store
            .record(StoreCall::Update(key.to_string(), record.clone()));
        self.check()?;
        self.inner.update(key, record).await
    }

    async fn delete(&mut self, key: &str) -> Result<()> {
        self.store.record(StoreCall::Delete(key.to_string()));
        self.check()?;
        self.inner.delete(key).await
    }

    async fn clear(&mut self) -> Result<()> {
        self.store.record(StoreCall::Clear);
        self.check()?;
        self.inner.clear().await
    }

    async fn list(&mut self) -> Result<LeaseStream> {
        self.store.record(StoreCall::List);
        self.check()?;
        self.inner.list().await
    }

    async fn close(&mut self) -> Result<()> {
        self.store.record(StoreCall::Close);
        self.inner.close().await
    }
}

/// Environment carrying only the dnsmasq expiry variable
pub fn expiry_env(expiry: &str) -> HashMap<String, String> {
    HashMap::from([("DNSMASQ_LEASE_EXPIRES".to_string(), expiry.to_string())])
}

/// Parse `args` and dispatch them against `store`, capturing stdout
pub async fn run(
    store: &RecordingStore,
    args: &[&str],
    env: &dyn Environment,
) -> Result<(Outcome, String)> {
    let invocation = Invocation::parse(args.iter().copied(), env, &InterpreterConfig::default())?;
    let dispatcher = Dispatcher::new(Box::new(store.clone()));
    let mut out = Vec::new();
    let outcome = dispatcher.dispatch(invocation, &mut out).await?;
    let out = String::from_utf8(out).map_err(|e| Error::protocol(e.to_string()))?;
    Ok((outcome, out))
}

/// Empty environment
pub fn no_env() -> HashMap<String, String> {
    HashMap::new()
}
