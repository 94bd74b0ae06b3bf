//! Plugin-based store registry
//!
//! The registry lets lease store backends be registered at runtime, so the
//! binary picks a backend by configured type name instead of a hardcoded
//! match.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lease_core::{StoreConfig, StoreRegistry};
//!
//! let registry = StoreRegistry::with_builtin();
//! lease_store_ovsdb::register(&registry);
//!
//! let store = registry.create_store(&StoreConfig::default())?;
//! ```

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::state::MemoryLeaseStoreFactory;
use crate::traits::{LeaseStore, LeaseStoreFactory};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Registry of lease store factories keyed by type name
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct StoreRegistry {
    stores: RwLock<HashMap<String, Arc<dyn LeaseStoreFactory>>>,
}

impl StoreRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the `memory` store registered
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register_store("memory", Box::new(MemoryLeaseStoreFactory));
        registry
    }

    /// Register a lease store factory
    ///
    /// # Parameters
    ///
    /// - `name`: Store type name (e.g., "ovsdb", "memory")
    /// - `factory`: Factory object for creating store instances
    pub fn register_store(&self, name: impl Into<String>, factory: Box<dyn LeaseStoreFactory>) {
        let mut stores = self.stores.write().unwrap_or_else(|e| e.into_inner());
        stores.insert(name.into(), Arc::from(factory));
    }

    /// Create a lease store from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn LeaseStore>)`: Created store instance
    /// - `Err(Error)`: If the store type is not registered or creation fails
    pub fn create_store(&self, config: &StoreConfig) -> Result<Box<dyn LeaseStore>> {
        config.validate()?;

        let store_type = config.type_name();
        let factory = {
            let stores = self.stores.read().unwrap_or_else(|e| e.into_inner());
            stores
                .get(store_type)
                .cloned()
                .ok_or_else(|| Error::config(format!("Unknown store type: {}", store_type)))?
        };

        factory.create(config)
    }

    /// List all registered store types
    pub fn list_stores(&self) -> Vec<String> {
        let stores = self.stores.read().unwrap_or_else(|e| e.into_inner());
        stores.keys().cloned().collect()
    }

    /// Check if a store type is registered
    pub fn has_store(&self, name: &str) -> bool {
        let stores = self.stores.read().unwrap_or_else(|e| e.into_inner());
        stores.contains_key(name)
    }
}
