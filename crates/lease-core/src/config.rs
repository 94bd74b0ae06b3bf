//! Configuration types for the lease synchronizer
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Lease store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// OVSDB server holding the lease table
    Ovsdb(OvsdbConfig),

    /// In-memory table (not persistent, one process only)
    Memory,
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::Ovsdb(ovsdb) => ovsdb.validate(),
            StoreConfig::Memory => Ok(()),
        }
    }

    /// Get the store type name
    pub fn type_name(&self) -> &'static str {
        match self {
            StoreConfig::Ovsdb(_) => "ovsdb",
            StoreConfig::Memory => "memory",
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Ovsdb(OvsdbConfig::default())
    }
}

/// OVSDB connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvsdbConfig {
    /// Server address, `unix:<path>` or `tcp:<host>:<port>`
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Database name
    #[serde(default = "default_database")]
    pub database: String,

    /// Lease table name
    #[serde(default = "default_table")]
    pub table: String,

    /// Timeout for connecting and for each request, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl OvsdbConfig {
    /// Validate the OVSDB settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !(self.remote.starts_with("unix:") || self.remote.starts_with("tcp:")) {
            return Err(crate::Error::config(format!(
                "OVSDB remote must start with unix: or tcp:, got '{}'",
                self.remote
            )));
        }
        if self.database.is_empty() {
            return Err(crate::Error::config("OVSDB database name cannot be empty"));
        }
        if self.table.is_empty() {
            return Err(crate::Error::config("OVSDB table name cannot be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("OVSDB timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for OvsdbConfig {
    fn default() -> Self {
        Self {
            remote: default_remote(),
            database: default_database(),
            table: default_table(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Command interpreter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpreterConfig {
    /// Environment variable holding the lease expiry timestamp
    #[serde(default = "default_expiry_var")]
    pub expiry_var: String,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            expiry_var: default_expiry_var(),
        }
    }
}

fn default_remote() -> String {
    "unix:/var/run/openvswitch/db.sock".to_string()
}

fn default_database() -> String {
    "dhcp_leases".to_string()
}

fn default_table() -> String {
    "DHCP_Lease".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_expiry_var() -> String {
    "DNSMASQ_LEASE_EXPIRES".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_store_is_ovsdb() {
        let config = StoreConfig::default();
        assert_eq!(config.type_name(), "ovsdb");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ovsdb_remote_scheme() {
        let config = OvsdbConfig {
            remote: "/var/run/db.sock".to_string(),
            ..OvsdbConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_store_config_from_json() {
        let config: StoreConfig =
            serde_json::from_value(serde_json::json!({ "type": "ovsdb", "remote": "tcp:127.0.0.1:6640" }))
                .unwrap();
        match config {
            StoreConfig::Ovsdb(ovsdb) => {
                assert_eq!(ovsdb.remote, "tcp:127.0.0.1:6640");
                assert_eq!(ovsdb.database, "dhcp_leases");
                assert_eq!(ovsdb.table, "DHCP_Lease");
            }
            other => panic!("unexpected config {:?}", other),
        }
    }

    #[test]
    fn test_memory_config_from_json() {
        let config: StoreConfig =
            serde_json::from_value(serde_json::json!({ "type": "memory" })).unwrap();
        assert_eq!(config.type_name(), "memory");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_store_type_rejected() {
        let result: Result<StoreConfig, _> =
            serde_json::from_value(serde_json::json!({ "type": "file", "path": "/tmp/x" }));
        assert!(result.is_err());
    }
}
