//! Lease record model
//!
//! A [`LeaseRecord`] is the unit of synchronization. Every field is an
//! `Option<String>`: `None` means the field was never supplied, which is
//! distinct from `Some(String::new())`, a field supplied empty.
//!
//! No content validation happens here. MAC and IP strings are carried through
//! exactly as the caller gave them.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Rendering of an unset field in listings
pub const PLACEHOLDER: &str = "*";

/// A named lease field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Hardware address, the table key
    MacAddress,
    /// Assigned network address
    IpAddress,
    /// Hostname reported by the client
    ClientHostname,
    /// Client identifier reported by the client
    ClientId,
    /// Lease expiration, sourced from the environment
    ExpiryTime,
}

impl Field {
    /// Fields that can be given as arguments, in positional order
    pub const POSITIONAL: [Field; 4] = [
        Field::MacAddress,
        Field::IpAddress,
        Field::ClientHostname,
        Field::ClientId,
    ];

    /// Column name of the field
    pub fn name(&self) -> &'static str {
        match self {
            Field::MacAddress => "mac_address",
            Field::IpAddress => "ip_address",
            Field::ClientHostname => "client_hostname",
            Field::ClientId => "client_id",
            Field::ExpiryTime => "expiry_time",
        }
    }

    /// Resolve the tag of a `tag=value` argument
    ///
    /// `expiry_time` is never accepted: it only comes from the environment.
    pub fn from_tag(tag: &str) -> Option<Field> {
        match tag {
            "mac_address" | "mac" => Some(Field::MacAddress),
            "ip_address" | "ip" => Some(Field::IpAddress),
            "client_hostname" | "hostname" => Some(Field::ClientHostname),
            "client_id" => Some(Field::ClientId),
            _ => None,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One lease entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseRecord {
    /// Lease expiration timestamp (opaque)
    #[serde(default)]
    pub expiry_time: Option<String>,
    /// Hardware address, unique key of the table
    #[serde(default)]
    pub mac_address: Option<String>,
    /// Assigned network address
    #[serde(default)]
    pub ip_address: Option<String>,
    /// Hostname reported by the client
    #[serde(default)]
    pub client_hostname: Option<String>,
    /// Client identifier reported by the client
    #[serde(default)]
    pub client_id: Option<String>,
}

impl LeaseRecord {
    /// Create a record with every field unset
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from positional values
    ///
    /// Values fill `mac_address`, `ip_address`, `client_hostname` and
    /// `client_id` in that order. Later fields may be omitted, earlier ones
    /// cannot. `expiry_time` is left unset.
    pub fn from_positional<I, S>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut record = Self::new();
        for (index, value) in values.into_iter().enumerate() {
            let field = Field::POSITIONAL.get(index).ok_or_else(|| {
                Error::usage(format!(
                    "at most {} lease fields can be given",
                    Field::POSITIONAL.len()
                ))
            })?;
            record.set(*field, Some(value.into()));
        }
        Ok(record)
    }

    /// Set the expiry time
    pub fn with_expiry_time(mut self, expiry_time: impl Into<String>) -> Self {
        self.expiry_time = Some(expiry_time.into());
        self
    }

    /// The table key, if supplied
    pub fn key(&self) -> Option<&str> {
        self.mac_address.as_deref()
    }

    /// Read a field
    pub fn get(&self, field: Field) -> Option<&str> {
        self.slot(field).as_deref()
    }

    /// Write a field
    pub fn set(&mut self, field: Field, value: Option<String>) {
        *self.slot_mut(field) = value;
    }

    /// Overwrite this record's fields with the ones set in `changes`
    ///
    /// Unset fields in `changes` leave the current value in place. The key is
    /// never rewritten.
    pub fn apply(&mut self, changes: &LeaseRecord) {
        for field in [
            Field::ExpiryTime,
            Field::IpAddress,
            Field::ClientHostname,
            Field::ClientId,
        ] {
            if let Some(value) = changes.get(field) {
                self.set(field, Some(value.to_string()));
            }
        }
    }

    fn slot(&self, field: Field) -> &Option<String> {
        match field {
            Field::MacAddress => &self.mac_address,
            Field::IpAddress => &self.ip_address,
            Field::ClientHostname => &self.client_hostname,
            Field::ClientId => &self.client_id,
            Field::ExpiryTime => &self.expiry_time,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::MacAddress => &mut self.mac_address,
            Field::IpAddress => &mut self.ip_address,
            Field::ClientHostname => &mut self.client_hostname,
            Field::ClientId => &mut self.client_id,
            Field::ExpiryTime => &mut self.expiry_time,
        }
    }
}

/// A listed row with unset fields replaced by [`PLACEHOLDER`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseRow {
    pub expiry_time: String,
    pub mac_address: String,
    pub ip_address: String,
    pub client_hostname: String,
    pub client_id: String,
}

impl From<&LeaseRecord> for LeaseRow {
    fn from(record: &LeaseRecord) -> Self {
        let render = |value: &Option<String>| {
            value.clone().unwrap_or_else(|| PLACEHOLDER.to_string())
        };
        Self {
            expiry_time: render(&record.expiry_time),
            mac_address: render(&record.mac_address),
            ip_address: render(&record.ip_address),
            client_hostname: render(&record.client_hostname),
            client_id: render(&record.client_id),
        }
    }
}

impl From<LeaseRecord> for LeaseRow {
    fn from(record: LeaseRecord) -> Self {
        Self::from(&record)
    }
}
