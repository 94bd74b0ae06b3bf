//! Error types for the lease synchronizer
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for lease operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the lease synchronizer
#[derive(Error, Debug)]
pub enum Error {
    /// Bad invocation: wrong argument count, misplaced or repeated fields
    #[error("Usage error: {0}")]
    Usage(String),

    /// Action word not recognized
    #[error("Invalid command {0}")]
    UnknownCommand(String),

    /// A required environment variable is not set
    #[error("Missing environment variable: {0}")]
    MissingEnvironment(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A store operation was rejected or failed
    #[error("Lease store error: {0}")]
    Store(String),

    /// The store session could not be established
    #[error("Connection error: {0}")]
    Connection(String),

    /// No row exists for the given key
    #[error("Lease not found: {0}")]
    NotFound(String),

    /// A row with the same key already exists
    #[error("Lease conflict: {0}")]
    Conflict(String),

    /// Malformed request or response on the store transport
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// How an error is surfaced to the caller of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad arguments or unknown action; nothing was mutated
    Usage,
    /// Missing environment or invalid configuration; fatal for the invocation
    Environment,
    /// The store rejected or failed the operation; reported, not fatal
    StoreOperation,
    /// The session could not be opened; reported like a store failure
    StoreConnectivity,
}

impl Error {
    /// Create a usage error
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    /// Create an unknown command error
    pub fn unknown_command(word: impl Into<String>) -> Self {
        Self::UnknownCommand(word.into())
    }

    /// Create a missing environment error
    pub fn missing_environment(var: impl Into<String>) -> Self {
        Self::MissingEnvironment(var.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Classify the error by how the process reports it
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Usage(_) | Error::UnknownCommand(_) => ErrorKind::Usage,
            Error::MissingEnvironment(_) | Error::Config(_) => ErrorKind::Environment,
            Error::Connection(_) | Error::Io(_) => ErrorKind::StoreConnectivity,
            Error::Store(_)
            | Error::NotFound(_)
            | Error::Conflict(_)
            | Error::Protocol(_) => ErrorKind::StoreOperation,
        }
    }
}
