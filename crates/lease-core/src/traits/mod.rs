//! Core traits for the lease synchronizer
//!
//! This module defines the abstract interfaces that store backends implement.
//!
//! - [`LeaseStore`]: Opens sessions on the lease table
//! - [`LeaseSession`]: Row operations inside one scoped session
//! - [`LeaseStoreFactory`]: Builds stores from configuration

pub mod lease_store;

pub use lease_store::{LeaseSession, LeaseStore, LeaseStoreFactory, LeaseStream, stream_rows};
