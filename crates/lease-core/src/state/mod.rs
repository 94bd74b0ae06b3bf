// # Lease Store Implementations
//
// This module provides the built-in implementation of the LeaseStore trait.
// The OVSDB store lives in its own crate.

pub mod memory;

pub use memory::{MemoryLeaseStore, MemoryLeaseStoreFactory};
