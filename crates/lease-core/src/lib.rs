// # lease-core
//
// Core library for the DHCP lease synchronizer.
//
// A lease-issuing process (dnsmasq) runs a script once per lease event. Each
// run is translated into exactly one mutation of a shared lease table, or a
// listing of it, and then the process exits.
//
// ## Architecture Overview
//
// - **LeaseRecord**: In-memory shape of one lease, unset fields are `None`
// - **Invocation**: Command interpreter output (action + record)
// - **LeaseStore / LeaseSession**: Traits for the scoped lease table session
// - **Dispatcher**: Runs the single store operation an action implies
// - **presentation**: Renders listed rows in the dnsmasq lease-file order
// - **StoreRegistry**: Plugin-based registry for store backends
//
// ## Design Principles
//
// 1. **Process-per-event**: No retained state between invocations
// 2. **One operation**: Each invocation performs at most one store operation
// 3. **Scoped sessions**: A session is always closed, success or failure
// 4. **Library-First**: The binary is a thin layer over this crate

pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod presentation;
pub mod record;
pub mod registry;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use command::{Action, Environment, Invocation, ProcessEnvironment};
pub use config::{InterpreterConfig, OvsdbConfig, StoreConfig};
pub use dispatch::{Dispatcher, Outcome};
pub use error::{Error, ErrorKind, Result};
pub use record::{Field, LeaseRecord, LeaseRow, PLACEHOLDER};
pub use registry::StoreRegistry;
pub use state::MemoryLeaseStore;
pub use traits::{LeaseSession, LeaseStore, LeaseStoreFactory, LeaseStream};
