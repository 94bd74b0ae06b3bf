//! Action dispatcher
//!
//! The Dispatcher turns one [`Invocation`] into at most one lease store
//! operation:
//!
//! ```text
//!  Invocation ──► Dispatcher ──► open session ──► operation ──► close session
//!                     │
//!                     ├── tftp     → nothing
//!                     └── unknown  → Error::UnknownCommand
//! ```
//!
//! | Action | Operation |
//! |--------|-----------|
//! | init, show | `list()` then print rows |
//! | add | `insert(record)` |
//! | del | `delete(mac_address)` |
//! | old | `update(mac_address, record)` |
//! | clear | `clear()` |
//!
//! Store failures, including failing to open the session, are logged as
//! warnings and returned as [`Outcome::StoreFailed`]; they are never retried
//! and never turned into an `Err`. The session is closed on every path once
//! it was opened.

use std::io::Write;

use tracing::{debug, error, warn};

use crate::command::{Action, Invocation};
use crate::error::{Error, Result};
use crate::presentation::write_rows;
use crate::record::LeaseRecord;
use crate::traits::{LeaseSession, LeaseStore};

/// Result of dispatching one invocation
#[derive(Debug)]
pub enum Outcome {
    /// Rows were printed
    Listed {
        rows: usize,
    },

    /// A row was inserted
    Inserted,

    /// A row was updated; holds the row as stored afterwards
    Updated(LeaseRecord),

    /// A row was deleted
    Deleted,

    /// The table was emptied
    Cleared,

    /// Nothing to do for this action
    Skipped,

    /// The store operation failed; already logged
    StoreFailed {
        action: Action,
        error: Error,
    },
}

impl Outcome {
    /// Whether the store operation (if any) succeeded
    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::StoreFailed { .. })
    }
}

/// Maps actions onto lease store operations
pub struct Dispatcher {
    store: Box<dyn LeaseStore>,
}

impl Dispatcher {
    /// Create a dispatcher over `store`
    pub fn new(store: Box<dyn LeaseStore>) -> Self {
        Self { store }
    }

    /// Run the store operation selected by `invocation`
    ///
    /// Listing output is written to `out`.
    ///
    /// # Returns
    ///
    /// - `Ok(Outcome)`: The action ran, or its store failure was reported
    /// - `Err(Error::UnknownCommand)`: The action word is not recognized
    /// - `Err(Error::Usage)`: A keyed action carries no MAC address
    pub async fn dispatch<W: Write>(&self, invocation: Invocation, out: &mut W) -> Result<Outcome> {
        match &invocation.action {
            Action::Noop => {
                debug!("Nothing to record for tftp");
                return Ok(Outcome::Skipped);
            }
            Action::Unknown(word) => {
                error!("Invalid command {} to dhcp_leases script.... Exiting", word);
                return Err(Error::unknown_command(word.clone()));
            }
            action if action.is_keyed() && invocation.record.key().is_none() => {
                error!("Command {} requires a MAC address", action);
                return Err(Error::usage(format!("command '{}' requires a MAC address", action)));
            }
            _ => {}
        }

        match self.run_in_session(&invocation, out).await {
            Ok(outcome) => Ok(outcome),
            Err(error) => {
                warn!(
                    "dhcp_leases {} failed on {} store: {}",
                    invocation.action,
                    self.store.store_name(),
                    error
                );
                Ok(Outcome::StoreFailed {
                    action: invocation.action,
                    error,
                })
            }
        }
    }

    /// Open a session, perform the operation, close the session
    async fn run_in_session<W: Write>(&self, invocation: &Invocation, out: &mut W) -> Result<Outcome> {
        let mut session = self.store.open().await?;
        debug!("Opened {} session for {}", self.store.store_name(), invocation.action);

        let result = Self::perform(session.as_mut(), invocation, out).await;

        if let Err(e) = session.close().await {
            warn!("Failed to close {} session: {}", self.store.store_name(), e);
        } else {
            debug!("Closed {} session", self.store.store_name());
        }

        result
    }

    /// Perform the single operation for the action
    async fn perform<W: Write>(
        session: &mut dyn LeaseSession,
        invocation: &Invocation,
        out: &mut W,
    ) -> Result<Outcome> {
        let record = &invocation.record;
        let key = || {
            record
                .key()
                .ok_or_else(|| Error::usage("a MAC address is required"))
        };

        match &invocation.action {
            Action::Show => {
                let rows = session.list().await?;
                let rows = write_rows(rows, out).await?;
                Ok(Outcome::Listed { rows })
            }
            Action::Add => {
                session.insert(record).await?;
                debug!("Inserted lease {}", key()?);
                Ok(Outcome::Inserted)
            }
            Action::Delete => {
                session.delete(key()?).await?;
                debug!("Deleted lease {}", key()?);
                Ok(Outcome::Deleted)
            }
            Action::Update => {
                let updated = session.update(key()?, record).await?;
                debug!("Updated lease {}", key()?);
                Ok(Outcome::Updated(updated))
            }
            Action::Clear => {
                session.clear().await?;
                debug!("Cleared lease table");
                Ok(Outcome::Cleared)
            }
            Action::Noop | Action::Unknown(_) => Ok(Outcome::Skipped),
        }
    }
}
