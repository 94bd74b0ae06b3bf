//! Minimal OVSDB JSON-RPC 1.0 client (RFC 7047)
//!
//! Messages are JSON objects written back to back on the stream with no
//! framing. Incoming bytes are buffered until a complete value parses.

use std::time::Duration;

use serde_json::{Value, json};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, trace};

use crate::remote::Transport;

/// Error returned by the OVSDB server for failed constraint checks
const CONSTRAINT_VIOLATION: &str = "constraint violation";

/// Errors raised while talking to the OVSDB server
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("OVSDB connection closed")]
    Closed,

    #[error("OVSDB request timed out after {0:?}")]
    Timeout(Duration),

    #[error("OVSDB I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed OVSDB message: {0}")]
    Malformed(String),

    #[error("OVSDB error '{error}': {details}")]
    Server { error: String, details: String },
}

impl RpcError {
    /// Build a server error from an RFC 7047 `<error>` object
    fn from_error_value(value: &Value) -> Self {
        let error = match value.get("error") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => value.to_string(),
        };
        let details = value
            .get("details")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        RpcError::Server { error, details }
    }
}

impl From<RpcError> for lease_core::Error {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Closed | RpcError::Timeout(_) | RpcError::Io(_) => {
                lease_core::Error::connection(err.to_string())
            }
            RpcError::Malformed(_) => lease_core::Error::protocol(err.to_string()),
            RpcError::Server { ref error, .. } if error == CONSTRAINT_VIOLATION => {
                lease_core::Error::conflict(err.to_string())
            }
            RpcError::Server { .. } => lease_core::Error::store(err.to_string()),
        }
    }
}

/// A JSON-RPC connection over any byte stream
pub struct Connection {
    stream: Box<dyn Transport>,
    buffer: Vec<u8>,
    next_id: u64,
}

impl Connection {
    pub fn new(stream: Box<dyn Transport>) -> Self {
        Self {
            stream,
            buffer: Vec::with_capacity(4096),
            next_id: 0,
        }
    }

    /// Run one `transact` request and return the per-operation results
    pub async fn transact(
        &mut self,
        database: &str,
        operations: Vec<Value>,
        timeout: Duration,
    ) -> Result<Vec<Value>, RpcError> {
        let mut params = Vec::with_capacity(operations.len() + 1);
        params.push(Value::String(database.to_string()));
        params.extend(operations);

        let result = self.call("transact", Value::Array(params), timeout).await?;
        match result {
            Value::Array(results) => Ok(results),
            other => Err(RpcError::Malformed(format!(
                "transact result is not an array: {}",
                other
            ))),
        }
    }

    /// Send a request and wait for the response with the same id
    pub async fn call(
        &mut self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, RpcError> {
        let id = self.next_id;
        self.next_id += 1;

        let request = json!({ "method": method, "params": params, "id": id });
        debug!(method, id, "Sending OVSDB request");

        match tokio::time::timeout(timeout, self.exchange(request, id)).await {
            Ok(result) => result,
            Err(_) => Err(RpcError::Timeout(timeout)),
        }
    }

    async fn exchange(&mut self, request: Value, id: u64) -> Result<Value, RpcError> {
        self.send(&request).await?;

        loop {
            let message = self.receive().await?;

            // Server-initiated request; only echo needs an answer
            if let Some(method) = message.get("method").and_then(Value::as_str) {
                if method == "echo" {
                    let reply = json!({
                        "result": message.get("params").cloned().unwrap_or(Value::Null),
                        "error": null,
                        "id": message.get("id").cloned().unwrap_or(Value::Null),
                    });
                    self.send(&reply).await?;
                } else {
                    trace!(method, "Ignoring OVSDB notification");
                }
                continue;
            }

            if message.get("id").and_then(Value::as_u64) != Some(id) {
                trace!(?message, "Ignoring OVSDB response for another request");
                continue;
            }

            return match message.get("error") {
                None | Some(Value::Null) => Ok(message.get("result").cloned().unwrap_or(Value::Null)),
                Some(error) => Err(RpcError::from_error_value(&json!({
                    "error": error,
                    "details": message.get("details").cloned().unwrap_or(Value::Null),
                }))),
            };
        }
    }

    /// Write one message to the stream
    pub async fn send(&mut self, message: &Value) -> Result<(), RpcError> {
        let bytes = serde_json::to_vec(message)
            .map_err(|e| RpcError::Malformed(format!("cannot encode request: {}", e)))?;
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Read the next complete message from the stream
    pub async fn receive(&mut self) -> Result<Value, RpcError> {
        loop {
            if let Some(message) = self.take_buffered()? {
                return Ok(message);
            }

            let read = self.stream.read_buf(&mut self.buffer).await?;
            if read == 0 {
                return Err(RpcError::Closed);
            }
        }
    }

    /// Pop one complete value off the front of the buffer, if there is one
    fn take_buffered(&mut self) -> Result<Option<Value>, RpcError> {
        let (parsed, consumed) = {
            let mut values =
                serde_json::Deserializer::from_slice(&self.buffer).into_iter::<Value>();
            let parsed = values.next();
            (parsed, values.byte_offset())
        };

        match parsed {
            Some(Ok(value)) => {
                self.buffer.drain(..consumed);
                Ok(Some(value))
            }
            Some(Err(e)) if e.is_eof() => Ok(None),
            Some(Err(e)) => Err(RpcError::Malformed(e.to_string())),
            None => {
                self.buffer.clear();
                Ok(None)
            }
        }
    }

    /// Shut down the write half of the stream
    pub async fn shutdown(&mut self) -> Result<(), RpcError> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

/// Check every per-operation result for an `error` member
///
/// A transaction that fails to commit carries one extra trailing error
/// object beyond the operations that were sent.
pub fn check_results(results: &[Value], expected: usize) -> Result<(), RpcError> {
    if let Some(failed) = results
        .iter()
        .find(|result| result.get("error").is_some_and(|e| !e.is_null()))
    {
        return Err(RpcError::from_error_value(failed));
    }

    if results.len() < expected {
        return Err(RpcError::Malformed(format!(
            "expected {} operation results, got {}",
            expected,
            results.len()
        )));
    }

    Ok(())
}
