//! OVSDB remote addresses and connection setup

use std::path::PathBuf;
use std::time::Duration;

use lease_core::{Error, Result};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Byte stream to an OVSDB server
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Transport for T {}

/// Where the OVSDB server listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Remote {
    /// `unix:<path>`
    Unix(PathBuf),
    /// `tcp:<host>:<port>`
    Tcp(String),
}

impl Remote {
    /// Parse an OVSDB remote string
    pub fn parse(remote: &str) -> Result<Self> {
        if let Some(path) = remote.strip_prefix("unix:") {
            if path.is_empty() {
                return Err(Error::config("unix: remote needs a socket path"));
            }
            return Ok(Remote::Unix(PathBuf::from(path)));
        }

        if let Some(address) = remote.strip_prefix("tcp:") {
            match address.rsplit_once(':') {
                Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
                    return Ok(Remote::Tcp(address.to_string()));
                }
                _ => {
                    return Err(Error::config(format!(
                        "tcp: remote must be tcp:<host>:<port>, got '{}'",
                        remote
                    )));
                }
            }
        }

        Err(Error::config(format!(
            "Unsupported OVSDB remote '{}'. Use unix:<path> or tcp:<host>:<port>",
            remote
        )))
    }

    /// Open a stream to the remote within `timeout`
    pub async fn connect(&self, timeout: Duration) -> Result<Box<dyn Transport>> {
        let connecting = async {
            match self {
                #[cfg(unix)]
                Remote::Unix(path) => tokio::net::UnixStream::connect(path)
                    .await
                    .map(|stream| Box::new(stream) as Box<dyn Transport>),
                #[cfg(not(unix))]
                Remote::Unix(_) => Err(std::io::Error::new(
                    std::io::ErrorKind::Unsupported,
                    "unix sockets are not available on this platform",
                )),
                Remote::Tcp(address) => TcpStream::connect(address.as_str())
                    .await
                    .map(|stream| Box::new(stream) as Box<dyn Transport>),
            }
        };

        match tokio::time::timeout(timeout, connecting).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(Error::connection(format!(
                "Failed to connect to OVSDB at {}: {}",
                self, e
            ))),
            Err(_) => Err(Error::connection(format!(
                "Timed out after {:?} connecting to OVSDB at {}",
                timeout, self
            ))),
        }
    }
}

impl std::fmt::Display for Remote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Remote::Unix(path) => write!(f, "unix:{}", path.display()),
            Remote::Tcp(address) => write!(f, "tcp:{}", address),
        }
    }
}
