//! Error types
//!
//! Request-level failures never reach the dispatcher; startup failures end the process.

use std::io;
use std::path::PathBuf;

/// Failure while reading the request head
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Peer closed the stream before sending a request line
    #[error("connection closed before request line")]
    Closed,
    /// Request line did not carry method, resource and protocol
    #[error("malformed request line: {line:?}")]
    Malformed { line: String },
    #[error("failed to read request: {0}")]
    Io(#[from] io::Error),
}

/// Failure that aborts the response for one connection
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("failed to read request: {0}")]
    Read(#[source] io::Error),
    #[error("failed to read body file {}: {source}", path.display())]
    Body {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write response: {0}")]
    Write(#[source] io::Error),
}

/// Failure before the server starts accepting connections
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("{key} is not a directory: {}", path.display())]
    MissingDirectory { key: &'static str, path: PathBuf },
    #[error("fixed document missing: {}", path.display())]
    MissingDocument { path: PathBuf },
    #[error("invalid bind address '{addr}': {reason}")]
    Address { addr: String, reason: String },
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("failed to open log file: {0}")]
    Log(#[source] io::Error),
}
