// ABOUTME: Error types for the tether ssh proxy.
// ABOUTME: Connection, daemon, and config failures; relay I/O errors end a session rather than erroring.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    /// Could not open the TCP connection to the SSH server.
    #[error("could not connect to remote {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The host-auth daemon socket could not be reached or written.
    #[error("could not reach host-auth daemon at {path}: {source}")]
    DaemonUnreachable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Host-auth record could not be encoded.
    #[error("failed to encode host-auth record: {0}")]
    Encode(#[from] serde_json::Error),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ProxyError>;
