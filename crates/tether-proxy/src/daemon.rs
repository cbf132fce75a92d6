// ABOUTME: Delivery of observed host-auth records to the local daemon.
// ABOUTME: One newline-terminated JSON record per unix socket connection.

use crate::error::{ProxyError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tether_ssh::HostAuthRecord;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tracing::debug;

/// Destination for host-auth records.
#[async_trait]
pub trait HostAuthSink: Send + Sync {
    async fn submit(&self, record: &HostAuthRecord) -> Result<()>;
}

/// Writes records to the daemon's unix socket.
#[derive(Debug, Clone)]
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    fn unreachable(&self, source: std::io::Error) -> ProxyError {
        ProxyError::DaemonUnreachable {
            path: self.socket_path.clone(),
            source,
        }
    }
}

#[async_trait]
impl HostAuthSink for DaemonClient {
    async fn submit(&self, record: &HostAuthRecord) -> Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|e| self.unreachable(e))?;
        stream
            .write_all(&line)
            .await
            .map_err(|e| self.unreachable(e))?;
        stream.shutdown().await.map_err(|e| self.unreachable(e))?;

        debug!(
            socket = %self.socket_path.display(),
            hosts = ?record.host_names,
            "→ host-auth record"
        );
        Ok(())
    }
}
