// ABOUTME: Bidirectional relay between the local ssh client and the remote server.
// ABOUTME: Inbound chunks after the banner are inspected for key-exchange replies; bytes pass through unchanged.

use crate::config::ProxyConfig;
use crate::daemon::{DaemonClient, HostAuthSink};
use crate::error::{ProxyError, Result};
use crate::notify::{spawn_stderr_printer, Notifier};
use std::fmt;
use std::io;
use std::sync::Arc;
use tether_ssh::HostAuthRecord;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Default SSH port.
pub const DEFAULT_PORT: u16 = 22;

/// Remote SSH server address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Why a session stopped.
#[derive(Debug)]
pub enum SessionEnd {
    /// The server side reached EOF or failed.
    RemoteClosed(io::Result<()>),
    /// The local side reached EOF or failed.
    LocalClosed(io::Result<()>),
    /// A termination signal arrived.
    Signal(&'static str),
}

/// Inspects inbound chunks and hands matches to the notifier and sink.
#[derive(Clone)]
pub struct HostAuthObserver {
    hostname: String,
    notifier: Notifier,
    sink: Arc<dyn HostAuthSink>,
}

impl HostAuthObserver {
    pub fn new(hostname: impl Into<String>, notifier: Notifier, sink: Arc<dyn HostAuthSink>) -> Self {
        Self {
            hostname: hostname.into(),
            notifier,
            sink,
        }
    }

    /// Check one chunk. On a match, notify and submit in the background.
    ///
    /// Never blocks the relay and never fails it.
    pub fn observe(&self, chunk: &[u8]) -> Option<HostAuthRecord> {
        let record = HostAuthRecord::from_chunk(chunk, &self.hostname)?;
        let signature = record.short_fingerprint();
        info!(
            host = %self.hostname,
            signature = %signature,
            host_key = record.host_key_fingerprint().as_deref().unwrap_or("unparsed"),
            "Observed key exchange reply"
        );
        self.notifier.notify(format!("host signature {}", signature));

        let sink = self.sink.clone();
        let notifier = self.notifier.clone();
        let submitted = record.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.submit(&submitted).await {
                warn!(error = %e, "Host-auth record not delivered");
                if matches!(e, ProxyError::DaemonUnreachable { .. }) {
                    notifier.notify(
                        "could not reach the tether daemon; host key not verified"
                            .to_string(),
                    );
                }
            }
        });
        Some(record)
    }
}

impl fmt::Debug for HostAuthObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostAuthObserver")
            .field("hostname", &self.hostname)
            .finish_non_exhaustive()
    }
}

/// Copy server bytes to the local client, inspecting every chunk but the first.
pub async fn relay_inbound<R, W>(
    mut remote: R,
    mut local: W,
    observer: &HostAuthObserver,
    buffer_size: usize,
) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut seen_banner = false;
    loop {
        let n = remote.read(&mut buf).await?;
        if n == 0 {
            debug!("← remote EOF");
            return Ok(());
        }
        let chunk = &buf[..n];
        if seen_banner {
            observer.observe(chunk);
        } else {
            seen_banner = true;
        }
        local.write_all(chunk).await?;
        local.flush().await?;
    }
}

/// Copy local client bytes to the server.
pub async fn relay_outbound<R, W>(mut local: R, mut remote: W, buffer_size: usize) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; buffer_size.max(1)];
    loop {
        let n = local.read(&mut buf).await?;
        if n == 0 {
            debug!("→ local EOF");
            return Ok(());
        }
        remote.write_all(&buf[..n]).await?;
        remote.flush().await?;
    }
}

/// Relay both directions until either one finishes.
pub async fn run_session<T, I, O>(
    remote: T,
    local_in: I,
    local_out: O,
    observer: &HostAuthObserver,
    buffer_size: usize,
) -> SessionEnd
where
    T: AsyncRead + AsyncWrite,
    I: AsyncRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let (remote_read, remote_write) = tokio::io::split(remote);
    tokio::select! {
        result = relay_inbound(remote_read, local_out, observer, buffer_size) => {
            SessionEnd::RemoteClosed(result)
        }
        result = relay_outbound(local_in, remote_write, buffer_size) => {
            SessionEnd::LocalClosed(result)
        }
    }
}

/// Open the TCP connection to the server.
pub async fn connect(target: &Target) -> Result<TcpStream> {
    let stream = TcpStream::connect((target.host.as_str(), target.port))
        .await
        .map_err(|source| ProxyError::Connect {
            addr: target.to_string(),
            source,
        })?;
    if let Err(e) = stream.set_nodelay(true) {
        debug!(error = %e, "Could not set TCP_NODELAY");
    }
    Ok(stream)
}

/// Proxy stdin/stdout to `target` until either side closes or a signal arrives.
pub async fn run(target: Target, config: ProxyConfig) -> Result<()> {
    let remote = connect(&target).await?;
    info!(target = %target, "Connected");

    let notifier = if config.notify {
        spawn_stderr_printer()
    } else {
        Notifier::disabled()
    };
    let sink = Arc::new(DaemonClient::new(config.hostauth_socket_path()));
    let observer = HostAuthObserver::new(target.host.clone(), notifier, sink);

    let end = tokio::select! {
        end = run_session(
            remote,
            tokio::io::stdin(),
            tokio::io::stdout(),
            &observer,
            config.buffer_size,
        ) => end,
        name = wait_for_signal() => SessionEnd::Signal(name),
    };

    match &end {
        SessionEnd::RemoteClosed(Err(e)) | SessionEnd::LocalClosed(Err(e)) => {
            warn!(error = %e, target = %target, "Relay failed");
        }
        other => info!(end = ?other, target = %target, "Session ended"),
    }

    let _ = tokio::io::stdout().flush().await;
    tokio::time::sleep(config.grace_period()).await;
    Ok(())
}

async fn wait_for_signal() -> &'static str {
    match shutdown_signal().await {
        Ok(name) => name,
        Err(e) => {
            warn!(error = %e, "Could not install signal handlers");
            std::future::pending().await
        }
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;
    let mut quit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = interrupt.recv() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
        _ = hangup.recv() => "SIGHUP",
        _ = quit.recv() => "SIGQUIT",
    };
    Ok(name)
}

#[cfg(not(unix))]
async fn shutdown_signal() -> io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
