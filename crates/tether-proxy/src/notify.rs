// ABOUTME: Non-blocking user notices from the relay path.
// ABOUTME: Messages go over a bounded channel and a printer task writes them to stderr.

use colored::Colorize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

/// Capacity of the notice queue. Notices beyond it are dropped.
pub const NOTICE_QUEUE_CAPACITY: usize = 32;

/// Handle the relay uses to emit notices. Never blocks.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    tx: Option<mpsc::Sender<String>>,
}

impl Notifier {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx: Some(tx) }, rx)
    }

    /// A notifier that discards everything.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Queue a notice. Returns false if it was dropped.
    pub fn notify(&self, message: impl Into<String>) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        match tx.try_send(message.into()) {
            Ok(()) => true,
            Err(TrySendError::Full(dropped)) => {
                debug!(notice = %dropped, "Notice queue full, dropping");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// Write notices to `out` until every sender is gone.
///
/// Lines end in `\r\n` since the terminal is usually in raw mode under ssh.
pub async fn print_notices<W>(mut rx: mpsc::Receiver<String>, mut out: W)
where
    W: AsyncWrite + Unpin,
{
    while let Some(notice) = rx.recv().await {
        let line = format!("{} {}\r\n", "tether ▶".cyan().bold(), notice);
        if out.write_all(line.as_bytes()).await.is_err() {
            break;
        }
        let _ = out.flush().await;
    }
}

/// Spawn the stderr printer, returning the notifier that feeds it.
pub fn spawn_stderr_printer() -> Notifier {
    let (notifier, rx) = Notifier::channel(NOTICE_QUEUE_CAPACITY);
    tokio::spawn(print_notices(rx, tokio::io::stderr()));
    notifier
}
