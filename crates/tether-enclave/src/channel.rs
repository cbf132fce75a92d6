// ABOUTME: The secure channel seam to the paired phone, and the pairing secret that owns it.
// ABOUTME: Transport crypto lives behind SecureChannel; the client only sends and drains messages.

use crate::error::ChannelError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Authenticated, message-oriented, possibly lossy transport to the enclave.
///
/// Implementations are expected to be safe for concurrent use: several
/// request round trips may be sending and receiving at the same time.
#[async_trait]
pub trait SecureChannel: Send + Sync {
    /// Send one message.
    async fn send(&self, message: &[u8]) -> Result<(), ChannelError>;

    /// Receive whatever messages are available.
    ///
    /// May block for a while (long poll) and may return zero, one, or many
    /// complete messages, in arrival order. An error means the channel is
    /// unusable for the current attempt.
    async fn receive(&self) -> Result<Vec<Vec<u8>>, ChannelError>;
}

/// Credential for one paired enclave: its name and the channel its keys open.
///
/// Cloning is cheap and shares the channel.
#[derive(Clone)]
pub struct PairingSecret {
    enclave_name: String,
    channel: Arc<dyn SecureChannel>,
}

impl PairingSecret {
    pub fn new(enclave_name: impl Into<String>, channel: Arc<dyn SecureChannel>) -> Self {
        Self {
            enclave_name: enclave_name.into(),
            channel,
        }
    }

    /// Display name of the paired device.
    pub fn enclave_name(&self) -> &str {
        &self.enclave_name
    }

    pub(crate) async fn send(&self, message: &[u8]) -> Result<(), ChannelError> {
        self.channel.send(message).await
    }

    pub(crate) async fn receive(&self) -> Result<Vec<Vec<u8>>, ChannelError> {
        self.channel.receive().await
    }
}

impl fmt::Debug for PairingSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairingSecret")
            .field("enclave_name", &self.enclave_name)
            .field("channel", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingChannel {
        sent: Mutex<Vec<Vec<u8>>>,
    }

    #[async_trait]
    impl SecureChannel for RecordingChannel {
        async fn send(&self, message: &[u8]) -> Result<(), ChannelError> {
            self.sent.lock().unwrap().push(message.to_vec());
            Ok(())
        }

        async fn receive(&self) -> Result<Vec<Vec<u8>>, ChannelError> {
            Err(ChannelError::Closed)
        }
    }

    #[tokio::test]
    async fn test_pairing_secret_delegates_to_channel() {
        let channel = Arc::new(RecordingChannel::default());
        let secret = PairingSecret::new("pixel", channel.clone());

        secret.send(b"hello").await.unwrap();
        assert_eq!(*channel.sent.lock().unwrap(), vec![b"hello".to_vec()]);
        assert_eq!(secret.receive().await, Err(ChannelError::Closed));
        assert_eq!(secret.enclave_name(), "pixel");
    }

    #[test]
    fn test_debug_hides_channel() {
        let secret = PairingSecret::new("pixel", Arc::new(RecordingChannel::default()));
        let debug = format!("{:?}", secret);
        assert!(debug.contains("pixel"));
        assert!(debug.contains("[REDACTED]"));
    }
}
