// ABOUTME: Error types for the tether-enclave client.
// ABOUTME: ChannelError for the opaque transport, EnclaveError for request round trips.

use thiserror::Error;

/// Failure reported by a secure channel.
///
/// Once a channel returns one of these for an operation, that attempt is over;
/// the caller may retry the whole request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The channel was closed by either side.
    #[error("channel closed")]
    Closed,

    /// Transport-level failure (network, crypto, relay).
    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors returned by enclave requests.
#[derive(Error, Debug)]
pub enum EnclaveError {
    /// No pairing secret has been set.
    #[error("enclave client not paired")]
    NotPaired,

    /// Writing the request to the channel failed.
    #[error("send error: {0}")]
    Send(#[source] ChannelError),

    /// Reading from the channel failed before our response arrived.
    #[error("receive error: {0}")]
    Recv(#[source] ChannelError),

    /// Payload could not be serialized or deserialized. Retrying will not help.
    #[error("protocol error: {0}")]
    Proto(#[from] serde_json::Error),

    /// The enclave answered with a different kind of response than requested.
    #[error("unexpected response: expected {expected}, got {actual}")]
    UnexpectedResponse {
        expected: &'static str,
        actual: &'static str,
    },

    /// No response within the allotted time, or the request was evicted.
    #[error("request timed out")]
    Timeout,

    /// The enclave declined the request.
    #[error("enclave rejected request: {0}")]
    Rejected(String),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),
}

impl EnclaveError {
    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EnclaveError::Send(_) | EnclaveError::Recv(_) | EnclaveError::Timeout
        )
    }
}

/// Result type alias using EnclaveError.
pub type Result<T> = std::result::Result<T, EnclaveError>;
