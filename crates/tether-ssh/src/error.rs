// ABOUTME: Error types for SSH wire decoding using thiserror.
// ABOUTME: Describes why a chunk was not a usable SSH packet or key-exchange reply.

use thiserror::Error;

/// Errors that can occur while decoding SSH wire data.
///
/// Most of these are expected in normal operation: the proxy feeds every
/// inbound chunk through the decoder and nearly all of them are not a
/// key-exchange reply.
#[derive(Error, Debug)]
pub enum SshError {
    /// Not enough bytes for the structure being decoded.
    #[error("truncated input: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    /// Packet header declared a payload length that is zero, negative, or too large.
    #[error("implausible payload length: packet length {packet_len}, padding {padding_len}")]
    PayloadLength { packet_len: u32, padding_len: u8 },

    /// Payload is not one of the expected message types.
    #[error("unexpected SSH message type {0}")]
    UnexpectedMessage(u8),

    /// Payload carried bytes after the last expected field.
    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),

    /// Failed to parse an SSH public key.
    #[error("failed to parse SSH public key: {0}")]
    ParseKey(#[source] ssh_key::Error),
}

/// Result type alias using SshError.
pub type Result<T> = std::result::Result<T, SshError>;
