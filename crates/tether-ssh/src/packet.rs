// ABOUTME: Stateless decoding of SSH binary packets and key-exchange reply messages.
// ABOUTME: Used on raw inbound chunks to spot the server's host key and exchange signature.

use crate::error::{Result, SshError};

/// Upper bound on a plausible payload length. Larger values mean the chunk is
/// garbage or not aligned on a packet boundary.
pub const MAX_PAYLOAD_LEN: u32 = 1 << 18;

/// SSH_MSG_KEXDH_REPLY / SSH_MSG_KEX_ECDH_REPLY (RFC 4253, RFC 5656).
pub const SSH_MSG_KEX_ECDH_REPLY: u8 = 31;

/// SSH_MSG_KEX_DH_GEX_REPLY (RFC 4419).
pub const SSH_MSG_KEX_DH_GEX_REPLY: u8 = 33;

/// Size of the packet header: uint32 packet_length + byte padding_length.
const HEADER_LEN: usize = 5;

/// Extract the payload of the first SSH binary packet in `chunk`.
///
/// Layout (RFC 4253 section 6):
/// - uint32 packet_length (big-endian, excludes itself)
/// - byte padding_length
/// - payload (packet_length - padding_length - 1 bytes)
/// - padding, then MAC
///
/// Only the header and payload need to be present in `chunk`.
pub fn packet_payload(chunk: &[u8]) -> Result<&[u8]> {
    if chunk.len() < HEADER_LEN {
        return Err(SshError::Truncated {
            needed: HEADER_LEN,
            available: chunk.len(),
        });
    }

    let packet_len = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    let padding_len = chunk[4];

    let payload_len = packet_len
        .checked_sub(u32::from(padding_len) + 1)
        .filter(|len| (1..=MAX_PAYLOAD_LEN).contains(len))
        .ok_or(SshError::PayloadLength {
            packet_len,
            padding_len,
        })? as usize;

    let end = HEADER_LEN + payload_len;
    if chunk.len() < end {
        return Err(SshError::Truncated {
            needed: end,
            available: chunk.len(),
        });
    }

    Ok(&chunk[HEADER_LEN..end])
}

/// The fields of a key-exchange reply that matter for host authentication.
///
/// Covers both the classic/ECDH reply (`Q_S` is the ephemeral key) and the
/// group-exchange reply (`f` sits in the same position as an mpint, which
/// shares the SSH string encoding).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KexReply<'a> {
    pub message_type: u8,
    pub host_key: &'a [u8],
    pub ephemeral_public_key: &'a [u8],
    pub signature: &'a [u8],
}

impl<'a> KexReply<'a> {
    /// Decode a key-exchange reply from a packet payload.
    ///
    /// The payload must be exactly: message type, host key, ephemeral key,
    /// signature. Anything else is rejected.
    pub fn decode(payload: &'a [u8]) -> Result<Self> {
        let mut reader = WireReader::new(payload);

        let message_type = reader.read_u8()?;
        if message_type != SSH_MSG_KEX_ECDH_REPLY && message_type != SSH_MSG_KEX_DH_GEX_REPLY {
            return Err(SshError::UnexpectedMessage(message_type));
        }

        let host_key = reader.read_string()?;
        let ephemeral_public_key = reader.read_string()?;
        let signature = reader.read_string()?;

        if !reader.is_empty() {
            return Err(SshError::TrailingBytes(reader.remaining()));
        }

        Ok(Self {
            message_type,
            host_key,
            ephemeral_public_key,
            signature,
        })
    }

    /// Decode a key-exchange reply straight from a raw packet chunk.
    pub fn from_packet(chunk: &'a [u8]) -> Result<Self> {
        Self::decode(packet_payload(chunk)?)
    }
}

/// Cursor over SSH wire-encoded data.
struct WireReader<'a> {
    buf: &'a [u8],
}

impl<'a> WireReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.buf.len() < n {
            return Err(SshError::Truncated {
                needed: n,
                available: self.buf.len(),
            });
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// SSH string: uint32 length followed by that many bytes.
    fn read_string(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u32()? as usize;
        self.take(len)
    }

    fn remaining(&self) -> usize {
        self.buf.len()
    }

    fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}
