// ABOUTME: HostAuthRecord: host key, exchange signature, and hostnames from one observed key exchange.
// ABOUTME: Built from raw inbound chunks; never fails, a non-matching chunk simply yields None.

use crate::fingerprint::{openssh_fingerprint, signature_fingerprint};
use crate::packet::KexReply;
use serde::{Deserialize, Serialize};

/// Host authentication material extracted from one SSH key-exchange reply.
///
/// Serialized with the field names the host-auth daemon expects
/// (`HostKey`, `Signature`, `HostNames`), bytes as base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostAuthRecord {
    #[serde(with = "crate::serde_bytes::b64")]
    pub host_key: Vec<u8>,
    #[serde(with = "crate::serde_bytes::b64")]
    pub signature: Vec<u8>,
    pub host_names: Vec<String>,
}

impl HostAuthRecord {
    /// Try to read `chunk` as a packet carrying a key-exchange reply from `hostname`.
    ///
    /// Returns `None` for anything else: short chunks, implausible lengths,
    /// other message types. That is the common case, not an error.
    pub fn from_chunk(chunk: &[u8], hostname: &str) -> Option<Self> {
        let reply = KexReply::from_packet(chunk).ok()?;
        Some(Self::from_reply(&reply, hostname))
    }

    /// Build a record from an already decoded reply.
    pub fn from_reply(reply: &KexReply<'_>, hostname: &str) -> Self {
        Self {
            host_key: reply.host_key.to_vec(),
            signature: reply.signature.to_vec(),
            host_names: vec![hostname.to_string()],
        }
    }

    /// Bracketed base-62 fingerprint of the exchange signature, for display.
    pub fn short_fingerprint(&self) -> String {
        signature_fingerprint(&self.signature)
    }

    /// OpenSSH `SHA256:...` fingerprint of the host key, if it parses as a public key.
    pub fn host_key_fingerprint(&self) -> Option<String> {
        openssh_fingerprint(&self.host_key).ok()
    }
}
