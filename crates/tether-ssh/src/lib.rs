// ABOUTME: Shared SSH wire utilities for tether crates.
// ABOUTME: Provides packet decoding, host-auth records, fingerprints, and byte serde helpers.

//! # tether-ssh
//!
//! SSH wire handling shared by the tether proxy and enclave client.
//!
//! ## Features
//!
//! - **Packet decoding**: pull the payload out of an unencrypted SSH binary
//!   packet and decode a key-exchange reply without copying
//! - **Host authentication**: turn an observed key-exchange reply into a
//!   [`HostAuthRecord`] for the host-auth daemon
//! - **Fingerprints**: base-62 signature fingerprints for display, SHA256
//!   digests and OpenSSH fingerprints of wire-format public keys
//!
//! ## Example
//!
//! ```no_run
//! use tether_ssh::HostAuthRecord;
//!
//! let chunk: &[u8] = &[];
//! if let Some(record) = HostAuthRecord::from_chunk(chunk, "github.com") {
//!     println!("host signature {}", record.short_fingerprint());
//! }
//! ```

mod error;
mod fingerprint;
mod host_auth;
mod packet;
pub mod serde_bytes;

pub use error::{Result, SshError};
pub use fingerprint::{
    base62_encode, openssh_fingerprint, signature_fingerprint, wire_key_digest, BASE62_ALPHABET,
};
pub use host_auth::HostAuthRecord;
pub use packet::{
    packet_payload, KexReply, MAX_PAYLOAD_LEN, SSH_MSG_KEX_DH_GEX_REPLY, SSH_MSG_KEX_ECDH_REPLY,
};

// Re-export ssh_key types for convenience
pub use ssh_key::PublicKey;
