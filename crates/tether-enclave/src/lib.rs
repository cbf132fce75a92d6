// ABOUTME: Client for a phone-held SSH key enclave reached over a paired secure channel.
// ABOUTME: Provides EnclaveClient, the wire protocol, the SecureChannel seam, and the pending table.

//! # tether-enclave
//!
//! The workstation side of phone-held SSH keys. The private key never leaves
//! the phone; this crate sends identity, signature, and key list requests over
//! a paired [`SecureChannel`] and matches the asynchronous responses back to
//! whoever asked.
//!
//! ## Quick Start
//!
//! ```ignore
//! use tether_enclave::{EnclaveClient, PairingSecret, SignRequest};
//!
//! let client = EnclaveClient::unpaired();
//! client.pair(PairingSecret::new("phone", channel));
//!
//! if let Some(signer) = client.request_identity_signer().await? {
//!     let signature = signer.sign(b"session data").await?;
//! }
//! ```

mod channel;
mod client;
mod config;
mod error;
mod pending;
mod protocol;
mod signer;

pub use channel::{PairingSecret, SecureChannel};
pub use client::EnclaveClient;
pub use config::EnclaveConfig;
pub use error::{ChannelError, EnclaveError, Result};
pub use pending::{PendingRequests, Resolution, ResponseSlot, DEFAULT_PENDING_CAPACITY};
pub use protocol::{
    current_timestamp, ListRequest, ListResponse, MeRequest, MeResponse, Profile, Request,
    RequestBody, Response, ResponseBody, SignRequest, SignResponse,
};
pub use signer::EnclaveSigner;
