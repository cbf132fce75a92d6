// ABOUTME: EnclaveSigner: a signing handle for a profile whose private key stays on the phone.
// ABOUTME: Each sign() is a signature request routed through the EnclaveClient.

use crate::client::EnclaveClient;
use crate::error::{EnclaveError, Result};
use crate::protocol::{Profile, SignRequest};
use tether_ssh::PublicKey;

/// Signs with the enclave-held key of one profile.
#[derive(Debug, Clone)]
pub struct EnclaveSigner {
    client: EnclaveClient,
    profile: Profile,
    public_key: PublicKey,
}

impl EnclaveSigner {
    /// `None` if the profile's public key does not parse.
    pub(crate) fn from_profile(client: EnclaveClient, profile: Profile) -> Option<Self> {
        let public_key = profile.ssh_public_key().ok()?;
        Some(Self {
            client,
            profile,
            public_key,
        })
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Have the enclave sign `data`; returns the signature blob it produced.
    ///
    /// # Errors
    /// Any request error, or `EnclaveError::Rejected` if the enclave answered
    /// without a signature.
    pub async fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        let response = self
            .client
            .request_signature(SignRequest {
                public_key_fingerprint: self.profile.public_key_fingerprint(),
                data: data.to_vec(),
            })
            .await?;

        match (response.signature, response.error) {
            (Some(signature), _) => Ok(signature),
            (None, Some(error)) => Err(EnclaveError::Rejected(error)),
            (None, None) => Err(EnclaveError::Rejected(
                "response carried no signature".to_string(),
            )),
        }
    }
}
