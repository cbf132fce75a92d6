// ABOUTME: Timeouts and table sizing for the enclave client.
// ABOUTME: Loadable from TOML; every field has a default, zero seconds means no timeout.

use crate::error::{EnclaveError, Result};
use crate::pending::DEFAULT_PENDING_CAPACITY;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Enclave client configuration.
///
/// ```toml
/// identity_timeout_secs = 20
/// sign_timeout_secs = 30
/// list_timeout_secs = 0     # wait indefinitely
/// pending_capacity = 128
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnclaveConfig {
    /// How long an identity request may wait for the phone.
    pub identity_timeout_secs: u64,
    /// How long a signature request may wait for the phone.
    pub sign_timeout_secs: u64,
    /// How long a key list request may wait. Unset or zero waits until the
    /// channel fails.
    pub list_timeout_secs: Option<u64>,
    /// Maximum number of requests awaiting a response.
    pub pending_capacity: usize,
}

impl Default for EnclaveConfig {
    fn default() -> Self {
        Self {
            identity_timeout_secs: 20,
            sign_timeout_secs: 30,
            list_timeout_secs: None,
            pending_capacity: DEFAULT_PENDING_CAPACITY,
        }
    }
}

impl EnclaveConfig {
    pub fn identity_timeout(&self) -> Option<Duration> {
        timeout_from_secs(self.identity_timeout_secs)
    }

    pub fn sign_timeout(&self) -> Option<Duration> {
        timeout_from_secs(self.sign_timeout_secs)
    }

    pub fn list_timeout(&self) -> Option<Duration> {
        self.list_timeout_secs.and_then(timeout_from_secs)
    }

    /// Parse a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| EnclaveError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EnclaveError::Config(format!("Failed to read config from {:?}: {}", path, e))
        })?;
        Self::from_toml_str(&contents)
    }
}

fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
