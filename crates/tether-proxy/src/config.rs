// ABOUTME: Configuration for the ssh proxy: daemon socket, exit grace, notices, buffer size.
// ABOUTME: Optional TOML file under the config dir, then TETHER_* environment overrides.

use crate::error::{ProxyError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the host-auth daemon socket path.
pub const HOSTAUTH_SOCKET_ENV: &str = "TETHER_HOSTAUTH_SOCKET";

/// Environment variable turning stderr notices on or off.
pub const NOTIFY_ENV: &str = "TETHER_NOTIFY";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Unix socket of the host-auth daemon. Defaults to `~/.tether/hostauth.sock`.
    pub hostauth_socket: Option<PathBuf>,
    /// Pause before exiting so in-flight writes land.
    pub grace_period_ms: u64,
    /// Print notices (host signature fingerprints, daemon hints) to stderr.
    pub notify: bool,
    /// Read buffer size for each relay direction.
    pub buffer_size: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            hostauth_socket: None,
            grace_period_ms: 500,
            notify: true,
            buffer_size: 1 << 18,
        }
    }
}

impl ProxyConfig {
    /// `<config_dir>/tether/proxy.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("tether").join("proxy.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the default file is read
    /// if present and defaults are used otherwise. Environment overrides are
    /// applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ProxyError::Config(format!("Failed to read config from {:?}: {}", path, e))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| ProxyError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Apply `TETHER_*` overrides using `lookup` to read variables.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(socket) = lookup(HOSTAUTH_SOCKET_ENV).filter(|s| !s.is_empty()) {
            self.hostauth_socket = Some(PathBuf::from(socket));
        }
        if let Some(notify) = lookup(NOTIFY_ENV) {
            self.notify = !matches!(
                notify.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
        }
    }

    /// Resolved daemon socket path.
    pub fn hostauth_socket_path(&self) -> PathBuf {
        self.hostauth_socket
            .clone()
            .unwrap_or_else(default_hostauth_socket)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}

/// `~/.tether/hostauth.sock`, or a temp-dir socket when there is no home.
pub fn default_hostauth_socket() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".tether"))
        .unwrap_or_else(std::env::temp_dir)
        .join("hostauth.sock")
}
