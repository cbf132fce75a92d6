// ABOUTME: Library half of the tether ssh proxy.
// ABOUTME: Relay, host-auth observation, daemon delivery, notices, and config.

//! # tether-proxy
//!
//! An SSH `ProxyCommand` that relays bytes between the local ssh client and
//! the server unchanged. While relaying it watches for the server's
//! key-exchange reply and sends the host key, exchange signature, and
//! hostname to the local host-auth daemon.
//!
//! ```text
//! Host *
//!     ProxyCommand tether-ssh-proxy %h %p
//! ```

pub mod config;
pub mod daemon;
pub mod error;
pub mod notify;
pub mod proxy;

pub use config::ProxyConfig;
pub use daemon::{DaemonClient, HostAuthSink};
pub use error::{ProxyError, Result};
pub use notify::Notifier;
pub use proxy::{
    connect, relay_inbound, relay_outbound, run, run_session, HostAuthObserver, SessionEnd,
    Target, DEFAULT_PORT,
};
