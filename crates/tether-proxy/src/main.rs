// ABOUTME: tether-ssh-proxy binary entry point.
// ABOUTME: Parses host and port, loads config, relays stdin/stdout to the server, and exits without waiting on stdin.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tether_proxy::{ProxyConfig, Target, DEFAULT_PORT};

#[derive(Parser)]
#[command(name = "tether-ssh-proxy")]
#[command(about = "SSH ProxyCommand that reports server host keys to the tether daemon")]
#[command(version)]
struct Cli {
    /// Remote host
    host: String,

    /// Remote port
    #[arg(default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Path to config file
    #[arg(long, env = "TETHER_PROXY_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // stdout carries the SSH stream, so logs go to a file.
    tether_log::init_file("tether-ssh-proxy");

    let cli = Cli::parse();
    let config = ProxyConfig::load(cli.config.as_deref()).context("Failed to load config")?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
    let result = runtime.block_on(tether_proxy::run(Target::new(cli.host, cli.port), config));

    // The stdin reader blocks on a thread that cannot be cancelled; leave it
    // behind rather than waiting for the ssh client to write again.
    runtime.shutdown_background();

    result.context("Proxy failed")
}
