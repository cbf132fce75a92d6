// ABOUTME: Shared logging setup for tether binaries
// ABOUTME: init_file() sends tracing output to a per-app log file, keeping stdio free for the SSH stream

use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Location of the log file for `app_name`: `<config_dir>/tether/{app_name}/{app_name}.log`.
pub fn log_path(app_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| {
        d.join("tether")
            .join(app_name)
            .join(format!("{app_name}.log"))
    })
}

/// File-based logging for tools whose stdout/stderr belong to someone else
/// (the ssh proxy relays a live SSH session over stdio). Default: WARN level,
/// RUST_LOG override. If setup fails, prints a warning to stderr and continues
/// without logging.
pub fn init_file(app_name: &str) {
    if let Err(e) = init_file_inner(app_name) {
        eprintln!("Warning: failed to set up file logging: {e}");
    }
}

fn init_file_inner(app_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = log_path(app_name).ok_or("could not determine config directory")?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .with_ansi(false)
        .init();

    Ok(())
}
