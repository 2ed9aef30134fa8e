use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter directive for a `-v` count when `RUST_LOG` is not set.
pub fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// `<reports>/logs/<YYYY-MM-DD_HH-MM-SS>.log`
pub fn log_file_path(reports_dir: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
    reports_dir.join("logs").join(format!("{}.log", stamp))
}

/// Install the global subscriber: stderr plus a plain-text run log.
///
/// Returns the log file path. `RUST_LOG` overrides the verbosity flag.
pub fn init(verbose: u8, reports_dir: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = log_file_path(reports_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(&path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .try_init()?;

    Ok(path)
}
