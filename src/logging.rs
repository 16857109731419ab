// logging.rs

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub const ENV_LOG: &str = "TASKDECK_LOG";
const DEFAULT_FILTER: &str = "taskdeck=info";

/// Sends tracing output to `<dir>/taskdeck.log`. The terminal belongs to the
/// TUI, so nothing is ever written to stderr. Returns the log file path.
pub fn init(dir: &Path) -> std::io::Result<PathBuf> {
    let path = dir.join("taskdeck.log");
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true),
        )
        .try_init();

    tracing::info!(path = %path.display(), "logging initialised");
    Ok(path)
}
