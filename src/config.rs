// config.rs

use std::fs::{File, create_dir_all};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pagination::DEFAULT_ROWS_PER_PAGE;

pub const ENV_SERVER_URL: &str = "TASKDECK_SERVER_URL";
pub const ENV_ROWS_PER_PAGE: &str = "TASKDECK_ROWS_PER_PAGE";

fn default_server_url() -> String {
    "http://localhost:8080".to_string()
}
fn default_rows_per_page() -> usize {
    DEFAULT_ROWS_PER_PAGE
}
fn default_request_timeout_secs() -> u64 {
    10
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_rows_per_page")]
    pub rows_per_page: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            rows_per_page: default_rows_per_page(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "taskdeck")
}

/// `<config dir>/config.json`, or `./config.json` when no home directory is known.
pub fn config_path() -> PathBuf {
    project_dirs()
        .map(|d| d.config_dir().join("config.json"))
        .unwrap_or_else(|| PathBuf::from("config.json"))
}

/// Directory for the log file; created on demand.
pub fn data_dir() -> PathBuf {
    let dir = project_dirs()
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    create_dir_all(&dir).ok();
    dir
}

impl Config {
    /// Missing file means defaults; a present but broken file is an error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = match File::open(path.as_ref()) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(e.into()),
        };
        let cfg: Config = serde_json::from_reader(BufReader::new(file))?;
        cfg.validated()
    }

    /// Applies `TASKDECK_*` overrides read through `lookup`.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_SERVER_URL) {
            if !url.trim().is_empty() {
                self.server_url = url.trim().to_string();
            }
        }
        if let Some(rows) = lookup(ENV_ROWS_PER_PAGE) {
            self.rows_per_page = rows.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_ROWS_PER_PAGE,
                value: rows.clone(),
            })?;
        }
        self.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.rows_per_page == 0 {
            return Err(ConfigError::InvalidValue {
                key: "rows_per_page",
                value: "0".to_string(),
            });
        }
        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
