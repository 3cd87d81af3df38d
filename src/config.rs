//! Runtime configuration
//!
//! Values come from `<config_dir>/musicbox-rs/config.toml` when it exists, then from
//! environment overrides. Every field has a default so an empty file is valid.

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_DIRECTORY: &str = "musicbox-rs";
const CONFIG_FILE: &str = "config.toml";

const ENV_SERVER_URL: &str = "MUSICBOX_SERVER_URL";
const ENV_MUSIC_DIR: &str = "MUSICBOX_MUSIC_DIR";

const MIN_SEARCH_DEBOUNCE_MS: u64 = 300;
const MAX_SEARCH_DEBOUNCE_MS: u64 = 500;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the server exposing playlist, search and lyrics endpoints
    pub server_url: String,
    /// Directory holding the local library (`.mp3` / `.wav`)
    pub music_dir: PathBuf,
    pub search_debounce_ms: u64,
    pub filter_debounce_ms: u64,
    pub frame_interval_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".to_string(),
            music_dir: PathBuf::from("music"),
            search_debounce_ms: MAX_SEARCH_DEBOUNCE_MS,
            filter_debounce_ms: 300,
            frame_interval_ms: 33,
            request_timeout_secs: 10,
        }
    }
}

impl Config {
    /// Load the config file (if any) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = dirs::config_dir().map(|dir| dir.join(CONFIG_DIRECTORY).join(CONFIG_FILE));

        let mut config = match path {
            Some(ref p) if p.exists() => {
                tracing::info!(path = %p.display(), "Loading config file");
                Self::load_from_file(p)?
            }
            _ => Self::default(),
        };

        if let Ok(url) = std::env::var(ENV_SERVER_URL) {
            config.server_url = url;
        }
        if let Ok(dir) = std::env::var(ENV_MUSIC_DIR) {
            config.music_dir = PathBuf::from(dir);
        }

        Ok(config.normalized())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file_str = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&file_str)
    }

    pub fn from_toml(source: &str) -> Result<Self> {
        let config = toml::from_str::<Config>(source)?;
        Ok(config.normalized())
    }

    fn normalized(mut self) -> Self {
        self.server_url = self.server_url.trim_end_matches('/').to_string();
        self.search_debounce_ms = self
            .search_debounce_ms
            .clamp(MIN_SEARCH_DEBOUNCE_MS, MAX_SEARCH_DEBOUNCE_MS);
        self.frame_interval_ms = self.frame_interval_ms.max(1);
        self
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn filter_debounce(&self) -> Duration {
        Duration::from_millis(self.filter_debounce_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
