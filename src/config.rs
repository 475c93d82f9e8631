//! Runtime configuration
//!
//! Defaults come from [`crate::constants`]; a few environment variables
//! override them so tests and scripted runs can point the app elsewhere.

use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    CONNECT_TIMEOUT, LOG_FILE_NAME, OPEN_TABS_DIR, REQUEST_TIMEOUT, STATE_DIR_NAME,
};

pub const ENV_STATE_DIR: &str = "GETMAN_STATE_DIR";
pub const ENV_CONNECT_TIMEOUT: &str = "GETMAN_CONNECT_TIMEOUT_SECS";
pub const ENV_REQUEST_TIMEOUT: &str = "GETMAN_REQUEST_TIMEOUT_SECS";

#[derive(Clone, Debug)]
pub struct Config {
    /// Root of all persisted state; open tabs live in `<state_root>/open-tabs`
    pub state_root: PathBuf,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            state_root: default_state_root(),
            connect_timeout: CONNECT_TIMEOUT,
            request_timeout: REQUEST_TIMEOUT,
            log_file: LOG_FILE_NAME.to_string(),
        }
    }
}

impl Config {
    /// Build the configuration from defaults plus environment overrides
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();

        if let Some(dir) = lookup(ENV_STATE_DIR).filter(|d| !d.trim().is_empty()) {
            config.state_root = PathBuf::from(dir);
        }
        if let Some(secs) = lookup(ENV_CONNECT_TIMEOUT).and_then(|v| parse_secs(&v)) {
            config.connect_timeout = secs;
        }
        if let Some(secs) = lookup(ENV_REQUEST_TIMEOUT).and_then(|v| parse_secs(&v)) {
            config.request_timeout = secs;
        }

        config
    }

    pub fn open_tabs_dir(&self) -> PathBuf {
        self.state_root.join(OPEN_TABS_DIR)
    }
}

fn default_state_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(STATE_DIR_NAME)
}

fn parse_secs(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|s| *s > 0)
        .map(Duration::from_secs)
}
