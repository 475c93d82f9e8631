//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

use std::time::Duration;

/// Header block every new tab starts with
pub const DEFAULT_REQUEST_HEADERS: &str = "Content-Type: application/json\nAccept: application/json";

/// Directory name under the home directory holding application state
pub const STATE_DIR_NAME: &str = ".getman";

/// Subdirectory of the state root with one file per open tab
pub const OPEN_TABS_DIR: &str = "open-tabs";

/// Log file written inside the state root
pub const LOG_FILE_NAME: &str = "getman.log";

/// Connect timeout for outgoing requests
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall timeout for one exchange, body included
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// Display placeholders
pub const STATUS_SENDING: &str = "Sending...";
pub const STATUS_ERROR: &str = "Error";
pub const PENDING_PLACEHOLDER: &str = "...";

/// Application name
pub const APP_NAME: &str = "Getman";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
