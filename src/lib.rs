//! # Getman TUI
//!
//! A terminal REST client that keeps every open request tab on disk.
//!
//! ## Features
//! - HTTP methods: GET, POST, PUT, PATCH, DELETE
//! - Request body editor and header table/text views
//! - Pretty-printed, highlighted JSON responses
//! - Tabs restored across restarts from `~/.getman/open-tabs`
//!
//! ## Architecture
//! Actor-based with channels:
//! - UI Layer (Ratatui) - synchronous
//! - App Layer (one session per tab)
//! - Network and storage work on the Tokio runtime

pub mod constants;
pub mod config;
pub mod models;
pub mod headers;
pub mod format;
pub mod storage;
pub mod ui;
pub mod messages;
pub mod app;
pub mod network;

// Re-export commonly used types
pub use config::Config;
pub use models::{HeaderEntry, HttpMethod, RequestData};
pub use storage::{StateStore, StorageHandle};
pub use messages::{RenderState, UiEvent};
pub use app::{AppActor, AppState, TabSession};
pub use network::{ExchangeError, ExchangeSpec, HttpExecutor};
