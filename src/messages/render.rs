//! Render state - data structure sent from App layer to UI for rendering

use std::sync::Arc;

use crate::messages::ui_events::{HeaderCell, HeaderView, InputMode, Panel};
use crate::models::{HeaderEntry, HttpMethod};

/// One entry of the tab strip
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabSummary {
    pub title: String,
    pub is_sending: bool,
}

/// Complete state needed by the UI to render
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    // Tabs
    pub tabs: Vec<TabSummary>,
    pub active_tab: usize,

    // Request data of the active tab
    pub method: HttpMethod,
    pub url: String,
    pub body: Arc<str>,
    pub headers_text: String,
    pub header_rows: Vec<HeaderEntry>,
    pub header_view: HeaderView,
    pub selected_header: usize,
    /// Set while a header table cell is being edited; `cell_text` holds its text
    pub editing_cell: Option<HeaderCell>,
    pub cell_text: String,

    // Response of the active tab
    pub status: Option<String>,
    pub time: Option<String>,
    pub size: Option<String>,
    /// Shared with the session; a new allocation means a new response
    pub response_body: Arc<str>,
    pub response_headers: Vec<HeaderEntry>,
    pub is_sending: bool,

    // UI state
    pub active_panel: Panel,
    pub input_mode: InputMode,
    pub cursor_position: usize,
    pub response_scroll: u16,
    pub show_help: bool,
}
