//! App state - open tabs plus the UI state around them, no I/O logic

use std::collections::HashMap;
use std::sync::Arc;

use crate::app::session::{SendPhase, TabSession};
use crate::messages::render::TabSummary;
use crate::messages::ui_events::{HeaderCell, HeaderView, InputMode, Panel};
use crate::messages::RenderState;
use crate::models::RequestData;
use crate::storage::StorageHandle;

/// Main application state
pub struct AppState {
    // Open tabs, keyed by tab id; `tab_order` is the strip order
    pub sessions: HashMap<String, TabSession>,
    pub tab_order: Vec<String>,
    pub active_tab: usize,

    // UI state
    pub active_panel: Panel,
    pub input_mode: InputMode,
    pub cursor_position: usize,
    pub response_scroll: u16,

    // Headers panel
    pub header_view: HeaderView,
    pub selected_header: usize,
    // Table cell under edit and its working text, written back on commit
    pub header_cell: HeaderCell,
    pub cell_buffer: String,

    // Popups
    pub show_help: bool,

    pub storage: StorageHandle,
}

impl AppState {
    /// Rebuild one tab per persisted record, or open a fresh tab if there are none
    pub fn new(storage: StorageHandle, restored: Vec<RequestData>) -> Self {
        let mut state = AppState {
            sessions: HashMap::new(),
            tab_order: Vec::new(),
            active_tab: 0,
            active_panel: Panel::Url,
            input_mode: InputMode::Normal,
            cursor_position: 0,
            response_scroll: 0,
            header_view: HeaderView::Table,
            selected_header: 0,
            header_cell: HeaderCell::Key,
            cell_buffer: String::new(),
            show_help: false,
            storage,
        };

        for data in restored {
            if data.id.is_empty() || state.sessions.contains_key(&data.id) {
                tracing::warn!(id = %data.id, "Skipping restored tab with missing or duplicate id");
                continue;
            }
            let session = TabSession::restore(data, state.storage.clone());
            state.insert_session(session);
        }

        if state.sessions.is_empty() {
            let session = TabSession::new(state.storage.clone());
            state.insert_session(session);
        }

        state.active_tab = 0;
        state
    }

    pub(crate) fn insert_session(&mut self, session: TabSession) {
        let id = session.id().to_string();
        self.tab_order.push(id.clone());
        self.sessions.insert(id, session);
    }

    pub fn active_id(&self) -> Option<&str> {
        self.tab_order.get(self.active_tab).map(String::as_str)
    }

    pub fn active_session(&self) -> Option<&TabSession> {
        self.active_id().and_then(|id| self.sessions.get(id))
    }

    pub fn active_session_mut(&mut self) -> Option<&mut TabSession> {
        let id = self.tab_order.get(self.active_tab)?;
        self.sessions.get_mut(id)
    }

    pub fn tab_count(&self) -> usize {
        self.tab_order.len()
    }

    /// True while a key or value cell of the header table is being edited
    pub fn is_editing_header_cell(&self) -> bool {
        self.input_mode == InputMode::Editing
            && self.active_panel == Panel::Headers
            && self.header_view == HeaderView::Table
    }

    /// Convert state to RenderState for UI
    pub fn to_render_state(&self) -> RenderState {
        let tabs = self
            .tab_order
            .iter()
            .filter_map(|id| self.sessions.get(id))
            .map(|s| TabSummary {
                title: s.data().title(),
                is_sending: s.phase() == SendPhase::Sending,
            })
            .collect();

        let mut render = RenderState {
            tabs,
            active_tab: self.active_tab,
            header_view: self.header_view,
            selected_header: self.selected_header,
            active_panel: self.active_panel,
            input_mode: self.input_mode,
            cursor_position: self.cursor_position,
            response_scroll: self.response_scroll,
            show_help: self.show_help,
            ..RenderState::default()
        };

        if self.is_editing_header_cell() {
            render.editing_cell = Some(self.header_cell);
            render.cell_text = self.cell_buffer.clone();
        }

        if let Some(session) = self.active_session() {
            render.method = session.method();
            render.url = session.url().to_string();
            render.body = Arc::from(session.request_body());
            render.headers_text = session.request_headers().to_string();
            render.header_rows = session.request_header_entries();
            render.status = session.status().map(str::to_string);
            render.time = session.time().map(str::to_string);
            render.size = session.size().map(str::to_string);
            render.response_body = session.response_text();
            render.response_headers = session.response_header_entries();
            render.is_sending = session.phase() == SendPhase::Sending;
        }

        render
    }
}
