//! Command handlers - business logic for processing UI events

use tokio::sync::mpsc;

use crate::app::session::{SessionEvent, TabSession};
use crate::app::AppState;
use crate::messages::ui_events::{editable_field, HeaderCell, HeaderView, InputMode, Panel};
use crate::models::HeaderEntry;
use crate::network::HttpExecutor;

impl AppState {
    // ========================
    // Tabs
    // ========================

    /// Open a new tab after the current ones and focus it
    pub fn new_tab(&mut self) {
        self.persist_active();
        let session = TabSession::new(self.storage.clone());
        tracing::info!(tab = %session.id(), "Opened tab");
        self.insert_session(session);
        self.focus_tab(self.tab_order.len() - 1);
    }

    /// Close the focused tab and delete its state.
    ///
    /// Closing the last tab opens a fresh one so there is always a tab.
    pub fn close_tab(&mut self) {
        if self.tab_order.is_empty() {
            return;
        }
        let id = self.tab_order.remove(self.active_tab);
        if let Some(session) = self.sessions.remove(&id) {
            session.close();
        }

        if self.tab_order.is_empty() {
            let session = TabSession::new(self.storage.clone());
            self.insert_session(session);
        }
        let index = self.active_tab.min(self.tab_order.len() - 1);
        self.focus_tab(index);
    }

    pub fn next_tab(&mut self) {
        if self.tab_order.len() > 1 {
            self.persist_active();
            self.focus_tab((self.active_tab + 1) % self.tab_order.len());
        }
    }

    pub fn prev_tab(&mut self) {
        if self.tab_order.len() > 1 {
            self.persist_active();
            let index = self
                .active_tab
                .checked_sub(1)
                .unwrap_or(self.tab_order.len() - 1);
            self.focus_tab(index);
        }
    }

    fn focus_tab(&mut self, index: usize) {
        self.active_tab = index;
        self.input_mode = InputMode::Normal;
        self.cursor_position = 0;
        self.response_scroll = 0;
        self.selected_header = 0;
    }

    fn persist_active(&self) {
        if let Some(session) = self.active_session() {
            session.persist();
        }
    }

    /// Queue a save of every open tab
    pub fn persist_all(&self) {
        for session in self.sessions.values() {
            session.persist();
        }
    }

    // ========================
    // Navigation
    // ========================

    pub fn next_panel(&mut self) {
        self.input_mode = InputMode::Normal;
        self.active_panel = self.active_panel.next();
    }

    pub fn prev_panel(&mut self) {
        self.input_mode = InputMode::Normal;
        self.active_panel = self.active_panel.prev();
    }

    pub fn scroll_up(&mut self) {
        match self.active_panel {
            Panel::Headers if self.header_view == HeaderView::Table => self.prev_header(),
            _ => self.response_scroll = self.response_scroll.saturating_sub(1),
        }
    }

    pub fn scroll_down(&mut self) {
        match self.active_panel {
            Panel::Headers if self.header_view == HeaderView::Table => self.next_header(),
            _ => self.response_scroll = self.response_scroll.saturating_add(1),
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn close_help(&mut self) {
        self.show_help = false;
    }

    // ========================
    // Input editing
    // ========================

    fn header_table_focused(&self) -> bool {
        self.active_panel == Panel::Headers && self.header_view == HeaderView::Table
    }

    fn current_input(&self) -> &str {
        if self.header_table_focused() {
            return &self.cell_buffer;
        }
        match (editable_field(self.active_panel, self.header_view), self.active_session()) {
            (Some(field), Some(session)) => session.field(field),
            _ => "",
        }
    }

    fn current_input_mut(&mut self) -> Option<&mut String> {
        if self.header_table_focused() {
            return Some(&mut self.cell_buffer);
        }
        let field = editable_field(self.active_panel, self.header_view)?;
        self.active_session_mut().map(|s| s.field_mut(field))
    }

    pub fn start_editing(&mut self) {
        if self.header_table_focused() {
            self.begin_header_cell(HeaderCell::Key);
        } else if editable_field(self.active_panel, self.header_view).is_some() {
            self.input_mode = InputMode::Editing;
            self.cursor_position = self.current_input().len();
        }
    }

    pub fn stop_editing(&mut self) {
        if self.is_editing_header_cell() {
            self.commit_header_cell();
        }
        self.input_mode = InputMode::Normal;
    }

    pub fn move_cursor_left(&mut self) {
        let input = self.current_input();
        if let Some(before) = input.get(..self.cursor_position) {
            let new_pos = before
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.cursor_position = new_pos;
        }
    }

    pub fn move_cursor_right(&mut self) {
        let input = self.current_input();
        if let Some(after) = input.get(self.cursor_position..).filter(|s| !s.is_empty()) {
            let new_pos = after
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor_position + i)
                .unwrap_or(input.len());
            self.cursor_position = new_pos;
        }
    }

    pub fn enter_char(&mut self, c: char) {
        // A key cannot hold the separator, and cells are single-line
        if self.header_table_focused()
            && (c == '\n' || (self.header_cell == HeaderCell::Key && c == ':'))
        {
            return;
        }
        let cursor_pos = self.cursor_position;
        if let Some(input) = self.current_input_mut() {
            if cursor_pos <= input.len() && input.is_char_boundary(cursor_pos) {
                input.insert(cursor_pos, c);
                self.cursor_position = cursor_pos + c.len_utf8();
            }
        }
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position == 0 {
            return;
        }
        let cursor_pos = self.cursor_position;
        if let Some(input) = self.current_input_mut() {
            let Some((prev_pos, _)) = input.get(..cursor_pos).and_then(|s| s.char_indices().last())
            else {
                return;
            };
            input.remove(prev_pos);
            self.cursor_position = prev_pos;
        }
    }

    // ========================
    // HTTP Method
    // ========================

    pub fn cycle_method(&mut self) {
        if let Some(session) = self.active_session_mut() {
            let next = session.method().next();
            session.set_method(next);
        }
    }

    // ========================
    // Headers
    // ========================

    /// Switch between table and text views. The text is always the source of
    /// truth, so switching only resets the selection.
    pub fn toggle_header_view(&mut self) {
        self.header_view = self.header_view.toggle();
        self.input_mode = InputMode::Normal;
        self.selected_header = 0;
        self.cursor_position = 0;
    }

    fn header_count(&self) -> usize {
        self.active_session()
            .map(|s| s.request_header_entries().len())
            .unwrap_or(0)
    }

    pub fn next_header(&mut self) {
        let count = self.header_count();
        if count > 0 {
            self.selected_header = (self.selected_header + 1) % count;
        }
    }

    pub fn prev_header(&mut self) {
        let count = self.header_count();
        if count > 0 {
            self.selected_header = self
                .selected_header
                .checked_sub(1)
                .unwrap_or(count - 1);
        }
    }

    pub fn add_header(&mut self) {
        let index = self.header_count();
        if let Some(session) = self.active_session_mut() {
            session.insert_request_header(index, HeaderEntry::new("New-Key", "Value"));
            self.selected_header = index;
        }
    }

    /// Commit the cell under edit and continue in the other cell of the row
    pub fn next_header_cell(&mut self) {
        if self.is_editing_header_cell() {
            self.commit_header_cell();
            self.begin_header_cell(self.header_cell.next());
        }
    }

    fn begin_header_cell(&mut self, cell: HeaderCell) {
        let selected = self.selected_header;
        let Some(entry) = self
            .active_session()
            .and_then(|s| s.request_header_entries().into_iter().nth(selected))
        else {
            self.input_mode = InputMode::Normal;
            return;
        };
        self.cell_buffer = match cell {
            HeaderCell::Key => entry.key,
            HeaderCell::Value => entry.value,
        };
        self.header_cell = cell;
        self.cursor_position = self.cell_buffer.len();
        self.input_mode = InputMode::Editing;
    }

    /// Write the cell buffer into the selected row. A row left with an empty
    /// key and value is dropped, like a blank line in the text view.
    fn commit_header_cell(&mut self) {
        let selected = self.selected_header;
        let cell = self.header_cell;
        let text = self.cell_buffer.trim().to_string();
        if let Some(session) = self.active_session_mut() {
            let mut entries = session.request_header_entries();
            if let Some(entry) = entries.get_mut(selected) {
                match cell {
                    HeaderCell::Key => entry.key = text,
                    HeaderCell::Value => entry.value = text,
                }
                entries.retain(|e| !(e.key.is_empty() && e.value.is_empty()));
                session.set_request_header_entries(&entries);
            }
        }
        let count = self.header_count();
        if self.selected_header >= count {
            self.selected_header = count.saturating_sub(1);
        }
    }

    pub fn delete_header(&mut self) {
        let selected = self.selected_header;
        if let Some(session) = self.active_session_mut() {
            session.remove_request_header(selected);
        }
        let count = self.header_count();
        if self.selected_header >= count {
            self.selected_header = count.saturating_sub(1);
        }
    }

    // ========================
    // Request sending
    // ========================

    pub fn send_request(
        &mut self,
        executor: &HttpExecutor,
        events: &mpsc::UnboundedSender<SessionEvent>,
    ) {
        self.input_mode = InputMode::Normal;
        self.response_scroll = 0;
        if let Some(session) = self.active_session_mut() {
            session.send_request(executor, events);
        }
    }

    /// Apply background results. Results for tabs closed in the meantime are dropped.
    pub fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::ExchangeSettled { tab_id, outcome } => {
                match self.sessions.get_mut(&tab_id) {
                    Some(session) => {
                        session.apply_outcome(outcome);
                        session.persist();
                    }
                    None => tracing::debug!(tab = %tab_id, "Result for closed tab ignored"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    use crate::models::{HttpMethod, RequestData};
    use crate::network::mock::MockTransport;
    use crate::network::{ExchangeResponse, HttpExecutor};
    use crate::storage::{StateStore, StorageHandle};

    fn restored(id: &str, url: &str) -> RequestData {
        let mut data = RequestData::with_id(id);
        data.url = url.to_string();
        data
    }

    fn ok_outcome(status: u16) -> crate::network::ExchangeResult {
        Ok(ExchangeResponse {
            status_code: status,
            duration_ms: 1,
            size_bytes: 0,
            headers: vec![],
            raw_body: String::new(),
            body: String::new(),
        })
    }

    #[tokio::test]
    async fn test_startup_without_state_opens_one_persisted_tab() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path());
        let storage = StorageHandle::spawn(store.clone());

        let state = AppState::new(storage.clone(), store.load_all());
        storage.flush().await;

        assert_eq!(state.tab_count(), 1);
        assert_eq!(store.load_all().len(), 1);
        assert_eq!(state.active_id(), Some(store.load_all()[0].id.as_str()));
    }

    fn header_table_state(headers: &str) -> AppState {
        let (cmd_tx, _cmd_rx) = tokio::sync::mpsc::unbounded_channel();
        let mut data = restored("h", "http://h");
        data.request_headers = headers.to_string();
        let mut state = AppState::new(StorageHandle::from_sender(cmd_tx), vec![data]);
        state.active_panel = Panel::Headers;
        state.header_view = HeaderView::Table;
        state
    }

    #[test]
    fn test_edit_header_table_cells_in_place() {
        let mut state = header_table_state("A: 1\nB: 2");
        state.selected_header = 1;

        state.start_editing();
        assert!(state.is_editing_header_cell());
        assert_eq!(state.cell_buffer, "B");
        state.delete_char();
        state.enter_char(':');
        for c in "X-Id".chars() {
            state.enter_char(c);
        }
        assert_eq!(state.to_render_state().cell_text, "X-Id");

        state.next_header_cell();
        assert_eq!(state.header_cell, HeaderCell::Value);
        assert_eq!(state.cell_buffer, "2");
        state.move_cursor_left();
        for c in "v:".chars() {
            state.enter_char(c);
        }
        state.stop_editing();

        assert_eq!(state.input_mode, InputMode::Normal);
        assert_eq!(
            state.active_session().unwrap().request_headers(),
            "A: 1\nX-Id: v:2"
        );
        assert_eq!(state.to_render_state().editing_cell, None);
    }

    #[test]
    fn test_clearing_a_header_row_drops_it() {
        let mut state = header_table_state("A: 1\nB:");
        state.selected_header = 1;

        state.start_editing();
        state.delete_char();
        state.stop_editing();

        assert_eq!(state.active_session().unwrap().request_headers(), "A: 1");
        assert_eq!(state.selected_header, 0);
    }

    #[test]
    fn test_editing_empty_header_table_is_a_no_op() {
        let mut state = header_table_state("");
        state.start_editing();
        assert_eq!(state.input_mode, InputMode::Normal);
    }

    #[tokio::test]
    async fn test_startup_restores_each_record_once() {
        let dir = tempdir().unwrap();
        let storage = StorageHandle::spawn(StateStore::new(dir.path()));

        let state = AppState::new(
            storage,
            vec![
                restored("a", "http://a"),
                restored("b", "http://b"),
                restored("a", "http://dup"),
                restored("", "http://none"),
            ],
        );

        assert_eq!(state.tab_order, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(state.active_session().unwrap().url(), "http://a");
    }

    #[tokio::test]
    async fn test_close_tab_deletes_and_result_for_it_is_dropped() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path());
        let storage = StorageHandle::spawn(store.clone());
        let mut state = AppState::new(storage.clone(), vec![]);
        state.new_tab();
        let closed = state.active_id().unwrap().to_string();

        state.close_tab();
        state.handle_session_event(SessionEvent::ExchangeSettled {
            tab_id: closed.clone(),
            outcome: ok_outcome(200),
        });
        storage.flush().await;

        assert_eq!(state.tab_count(), 1);
        assert!(!state.sessions.contains_key(&closed));
        assert!(store.load_all().iter().all(|d| d.id != closed));
    }

    #[tokio::test]
    async fn test_closing_last_tab_opens_a_fresh_one() {
        let dir = tempdir().unwrap();
        let storage = StorageHandle::spawn(StateStore::new(dir.path()));
        let mut state = AppState::new(storage, vec![restored("only", "http://x")]);

        state.close_tab();

        assert_eq!(state.tab_count(), 1);
        assert_ne!(state.active_id(), Some("only"));
    }

    #[tokio::test]
    async fn test_switching_away_persists_edits() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path());
        let storage = StorageHandle::spawn(store.clone());
        let mut state = AppState::new(
            storage.clone(),
            vec![restored("a", ""), restored("b", "")],
        );

        state.active_panel = Panel::Url;
        state.start_editing();
        for c in "http://é.test".chars() {
            state.enter_char(c);
        }
        state.delete_char();
        state.next_tab();
        storage.flush().await;

        let saved = store.load_all().into_iter().find(|d| d.id == "a").unwrap();
        assert_eq!(saved.url, "http://é.tes");
        assert_eq!(state.active_id(), Some("b"));
        assert_eq!(state.input_mode, InputMode::Normal);
    }

    #[tokio::test]
    async fn test_settlement_updates_owning_tab_not_active_one() {
        let dir = tempdir().unwrap();
        let storage = StorageHandle::spawn(StateStore::new(dir.path()));
        let executor = HttpExecutor::with_transport(Arc::new(MockTransport::ok(200, "ok")));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = AppState::new(storage, vec![restored("a", "http://a.test/")]);

        state.send_request(&executor, &tx);
        state.new_tab();
        let event = rx.recv().await.unwrap();
        state.handle_session_event(event);

        assert_eq!(state.sessions["a"].status(), Some("200"));
        assert_eq!(state.active_session().unwrap().status(), None);
    }

    #[tokio::test]
    async fn test_header_table_commands() {
        let dir = tempdir().unwrap();
        let storage = StorageHandle::spawn(StateStore::new(dir.path()));
        let mut state = AppState::new(storage, vec![RequestData::with_id("t")]);
        state.active_panel = Panel::Headers;

        state.add_header();
        assert_eq!(state.selected_header, 2);
        state.scroll_up();
        assert_eq!(state.selected_header, 1);
        state.delete_header();
        assert_eq!(
            state.active_session().unwrap().request_headers(),
            "Content-Type: application/json\nNew-Key: Value"
        );

        state.toggle_header_view();
        state.start_editing();
        state.enter_char('\n');
        for c in "X: 1".chars() {
            state.enter_char(c);
        }
        assert_eq!(state.to_render_state().header_rows.len(), 3);
    }

    #[tokio::test]
    async fn test_cycle_method_and_render() {
        let dir = tempdir().unwrap();
        let storage = StorageHandle::spawn(StateStore::new(dir.path()));
        let mut state = AppState::new(storage, vec![restored("t", "https://api.test/users")]);

        state.cycle_method();
        let render = state.to_render_state();
        assert_eq!(render.method, HttpMethod::POST);
        assert_eq!(render.tabs[0].title, "POST api.test/users");
        assert!(!render.is_sending);
    }
}
