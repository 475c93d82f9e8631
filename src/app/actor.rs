//! App actor - message loop processing UI events and exchange results

use tokio::sync::mpsc;

use crate::app::session::SessionEvent;
use crate::app::state::AppState;
use crate::messages::{RenderState, UiEvent};
use crate::network::HttpExecutor;

/// App actor that owns every open tab and processes UI events and results
pub struct AppActor {
    state: AppState,
    executor: HttpExecutor,
    render_tx: mpsc::UnboundedSender<RenderState>,
    session_tx: mpsc::UnboundedSender<SessionEvent>,
    session_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl AppActor {
    pub fn new(
        state: AppState,
        executor: HttpExecutor,
        render_tx: mpsc::UnboundedSender<RenderState>,
    ) -> Self {
        let (session_tx, session_rx) = mpsc::unbounded_channel();
        AppActor {
            state,
            executor,
            render_tx,
            session_tx,
            session_rx,
        }
    }

    /// Run the actor message loop. Returns once quit was requested (or the
    /// UI went away) and every tab has been flushed to disk.
    pub async fn run(mut self, mut ui_rx: mpsc::UnboundedReceiver<UiEvent>) {
        // Send initial render state
        let _ = self.render_tx.send(self.state.to_render_state());

        loop {
            tokio::select! {
                event = ui_rx.recv() => {
                    match event {
                        Some(event) => {
                            if self.handle_ui_event(event) {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                Some(event) = self.session_rx.recv() => {
                    self.state.handle_session_event(event);
                }
            }
            let _ = self.render_tx.send(self.state.to_render_state());
        }

        tracing::info!(tabs = self.state.tab_count(), "Shutting down, saving open tabs");
        // Keep a header cell that was still being edited
        self.state.stop_editing();
        self.state.persist_all();
        self.state.storage.flush().await;
    }

    /// Handle a UI event, returns true if quit was requested
    fn handle_ui_event(&mut self, event: UiEvent) -> bool {
        match event {
            // Tabs
            UiEvent::NewTab => self.state.new_tab(),
            UiEvent::CloseTab => self.state.close_tab(),
            UiEvent::NextTab => self.state.next_tab(),
            UiEvent::PrevTab => self.state.prev_tab(),

            // Panel navigation
            UiEvent::NextPanel => self.state.next_panel(),
            UiEvent::PrevPanel => self.state.prev_panel(),
            UiEvent::ScrollUp => self.state.scroll_up(),
            UiEvent::ScrollDown => self.state.scroll_down(),

            // Input editing
            UiEvent::StartEditing => self.state.start_editing(),
            UiEvent::StopEditing => self.state.stop_editing(),
            UiEvent::CharInput(c) => self.state.enter_char(c),
            UiEvent::Newline => self.state.enter_char('\n'),
            UiEvent::Backspace => self.state.delete_char(),
            UiEvent::CursorLeft => self.state.move_cursor_left(),
            UiEvent::CursorRight => self.state.move_cursor_right(),

            // Request actions
            UiEvent::CycleMethod => self.state.cycle_method(),
            UiEvent::SendRequest => self.state.send_request(&self.executor, &self.session_tx),

            // Headers
            UiEvent::ToggleHeaderView => self.state.toggle_header_view(),
            UiEvent::AddHeader => self.state.add_header(),
            UiEvent::DeleteHeader => self.state.delete_header(),
            UiEvent::NextHeaderCell => self.state.next_header_cell(),

            // Popups
            UiEvent::ToggleHelp => self.state.toggle_help(),
            UiEvent::CloseHelp => self.state.close_help(),

            // System
            UiEvent::Quit => return true,
        }

        false
    }
}
