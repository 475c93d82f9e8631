//! Getman TUI - REST client with persistent request tabs
//!
//! Architecture:
//! - UI Layer (Ratatui) - synchronous terminal rendering
//! - App Layer - orchestrator owning one session per open tab
//! - Background (Tokio) - HTTP exchanges and state file writes

use std::io;
use std::time::Duration;

use anyhow::Context;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::*};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use getman::app::{AppActor, AppState};
use getman::config::Config;
use getman::constants::{APP_NAME, APP_VERSION};
use getman::messages::ui_events::{key_to_ui_event, HeaderCell, HeaderView, InputMode, Panel};
use getman::messages::{RenderState, UiEvent};
use getman::network::HttpExecutor;
use getman::storage::{StateStore, StorageHandle};
use getman::ui::{
    cursor_line_col, method_color, render_header_list, render_tabs, status_color, visible_lines,
    HighlightCache,
};

/// Highlighting kept across frames so unchanged bodies are not re-tokenized
#[derive(Default)]
struct Highlights {
    body: HighlightCache,
    response: HighlightCache,
}

/// Terminal cleanup guard
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    std::fs::create_dir_all(&config.state_root)
        .with_context(|| format!("creating {}", config.state_root.display()))?;

    // Initialize logging to file
    let file_appender = tracing_appender::rolling::never(&config.state_root, &config.log_file);
    let (non_blocking, _log_guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    tracing::info!(version = APP_VERSION, tabs_dir = %config.open_tabs_dir().display(), "Starting");

    let executor = HttpExecutor::new(&config).context("building HTTP client")?;
    let store = StateStore::new(&config.state_root);
    let restored = {
        let store = store.clone();
        tokio::task::spawn_blocking(move || store.load_all())
            .await
            .context("loading open tabs")?
    };
    let storage = StorageHandle::spawn(store);
    let state = AppState::new(storage, restored);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let _guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create channels
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderState>();

    // Spawn app actor
    let app_actor = AppActor::new(state, executor, render_tx);
    let app_task = tokio::spawn(app_actor.run(ui_rx));

    // Run UI loop (synchronous with async polling)
    let ui_result = run_ui_loop(&mut terminal, ui_tx, &mut render_rx).await;

    // The app actor saves every tab before it finishes
    if let Err(e) = app_task.await {
        tracing::warn!(error = %e, "App actor ended abnormally");
    }
    tracing::info!("Stopped");

    ui_result
}

/// Run the synchronous UI rendering loop
async fn run_ui_loop(
    terminal: &mut Terminal<impl Backend>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
    render_rx: &mut mpsc::UnboundedReceiver<RenderState>,
) -> anyhow::Result<()> {
    let mut current_state = RenderState::default();
    let mut highlights = Highlights::default();

    loop {
        // Check for state updates (non-blocking)
        while let Ok(state) = render_rx.try_recv() {
            current_state = state;
        }

        // Draw with current state
        terminal.draw(|f| draw_ui(f, &current_state, &mut highlights))?;

        // Poll for events with timeout
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if let Some(event) = key_to_ui_event(
                    key,
                    current_state.input_mode,
                    current_state.active_panel,
                    current_state.header_view,
                    current_state.show_help,
                ) {
                    let quit = matches!(event, UiEvent::Quit);
                    let _ = ui_tx.send(event);
                    if quit {
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

// ============================================================================
// UI Drawing Functions
// ============================================================================

fn draw_ui(f: &mut Frame, state: &RenderState, highlights: &mut Highlights) {
    let area = f.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Tab bar
            Constraint::Length(3), // Method + URL
            Constraint::Length(9), // Body / Headers
            Constraint::Min(5),    // Response
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    draw_tab_bar(f, state, main_chunks[0]);
    draw_url_bar(f, state, main_chunks[1]);
    draw_request_panels(f, state, &mut highlights.body, main_chunks[2]);
    draw_response(f, state, &mut highlights.response, main_chunks[3]);
    draw_status_bar(f, state, main_chunks[4]);

    if state.show_help {
        draw_help_popup(f, area);
    }
}

fn border_style(state: &RenderState, panel: Panel) -> Style {
    let is_focused = state.active_panel == panel;
    if is_focused && state.input_mode == InputMode::Editing {
        Style::default().fg(Color::Yellow)
    } else if is_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn draw_tab_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let titles: Vec<Line> = state
        .tabs
        .iter()
        .enumerate()
        .map(|(i, tab)| {
            let marker = if tab.is_sending { " [...]" } else { "" };
            Line::from(format!(" {}:{}{} ", i + 1, tab.title, marker))
        })
        .collect();
    f.render_widget(render_tabs(titles, state.active_tab), area);
}

fn draw_url_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let method = state.method.as_str();
    let loading = if state.is_sending { " [...]" } else { "" };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(state, Panel::Url))
        .title(format!(" {}{} ", method, loading))
        .title_style(Style::default().fg(method_color(method)).bold());

    let content = if state.url.is_empty() && state.input_mode == InputMode::Normal {
        Paragraph::new("Press 'e' to enter a URL").style(Style::default().fg(Color::DarkGray))
    } else {
        Paragraph::new(state.url.as_str())
    };
    f.render_widget(content.block(block), area);

    if state.active_panel == Panel::Url && state.input_mode == InputMode::Editing {
        set_text_cursor(f, &state.url, state.cursor_position, area);
    }
}

fn draw_request_panels(f: &mut Frame, state: &RenderState, body_lines: &mut HighlightCache, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    // Body
    let body_title = if state.method.has_body() {
        " Body "
    } else {
        " Body (not sent for GET/DELETE) "
    };
    let height = chunks[0].height.saturating_sub(2) as usize;
    let body = Paragraph::new(visible_lines(body_lines.lines(&state.body), 0, height)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style(state, Panel::Body))
            .title(body_title),
    );
    f.render_widget(body, chunks[0]);
    if state.active_panel == Panel::Body && state.input_mode == InputMode::Editing {
        set_text_cursor(f, &state.body, state.cursor_position, chunks[0]);
    }

    // Headers
    let is_focused = state.active_panel == Panel::Headers;
    match state.header_view {
        HeaderView::Table => {
            let selected = is_focused.then_some(state.selected_header);
            let mut rows = state.header_rows.clone();
            // Show the cell under edit with its working text
            if let (Some(cell), Some(row)) = (state.editing_cell, rows.get_mut(state.selected_header)) {
                let (key_width, offset) = match cell {
                    HeaderCell::Key => {
                        row.key = state.cell_text.clone();
                        (0, 0)
                    }
                    HeaderCell::Value => {
                        row.value = state.cell_text.clone();
                        (row.key.chars().count() as u16, 2)
                    }
                };
                let (_, col) = cursor_line_col(&state.cell_text, state.cursor_position);
                let area = chunks[1];
                let x = (area.x + 1 + key_width + offset + col).min(area.x + area.width.saturating_sub(2));
                let y = (area.y + 1 + state.selected_header as u16).min(area.y + area.height.saturating_sub(2));
                f.set_cursor_position(Position::new(x, y));
            }
            let list = render_header_list(
                &rows,
                " Headers [table] (v:text e:edit a:add d:del) ",
                selected,
                is_focused,
            );
            f.render_widget(list, chunks[1]);
        }
        HeaderView::Text => {
            let text = Paragraph::new(state.headers_text.as_str()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style(state, Panel::Headers))
                    .title(" Headers [text] (v:table e:edit) "),
            );
            f.render_widget(text, chunks[1]);
            if is_focused && state.input_mode == InputMode::Editing {
                set_text_cursor(f, &state.headers_text, state.cursor_position, chunks[1]);
            }
        }
    }
}

fn draw_response(f: &mut Frame, state: &RenderState, response_lines: &mut HighlightCache, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);

    let status_text = match state.status.as_deref() {
        Some(status) => Span::styled(
            format!(" Status: {} ", status),
            Style::default().fg(status_color(status)).bold(),
        ),
        None => Span::raw(" Response "),
    };

    let metrics = format!(
        " Time: {}  Size: {} ",
        state.time.as_deref().unwrap_or(""),
        state.size.as_deref().unwrap_or("")
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(state, Panel::Response))
        .title(status_text)
        .title_bottom(Line::from(metrics).right_aligned());

    // Only the rows on screen are handed to the widget
    let height = chunks[0].height.saturating_sub(2) as usize;
    let lines = visible_lines(
        response_lines.lines(&state.response_body),
        state.response_scroll as usize,
        height,
    );
    let response = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(response, chunks[0]);

    let headers = render_header_list(&state.response_headers, " Response Headers ", None, false);
    f.render_widget(headers, chunks[1]);
}

fn draw_status_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let status = if state.input_mode == InputMode::Editing {
        " ESC:stop editing | arrows:move | Tab:next field "
    } else {
        " n:new tab | w:close | [ ]:switch | Tab:panel | e:edit | m:method | s:send | ?:help | q:quit "
    };

    let bar = Paragraph::new(status).style(Style::default().fg(Color::DarkGray));
    f.render_widget(bar, area);
}

fn set_text_cursor(f: &mut Frame, text: &str, cursor: usize, area: Rect) {
    let (line, col) = cursor_line_col(text, cursor);
    let max_x = area.x + area.width.saturating_sub(2);
    let max_y = area.y + area.height.saturating_sub(2);
    let x = (area.x + 1 + col).min(max_x);
    let y = (area.y + 1 + line).min(max_y);
    f.set_cursor_position(Position::new(x, y));
}

fn draw_help_popup(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);

    let help_text = format!(
        r#"
 {} {} - Keyboard Shortcuts

 TABS
   n                  New tab
   w                  Close tab (deletes its saved state)
   [ / ]              Previous / next tab

 REQUEST
   Tab / Shift+Tab    Switch panels
   e                  Edit current field
   m                  Cycle HTTP method
   s / Enter          Send request

 HEADERS
   v                  Toggle table / text view
   e                  Edit key, Tab to value (table view)
   a / d              Add / delete row (table view)
   Up / Down          Select row

 RESPONSE
   Up / Down          Scroll

 GENERAL
   ?                  Toggle this help
   q / Ctrl+C         Quit

 Press any key to close...
"#,
        APP_NAME, APP_VERSION
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .style(Style::default().bg(Color::Black));

    let help = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
