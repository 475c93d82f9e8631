//! UI events - messages from UI layer to App layer

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::session::EditableField;

/// Focusable panels
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Panel {
    #[default]
    Url,
    Body,
    Headers,
    Response,
}

impl Panel {
    pub fn next(&self) -> Self {
        match self {
            Panel::Url => Panel::Body,
            Panel::Body => Panel::Headers,
            Panel::Headers => Panel::Response,
            Panel::Response => Panel::Url,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Panel::Url => Panel::Response,
            Panel::Body => Panel::Url,
            Panel::Headers => Panel::Body,
            Panel::Response => Panel::Headers,
        }
    }
}

/// Input mode
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Editing,
}

/// How the request headers panel shows the header block
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum HeaderView {
    #[default]
    Table,
    Text,
}

impl HeaderView {
    pub fn toggle(&self) -> Self {
        match self {
            HeaderView::Table => HeaderView::Text,
            HeaderView::Text => HeaderView::Table,
        }
    }
}

/// Cell of a header table row being edited
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum HeaderCell {
    #[default]
    Key,
    Value,
}

impl HeaderCell {
    pub fn next(&self) -> Self {
        match self {
            HeaderCell::Key => HeaderCell::Value,
            HeaderCell::Value => HeaderCell::Key,
        }
    }
}

fn is_header_table(panel: Panel, header_view: HeaderView) -> bool {
    panel == Panel::Headers && header_view == HeaderView::Table
}

/// The text field a panel edits, if any
pub fn editable_field(panel: Panel, header_view: HeaderView) -> Option<EditableField> {
    match panel {
        Panel::Url => Some(EditableField::Url),
        Panel::Body => Some(EditableField::Body),
        Panel::Headers if header_view == HeaderView::Text => Some(EditableField::Headers),
        Panel::Headers | Panel::Response => None,
    }
}

/// Events generated from user input in the UI layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    // Tabs
    NewTab,
    CloseTab,
    NextTab,
    PrevTab,

    // Panel navigation
    NextPanel,
    PrevPanel,
    ScrollUp,
    ScrollDown,

    // Input editing
    StartEditing,
    StopEditing,
    CharInput(char),
    Newline,
    Backspace,
    CursorLeft,
    CursorRight,

    // Request actions
    SendRequest,
    CycleMethod,

    // Headers
    ToggleHeaderView,
    AddHeader,
    DeleteHeader,
    NextHeaderCell,

    // Popups
    ToggleHelp,
    CloseHelp,

    // System
    Quit,
}

/// Convert a keyboard event to a UI event based on current context
pub fn key_to_ui_event(
    key: KeyEvent,
    input_mode: InputMode,
    active_panel: Panel,
    header_view: HeaderView,
    show_help: bool,
) -> Option<UiEvent> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(UiEvent::Quit);
    }

    if show_help {
        return Some(UiEvent::CloseHelp);
    }

    match input_mode {
        InputMode::Editing => match key.code {
            KeyCode::Esc => Some(UiEvent::StopEditing),
            KeyCode::Enter if active_panel == Panel::Url => Some(UiEvent::SendRequest),
            // Table cells are single-line
            KeyCode::Enter if is_header_table(active_panel, header_view) => Some(UiEvent::StopEditing),
            KeyCode::Tab if is_header_table(active_panel, header_view) => Some(UiEvent::NextHeaderCell),
            KeyCode::Enter => Some(UiEvent::Newline),
            KeyCode::Backspace => Some(UiEvent::Backspace),
            KeyCode::Left => Some(UiEvent::CursorLeft),
            KeyCode::Right => Some(UiEvent::CursorRight),
            KeyCode::Tab => Some(UiEvent::NextPanel),
            KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
            _ => None,
        },
        InputMode::Normal => match key.code {
            KeyCode::Char('q') => Some(UiEvent::Quit),
            KeyCode::Char('?') => Some(UiEvent::ToggleHelp),
            KeyCode::Tab => Some(UiEvent::NextPanel),
            KeyCode::BackTab => Some(UiEvent::PrevPanel),
            KeyCode::Char('n') => Some(UiEvent::NewTab),
            KeyCode::Char('w') => Some(UiEvent::CloseTab),
            KeyCode::Char(']') => Some(UiEvent::NextTab),
            KeyCode::Char('[') => Some(UiEvent::PrevTab),
            KeyCode::Char('m') => Some(UiEvent::CycleMethod),
            KeyCode::Char('s') => Some(UiEvent::SendRequest),
            KeyCode::Enter if active_panel == Panel::Url => Some(UiEvent::SendRequest),
            KeyCode::Char('e') | KeyCode::Char('i')
                if editable_field(active_panel, header_view).is_some()
                    || is_header_table(active_panel, header_view) =>
            {
                Some(UiEvent::StartEditing)
            }
            KeyCode::Char('v') if active_panel == Panel::Headers => Some(UiEvent::ToggleHeaderView),
            KeyCode::Char('a')
                if active_panel == Panel::Headers && header_view == HeaderView::Table =>
            {
                Some(UiEvent::AddHeader)
            }
            KeyCode::Char('d')
                if active_panel == Panel::Headers && header_view == HeaderView::Table =>
            {
                Some(UiEvent::DeleteHeader)
            }
            KeyCode::Up => Some(UiEvent::ScrollUp),
            KeyCode::Down => Some(UiEvent::ScrollDown),
            _ => None,
        },
    }
}
