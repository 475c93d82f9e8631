use std::sync::Arc;

use ratatui::{prelude::*, widgets::*};

use crate::format::{tokenize, TokenKind};
use crate::models::HeaderEntry;

/// Renders tabs
pub fn render_tabs<'a>(titles: Vec<Line<'a>>, selected: usize) -> Tabs<'a> {
    Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Yellow).bold())
        .divider("|")
}

/// Renders a key-value list (for headers)
pub fn render_header_list<'a>(
    entries: &'a [HeaderEntry],
    title: &'a str,
    selected: Option<usize>,
    is_focused: bool,
) -> List<'a> {
    let items: Vec<ListItem> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let style = if Some(i) == selected {
                Style::default().fg(Color::Yellow).bold()
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled(entry.key.as_str(), Style::default().fg(Color::Cyan)),
                Span::raw(": "),
                Span::raw(entry.value.as_str()),
            ]))
            .style(style)
        })
        .collect();

    let border_style = if is_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title),
    )
}

fn token_style(kind: TokenKind) -> Style {
    match kind {
        TokenKind::Brace | TokenKind::Bracket => Style::default().fg(Color::Yellow),
        TokenKind::Comma | TokenKind::Colon => Style::default().fg(Color::White),
        TokenKind::String => Style::default().fg(Color::Green),
        TokenKind::Number => Style::default().fg(Color::Cyan),
        TokenKind::Boolean => Style::default().fg(Color::Magenta),
        TokenKind::Plain => Style::default(),
    }
}

/// JSON syntax highlighting, split into display lines
pub fn highlight_json(text: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();

    for token in tokenize(text) {
        let style = token_style(token.kind);
        let mut pieces = token.text(text).split('\n');
        if let Some(first) = pieces.next() {
            if !first.is_empty() {
                spans.push(Span::styled(first.to_string(), style));
            }
        }
        // Every further piece starts a new display line
        for piece in pieces {
            lines.push(Line::from(std::mem::take(&mut spans)));
            if !piece.is_empty() {
                spans.push(Span::styled(piece.to_string(), style));
            }
        }
    }

    if !spans.is_empty() || lines.is_empty() {
        lines.push(Line::from(spans));
    }
    lines
}

/// Highlighted lines of one text, rebuilt only when the text changes
#[derive(Default)]
pub struct HighlightCache {
    source: Option<Arc<str>>,
    lines: Vec<Line<'static>>,
}

impl HighlightCache {
    pub fn lines(&mut self, text: &Arc<str>) -> &[Line<'static>] {
        let unchanged = self
            .source
            .as_ref()
            .is_some_and(|source| Arc::ptr_eq(source, text) || **source == **text);
        if !unchanged {
            self.lines = highlight_json(text);
        }
        // Holding the latest handle keeps the next check a pointer compare
        self.source = Some(Arc::clone(text));
        &self.lines
    }
}

/// The lines a viewport of `height` rows shows when scrolled to `offset`
pub fn visible_lines(lines: &[Line<'static>], offset: usize, height: usize) -> Vec<Line<'static>> {
    lines.iter().skip(offset).take(height).cloned().collect()
}

/// Status color from the status display text
pub fn status_color(status: &str) -> Color {
    match status.parse::<u16>() {
        Ok(200..=299) => Color::Green,
        Ok(300..=399) => Color::Cyan,
        Ok(400..=499) => Color::Red,
        Ok(500..=599) => Color::Magenta,
        Ok(_) => Color::Yellow,
        Err(_) if status == crate::constants::STATUS_ERROR => Color::Red,
        Err(_) => Color::DarkGray,
    }
}

/// Method color
pub fn method_color(method: &str) -> Color {
    match method {
        "GET" => Color::Green,
        "POST" => Color::Yellow,
        "PUT" => Color::Blue,
        "PATCH" => Color::Cyan,
        "DELETE" => Color::Red,
        _ => Color::White,
    }
}

/// Line and column (in chars) of a byte offset, for placing the cursor
pub fn cursor_line_col(text: &str, byte_pos: usize) -> (u16, u16) {
    let end = byte_pos.min(text.len());
    let before = text.get(..end).unwrap_or(text);
    let line = before.matches('\n').count();
    let col = before.rsplit('\n').next().map(|l| l.chars().count()).unwrap_or(0);
    (line as u16, col as u16)
}
