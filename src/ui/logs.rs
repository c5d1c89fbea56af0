//! Logs overlay rendering.
//!
//! Displays a modal overlay with the recent log lines of one server.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, LogsState, LogsView};

/// Minimum width required for the logs overlay to render properly.
const MIN_OVERLAY_WIDTH: u16 = 40;
/// Minimum height required for the logs overlay to render properly.
const MIN_OVERLAY_HEIGHT: u16 = 8;

/// Render the logs of one server as a modal overlay.
pub fn render_overlay(frame: &mut Frame, app: &App, view: &LogsView, area: Rect) {
    // Skip rendering if terminal is too small for the overlay
    if area.width < MIN_OVERLAY_WIDTH || area.height < MIN_OVERLAY_HEIGHT {
        return;
    }

    let overlay_width = (area.width * 90 / 100).clamp(MIN_OVERLAY_WIDTH, 120);
    let overlay_height = (area.height * 85 / 100).clamp(MIN_OVERLAY_HEIGHT, 50);
    let x = area.x + (area.width.saturating_sub(overlay_width)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_height)) / 2;
    let overlay_area = Rect::new(x, y, overlay_width, overlay_height);

    frame.render_widget(Clear, overlay_area);

    let chunks = Layout::vertical([
        Constraint::Min(3),    // Log lines
        Constraint::Length(1), // Footer
    ])
    .split(overlay_area);

    let name = server_name(app, view);
    let block = Block::default()
        .title(format!(" Logs: {} ", name))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let dim = Style::default().add_modifier(Modifier::DIM);
    let lines: Vec<Line> = match &view.state {
        LogsState::Loading => vec![Line::from(Span::styled(" Loading logs...", dim))],
        LogsState::Unavailable => vec![Line::from(Span::styled(
            " Logs are only available from an HTTP endpoint",
            dim,
        ))],
        LogsState::Failed(err) => vec![Line::from(Span::styled(
            format!(" Failed to load logs: {}", err),
            Style::default().fg(app.theme.critical),
        ))],
        LogsState::Loaded(logs) => match &logs.error {
            Some(err) => vec![Line::from(Span::styled(
                format!(" {}", err),
                Style::default().fg(app.theme.critical),
            ))],
            None if logs.logs.is_empty() => {
                vec![Line::from(Span::styled(" No logs available.", dim))]
            }
            None => logs.logs.iter().map(|l| Line::from(l.as_str())).collect(),
        },
    };

    // Keep at least one line on screen when scrolled past the end
    let scroll = view.scroll.min(lines.len().saturating_sub(1));
    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0));
    frame.render_widget(paragraph, chunks[0]);

    let footer = Paragraph::new(Line::from(vec![Span::styled(
        " ↑↓:scroll Esc:close ",
        dim,
    )]));
    frame.render_widget(footer, chunks[1]);
}

/// Server name for the title: the name the log endpoint reported, then the
/// card name, then the key.
fn server_name(app: &App, view: &LogsView) -> String {
    if let LogsState::Loaded(logs) = &view.state {
        if let Some(name) = logs.server_name.as_ref().filter(|n| !n.is_empty()) {
            return name.clone();
        }
    }
    app.dashboard
        .card(&view.key)
        .map(|c| c.display_name().to_string())
        .unwrap_or_else(|| view.key.clone())
}
