//! Common UI components.
//!
//! This module contains the header, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::duration::format_age;

/// Render the header: title, source and clock on the first line, aggregates
/// on the second.
///
/// The aggregate line turns red while a down alert is active.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let stats = app.dashboard.stats();

    let overall_style = if stats.down > 0 {
        Style::default().fg(app.theme.critical)
    } else if stats.total > 0 {
        Style::default().fg(app.theme.healthy)
    } else {
        Style::default().fg(app.theme.unknown)
    };

    let title = Line::from(vec![
        Span::styled(" ● ", overall_style),
        Span::styled("UPTIME BOARD ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(
            app.source_description().to_string(),
            Style::default().add_modifier(Modifier::DIM),
        ),
        Span::raw(" │ "),
        Span::styled(app.clock_display.clone(), app.theme.header),
    ]);

    let refreshed = match app.dashboard.last_refreshed() {
        Some(at) => {
            let age = (app.now() - at).to_std().unwrap_or_default();
            format!("refreshed {} ago", format_age(age))
        }
        None => "waiting for data".to_string(),
    };

    let summary = if let Some(alert) = app.active_alert() {
        Line::from(vec![Span::styled(
            format!(
                " ▲ ALERT: {} down (was {}) │ {} servers │ {} up │ mean {:.1}% │ {} ",
                alert.current, alert.previous, stats.total, stats.up, stats.mean_uptime, refreshed
            ),
            Style::default()
                .fg(ratatui::style::Color::White)
                .bg(app.theme.critical)
                .add_modifier(Modifier::BOLD),
        )])
    } else {
        Line::from(vec![
            Span::raw(" "),
            Span::styled(
                format!("{}", stats.total),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(" servers │ "),
            Span::styled(format!("{}", stats.up), Style::default().fg(app.theme.healthy)),
            Span::raw(" up "),
            if stats.down > 0 {
                Span::styled(
                    format!("{}", stats.down),
                    Style::default().fg(app.theme.critical).add_modifier(Modifier::BOLD),
                )
            } else {
                Span::styled("0", Style::default().add_modifier(Modifier::DIM))
            },
            Span::raw(" down │ "),
            Span::raw(format!("mean {:.1}%", stats.mean_uptime)),
            Span::raw(" │ "),
            Span::styled(refreshed, Style::default().add_modifier(Modifier::DIM)),
        ])
    };

    frame.render_widget(Paragraph::new(vec![title, summary]), area);
}

/// Render the status bar at the bottom.
///
/// Temporary messages win over errors, errors win over the key hints.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    if app.filter_active {
        let paragraph = Paragraph::new(format!(
            " /{}█ | Enter:apply Esc:cancel",
            app.filter_text
        ));
        frame.render_widget(paragraph, area);
        return;
    }

    if let Some(ref err) = app.load_error {
        let paragraph = Paragraph::new(format!(" Error: {} | retrying | r:retry q:quit", err))
            .style(Style::default().fg(app.theme.critical));
        frame.render_widget(paragraph, area);
        return;
    }

    let filter = if app.filter_text.is_empty() {
        String::new()
    } else {
        format!("filter: {} (c:clear) | ", app.filter_text)
    };
    let status = format!(
        " {}←↓↑→:select 1-6/[]:window Enter:logs /:search r:refresh ?:help q:quit",
        filter
    );
    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the card grid.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Cards"),
        Line::from("  ←↓↑→ hjkl   Select card"),
        Line::from("  Home/End    First/last card"),
        Line::from("  1-6         Window 5m/10m/1h/3h/5h/24h"),
        Line::from("  [ ] Tab     Shorter/longer window"),
        Line::from("  Enter L     Show logs"),
        Line::from("  Click       Select, window, logs"),
        Line::from(""),
        section(" Filter"),
        Line::from("  /           Search name or host"),
        Line::from("  c           Clear filter"),
        Line::from(""),
        section(" General"),
        Line::from("  r           Refresh now"),
        Line::from("  e           Export to JSON"),
        Line::from("  Esc         Close overlay"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 46u16.min(area.width.saturating_sub(4));
    let help_height = 24u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    // Clear the area behind the help
    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
