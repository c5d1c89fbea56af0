//! Server card grid.
//!
//! Each card shows the status badge, host, last check, an uptime gauge, the
//! window selector and a chart of the filtered history. Clickable parts are
//! recorded as hit regions so the event handler can resolve clicks.

use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, Gauge, GraphType, Paragraph},
    Frame,
};

use crate::action::Action;
use crate::app::App;
use crate::data::duration::format_age;
use crate::data::{parse_sample_time, PointColor, ServerCard, TimeWindow};

/// Narrowest a card may get before the grid drops a column.
pub const CARD_MIN_WIDTH: u16 = 44;
/// Height of one card, borders included.
pub const CARD_HEIGHT: u16 = 14;

const LOGS_LABEL: &str = " logs ";

/// Number of card columns that fit in `width`.
pub fn columns_for(width: u16) -> usize {
    usize::from((width / CARD_MIN_WIDTH).max(1))
}

/// Render the grid of visible cards.
///
/// Returns the hit regions of everything drawn and the column count used.
pub fn render(frame: &mut Frame, app: &App, area: Rect) -> (Vec<(Rect, Action)>, usize) {
    let mut regions = Vec::new();
    let columns = columns_for(area.width);
    let cards = app.visible_cards();

    if cards.is_empty() {
        let message = if app.dashboard.is_empty() {
            match app.load_error {
                Some(ref err) => format!("Error loading status: {}", err),
                None => "Loading...".to_string(),
            }
        } else {
            format!("No servers match '{}'", app.filter_text)
        };
        frame.render_widget(
            Paragraph::new(message).style(Style::default().add_modifier(Modifier::DIM)),
            area,
        );
        return (regions, columns);
    }

    // Scroll so the selected row stays visible
    let visible_rows = usize::from((area.height / CARD_HEIGHT).max(1));
    let selected_row = app.selected_card / columns;
    let first_row = selected_row.saturating_sub(visible_rows - 1);

    let now = app.now();
    let card_width = area.width / columns as u16;

    for (index, card) in cards.iter().enumerate().skip(first_row * columns) {
        let row = index / columns - first_row;
        if row >= visible_rows {
            break;
        }
        let column = index % columns;
        let y = area.y + row as u16 * CARD_HEIGHT;
        let height = CARD_HEIGHT.min(area.bottom().saturating_sub(y));
        if height < 3 {
            break;
        }
        let card_area = Rect::new(area.x + column as u16 * card_width, y, card_width, height);

        regions.push((card_area, Action::SelectCard(index)));
        render_card(
            frame,
            app,
            card,
            card_area,
            index == app.selected_card,
            now,
            &mut regions,
        );
    }

    (regions, columns)
}

fn render_card(
    frame: &mut Frame,
    app: &App,
    card: &ServerCard,
    area: Rect,
    selected: bool,
    now: DateTime<Utc>,
    regions: &mut Vec<(Rect, Action)>,
) {
    let border_style = if selected {
        app.theme.selected
    } else if card.stale {
        Style::default().fg(app.theme.border).add_modifier(Modifier::DIM)
    } else {
        Style::default().fg(app.theme.border)
    };

    let mut title = vec![Span::styled(
        format!(" {} ", card.display_name()),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if card.stale {
        title.push(Span::styled(
            "(gone) ",
            Style::default().add_modifier(Modifier::DIM),
        ));
    }

    let block = Block::default()
        .title(Line::from(title))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height < 4 || inner.width < 10 {
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Length(1), // Status and host
        Constraint::Length(1), // Last check
        Constraint::Length(1), // Uptime gauge
        Constraint::Length(1), // Window selector
        Constraint::Min(1),    // Chart
    ])
    .split(inner);

    let mut status_style = app.theme.status_style(card.status);
    if card.stale {
        status_style = status_style.add_modifier(Modifier::DIM);
    }
    let status_line = Line::from(vec![
        Span::styled(format!("● {} ", card.status.label()), status_style),
        Span::raw("│ "),
        Span::raw(card.host.clone()),
    ]);
    frame.render_widget(Paragraph::new(status_line), chunks[0]);

    frame.render_widget(
        Paragraph::new(last_check_text(card.last_check.as_deref(), now))
            .style(Style::default().add_modifier(Modifier::DIM)),
        chunks[1],
    );

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(app.theme.level_color(card.uptime_level())))
        .ratio(card.gauge_ratio())
        .label(format!("{:.1}% uptime", card.uptime_percentage));
    frame.render_widget(gauge, chunks[2]);

    render_window_selector(frame, app, card, chunks[3], regions);
    render_chart(frame, app, card, chunks[4]);
}

/// Human text for the last check timestamp.
pub fn last_check_text(last_check: Option<&str>, now: DateTime<Utc>) -> String {
    match last_check {
        None => "never checked".to_string(),
        Some(raw) => match parse_sample_time(raw) {
            Ok(at) => {
                let age = (now - at).to_std().unwrap_or_default();
                format!("checked {} ago", format_age(age))
            }
            Err(_) => format!("checked {}", raw),
        },
    }
}

fn render_window_selector(
    frame: &mut Frame,
    app: &App,
    card: &ServerCard,
    area: Rect,
    regions: &mut Vec<(Rect, Action)>,
) {
    let current = app.dashboard.window_for(&card.key);
    let mut spans = Vec::new();
    let mut x = area.x;

    for window in TimeWindow::ALL {
        let label = format!(" {} ", window.label());
        let width = label.len() as u16;
        if x + width > area.right() {
            break;
        }
        regions.push((
            Rect::new(x, area.y, width, 1),
            Action::SetWindow {
                key: card.key.clone(),
                window,
            },
        ));
        let style = if window == current {
            app.theme.window_active
        } else {
            app.theme.window_inactive
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));
        x += width + 1;
    }

    let logs_width = LOGS_LABEL.len() as u16;
    if x + 1 + logs_width <= area.right() {
        spans.push(Span::raw(" "));
        regions.push((
            Rect::new(x + 1, area.y, logs_width, 1),
            Action::OpenLogs {
                key: card.key.clone(),
            },
        ));
        spans.push(Span::styled(
            LOGS_LABEL,
            Style::default()
                .fg(app.theme.highlight)
                .add_modifier(Modifier::UNDERLINED),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_chart(frame: &mut Frame, app: &App, card: &ServerCard, area: Rect) {
    let series = &card.chart;
    if series.is_empty() {
        frame.render_widget(
            Paragraph::new(format!(
                "No checks in the last {}",
                app.dashboard.window_for(&card.key)
            ))
            .style(Style::default().add_modifier(Modifier::DIM)),
            area,
        );
        return;
    }

    let line: Vec<(f64, f64)> = series
        .values
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64, f64::from(*v)))
        .collect();
    let up = series.points_with_color(PointColor::Up);
    let down = series.points_with_color(PointColor::Down);

    let datasets = vec![
        Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(app.theme.border))
            .data(&line),
        Dataset::default()
            .marker(Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(app.theme.point_color(PointColor::Up)))
            .data(&up),
        Dataset::default()
            .marker(Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(app.theme.point_color(PointColor::Down)))
            .data(&down),
    ];

    let x_max = (series.len() as f64 - 1.0).max(1.0);
    let first = series.labels.first().cloned().unwrap_or_default();
    let last = series.labels.last().cloned().unwrap_or_default();

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .bounds([0.0, x_max])
                .labels([Span::raw(first), Span::raw(last)])
                .style(Style::default().fg(app.theme.border)),
        )
        .y_axis(
            Axis::default()
                .bounds([-0.2, 1.2])
                .labels([Span::raw("down"), Span::raw("up")])
                .style(Style::default().fg(app.theme.border)),
        );
    frame.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_for() {
        assert_eq!(columns_for(10), 1);
        assert_eq!(columns_for(44), 1);
        assert_eq!(columns_for(100), 2);
        assert_eq!(columns_for(200), 4);
    }

    #[test]
    fn test_last_check_text() {
        let now = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(last_check_text(None, now), "never checked");
        assert_eq!(
            last_check_text(Some("2024-05-01T11:59:30Z"), now),
            "checked 30s ago"
        );
        assert_eq!(
            last_check_text(Some("yesterday"), now),
            "checked yesterday"
        );
        // Future timestamps clamp to zero
        assert_eq!(
            last_check_text(Some("2024-05-01T12:05:00Z"), now),
            "checked 0s ago"
        );
    }
}
