//! Terminal UI rendering using ratatui.
//!
//! Rendering reads the [`App`] and never changes dashboard state. The only
//! thing it writes back is layout information the event handler needs: the
//! clickable regions and the grid width.
//!
//! ## Submodules
//!
//! - [`cards`]: Card grid with status, uptime gauge, window selector and chart
//! - [`logs`]: Modal overlay showing a server's recent log lines
//! - [`common`]: Shared components (header, status bar, help overlay)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! │ Aggregates / alert                   │
//! ├──────────────────────────────────────┤
//! │ ┌─ card ─────┐ ┌─ card ─────┐        │
//! │ │ cards::    │ │            │        │
//! │ │ render     │ │            │        │
//! │ └────────────┘ └────────────┘        │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    Overlays rendered on top:
//!    - logs::render_overlay
//!    - common::render_help
//! ```

pub mod cards;
pub mod common;
pub mod logs;
pub mod theme;

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::Style,
    widgets::Paragraph,
    Frame,
};

use crate::app::App;

pub use theme::Theme;

/// Minimum terminal width for a usable display.
pub const MIN_WIDTH: u16 = 50;
/// Minimum terminal height for a usable display.
pub const MIN_HEIGHT: u16 = 12;

/// Draw one frame and record the hit regions for mouse handling.
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        app.hit_regions.clear();
        let msg = format!(
            "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
            area.width, area.height, MIN_WIDTH, MIN_HEIGHT
        );
        let paragraph = Paragraph::new(msg)
            .alignment(Alignment::Center)
            .style(Style::default().fg(app.theme.warning));
        let centered = Rect::new(0, (area.height / 2).saturating_sub(2), area.width, 5)
            .intersection(area);
        frame.render_widget(paragraph, centered);
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Length(2), // Header and aggregates
        Constraint::Min(6),    // Card grid
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    common::render_header(frame, app, chunks[0]);
    let (regions, columns) = cards::render(frame, app, chunks[1]);
    common::render_status_bar(frame, app, chunks[2]);

    if let Some(view) = app.logs.as_ref() {
        logs::render_overlay(frame, app, view, area);
    }
    if app.show_help {
        common::render_help(frame, app, area);
    }

    // Overlays cover the grid, so the grid is not clickable under them
    app.hit_regions = if app.logs.is_some() || app.show_help {
        Vec::new()
    } else {
        regions
    };
    app.cards_per_row = columns;
}
