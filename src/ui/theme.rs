//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::{PointColor, UptimeLevel};
use crate::source::ServerStatus;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color for degraded uptime.
    pub warning: Color,
    /// Color for down servers and poor uptime.
    pub critical: Color,
    /// Color for up servers and good uptime.
    pub healthy: Color,
    /// Color for servers with no known status.
    pub unknown: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for section titles.
    pub header: Style,
    /// Border style for the selected card.
    pub selected: Style,
    /// Style for the active window button.
    pub window_active: Style,
    /// Style for inactive window buttons.
    pub window_inactive: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            unknown: Color::Gray,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            window_active: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            window_inactive: Style::default().fg(Color::Gray),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            unknown: Color::DarkGray,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            window_active: Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            window_inactive: Style::default().fg(Color::DarkGray),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        // Use terminal-light crate to detect background luminance
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Get style for a server status badge
    pub fn status_style(&self, status: ServerStatus) -> Style {
        match status {
            ServerStatus::Up => Style::default().fg(self.healthy).add_modifier(Modifier::BOLD),
            ServerStatus::Down => Style::default().fg(self.critical).add_modifier(Modifier::BOLD),
            ServerStatus::Unknown => Style::default().fg(self.unknown),
        }
    }

    /// Gauge color for an uptime level
    pub fn level_color(&self, level: UptimeLevel) -> Color {
        match level {
            UptimeLevel::Good => self.healthy,
            UptimeLevel::Degraded => self.warning,
            UptimeLevel::Poor => self.critical,
        }
    }

    /// Chart point color
    pub fn point_color(&self, color: PointColor) -> Color {
        match color {
            PointColor::Up => self.healthy,
            PointColor::Down => self.critical,
        }
    }
}
