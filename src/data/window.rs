//! Selectable chart time windows.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use anyhow::bail;

/// A trailing window of history shown in a server's chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeWindow {
    FiveMinutes,
    TenMinutes,
    #[default]
    OneHour,
    ThreeHours,
    FiveHours,
    Day,
}

impl TimeWindow {
    /// All windows in button order.
    pub const ALL: [TimeWindow; 6] = [
        TimeWindow::FiveMinutes,
        TimeWindow::TenMinutes,
        TimeWindow::OneHour,
        TimeWindow::ThreeHours,
        TimeWindow::FiveHours,
        TimeWindow::Day,
    ];

    /// Window length in hours.
    pub fn hours(self) -> f64 {
        match self {
            TimeWindow::FiveMinutes => 1.0 / 12.0,
            TimeWindow::TenMinutes => 1.0 / 6.0,
            TimeWindow::OneHour => 1.0,
            TimeWindow::ThreeHours => 3.0,
            TimeWindow::FiveHours => 5.0,
            TimeWindow::Day => 24.0,
        }
    }

    /// Label shown on the selector.
    pub fn label(self) -> &'static str {
        match self {
            TimeWindow::FiveMinutes => "5m",
            TimeWindow::TenMinutes => "10m",
            TimeWindow::OneHour => "1h",
            TimeWindow::ThreeHours => "3h",
            TimeWindow::FiveHours => "5h",
            TimeWindow::Day => "24h",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|w| *w == self).unwrap_or(0)
    }

    /// Next longer window, wrapping around.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Next shorter window, wrapping around.
    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeWindow {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match TimeWindow::ALL.iter().find(|w| w.label() == s) {
            Some(window) => Ok(*window),
            None => bail!("Unknown time window: {} (expected one of 5m, 10m, 1h, 3h, 5h, 24h)", s),
        }
    }
}

/// Per-server window choice.
///
/// A server gets [`TimeWindow::default`] the first time it is seen and keeps
/// whatever the user picks afterwards.
#[derive(Debug, Clone, Default)]
pub struct WindowSelection {
    windows: HashMap<String, TimeWindow>,
}

impl WindowSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected window for `key`, or the default if none was chosen.
    pub fn get(&self, key: &str) -> TimeWindow {
        self.windows.get(key).copied().unwrap_or_default()
    }

    /// Record the default for `key` unless a choice already exists.
    pub fn ensure(&mut self, key: &str) -> TimeWindow {
        *self.windows.entry(key.to_string()).or_default()
    }

    pub fn set(&mut self, key: &str, window: TimeWindow) {
        self.windows.insert(key.to_string(), window);
    }
}
