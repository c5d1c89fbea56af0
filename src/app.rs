//! Application state and user interaction logic.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use ratatui::layout::Rect;
use tracing::{debug, info, warn};

use crate::action::{Action, Direction};
use crate::data::{Clock, DashboardState, DownAlert, ServerCard, SystemClock};
use crate::source::{DataSource, ServerLogs};
use crate::ui::Theme;

/// How long a status bar message stays visible.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);
/// How long the header flashes after the down count grows.
const ALERT_FLASH_TTL: Duration = Duration::from_secs(5);

/// Where the `e` key writes its export.
pub const DEFAULT_EXPORT_PATH: &str = "uptime_export.json";

/// Progress of a log request shown in the logs overlay.
#[derive(Debug, Clone, PartialEq)]
pub enum LogsState {
    Loading,
    Loaded(ServerLogs),
    Failed(String),
    /// The data source has no log endpoint.
    Unavailable,
}

/// The logs overlay for one server.
#[derive(Debug, Clone, PartialEq)]
pub struct LogsView {
    pub key: String,
    pub state: LogsState,
    pub scroll: usize,
}

/// Main application state.
///
/// Owns the data source, the dashboard state and all UI state. Rendering
/// functions borrow it; only [`App::dispatch`] and the refresh/tick methods
/// change it.
pub struct App {
    pub running: bool,
    pub show_help: bool,
    pub logs: Option<LogsView>,

    // Data
    source: Box<dyn DataSource>,
    clock: Arc<dyn Clock>,
    pub dashboard: DashboardState,
    pub load_error: Option<String>,

    // Navigation state (index into the filtered card list)
    pub selected_card: usize,
    /// Grid width from the last render, used for up/down movement.
    pub cards_per_row: usize,

    // Search/filter
    pub filter_text: String,
    pub filter_active: bool,

    // UI
    pub theme: Theme,
    pub clock_display: String,
    /// Clickable areas from the last render.
    pub hit_regions: Vec<(Rect, Action)>,
    pub export_path: PathBuf,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
    alert: Option<(DownAlert, Instant)>,
}

impl App {
    /// Create a new App reading the system clock, with an auto-detected theme.
    pub fn new(source: Box<dyn DataSource>) -> Self {
        let mut app = Self::with_clock(source, Arc::new(SystemClock));
        app.theme = Theme::auto_detect();
        app
    }

    /// Create a new App with an explicit clock and the dark theme.
    pub fn with_clock(source: Box<dyn DataSource>, clock: Arc<dyn Clock>) -> Self {
        let mut app = Self {
            running: true,
            show_help: false,
            logs: None,
            source,
            clock,
            dashboard: DashboardState::new(),
            load_error: None,
            selected_card: 0,
            cards_per_row: 1,
            filter_text: String::new(),
            filter_active: false,
            theme: Theme::dark(),
            clock_display: String::new(),
            hit_regions: Vec::new(),
            export_path: PathBuf::from(DEFAULT_EXPORT_PATH),
            status_message: None,
            alert: None,
        };
        app.tick_clock();
        app
    }

    /// Current time from the injected clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Returns a description of the current data source.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, time)) if time.elapsed() < STATUS_MESSAGE_TTL => Some(msg),
            _ => None,
        }
    }

    /// The down alert, while it is still flashing.
    pub fn active_alert(&self) -> Option<&DownAlert> {
        match &self.alert {
            Some((alert, time)) if time.elapsed() < ALERT_FLASH_TTL => Some(alert),
            _ => None,
        }
    }

    /// Ask the source for a fresh snapshot. Called by the poll timer and by
    /// the refresh action.
    pub fn request_refresh(&mut self) {
        self.source.request_refresh();
    }

    /// Pick up whatever the source has delivered.
    ///
    /// Returns `true` if a snapshot was applied. Fetch failures are recorded
    /// in `load_error` and leave the current cards in place; the next poll
    /// retries.
    pub fn reload_data(&mut self) -> bool {
        let mut applied = false;

        if let Some(delivery) = self.source.poll() {
            let now = self.clock.now();
            let outcome = self.dashboard.apply(delivery.seq, &delivery.snapshot, now);
            debug!(?outcome, "reloaded");
            if matches!(outcome, crate::data::ApplyOutcome::Applied { .. }) {
                applied = true;
                self.clamp_selection();
            }
        }

        if let Some(alert) = self.dashboard.take_alert() {
            self.set_status_message(format!(
                "ALERT: {} server(s) down (was {})",
                alert.current, alert.previous
            ));
            self.alert = Some((alert, Instant::now()));
        }

        self.load_error = self.source.error().map(str::to_string);
        self.receive_logs();

        applied
    }

    /// Refresh the clock display and slide every chart's window cutoff.
    pub fn tick_clock(&mut self) {
        let now = self.clock.now();
        self.dashboard.refilter_all(now);
        self.clock_display = now
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
    }

    fn receive_logs(&mut self) {
        for (key, result) in self.source.poll_logs() {
            let Some(view) = self.logs.as_mut().filter(|v| v.key == key) else {
                debug!(key = %key, "discarding logs for closed overlay");
                continue;
            };
            view.state = match result {
                Ok(logs) => LogsState::Loaded(logs),
                Err(e) => {
                    warn!(key = %key, error = %e, "log fetch failed");
                    LogsState::Failed(e.to_string())
                }
            };
        }
    }

    /// Cards that pass the current filter, in display order.
    pub fn visible_cards(&self) -> Vec<&ServerCard> {
        self.dashboard
            .cards()
            .filter(|c| self.matches_filter(c))
            .collect()
    }

    /// Key of the selected card, if any card is visible.
    pub fn selected_key(&self) -> Option<String> {
        self.visible_cards()
            .get(self.selected_card)
            .map(|c| c.key.clone())
    }

    fn clamp_selection(&mut self) {
        let count = self.visible_cards().len();
        if self.selected_card >= count {
            self.selected_card = count.saturating_sub(1);
        }
    }

    /// Handle one user action.
    pub fn dispatch(&mut self, action: Action) {
        match action {
            Action::Quit => self.quit(),
            Action::Refresh => {
                self.request_refresh();
                self.set_status_message("Refreshing...".to_string());
            }
            Action::ToggleHelp => self.show_help = !self.show_help,
            Action::CloseOverlay => self.close_overlay(),
            Action::Export => {
                let path = self.export_path.clone();
                match self.export_state(&path) {
                    Ok(()) => self.set_status_message(format!("Exported to {}", path.display())),
                    Err(e) => self.set_status_message(format!("Export failed: {}", e)),
                }
            }

            Action::SelectCard(index) => {
                if index < self.visible_cards().len() {
                    self.selected_card = index;
                }
            }
            Action::Move(direction) => self.move_selection(direction),
            Action::SelectFirst => self.selected_card = 0,
            Action::SelectLast => {
                self.selected_card = self.visible_cards().len().saturating_sub(1);
            }

            Action::SetWindow { key, window } => {
                let now = self.clock.now();
                if !self.dashboard.select_window(&key, window, now) {
                    debug!(key = %key, "window change for unknown server");
                }
            }
            Action::CycleWindow { key, forward } => {
                let current = self.dashboard.window_for(&key);
                let window = if forward { current.next() } else { current.prev() };
                let now = self.clock.now();
                self.dashboard.select_window(&key, window, now);
            }
            Action::OpenLogs { key } => self.open_logs(key),
            Action::ScrollLogs(delta) => {
                if let Some(view) = self.logs.as_mut() {
                    view.scroll = view.scroll.saturating_add_signed(delta as isize);
                }
            }

            Action::StartFilter => self.filter_active = true,
            Action::ClearFilter => {
                self.filter_text.clear();
                self.filter_active = false;
                self.clamp_selection();
            }
        }
    }

    fn move_selection(&mut self, direction: Direction) {
        let count = self.visible_cards().len();
        if count == 0 {
            return;
        }
        let last = count - 1;
        let per_row = self.cards_per_row.max(1);
        self.selected_card = match direction {
            Direction::Left => self.selected_card.saturating_sub(1),
            Direction::Right => (self.selected_card + 1).min(last),
            Direction::Up => self.selected_card.saturating_sub(per_row),
            Direction::Down => (self.selected_card + per_row).min(last),
        };
    }

    fn open_logs(&mut self, key: String) {
        let state = if self.source.request_logs(&key) {
            LogsState::Loading
        } else {
            LogsState::Unavailable
        };
        info!(key = %key, "opening logs");
        self.logs = Some(LogsView {
            key,
            state,
            scroll: 0,
        });
    }

    /// Close the topmost overlay: help, then logs, then filter input.
    pub fn close_overlay(&mut self) {
        if self.show_help {
            self.show_help = false;
        } else if self.logs.is_some() {
            self.logs = None;
        } else if self.filter_active {
            self.filter_active = false;
        }
    }

    /// Append a character to the filter text.
    pub fn filter_push(&mut self, c: char) {
        self.filter_text.push(c);
        self.clamp_selection();
    }

    /// Remove the last character from the filter text.
    pub fn filter_pop(&mut self) {
        self.filter_text.pop();
        self.clamp_selection();
    }

    /// Check if a card matches the current filter (name, host or key).
    pub fn matches_filter(&self, card: &ServerCard) -> bool {
        if self.filter_text.is_empty() {
            return true;
        }
        let search = self.filter_text.to_lowercase();
        [&card.name, &card.host, &card.key]
            .iter()
            .any(|field| field.to_lowercase().contains(&search))
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export current dashboard state to a JSON file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        if self.dashboard.last_refreshed().is_none() {
            anyhow::bail!("No data to export");
        }
        let json = serde_json::to_string_pretty(&export_json(&self.dashboard))?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "exported dashboard state");
        Ok(())
    }
}

/// JSON document describing the dashboard: aggregates plus one entry per card.
pub fn export_json(dashboard: &DashboardState) -> serde_json::Value {
    let stats = dashboard.stats();
    let servers: Vec<serde_json::Value> = dashboard
        .cards()
        .map(|card| {
            serde_json::json!({
                "key": card.key,
                "name": card.name,
                "host": card.host,
                "status": card.status,
                "last_check": card.last_check,
                "uptime_percentage": card.uptime_percentage,
                "window": dashboard.window_for(&card.key).label(),
                "points": card.chart.len(),
                "stale": card.stale,
            })
        })
        .collect();

    serde_json::json!({
        "summary": {
            "total": stats.total,
            "up": stats.up,
            "down": stats.down,
            "mean_uptime": stats.mean_uptime,
            "last_refreshed": dashboard.last_refreshed().map(|t| t.to_rfc3339()),
            "sequence": dashboard.last_applied_seq(),
        },
        "servers": servers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ManualClock, TimeWindow};
    use crate::source::{
        ChannelSource, HistorySample, SampleStatus, ServerRecord, ServerStatus, StatusSnapshot,
    };
    use chrono::{DateTime, TimeDelta, Utc};
    use tokio::sync::watch;

    fn start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn record(key: &str, status: ServerStatus) -> ServerRecord {
        let mut record = ServerRecord::new(format!("srv-{}", key), key);
        record.status = status;
        record.uptime_percentage = if status == ServerStatus::Up { 100.0 } else { 0.0 };
        record.history = (0..6)
            .rev()
            .map(|i| HistorySample {
                time: (start() - TimeDelta::minutes(i * 30)).to_rfc3339(),
                status: SampleStatus::Up,
            })
            .collect();
        record
    }

    fn snapshot(entries: &[(&str, ServerStatus)]) -> StatusSnapshot {
        entries
            .iter()
            .map(|(key, status)| (key.to_string(), record(key, *status)))
            .collect()
    }

    fn app_with_channel() -> (watch::Sender<StatusSnapshot>, App) {
        let (tx, source) = ChannelSource::create("test");
        let clock = Arc::new(ManualClock::new(start()));
        (tx, App::with_clock(Box::new(source), clock))
    }

    #[test]
    fn test_reload_applies_snapshot() {
        let (tx, mut app) = app_with_channel();
        tx.send(snapshot(&[("a", ServerStatus::Up), ("b", ServerStatus::Up)]))
            .unwrap();

        assert!(app.reload_data());
        assert_eq!(app.dashboard.len(), 2);
        assert_eq!(app.selected_key().as_deref(), Some("a"));
        assert!(app.load_error.is_none());

        // Nothing new
        assert!(!app.reload_data());
    }

    #[test]
    fn test_down_increase_sets_alert_message() {
        let (tx, mut app) = app_with_channel();
        tx.send(snapshot(&[("a", ServerStatus::Up)])).unwrap();
        app.reload_data();
        assert!(app.active_alert().is_none());

        tx.send(snapshot(&[("a", ServerStatus::Down)])).unwrap();
        app.reload_data();
        assert_eq!(app.active_alert().unwrap().current, 1);
        assert!(app.get_status_message().unwrap().contains("ALERT"));
    }

    #[test]
    fn test_set_window_action_only_touches_one_card() {
        let (tx, mut app) = app_with_channel();
        tx.send(snapshot(&[("a", ServerStatus::Up), ("b", ServerStatus::Up)]))
            .unwrap();
        app.reload_data();

        let b_before = app.dashboard.card("b").unwrap().chart.clone();
        app.dispatch(Action::SetWindow {
            key: "a".to_string(),
            window: TimeWindow::FiveMinutes,
        });

        assert_eq!(app.dashboard.window_for("a"), TimeWindow::FiveMinutes);
        assert_eq!(app.dashboard.card("a").unwrap().chart.len(), 1);
        assert_eq!(app.dashboard.card("b").unwrap().chart, b_before);
    }

    #[test]
    fn test_cycle_window() {
        let (tx, mut app) = app_with_channel();
        tx.send(snapshot(&[("a", ServerStatus::Up)])).unwrap();
        app.reload_data();

        app.dispatch(Action::CycleWindow {
            key: "a".to_string(),
            forward: true,
        });
        assert_eq!(app.dashboard.window_for("a"), TimeWindow::ThreeHours);

        app.dispatch(Action::CycleWindow {
            key: "a".to_string(),
            forward: false,
        });
        app.dispatch(Action::CycleWindow {
            key: "a".to_string(),
            forward: false,
        });
        assert_eq!(app.dashboard.window_for("a"), TimeWindow::TenMinutes);
    }

    #[test]
    fn test_grid_navigation() {
        let (tx, mut app) = app_with_channel();
        let keys = ["a", "b", "c", "d", "e"];
        let entries: Vec<(&str, ServerStatus)> =
            keys.iter().map(|k| (*k, ServerStatus::Up)).collect();
        tx.send(snapshot(&entries)).unwrap();
        app.reload_data();
        app.cards_per_row = 2;

        app.dispatch(Action::Move(Direction::Down));
        assert_eq!(app.selected_card, 2);
        app.dispatch(Action::Move(Direction::Right));
        assert_eq!(app.selected_card, 3);
        app.dispatch(Action::Move(Direction::Down));
        assert_eq!(app.selected_card, 4);
        app.dispatch(Action::Move(Direction::Right));
        assert_eq!(app.selected_card, 4);
        app.dispatch(Action::Move(Direction::Up));
        assert_eq!(app.selected_card, 2);
        app.dispatch(Action::SelectFirst);
        assert_eq!(app.selected_card, 0);
        app.dispatch(Action::SelectLast);
        assert_eq!(app.selected_card, 4);
        app.dispatch(Action::SelectCard(9));
        assert_eq!(app.selected_card, 4);
    }

    #[test]
    fn test_filter_narrows_and_clamps() {
        let (tx, mut app) = app_with_channel();
        tx.send(snapshot(&[
            ("10.0.0.1", ServerStatus::Up),
            ("10.0.0.2", ServerStatus::Up),
            ("db.local", ServerStatus::Up),
        ]))
        .unwrap();
        app.reload_data();
        app.dispatch(Action::SelectLast);
        assert_eq!(app.selected_card, 2);

        app.dispatch(Action::StartFilter);
        for c in "10.0".chars() {
            app.filter_push(c);
        }
        assert_eq!(app.visible_cards().len(), 2);
        assert_eq!(app.selected_card, 1);

        app.dispatch(Action::ClearFilter);
        assert_eq!(app.visible_cards().len(), 3);
        assert!(!app.filter_active);
    }

    #[test]
    fn test_logs_unavailable_for_channel_source() {
        let (_tx, mut app) = app_with_channel();
        app.dispatch(Action::OpenLogs {
            key: "a".to_string(),
        });
        assert_eq!(app.logs.as_ref().unwrap().state, LogsState::Unavailable);

        app.dispatch(Action::ScrollLogs(3));
        assert_eq!(app.logs.as_ref().unwrap().scroll, 3);
        app.dispatch(Action::ScrollLogs(-10));
        assert_eq!(app.logs.as_ref().unwrap().scroll, 0);

        app.dispatch(Action::CloseOverlay);
        assert!(app.logs.is_none());
    }

    #[test]
    fn test_close_overlay_order() {
        let (_tx, mut app) = app_with_channel();
        app.dispatch(Action::OpenLogs {
            key: "a".to_string(),
        });
        app.dispatch(Action::ToggleHelp);

        app.dispatch(Action::CloseOverlay);
        assert!(!app.show_help);
        assert!(app.logs.is_some());
        app.dispatch(Action::CloseOverlay);
        assert!(app.logs.is_none());
    }

    #[test]
    fn test_clock_display_uses_clock() {
        let (_tx, mut app) = app_with_channel();
        let expected = start()
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        assert_eq!(app.clock_display, expected);

        app.tick_clock();
        assert_eq!(app.clock_display, expected);
    }

    #[test]
    fn test_export_state() {
        let (tx, mut app) = app_with_channel();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");

        assert!(app.export_state(&path).is_err());

        tx.send(snapshot(&[("a", ServerStatus::Up), ("b", ServerStatus::Down)]))
            .unwrap();
        app.reload_data();
        app.export_path = path.clone();
        app.dispatch(Action::Export);

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["summary"]["total"], 2);
        assert_eq!(written["summary"]["down"], 1);
        assert_eq!(written["summary"]["mean_uptime"], 50.0);
        assert_eq!(written["summary"]["sequence"], 1);
        assert_eq!(written["servers"][1]["status"], "down");
        assert_eq!(written["servers"][0]["window"], "1h");
    }

    #[test]
    fn test_file_source_error_is_transient() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        std::fs::write(&path, r#"{"a":{"name":"a","host":"a","status":"up"}}"#).unwrap();

        let clock = Arc::new(ManualClock::new(start()));
        let source = crate::source::FileSource::new(&path);
        let mut app = App::with_clock(Box::new(source), clock);
        assert!(app.reload_data());

        std::fs::write(&path, "garbage").unwrap();
        app.request_refresh();
        assert!(!app.reload_data());
        assert!(app.load_error.as_deref().unwrap().contains("Parse error"));
        // Cards survive the failed refresh
        assert_eq!(app.dashboard.len(), 1);
    }

    /// Source whose log replies are queued by the test.
    #[derive(Debug, Default)]
    struct QueuedLogsSource {
        replies: Vec<(String, Result<ServerLogs, crate::source::FetchError>)>,
    }

    impl DataSource for QueuedLogsSource {
        fn poll(&mut self) -> Option<crate::source::Delivery> {
            None
        }

        fn request_logs(&mut self, _key: &str) -> bool {
            true
        }

        fn poll_logs(&mut self) -> Vec<(String, Result<ServerLogs, crate::source::FetchError>)> {
            std::mem::take(&mut self.replies)
        }

        fn description(&self) -> &str {
            "queued"
        }

        fn error(&self) -> Option<&str> {
            None
        }
    }

    #[test]
    fn test_logs_reply_survives_later_reply_for_other_key() {
        let logs = |line: &str| ServerLogs {
            logs: vec![line.to_string()],
            ..ServerLogs::default()
        };
        let source = QueuedLogsSource {
            replies: vec![
                ("a".to_string(), Ok(logs("from a"))),
                ("b".to_string(), Ok(logs("from b"))),
            ],
        };
        let clock = Arc::new(ManualClock::new(start()));
        let mut app = App::with_clock(Box::new(source), clock);
        app.dispatch(Action::OpenLogs {
            key: "a".to_string(),
        });
        assert_eq!(app.logs.as_ref().unwrap().state, LogsState::Loading);

        app.reload_data();
        assert_eq!(
            app.logs.as_ref().unwrap().state,
            LogsState::Loaded(logs("from a"))
        );
    }

    #[test]
    fn test_tick_slides_chart_window() {
        let (tx, source) = ChannelSource::create("test");
        let clock = Arc::new(ManualClock::new(start()));
        let mut app = App::with_clock(Box::new(source), clock.clone());
        tx.send(snapshot(&[("a", ServerStatus::Up)])).unwrap();
        app.reload_data();
        // Samples at -60m, -30m and 0 fall inside the default 1h window
        assert_eq!(app.dashboard.card("a").unwrap().chart.len(), 3);

        clock.advance(TimeDelta::minutes(45));
        app.tick_clock();
        assert_eq!(app.dashboard.card("a").unwrap().chart.len(), 1);
    }
}
