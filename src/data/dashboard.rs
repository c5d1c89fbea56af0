//! Dashboard state and snapshot reconciliation.
//!
//! [`DashboardState`] owns everything the dashboard remembers between polls:
//! one [`ServerCard`] per server key ever seen, the per-server time window,
//! the aggregate counters and the down-count used for alerts. Each poll is
//! folded in with [`DashboardState::apply`]; rendering reads the state and
//! never mutates it.
//!
//! ```text
//! Delivery { seq, snapshot }
//!        │
//!        ▼
//! DashboardState::apply()
//!        │
//!        ├──▶ seq ≤ last applied? ──▶ ApplyOutcome::Stale
//!        │
//!        ├──▶ per key: update_card() (falls back to create_card())
//!        │         └──▶ filter_history(selected window) ──▶ ChartSeries
//!        │
//!        ├──▶ AggregateStats::from_snapshot()
//!        │
//!        └──▶ down count grew? ──▶ DownAlert (one-shot)
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::history::filter_history;
use super::series::ChartSeries;
use super::window::{TimeWindow, WindowSelection};
use crate::source::{HistorySample, ServerRecord, ServerStatus, StatusSnapshot};

/// Uptime percentage at or above which a server counts as healthy.
pub const GOOD_UPTIME: f64 = 95.0;
/// Uptime percentage at or above which a server counts as degraded.
pub const DEGRADED_UPTIME: f64 = 80.0;

/// Coarse uptime class, drives the gauge color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UptimeLevel {
    Good,
    Degraded,
    Poor,
}

impl UptimeLevel {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= GOOD_UPTIME {
            UptimeLevel::Good
        } else if percentage >= DEGRADED_UPTIME {
            UptimeLevel::Degraded
        } else {
            UptimeLevel::Poor
        }
    }
}

/// Visual entity for one server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerCard {
    pub key: String,
    pub name: String,
    pub host: String,
    pub status: ServerStatus,
    pub last_check: Option<String>,
    pub uptime_percentage: f64,
    pub check_count: u64,
    pub up_count: u64,
    pub down_count: u64,
    /// Full history from the latest snapshot, kept so a window change can
    /// re-filter without a fetch.
    pub history: Vec<HistorySample>,
    /// History filtered by the card's selected window.
    pub chart: ChartSeries,
    /// Key was missing from the most recent snapshot.
    pub stale: bool,
}

impl ServerCard {
    fn from_record(key: &str, record: &ServerRecord, window: TimeWindow, now: DateTime<Utc>) -> Self {
        let chart = ChartSeries::from_samples(&filter_history(&record.history, window.hours(), now));
        Self {
            key: key.to_string(),
            name: record.name.clone(),
            host: record.host.clone(),
            status: record.status,
            last_check: record.last_check.clone(),
            uptime_percentage: record.uptime_percentage,
            check_count: record.check_count,
            up_count: record.up_count,
            down_count: record.down_count,
            history: record.history.clone(),
            chart,
            stale: false,
        }
    }

    /// Name to show, falling back to the key when the producer sent none.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.key
        } else {
            &self.name
        }
    }

    pub fn uptime_level(&self) -> UptimeLevel {
        UptimeLevel::from_percentage(self.uptime_percentage)
    }

    /// Uptime as a gauge ratio, clamped to 0..=1.
    pub fn gauge_ratio(&self) -> f64 {
        if self.uptime_percentage.is_finite() {
            (self.uptime_percentage / 100.0).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Counts and mean uptime across one snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AggregateStats {
    pub total: usize,
    pub up: usize,
    pub down: usize,
    /// Arithmetic mean of `uptime_percentage`; 0 for an empty snapshot.
    pub mean_uptime: f64,
}

impl AggregateStats {
    pub fn from_snapshot(snapshot: &StatusSnapshot) -> Self {
        let total = snapshot.len();
        let up = snapshot.values().filter(|s| s.status == ServerStatus::Up).count();
        let down = snapshot.values().filter(|s| s.status == ServerStatus::Down).count();
        let mean_uptime = if total == 0 {
            0.0
        } else {
            snapshot.values().map(|s| s.uptime_percentage).sum::<f64>() / total as f64
        };

        Self {
            total,
            up,
            down,
            mean_uptime,
        }
    }
}

/// Raised when the number of down servers grows between refreshes.
#[derive(Debug, Clone, PartialEq)]
pub struct DownAlert {
    pub previous: usize,
    pub current: usize,
    pub at: DateTime<Utc>,
}

/// What [`DashboardState::apply`] did with a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied { created: usize, updated: usize },
    /// The delivery was older than one already applied and was ignored.
    Stale { seq: u64, last_applied: u64 },
}

/// Everything the dashboard keeps between polls.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    cards: BTreeMap<String, ServerCard>,
    windows: WindowSelection,
    stats: AggregateStats,
    previous_down: usize,
    pending_alert: Option<DownAlert>,
    last_applied_seq: u64,
    last_refreshed: Option<DateTime<Utc>>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a snapshot into the dashboard.
    ///
    /// Deliveries numbered at or below the last applied one are ignored, so
    /// an old fetch finishing late cannot overwrite newer data.
    pub fn apply(&mut self, seq: u64, snapshot: &StatusSnapshot, now: DateTime<Utc>) -> ApplyOutcome {
        if seq <= self.last_applied_seq {
            debug!(seq, last_applied = self.last_applied_seq, "ignoring stale snapshot");
            return ApplyOutcome::Stale {
                seq,
                last_applied: self.last_applied_seq,
            };
        }

        let mut created = 0;
        let mut updated = 0;
        for (key, record) in snapshot {
            if self.cards.contains_key(key) {
                updated += 1;
            } else {
                created += 1;
            }
            self.update_card(key, record, now);
        }

        for (key, card) in self.cards.iter_mut() {
            card.stale = !snapshot.contains_key(key);
        }

        self.stats = AggregateStats::from_snapshot(snapshot);
        if self.stats.down > self.previous_down {
            info!(
                previous = self.previous_down,
                current = self.stats.down,
                "down server count increased"
            );
            self.pending_alert = Some(DownAlert {
                previous: self.previous_down,
                current: self.stats.down,
                at: now,
            });
        }
        self.previous_down = self.stats.down;

        self.last_applied_seq = seq;
        self.last_refreshed = Some(now);
        debug!(seq, created, updated, "applied snapshot");

        ApplyOutcome::Applied { created, updated }
    }

    /// Create a card for a server seen for the first time.
    ///
    /// The card starts on the default window unless one was already chosen
    /// for this key.
    pub fn create_card(&mut self, key: &str, record: &ServerRecord, now: DateTime<Utc>) {
        let window = self.windows.ensure(key);
        debug!(key, window = %window, "creating card");
        self.cards
            .insert(key.to_string(), ServerCard::from_record(key, record, window, now));
    }

    /// Update a card in place, creating it if it does not exist yet.
    ///
    /// The chart is re-filtered with the window currently selected for the
    /// key, not reset to the default.
    pub fn update_card(&mut self, key: &str, record: &ServerRecord, now: DateTime<Utc>) {
        let window = self.windows.get(key);
        let Some(card) = self.cards.get_mut(key) else {
            self.create_card(key, record, now);
            return;
        };

        card.name = record.name.clone();
        card.host = record.host.clone();
        card.status = record.status;
        card.last_check = record.last_check.clone();
        card.uptime_percentage = record.uptime_percentage;
        card.check_count = record.check_count;
        card.up_count = record.up_count;
        card.down_count = record.down_count;
        card.history = record.history.clone();
        card.chart =
            ChartSeries::from_samples(&filter_history(&card.history, window.hours(), now));
    }

    /// Change one server's window and re-filter only that server's chart.
    ///
    /// Returns `false` if no card exists for `key`.
    pub fn select_window(&mut self, key: &str, window: TimeWindow, now: DateTime<Utc>) -> bool {
        let Some(card) = self.cards.get_mut(key) else {
            return false;
        };
        self.windows.set(key, window);
        card.chart = ChartSeries::from_samples(&filter_history(&card.history, window.hours(), now));
        debug!(key, window = %window, points = card.chart.len(), "window changed");
        true
    }

    /// Re-filter every chart against `now` without changing any window.
    pub fn refilter_all(&mut self, now: DateTime<Utc>) {
        for (key, card) in self.cards.iter_mut() {
            let window = self.windows.get(key);
            card.chart =
                ChartSeries::from_samples(&filter_history(&card.history, window.hours(), now));
        }
    }

    /// Selected window for `key`.
    pub fn window_for(&self, key: &str) -> TimeWindow {
        self.windows.get(key)
    }

    pub fn card(&self, key: &str) -> Option<&ServerCard> {
        self.cards.get(key)
    }

    /// All cards, ordered by key.
    pub fn cards(&self) -> impl Iterator<Item = &ServerCard> {
        self.cards.values()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn stats(&self) -> &AggregateStats {
        &self.stats
    }

    /// Take the pending down alert, if any. Each alert is returned once.
    pub fn take_alert(&mut self) -> Option<DownAlert> {
        self.pending_alert.take()
    }

    pub fn last_applied_seq(&self) -> u64 {
        self.last_applied_seq
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SampleStatus;
    use chrono::TimeDelta;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn history() -> Vec<HistorySample> {
        // One sample every 20 minutes for the last 4 hours, oldest first
        (0..=12)
            .rev()
            .map(|i| HistorySample {
                time: (now() - TimeDelta::minutes(i * 20)).to_rfc3339(),
                status: if i % 4 == 0 { SampleStatus::Down } else { SampleStatus::Up },
            })
            .collect()
    }

    fn record(name: &str, status: ServerStatus, uptime: f64) -> ServerRecord {
        ServerRecord {
            name: name.to_string(),
            host: format!("{}.local", name),
            status,
            last_check: Some("2024-05-01 12:00:00".to_string()),
            uptime_percentage: uptime,
            check_count: 10,
            up_count: 9,
            down_count: 1,
            history: history(),
        }
    }

    fn snapshot(records: &[(&str, ServerStatus, f64)]) -> StatusSnapshot {
        records
            .iter()
            .map(|(key, status, uptime)| (key.to_string(), record(key, *status, *uptime)))
            .collect()
    }

    #[test]
    fn test_first_apply_creates_cards_with_one_hour_window() {
        let mut state = DashboardState::new();
        let snap = snapshot(&[("a", ServerStatus::Up, 100.0), ("b", ServerStatus::Down, 0.0)]);

        let outcome = state.apply(1, &snap, now());
        assert_eq!(outcome, ApplyOutcome::Applied { created: 2, updated: 0 });
        assert_eq!(state.len(), 2);

        let card = state.card("a").unwrap();
        assert_eq!(state.window_for("a"), TimeWindow::OneHour);
        // 60, 40, 20 and 0 minutes ago
        assert_eq!(card.chart.len(), 4);
        assert_eq!(state.last_refreshed(), Some(now()));
    }

    #[test]
    fn test_update_keeps_selected_window() {
        let mut state = DashboardState::new();
        let snap = snapshot(&[("a", ServerStatus::Up, 100.0)]);
        state.apply(1, &snap, now());

        assert!(state.select_window("a", TimeWindow::ThreeHours, now()));
        assert_eq!(state.card("a").unwrap().chart.len(), 10);

        let mut next = snapshot(&[("a", ServerStatus::Down, 90.0)]);
        next.get_mut("a").unwrap().last_check = Some("2024-05-01 12:00:30".to_string());
        let outcome = state.apply(2, &next, now());
        assert_eq!(outcome, ApplyOutcome::Applied { created: 0, updated: 1 });

        let card = state.card("a").unwrap();
        assert_eq!(state.window_for("a"), TimeWindow::ThreeHours);
        assert_eq!(card.chart.len(), 10);
        assert_eq!(card.status, ServerStatus::Down);
        assert_eq!(card.uptime_percentage, 90.0);
        assert_eq!(card.last_check.as_deref(), Some("2024-05-01 12:00:30"));
    }

    #[test]
    fn test_update_falls_back_to_create() {
        let rec = record("a", ServerStatus::Up, 99.0);

        let mut created = DashboardState::new();
        created.create_card("a", &rec, now());

        let mut updated = DashboardState::new();
        updated.update_card("a", &rec, now());

        assert_eq!(created.card("a"), updated.card("a"));
        assert_eq!(updated.window_for("a"), TimeWindow::OneHour);
    }

    #[test]
    fn test_window_change_is_isolated() {
        let mut state = DashboardState::new();
        let snap = snapshot(&[("a", ServerStatus::Up, 100.0), ("b", ServerStatus::Up, 100.0)]);
        state.apply(1, &snap, now());

        let before_b = state.card("b").unwrap().chart.clone();
        assert!(state.select_window("a", TimeWindow::FiveMinutes, now()));

        assert_eq!(state.card("a").unwrap().chart.len(), 1);
        assert_eq!(state.card("b").unwrap().chart, before_b);
        assert_eq!(state.window_for("b"), TimeWindow::OneHour);
    }

    #[test]
    fn test_select_window_unknown_key() {
        let mut state = DashboardState::new();
        assert!(!state.select_window("ghost", TimeWindow::Day, now()));
        assert_eq!(state.window_for("ghost"), TimeWindow::OneHour);
    }

    #[test]
    fn test_stale_sequence_is_ignored() {
        let mut state = DashboardState::new();
        state.apply(5, &snapshot(&[("new", ServerStatus::Up, 100.0)]), now());

        let outcome = state.apply(3, &snapshot(&[("old", ServerStatus::Down, 0.0)]), now());
        assert_eq!(outcome, ApplyOutcome::Stale { seq: 3, last_applied: 5 });
        assert!(state.card("old").is_none());
        assert_eq!(state.stats().down, 0);

        let outcome = state.apply(5, &snapshot(&[("dup", ServerStatus::Up, 100.0)]), now());
        assert!(matches!(outcome, ApplyOutcome::Stale { .. }));
        assert_eq!(state.last_applied_seq(), 5);
    }

    #[test]
    fn test_missing_keys_are_kept_and_flagged() {
        let mut state = DashboardState::new();
        state.apply(1, &snapshot(&[("a", ServerStatus::Up, 100.0), ("b", ServerStatus::Up, 100.0)]), now());
        state.apply(2, &snapshot(&[("a", ServerStatus::Up, 100.0)]), now());

        assert_eq!(state.len(), 2);
        assert!(!state.card("a").unwrap().stale);
        assert!(state.card("b").unwrap().stale);
        assert_eq!(state.stats().total, 1);

        state.apply(3, &snapshot(&[("a", ServerStatus::Up, 100.0), ("b", ServerStatus::Up, 100.0)]), now());
        assert!(!state.card("b").unwrap().stale);
    }

    #[test]
    fn test_aggregate_mean_uptime() {
        let snap = snapshot(&[
            ("a", ServerStatus::Up, 100.0),
            ("b", ServerStatus::Down, 0.0),
            ("c", ServerStatus::Unknown, 50.0),
        ]);
        let stats = AggregateStats::from_snapshot(&snap);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.up, 1);
        assert_eq!(stats.down, 1);
        assert_eq!(stats.mean_uptime, 50.0);
    }

    #[test]
    fn test_aggregate_empty() {
        let stats = AggregateStats::from_snapshot(&StatusSnapshot::new());
        assert_eq!(stats, AggregateStats::default());
    }

    #[test]
    fn test_down_alert_fires_once_per_increase() {
        let mut state = DashboardState::new();

        state.apply(1, &snapshot(&[("a", ServerStatus::Up, 100.0), ("b", ServerStatus::Up, 100.0)]), now());
        assert!(state.take_alert().is_none());

        state.apply(2, &snapshot(&[("a", ServerStatus::Down, 90.0), ("b", ServerStatus::Up, 100.0)]), now());
        let alert = state.take_alert().unwrap();
        assert_eq!((alert.previous, alert.current), (0, 1));
        assert!(state.take_alert().is_none());

        // Same count again: no alert
        state.apply(3, &snapshot(&[("a", ServerStatus::Down, 80.0), ("b", ServerStatus::Up, 100.0)]), now());
        assert!(state.take_alert().is_none());

        // Recovery lowers the stored count; the next failure alerts again
        state.apply(4, &snapshot(&[("a", ServerStatus::Up, 85.0), ("b", ServerStatus::Up, 100.0)]), now());
        assert!(state.take_alert().is_none());

        state.apply(5, &snapshot(&[("a", ServerStatus::Up, 85.0), ("b", ServerStatus::Down, 95.0)]), now());
        assert_eq!(state.take_alert().unwrap().current, 1);
    }

    #[test]
    fn test_refilter_all_moves_cutoff() {
        let mut state = DashboardState::new();
        state.apply(1, &snapshot(&[("a", ServerStatus::Up, 100.0)]), now());
        assert_eq!(state.card("a").unwrap().chart.len(), 4);

        state.refilter_all(now() + TimeDelta::minutes(30));
        assert_eq!(state.card("a").unwrap().chart.len(), 2);
    }

    #[test]
    fn test_uptime_levels() {
        assert_eq!(UptimeLevel::from_percentage(100.0), UptimeLevel::Good);
        assert_eq!(UptimeLevel::from_percentage(95.0), UptimeLevel::Good);
        assert_eq!(UptimeLevel::from_percentage(80.0), UptimeLevel::Degraded);
        assert_eq!(UptimeLevel::from_percentage(79.9), UptimeLevel::Poor);
    }

    #[test]
    fn test_gauge_ratio_is_clamped() {
        let mut card = ServerCard::from_record("a", &record("a", ServerStatus::Up, 150.0), TimeWindow::OneHour, now());
        assert_eq!(card.gauge_ratio(), 1.0);
        card.uptime_percentage = f64::NAN;
        assert_eq!(card.gauge_ratio(), 0.0);
        card.name.clear();
        assert_eq!(card.display_name(), "a");
    }
}
