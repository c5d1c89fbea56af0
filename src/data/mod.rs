//! Data models and processing for status snapshots.
//!
//! This module turns raw snapshots into the state the dashboard renders.
//!
//! ## Submodules
//!
//! - [`clock`]: Injectable wall clock ([`Clock`], [`SystemClock`], [`ManualClock`])
//! - [`dashboard`]: Card reconciliation, aggregates and down alerts ([`DashboardState`])
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "5s", "10m")
//! - [`history`]: Time-windowed history filtering ([`filter_history`])
//! - [`series`]: Chart series built from filtered history ([`ChartSeries`])
//! - [`window`]: Selectable time windows and per-server selection ([`TimeWindow`])
//!
//! ## Data Flow
//!
//! ```text
//! StatusSnapshot (raw JSON)
//!        │
//!        ▼
//! DashboardState::apply()
//!        │
//!        ├──▶ ServerCard (status, uptime, stored history)
//!        │
//!        └──▶ filter_history(window) ──▶ ChartSeries
//! ```

pub mod clock;
pub mod dashboard;
pub mod duration;
pub mod history;
pub mod series;
pub mod window;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dashboard::{
    AggregateStats, ApplyOutcome, DashboardState, DownAlert, ServerCard, UptimeLevel,
};
pub use history::{filter_history, filter_history_with_report, parse_sample_time, TimedSample};
pub use series::{ChartSeries, PointColor};
pub use window::{TimeWindow, WindowSelection};
