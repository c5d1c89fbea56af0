//! # uptime-board
//!
//! A terminal dashboard and library for watching server uptime.
//!
//! The dashboard polls a backend's `/api/status` endpoint, keeps one card per
//! server, and draws each server's recent history over a time window chosen
//! per card. Aggregate counts sit in the header, and it flashes an alert when
//! more servers are down than at the previous refresh.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌─────────┐ │
//! │  │  app    │───▶│   data   │───▶│   ui    │───▶│ Terminal│ │
//! │  │ (state) │    │(reconcile)    │(rendering)   │         │ │
//! │  └────┬────┘    └──────────┘    └─────────┘    └─────────┘ │
//! │       │  ▲                                                  │
//! │       │  └── events ──▶ Action ──▶ App::dispatch            │
//! │       ▼                                                     │
//! │  ┌─────────┐                                                │
//! │  │ source  │◀── HttpSource | FileSource | ChannelSource    │
//! │  │ (input) │                                                │
//! │  └─────────┘                                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: Application state and the single action dispatcher
//! - **[`action`]**: Every user intent as an [`Action`] value
//! - **[`events`]**: Key and mouse translation into actions
//! - **[`source`]**: Data source abstraction ([`DataSource`] trait) with implementations
//!   for HTTP polling, file polling, and channel-based input
//! - **[`data`]**: Card reconciliation, history windows, aggregates and alerts
//! - **[`ui`]**: Terminal rendering using ratatui
//! - **[`config`]**: Layered settings (defaults, TOML file, environment)
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch a backend
//! uptime-board --endpoint http://localhost:9898
//!
//! # Replay a saved /api/status response
//! uptime-board --file status.json
//! ```
//!
//! ### As a library with channel source
//!
//! ```
//! use uptime_board::{App, ChannelSource, ServerRecord, StatusSnapshot};
//!
//! let (tx, source) = ChannelSource::create("in-process");
//! let mut app = App::new(Box::new(source));
//!
//! let mut snapshot = StatusSnapshot::new();
//! snapshot.insert("10.0.0.1".to_string(), ServerRecord::new("web-1", "10.0.0.1"));
//! tx.send(snapshot).unwrap();
//!
//! assert!(app.reload_data());
//! assert_eq!(app.dashboard.len(), 1);
//! ```
//!
//! ### Polling an HTTP backend
//!
//! ```no_run
//! use uptime_board::{App, HttpSource};
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let source = HttpSource::builder()
//!     .endpoint("http://localhost:9898")
//!     .runtime(runtime.handle().clone())
//!     .build()
//!     .unwrap();
//! let mut app = App::new(Box::new(source));
//! app.request_refresh();
//! ```

pub mod action;
pub mod app;
pub mod config;
pub mod data;
pub mod events;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use action::{Action, Direction};
pub use app::App;
pub use config::{Settings, Timing};
pub use data::{
    AggregateStats, ApplyOutcome, Clock, DashboardState, DownAlert, ManualClock, ServerCard,
    SystemClock, TimeWindow,
};
pub use source::{
    ChannelSource, DataSource, Delivery, FetchError, FileSource, HttpSource, ServerLogs,
    ServerRecord, ServerStatus, StatusSnapshot,
};
