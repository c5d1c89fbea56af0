//! Data source abstraction for receiving status snapshots.
//!
//! A [`DataSource`] hands the dashboard the newest [`StatusSnapshot`] it has,
//! tagged with a monotonic sequence number. Sources differ in how snapshots
//! arrive: HTTP polling of `/api/status`, a JSON file on disk, or an
//! in-process channel.

mod channel;
mod error;
mod file;
mod http;
mod sequence;
mod snapshot;

pub use channel::ChannelSource;
pub use error::FetchError;
pub use file::FileSource;
pub use http::{fetch_logs, fetch_status, HttpSource, HttpSourceBuilder};
pub use sequence::SequenceCounter;
pub use snapshot::{
    HistorySample, SampleStatus, ServerLogs, ServerRecord, ServerStatus, StatusSnapshot,
};

use std::fmt::Debug;

/// A snapshot together with the sequence number of the request that
/// produced it.
///
/// Sequence numbers are assigned when a fetch is *requested*, so a slow
/// early request that completes late carries a smaller number than a fast
/// later one.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub seq: u64,
    pub snapshot: StatusSnapshot,
}

/// Trait for receiving status snapshots from various sources.
///
/// # Example
///
/// ```
/// use uptime_board::{DataSource, FileSource};
///
/// let mut source = FileSource::new("status.json");
/// if let Some(delivery) = source.poll() {
///     println!("Got {} servers", delivery.snapshot.len());
/// }
/// ```
pub trait DataSource: Send + Debug {
    /// Poll for the latest delivery.
    ///
    /// Returns the newest delivery received since the previous call, or
    /// `None` if nothing new arrived. Must not block.
    fn poll(&mut self) -> Option<Delivery>;

    /// Ask the source to fetch a fresh snapshot.
    ///
    /// Push-based sources ignore this.
    fn request_refresh(&mut self) {}

    /// Ask the source for the log lines of one server.
    ///
    /// Returns `false` when the source has no log endpoint.
    fn request_logs(&mut self, _key: &str) -> bool {
        false
    }

    /// Drain completed log requests, oldest first.
    fn poll_logs(&mut self) -> Vec<(String, Result<ServerLogs, FetchError>)> {
        Vec::new()
    }

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;

    /// Returns the error from the most recent fetch, if it failed.
    fn error(&self) -> Option<&str>;
}
