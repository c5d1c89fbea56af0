//! Wire types for status snapshots.
//!
//! These types match the JSON document served at `/api/status`: a map from
//! server key (usually the host address) to that server's record. Fields the
//! producer may omit are defaulted so a partial record still decodes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A complete snapshot of every monitored server.
///
/// Keyed by server key. A `BTreeMap` keeps card order stable between polls.
pub type StatusSnapshot = BTreeMap<String, ServerRecord>;

/// Current reachability of a server as reported by the producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Up,
    Down,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ServerStatus {
    /// Short badge label.
    pub fn label(&self) -> &'static str {
        match self {
            ServerStatus::Up => "UP",
            ServerStatus::Down => "DOWN",
            ServerStatus::Unknown => "UNKNOWN",
        }
    }
}

/// Outcome of a single historical check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleStatus {
    Up,
    Down,
}

impl SampleStatus {
    /// Chart value for this outcome: 1 for up, 0 for down.
    pub fn value(&self) -> u8 {
        match self {
            SampleStatus::Up => 1,
            SampleStatus::Down => 0,
        }
    }
}

/// One historical check as received.
///
/// `time` is kept as text; it is only parsed when the history is filtered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySample {
    pub time: String,
    pub status: SampleStatus,
}

/// State for a single server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerRecord {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub status: ServerStatus,

    /// Wall-clock text of the last check (e.g. "2024-05-01 12:00:00").
    /// Null until the first check has completed.
    #[serde(default)]
    pub last_check: Option<String>,

    /// Percentage of successful checks, 0 to 100.
    #[serde(default)]
    pub uptime_percentage: f64,

    #[serde(default)]
    pub check_count: u64,

    #[serde(default)]
    pub up_count: u64,

    #[serde(default)]
    pub down_count: u64,

    /// Historical samples, chronological as sent but not guaranteed sorted.
    #[serde(default)]
    pub history: Vec<HistorySample>,
}

impl ServerRecord {
    /// Create a record with no history and no checks yet.
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            status: ServerStatus::Unknown,
            last_check: None,
            uptime_percentage: 0.0,
            check_count: 0,
            up_count: 0,
            down_count: 0,
            history: Vec::new(),
        }
    }
}

/// Response body of `/api/logs/{key}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerLogs {
    #[serde(default)]
    pub logs: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,

    /// Set by the producer when its log file could not be read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_snapshot() {
        let json = r#"{
            "10.0.0.1": {
                "name": "web-1",
                "host": "10.0.0.1",
                "status": "up",
                "last_check": "2024-05-01 12:00:00",
                "check_count": 4,
                "up_count": 3,
                "down_count": 1,
                "uptime_percentage": 75.0,
                "history": [
                    { "time": "2024-05-01T11:59:30.123456", "status": "up" },
                    { "time": "2024-05-01T12:00:00", "status": "down" }
                ]
            }
        }"#;

        let snapshot: StatusSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.len(), 1);

        let server = snapshot.get("10.0.0.1").unwrap();
        assert_eq!(server.name, "web-1");
        assert_eq!(server.status, ServerStatus::Up);
        assert_eq!(server.last_check.as_deref(), Some("2024-05-01 12:00:00"));
        assert_eq!(server.uptime_percentage, 75.0);
        assert_eq!(server.down_count, 1);
        assert_eq!(server.history.len(), 2);
        assert_eq!(server.history[1].status, SampleStatus::Down);
    }

    #[test]
    fn test_missing_fields_default() {
        let json = r#"{ "db": { "name": "db", "host": "db.local", "status": "unknown", "last_check": null } }"#;

        let snapshot: StatusSnapshot = serde_json::from_str(json).unwrap();
        let server = snapshot.get("db").unwrap();
        assert!(server.history.is_empty());
        assert!(server.last_check.is_none());
        assert_eq!(server.uptime_percentage, 0.0);
        assert_eq!(server.status, ServerStatus::Unknown);
    }

    #[test]
    fn test_unrecognized_status_is_unknown() {
        let json = r#"{ "name": "x", "host": "x", "status": "degraded" }"#;
        let record: ServerRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.status, ServerStatus::Unknown);
    }

    #[test]
    fn test_deserialize_logs() {
        let json = r#"{ "logs": ["[2024-05-01 12:00:00] | Server: a | Status: DOWN"], "server_name": "a" }"#;
        let logs: ServerLogs = serde_json::from_str(json).unwrap();
        assert_eq!(logs.logs.len(), 1);
        assert_eq!(logs.server_name.as_deref(), Some("a"));
        assert!(logs.error.is_none());
    }
}
