//! Runtime settings.
//!
//! Settings come from three layers, later ones winning: built-in defaults,
//! an optional TOML file, and `UPTIME_BOARD_*` environment variables. The
//! binary applies command-line overrides on top.
//!
//! ```toml
//! endpoint = "http://monitor.internal:9898"
//! poll_interval = "5s"
//! clock_interval = "1s"
//! request_timeout = "5s"
//! log_file = "/var/log/uptime-board.log"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::data::duration::parse_duration;

/// Settings as written in the config file.
///
/// Durations stay as text here; [`Settings::timing`] validates them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the dashboard backend.
    pub endpoint: String,
    pub poll_interval: String,
    pub clock_interval: String,
    pub request_timeout: String,
    pub log_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9898".to_string(),
            poll_interval: "5s".to_string(),
            clock_interval: "1s".to_string(),
            request_timeout: "5s".to_string(),
            log_file: PathBuf::from("/tmp/uptime-board.log"),
        }
    }
}

/// Validated timer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub poll_interval: Duration,
    pub clock_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(5_000),
            clock_interval: Duration::from_millis(1_000),
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl Settings {
    /// Load settings from an optional file plus the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(Environment::with_prefix("UPTIME_BOARD"))
            .build()
            .context("Failed to load configuration")?;

        config.try_deserialize().context("Invalid configuration")
    }

    /// Parse and validate the timer settings.
    pub fn timing(&self) -> Result<Timing> {
        let parse = |name: &str, value: &str| -> Result<Duration> {
            let d = parse_duration(value).with_context(|| format!("Invalid {}", name))?;
            if d.is_zero() {
                bail!("{} must be greater than zero", name);
            }
            Ok(d)
        };

        Ok(Timing {
            poll_interval: parse("poll_interval", &self.poll_interval)?,
            clock_interval: parse("clock_interval", &self.clock_interval)?,
            request_timeout: parse("request_timeout", &self.request_timeout)?,
        })
    }
}
