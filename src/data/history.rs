//! Time-windowed filtering of server history.
//!
//! The producer sends each server's full history (up to two days of checks).
//! A chart only shows the trailing window the user picked, so every redraw
//! narrows the history with [`filter_history`].

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, TimeZone, Utc};
use thiserror::Error;
use tracing::debug;

use crate::source::{HistorySample, SampleStatus};

/// Naive formats the producer is known to emit. They carry no offset and
/// are read as local time.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// A sample timestamp that could not be turned into an instant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unparseable timestamp: {0:?}")]
pub struct TimeParseError(pub String);

/// A history sample with its time parsed into a comparable instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedSample {
    pub time: DateTime<Utc>,
    pub status: SampleStatus,
}

/// Result of filtering, including how many samples had to be dropped
/// because their timestamp did not parse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterReport {
    pub samples: Vec<TimedSample>,
    pub unparseable: usize,
}

/// Parse a sample timestamp.
///
/// Accepts RFC 3339 with an offset, or a naive ISO-8601 date-time (with `T`
/// or a space, optional fractional seconds) which is interpreted in the
/// local time zone. Naive times that do not exist locally (a DST gap) are
/// errors; ambiguous ones resolve to the earlier instant.
pub fn parse_sample_time(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let trimmed = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| TimeParseError(s.to_string()))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| TimeParseError(s.to_string()))
}

/// Window length in hours as a signed duration, to the microsecond.
fn window_delta(window_hours: f64) -> Option<TimeDelta> {
    if !window_hours.is_finite() || window_hours <= 0.0 {
        return None;
    }
    let micros = (window_hours * 3_600_000_000.0).round();
    if micros > i64::MAX as f64 {
        return None;
    }
    Some(TimeDelta::microseconds(micros as i64))
}

/// Keep only samples at or after `now - window_hours`, reporting drops.
///
/// Order is preserved; nothing is re-sorted. A non-positive or non-finite
/// window yields no samples.
pub fn filter_history_with_report(
    history: &[HistorySample],
    window_hours: f64,
    now: DateTime<Utc>,
) -> FilterReport {
    let Some(window) = window_delta(window_hours) else {
        return FilterReport::default();
    };
    let Some(cutoff) = now.checked_sub_signed(window) else {
        return FilterReport::default();
    };

    let mut report = FilterReport::default();
    for sample in history {
        match parse_sample_time(&sample.time) {
            Ok(time) if time >= cutoff => report.samples.push(TimedSample {
                time,
                status: sample.status,
            }),
            Ok(_) => {}
            Err(_) => report.unparseable += 1,
        }
    }
    report
}

/// Keep only samples at or after `now - window_hours`.
///
/// Samples whose timestamp does not parse are dropped; the count is logged.
pub fn filter_history(
    history: &[HistorySample],
    window_hours: f64,
    now: DateTime<Utc>,
) -> Vec<TimedSample> {
    let report = filter_history_with_report(history, window_hours, now);
    if report.unparseable > 0 {
        debug!(
            dropped = report.unparseable,
            "dropped history samples with unparseable timestamps"
        );
    }
    report.samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TimeWindow;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn sample(time: DateTime<Utc>, status: SampleStatus) -> HistorySample {
        HistorySample {
            time: time.to_rfc3339(),
            status,
        }
    }

    fn minutes_ago(m: i64, status: SampleStatus) -> HistorySample {
        sample(now() - TimeDelta::minutes(m), status)
    }

    #[test]
    fn test_empty_history() {
        for window in TimeWindow::ALL {
            assert!(filter_history(&[], window.hours(), now()).is_empty());
        }
    }

    #[test]
    fn test_one_hour_window_drops_older_samples() {
        let history = vec![
            minutes_ago(10, SampleStatus::Up),
            minutes_ago(120, SampleStatus::Down),
        ];

        let filtered = filter_history(&history, 1.0, now());
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].status, SampleStatus::Up);
        assert_eq!(filtered[0].time, now() - TimeDelta::minutes(10));
    }

    #[test]
    fn test_five_minute_window() {
        let history = vec![
            minutes_ago(4, SampleStatus::Up),
            minutes_ago(6, SampleStatus::Down),
        ];

        let filtered = filter_history(&history, 5.0 / 60.0, now());
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].time, now() - TimeDelta::minutes(4));
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        let history = vec![minutes_ago(60, SampleStatus::Up)];
        assert_eq!(filter_history(&history, 1.0, now()).len(), 1);

        let just_outside = vec![sample(
            now() - TimeDelta::minutes(60) - TimeDelta::milliseconds(1),
            SampleStatus::Up,
        )];
        assert!(filter_history(&just_outside, 1.0, now()).is_empty());
    }

    #[test]
    fn test_order_is_preserved() {
        // Deliberately out of chronological order
        let history = vec![
            minutes_ago(5, SampleStatus::Up),
            minutes_ago(30, SampleStatus::Down),
            minutes_ago(1, SampleStatus::Up),
            minutes_ago(90, SampleStatus::Down),
            minutes_ago(20, SampleStatus::Down),
        ];

        let filtered = filter_history(&history, 1.0, now());
        let ages: Vec<i64> = filtered.iter().map(|s| (now() - s.time).num_minutes()).collect();
        assert_eq!(ages, vec![5, 30, 1, 20]);
    }

    #[test]
    fn test_membership_matches_cutoff() {
        let history: Vec<HistorySample> = (0..300)
            .map(|i| {
                let status = if i % 3 == 0 { SampleStatus::Down } else { SampleStatus::Up };
                minutes_ago(i * 7, status)
            })
            .collect();

        for window in TimeWindow::ALL {
            let cutoff = now() - window_delta(window.hours()).unwrap();
            let filtered = filter_history(&history, window.hours(), now());
            let expected: Vec<DateTime<Utc>> = history
                .iter()
                .map(|s| parse_sample_time(&s.time).unwrap())
                .filter(|t| *t >= cutoff)
                .collect();
            let got: Vec<DateTime<Utc>> = filtered.iter().map(|s| s.time).collect();
            assert_eq!(got, expected, "window {}", window);
        }
    }

    #[test]
    fn test_larger_window_is_superset() {
        let history: Vec<HistorySample> =
            (0..200).map(|i| minutes_ago(i * 11, SampleStatus::Up)).collect();

        for (i, small) in TimeWindow::ALL.iter().enumerate() {
            let narrow = filter_history(&history, small.hours(), now());
            for large in &TimeWindow::ALL[i..] {
                let wide = filter_history(&history, large.hours(), now());
                assert!(wide.len() >= narrow.len());
                assert!(narrow.iter().all(|s| wide.contains(s)), "{} vs {}", small, large);
            }
        }
    }

    #[test]
    fn test_unparseable_samples_are_dropped_and_counted() {
        let history = vec![
            minutes_ago(1, SampleStatus::Up),
            HistorySample {
                time: "yesterday-ish".to_string(),
                status: SampleStatus::Down,
            },
            HistorySample {
                time: String::new(),
                status: SampleStatus::Down,
            },
        ];

        let report = filter_history_with_report(&history, 1.0, now());
        assert_eq!(report.samples.len(), 1);
        assert_eq!(report.unparseable, 2);
        assert_eq!(filter_history(&history, 1.0, now()).len(), 1);
    }

    #[test]
    fn test_future_samples_are_kept() {
        let history = vec![sample(now() + TimeDelta::seconds(30), SampleStatus::Up)];
        assert_eq!(filter_history(&history, 1.0 / 12.0, now()).len(), 1);
    }

    #[test]
    fn test_invalid_window_yields_nothing() {
        let history = vec![minutes_ago(1, SampleStatus::Up)];
        assert!(filter_history(&history, 0.0, now()).is_empty());
        assert!(filter_history(&history, -1.0, now()).is_empty());
        assert!(filter_history(&history, f64::NAN, now()).is_empty());
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let t = parse_sample_time("2024-05-01T14:00:00+02:00").unwrap();
        assert_eq!(t, now());
    }

    #[test]
    fn test_parse_naive_local_time() {
        let sample_at = now() - TimeDelta::minutes(10);
        let text = sample_at
            .with_timezone(&Local)
            .naive_local()
            .format("%Y-%m-%dT%H:%M:%S%.6f")
            .to_string();
        assert_eq!(parse_sample_time(&text).unwrap(), sample_at);

        let history = vec![HistorySample {
            time: text,
            status: SampleStatus::Up,
        }];
        let filtered = filter_history(&history, 1.0, now());
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_parse_naive_variants() {
        assert!(parse_sample_time("2024-05-01T12:00:00").is_ok());
        assert!(parse_sample_time("2024-05-01T12:00:00.123456").is_ok());
        assert!(parse_sample_time("2024-05-01 12:00:00").is_ok());
        assert_eq!(
            parse_sample_time("12:00").unwrap_err(),
            TimeParseError("12:00".to_string())
        );
    }
}
