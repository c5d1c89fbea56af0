//! Chart series built from filtered history.

use chrono::Local;

use super::history::TimedSample;
use crate::source::SampleStatus;

/// Color class of a single chart point. The theme maps these to colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointColor {
    Up,
    Down,
}

impl From<SampleStatus> for PointColor {
    fn from(status: SampleStatus) -> Self {
        match status {
            SampleStatus::Up => PointColor::Up,
            SampleStatus::Down => PointColor::Down,
        }
    }
}

/// Data handed to the chart renderer: one label, value and color per point.
///
/// Points are plotted in order at evenly spaced x positions, so the three
/// vectors always have the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSeries {
    /// Local wall-clock time of each point (`HH:MM:SS`).
    pub labels: Vec<String>,
    /// 1 for up, 0 for down.
    pub values: Vec<u8>,
    pub point_colors: Vec<PointColor>,
}

impl ChartSeries {
    pub fn from_samples(samples: &[TimedSample]) -> Self {
        let mut series = Self {
            labels: Vec::with_capacity(samples.len()),
            values: Vec::with_capacity(samples.len()),
            point_colors: Vec::with_capacity(samples.len()),
        };
        for sample in samples {
            series
                .labels
                .push(sample.time.with_timezone(&Local).format("%H:%M:%S").to_string());
            series.values.push(sample.status.value());
            series.point_colors.push(sample.status.into());
        }
        series
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(x, y)` coordinates of the points with the given color.
    pub fn points_with_color(&self, color: PointColor) -> Vec<(f64, f64)> {
        self.values
            .iter()
            .zip(&self.point_colors)
            .enumerate()
            .filter(|(_, (_, c))| **c == color)
            .map(|(i, (v, _))| (i as f64, f64::from(*v)))
            .collect()
    }
}
