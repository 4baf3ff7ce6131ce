//! Pressure-trend classification over a trailing window of the series.

use crate::types::reading::Reading;
use chrono::{Duration, NaiveDateTime};
use std::fmt;

/// Pressure delta (hPa) at or above which the outlook counts as improving,
/// mirrored negatively for deteriorating. Ties classify; the comparison is
/// inclusive, not strict.
const TREND_THRESHOLD_HPA: f64 = 1.0;

/// Trailing horizons evaluated for every report, in display order.
pub const TREND_HORIZONS_HOURS: [i64; 3] = [3, 6, 12];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Improving,
    Deteriorating,
    Stable,
    /// Fewer than two readings fell inside the window.
    InsufficientData,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Trend::Improving => "improving",
            Trend::Deteriorating => "deteriorating",
            Trend::Stable => "stable",
            Trend::InsufficientData => "insufficient data",
        };
        f.write_str(label)
    }
}

/// Classifies the pressure trend over the trailing `window_hours`.
///
/// The delta is taken between the earliest and the most recent reading whose
/// timestamp falls at or after `now - window_hours`.
pub fn classify(readings: &[Reading], now: NaiveDateTime, window_hours: i64) -> Trend {
    let cutoff = now - Duration::hours(window_hours);
    let mut window = readings.iter().filter(|r| r.timestamp >= cutoff);

    let first = match window.next() {
        Some(reading) => reading,
        None => return Trend::InsufficientData,
    };
    let last = match window.last() {
        Some(reading) => reading,
        None => return Trend::InsufficientData,
    };

    let delta = last.pressure_hpa - first.pressure_hpa;
    if delta >= TREND_THRESHOLD_HPA {
        Trend::Improving
    } else if delta <= -TREND_THRESHOLD_HPA {
        Trend::Deteriorating
    } else {
        Trend::Stable
    }
}

/// Trend classification for every fixed horizon, in 3h/6h/12h order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendReport {
    horizons: [(i64, Trend); 3],
}

impl TrendReport {
    pub fn compute(readings: &[Reading], now: NaiveDateTime) -> Self {
        Self {
            horizons: TREND_HORIZONS_HOURS.map(|hours| (hours, classify(readings, now, hours))),
        }
    }

    pub fn horizons(&self) -> impl Iterator<Item = (i64, Trend)> + '_ {
        self.horizons.iter().copied()
    }

    pub fn trend_for(&self, hours: i64) -> Option<Trend> {
        self.horizons
            .iter()
            .find(|(h, _)| *h == hours)
            .map(|(_, trend)| *trend)
    }
}

impl fmt::Display for TrendReport {
    /// `3h: improving | 6h: stable | 12h: insufficient data`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (hours, trend)) in self.horizons.iter().enumerate() {
            if index > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{hours}h: {trend}")?;
        }
        Ok(())
    }
}
