use crate::types::reading::Reading;
use chrono::{Datelike, Duration, NaiveDateTime};
use std::fmt;

/// Calendar month that keys an on-disk segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// The period that `at` falls in.
    pub fn containing(at: NaiveDateTime) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Append-ordered working set of readings for the current period.
///
/// Timestamps are non-decreasing; the single writer (the collector) is
/// responsible for appending in order. Everything else gets read-only access.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    readings: Vec<Reading>,
}

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_readings(readings: Vec<Reading>) -> Self {
        Self { readings }
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn latest(&self) -> Option<&Reading> {
        self.readings.last()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Appends a reading. The caller keeps timestamps non-decreasing; the
    /// series does not re-check the ordering invariant.
    pub fn push(&mut self, reading: Reading) {
        self.readings.push(reading);
    }

    /// Drops every reading older than `retention` relative to `now`.
    pub fn prune(&mut self, now: NaiveDateTime, retention: Duration) {
        self.readings.retain(|r| now - r.timestamp <= retention);
    }

    /// Rewrites the forecast label of the most recent reading. Labels of
    /// earlier readings are never touched once written.
    pub fn annotate_latest(&mut self, forecast: String) {
        if let Some(last) = self.readings.last_mut() {
            last.forecast = forecast;
        }
    }
}
