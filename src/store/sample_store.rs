use crate::store::error::StoreError;
use crate::types::reading::Reading;
use crate::types::series::{Period, Series};
use chrono::{Duration, NaiveDateTime};
use log::{info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::{fs, task};

const SEGMENT_HEADER: [&str; 8] = [
    "Date",
    "Time",
    "Pressure (hPa)",
    "Temperature (C)",
    "Humidity (%)",
    "Wind (km/h)",
    "Forecast",
    "Timestamp",
];
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Durable store for the working series, one CSV segment per calendar month.
///
/// Segments are small (5 days of 5-minute samples is under 1500 rows), so
/// every persist rewrites the whole file rather than appending.
pub struct SampleStore {
    data_dir: PathBuf,
}

impl SampleStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
        }
    }

    pub fn segment_path(&self, period: Period) -> PathBuf {
        self.data_dir.join(format!("meteo_{period}.csv"))
    }

    /// Loads the segment for `period`, applying retention pruning as part of
    /// the load.
    ///
    /// A missing segment yields an empty series. A record that cannot be
    /// parsed is reported and skipped; it never aborts the load.
    pub async fn load(
        &self,
        period: Period,
        now: NaiveDateTime,
        retention: Duration,
    ) -> Result<Series, StoreError> {
        let path = self.segment_path(period);
        let raw = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No segment at {:?} yet, starting empty", path);
                return Ok(Series::new());
            }
            Err(e) => return Err(StoreError::SegmentRead(path, e)),
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(raw.as_slice());
        let mut series = Series::new();
        for (index, record) in reader.byte_records().enumerate() {
            // Line 1 is the header row.
            let line = index as u64 + 2;
            // A record-level error is one bad row, never a reason to abort
            // the load.
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping unreadable record at line {} of {:?}: {}", line, path, e);
                    continue;
                }
            };
            let record = csv::StringRecord::from_byte_record_lossy(record);
            match parse_record(&record, &path, line) {
                Ok(reading) => series.push(reading),
                Err(e) => warn!("Skipping record: {}", e),
            }
        }

        let loaded = series.len();
        series.prune(now, retention);
        if series.len() < loaded {
            info!(
                "Dropped {} readings past the retention window from {:?}",
                loaded - series.len(),
                path
            );
        }
        Ok(series)
    }

    /// Atomically rewrites the full segment for `period`.
    pub async fn persist(&self, series: &Series, period: Period) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| StoreError::DataDirCreation(self.data_dir.clone(), e))?;

        let path = self.segment_path(period);
        let bytes = encode_segment(series).map_err(|e| StoreError::SegmentEncode(path.clone(), e))?;

        let dir = self.data_dir.clone();
        let target = path.clone();
        task::spawn_blocking(move || {
            let mut tmp = NamedTempFile::new_in(&dir)
                .map_err(|e| StoreError::SegmentWrite(target.clone(), e))?;
            tmp.write_all(&bytes)
                .map_err(|e| StoreError::SegmentWrite(target.clone(), e))?;
            tmp.flush()
                .map_err(|e| StoreError::SegmentWrite(target.clone(), e))?;
            tmp.persist(&target)
                .map_err(|e| StoreError::SegmentWrite(target, e.error))?;
            Ok::<(), StoreError>(())
        })
        .await??;

        info!("Persisted {} readings to {:?}", series.len(), path);
        Ok(())
    }
}

fn encode_segment(series: &Series) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(SEGMENT_HEADER)?;
    for r in series.readings() {
        writer.write_record(&[
            r.timestamp.format("%Y-%m-%d").to_string(),
            r.timestamp.format("%H:%M:%S").to_string(),
            r.pressure_hpa.to_string(),
            r.temperature_c.to_string(),
            r.humidity_pct.to_string(),
            r.wind_kph.to_string(),
            r.forecast.clone(),
            r.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

fn parse_record(record: &csv::StringRecord, path: &Path, line: u64) -> Result<Reading, StoreError> {
    let malformed = |reason: String| StoreError::MalformedRecord {
        path: path.to_path_buf(),
        line,
        reason,
    };

    if record.len() != SEGMENT_HEADER.len() {
        return Err(malformed(format!(
            "expected {} fields, found {}",
            SEGMENT_HEADER.len(),
            record.len()
        )));
    }

    // The Timestamp column is authoritative; Date and Time are display
    // redundancy carried over from the original file format.
    let timestamp = NaiveDateTime::parse_from_str(&record[7], TIMESTAMP_FORMAT)
        .map_err(|e| malformed(format!("bad timestamp '{}': {}", &record[7], e)))?;

    Ok(Reading {
        timestamp,
        pressure_hpa: parse_locale_float(&record[2])
            .map_err(|e| malformed(format!("bad pressure: {e}")))?,
        temperature_c: parse_locale_float(&record[3])
            .map_err(|e| malformed(format!("bad temperature: {e}")))?,
        humidity_pct: parse_locale_float(&record[4])
            .map_err(|e| malformed(format!("bad humidity: {e}")))?,
        wind_kph: parse_locale_float(&record[5])
            .map_err(|e| malformed(format!("bad wind speed: {e}")))?,
        forecast: record[6].to_string(),
    })
}

/// Locale-tolerant numeric normalization: segments written by earlier
/// deployments may carry `,` as the decimal separator. Output is always a
/// strict, finite `f64`; we never write anything but `.` back out.
fn parse_locale_float(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .replace(',', ".")
        .parse()
        .map_err(|e: std::num::ParseFloatError| format!("'{raw}': {e}"))?;
    if !value.is_finite() {
        return Err(format!("non-finite value '{raw}'"));
    }
    Ok(value)
}
