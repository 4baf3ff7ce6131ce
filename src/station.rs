//! The main entry point: a single-location station that samples current
//! conditions on a fixed cadence and keeps a retention-bounded series on
//! disk. Wraps the scheduler, the collector and the HTTP boundary the way a
//! display layer wants to consume them.

use crate::collector::Collector;
use crate::error::StationError;
use crate::scheduler::{RefreshScheduler, SchedulerPhase};
use crate::source::open_meteo::OpenMeteoSource;
use crate::source::WeatherSource;
use crate::store::sample_store::SampleStore;
use crate::trend::TrendReport;
use crate::types::reading::{LatLon, Reading};
use crate::utils::{ensure_data_dir_exists, get_data_dir};
use bon::bon;
use chrono::{Local, NaiveDateTime};
use log::warn;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Saint-Cyprien-de-Napierville, the station's home coordinate.
pub const DEFAULT_LOCATION: LatLon = LatLon(45.25, -73.50);

/// Automatic refresh cadence.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// Readings older than this are pruned from the working series.
pub const DEFAULT_RETENTION_DAYS: i64 = 5;

/// What a scheduling tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing was due.
    Idle,
    /// A cycle ran and a new reading was appended.
    Collected,
    /// A cycle was due but the source was unavailable; the next interval
    /// retries.
    Skipped,
}

/// A weather station polling one fixed coordinate.
///
/// Drive it with [`tick`](WeatherStation::tick) from your own loop, or hand
/// the whole thing to [`run`](WeatherStation::run). All mutation goes through
/// `&mut self`; there is exactly one collection cycle in flight at a time.
///
/// # Examples
///
/// ```no_run
/// # use barostation::{WeatherStation, StationError};
/// # async fn demo() -> Result<(), StationError> {
/// let mut station = WeatherStation::builder().build().await?;
/// station.request_refresh();
/// station.tick().await?;
/// if let Some(reading) = station.latest() {
///     println!("{} hPa, {}", reading.pressure_hpa, reading.forecast);
/// }
/// # Ok(())
/// # }
/// ```
pub struct WeatherStation<S = OpenMeteoSource> {
    scheduler: RefreshScheduler,
    collector: Collector<S>,
}

#[bon]
impl WeatherStation {
    /// Builds a station against the Open-Meteo endpoint.
    ///
    /// All arguments are optional: the data folder defaults to the platform
    /// data dir, the location to [`DEFAULT_LOCATION`], the interval to five
    /// minutes and the retention to five days.
    #[builder]
    pub async fn new(
        data_folder: Option<PathBuf>,
        location: Option<LatLon>,
        refresh_interval: Option<Duration>,
        retention_days: Option<i64>,
    ) -> Result<Self, StationError> {
        let data_dir = match data_folder {
            Some(dir) => dir,
            None => get_data_dir().ok_or(StationError::DataDirResolution)?,
        };
        ensure_data_dir_exists(&data_dir)
            .await
            .map_err(|e| StationError::DataDirCreation(data_dir.clone(), e))?;

        let source = OpenMeteoSource::new(location.unwrap_or(DEFAULT_LOCATION))?;
        Self::with_source(
            source,
            data_dir,
            refresh_interval.unwrap_or(DEFAULT_REFRESH_INTERVAL),
            chrono::Duration::days(retention_days.unwrap_or(DEFAULT_RETENTION_DAYS)),
        )
        .await
    }
}

impl<S: WeatherSource> WeatherStation<S> {
    /// Wires a station around an arbitrary source implementation.
    pub async fn with_source(
        source: S,
        data_dir: PathBuf,
        refresh_interval: Duration,
        retention: chrono::Duration,
    ) -> Result<Self, StationError> {
        let now = Local::now().naive_local();
        let store = SampleStore::new(&data_dir);
        let collector = Collector::new(store, source, retention, now).await?;
        Ok(Self {
            scheduler: RefreshScheduler::new(refresh_interval, Instant::now(), now),
            collector,
        })
    }

    /// Non-blocking scheduling check; runs at most one collection cycle.
    ///
    /// A source failure is downgraded to [`TickOutcome::Skipped`] with a
    /// warning, leaving all state unchanged. A persist failure surfaces as an
    /// error; the in-memory series keeps the new reading and the next cycle
    /// retries the write.
    pub async fn tick(&mut self) -> Result<TickOutcome, StationError> {
        if self.scheduler.poll(Instant::now()) != SchedulerPhase::Due {
            return Ok(TickOutcome::Idle);
        }

        self.scheduler.begin_collecting(Instant::now());
        let now = Local::now().naive_local();
        let result = self.collector.collect(now).await;
        self.scheduler.finish_collecting();

        match result {
            Ok(()) => {
                self.scheduler.mark_refreshed(now);
                Ok(TickOutcome::Collected)
            }
            Err(StationError::Source(e)) => {
                warn!("Skipping cycle, source unavailable: {e}");
                Ok(TickOutcome::Skipped)
            }
            Err(e) => Err(e),
        }
    }

    /// Requests an extra collection on the next tick. Repeated requests
    /// before that tick still cause exactly one cycle.
    pub fn request_refresh(&mut self) {
        self.scheduler.request_refresh();
    }

    /// Countdown to the next automatic refresh; never negative.
    pub fn time_until_next_refresh(&self) -> Duration {
        self.scheduler.time_until_next_refresh(Instant::now())
    }

    /// The "last updated" instant shown to the user.
    pub fn last_refresh_timestamp(&self) -> NaiveDateTime {
        self.scheduler.last_refresh_timestamp()
    }

    /// Read-only snapshot of the retained series.
    pub fn readings(&self) -> &[Reading] {
        self.collector.series().readings()
    }

    pub fn latest(&self) -> Option<&Reading> {
        self.collector.latest()
    }

    /// Trend classification over the fixed 3h/6h/12h horizons as of now.
    pub fn trend_report(&self) -> TrendReport {
        self.collector.trend_report(Local::now().naive_local())
    }

    /// Drives [`tick`](WeatherStation::tick) on a one-second cadence,
    /// logging persist failures and carrying on. No failure is fatal.
    pub async fn run(&mut self) {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        loop {
            ticker.tick().await;
            if let Err(e) = self.tick().await {
                warn!("Collection cycle failed: {e}");
            }
        }
    }
}
