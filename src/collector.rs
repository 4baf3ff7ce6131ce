use crate::error::StationError;
use crate::source::WeatherSource;
use crate::store::sample_store::SampleStore;
use crate::trend::TrendReport;
use crate::types::reading::Reading;
use crate::types::series::{Period, Series};
use chrono::{Duration, NaiveDateTime};
use log::info;

/// Single writer of the series: fetches, appends, annotates, persists.
pub struct Collector<S> {
    store: SampleStore,
    source: S,
    retention: Duration,
    period: Period,
    series: Series,
}

impl<S: WeatherSource> Collector<S> {
    /// Loads the segment for the period containing `now` and wires the
    /// collector around it.
    pub async fn new(
        store: SampleStore,
        source: S,
        retention: Duration,
        now: NaiveDateTime,
    ) -> Result<Self, StationError> {
        let period = Period::containing(now);
        let series = store.load(period, now, retention).await?;
        Ok(Self {
            store,
            source,
            retention,
            period,
            series,
        })
    }

    /// Read-only snapshot for the display boundary.
    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn latest(&self) -> Option<&Reading> {
        self.series.latest()
    }

    pub fn trend_report(&self, now: NaiveDateTime) -> TrendReport {
        TrendReport::compute(self.series.readings(), now)
    }

    /// Runs one collection cycle.
    ///
    /// A source failure propagates before anything is appended, so the series
    /// and the segment are untouched and the next tick retries. A persist
    /// failure also propagates, but the in-memory series keeps the new
    /// reading and the next cycle rewrites the whole segment.
    pub async fn collect(&mut self, now: NaiveDateTime) -> Result<(), StationError> {
        // Month rollover starts a fresh segment; the prior month stays in its
        // own file.
        let period = Period::containing(now);
        if period != self.period {
            info!("Rolling over from segment {} to {}", self.period, period);
            self.series = self.store.load(period, now, self.retention).await?;
            self.period = period;
        }

        let observation = self.source.fetch_current().await?;

        self.series.push(Reading {
            timestamp: now,
            pressure_hpa: observation.pressure_hpa,
            temperature_c: observation.temperature_c,
            humidity_pct: observation.humidity_pct,
            wind_kph: observation.wind_kph,
            forecast: String::new(),
        });
        self.series.prune(now, self.retention);

        let report = TrendReport::compute(self.series.readings(), now);
        self.series.annotate_latest(report.to_string());

        self.store.persist(&self.series, self.period).await?;
        info!(
            "Collected reading at {}, {} readings retained",
            now,
            self.series.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::error::SourceError;
    use crate::source::Observation;
    use crate::trend::Trend;
    use chrono::NaiveDate;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct FakeSource {
        responses: Mutex<VecDeque<Result<Observation, SourceError>>>,
    }

    impl FakeSource {
        fn with(responses: Vec<Result<Observation, SourceError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }
    }

    impl WeatherSource for FakeSource {
        async fn fetch_current(&self) -> Result<Observation, SourceError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(SourceError::NonFiniteValue {
                    field: "pressure_msl",
                }))
        }
    }

    fn observation(pressure_hpa: f64) -> Observation {
        Observation {
            pressure_hpa,
            temperature_c: 21.4,
            humidity_pct: 63.0,
            wind_kph: 8.2,
        }
    }

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn collect_appends_annotates_and_persists() {
        let dir = tempdir().unwrap();
        let store = SampleStore::new(dir.path());
        let source = FakeSource::with(vec![Ok(observation(1010.4))]);
        let now = at(10, 9);

        let mut collector = Collector::new(store, source, Duration::days(5), now)
            .await
            .unwrap();
        collector.collect(now).await.unwrap();

        let latest = collector.latest().unwrap();
        assert_eq!(latest.timestamp, now);
        assert_eq!(latest.pressure_hpa, 1010.4);
        // One reading is never enough for a trend, whatever the horizon.
        assert_eq!(
            latest.forecast,
            "3h: insufficient data | 6h: insufficient data | 12h: insufficient data"
        );

        // The segment was rewritten on disk; a fresh load sees the reading.
        let reloaded = SampleStore::new(dir.path())
            .load(Period::containing(now), now, Duration::days(5))
            .await
            .unwrap();
        assert_eq!(reloaded.readings(), collector.series().readings());
    }

    #[tokio::test]
    async fn source_failure_leaves_series_and_segment_unchanged() {
        let dir = tempdir().unwrap();
        let store = SampleStore::new(dir.path());
        let source = FakeSource::with(vec![
            Ok(observation(1010.4)),
            Err(SourceError::NonFiniteValue {
                field: "pressure_msl",
            }),
        ]);
        let t0 = at(10, 9);

        let mut collector = Collector::new(store, source, Duration::days(5), t0)
            .await
            .unwrap();
        collector.collect(t0).await.unwrap();

        let result = collector.collect(at(10, 10)).await;
        assert!(matches!(result, Err(StationError::Source(_))));
        assert_eq!(collector.series().len(), 1);
        assert_eq!(collector.latest().unwrap().timestamp, t0);
    }

    #[tokio::test]
    async fn rising_pressure_reads_improving_over_six_hours() {
        let dir = tempdir().unwrap();
        let t0 = at(10, 8);
        let later = at(10, 12); // t0 + 4h

        // Seed the segment with a single 1010 hPa reading at t0.
        let seed = Series::from_readings(vec![Reading {
            timestamp: t0,
            pressure_hpa: 1010.0,
            temperature_c: 21.0,
            humidity_pct: 60.0,
            wind_kph: 7.0,
            forecast: String::new(),
        }]);
        SampleStore::new(dir.path())
            .persist(&seed, Period::containing(t0))
            .await
            .unwrap();

        let store = SampleStore::new(dir.path());
        let source = FakeSource::with(vec![Ok(observation(1012.0))]);
        let mut collector = Collector::new(store, source, Duration::days(5), later)
            .await
            .unwrap();
        collector.collect(later).await.unwrap();

        let report = collector.trend_report(later);
        assert_eq!(report.trend_for(6), Some(Trend::Improving));
        assert!(collector
            .latest()
            .unwrap()
            .forecast
            .contains("6h: improving"));
    }

    #[tokio::test]
    async fn month_rollover_starts_a_fresh_segment() {
        let dir = tempdir().unwrap();
        let store = SampleStore::new(dir.path());
        let source = FakeSource::with(vec![Ok(observation(1010.0)), Ok(observation(1011.0))]);
        let end_of_june = NaiveDate::from_ymd_opt(2025, 6, 30)
            .unwrap()
            .and_hms_opt(23, 55, 0)
            .unwrap();
        let start_of_july = NaiveDate::from_ymd_opt(2025, 7, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        let mut collector = Collector::new(store, source, Duration::days(5), end_of_june)
            .await
            .unwrap();
        collector.collect(end_of_june).await.unwrap();
        collector.collect(start_of_july).await.unwrap();

        // The working set was reset at the boundary: only July's reading.
        assert_eq!(collector.series().len(), 1);
        assert_eq!(collector.latest().unwrap().timestamp, start_of_july);

        // Both segment files exist on disk.
        let june = SampleStore::new(dir.path())
            .load(
                Period::containing(end_of_june),
                end_of_june,
                Duration::days(5),
            )
            .await
            .unwrap();
        assert_eq!(june.len(), 1);
    }

    #[tokio::test]
    async fn append_prunes_stale_readings() {
        let dir = tempdir().unwrap();
        let t0 = at(4, 9);
        let later = at(10, 9); // 6 days after t0

        let seed = Series::from_readings(vec![Reading {
            timestamp: t0,
            pressure_hpa: 1010.0,
            temperature_c: 21.0,
            humidity_pct: 60.0,
            wind_kph: 7.0,
            forecast: String::new(),
        }]);
        SampleStore::new(dir.path())
            .persist(&seed, Period::containing(t0))
            .await
            .unwrap();

        let store = SampleStore::new(dir.path());
        let source = FakeSource::with(vec![Ok(observation(1012.0))]);
        let mut collector = Collector::new(store, source, Duration::days(5), later)
            .await
            .unwrap();
        collector.collect(later).await.unwrap();

        assert_eq!(collector.series().len(), 1);
        assert_eq!(collector.latest().unwrap().timestamp, later);
    }
}
