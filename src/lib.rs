mod collector;
mod error;
mod scheduler;
mod source;
mod station;
mod store;
mod trend;
mod types;
mod utils;

pub use error::StationError;
pub use station::*;

pub use collector::Collector;
pub use scheduler::{RefreshScheduler, SchedulerPhase};
pub use trend::{classify, Trend, TrendReport, TREND_HORIZONS_HOURS};

pub use types::reading::{LatLon, Reading};
pub use types::series::{Period, Series};

pub use source::error::SourceError;
pub use source::open_meteo::OpenMeteoSource;
pub use source::{Observation, WeatherSource};
pub use store::error::StoreError;
pub use store::sample_store::SampleStore;

pub use utils::format_countdown;
