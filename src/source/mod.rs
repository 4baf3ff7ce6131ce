pub mod error;
pub mod open_meteo;

use error::SourceError;
use std::future::Future;

/// Snapshot of current conditions pulled from a provider, before it is
/// stamped into a [`Reading`](crate::Reading).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub pressure_hpa: f64,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub wind_kph: f64,
}

/// Boundary adapter for a current-conditions provider.
///
/// Implementations do not retry internally; a failed fetch skips the cycle
/// and the fixed refresh interval is the retry cadence.
pub trait WeatherSource {
    fn fetch_current(&self) -> impl Future<Output = Result<Observation, SourceError>> + Send;
}
