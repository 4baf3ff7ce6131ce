use crate::source::error::SourceError;
use crate::source::{Observation, WeatherSource};
use crate::types::reading::LatLon;
use log::{info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,pressure_msl,wind_speed_10m";

// Bounded timeout instead of mid-fetch cancellation; a fetch either completes
// or fails within this.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ForecastPayload {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    pressure_msl: f64,
    temperature_2m: f64,
    relative_humidity_2m: f64,
    wind_speed_10m: f64,
}

impl CurrentConditions {
    fn into_observation(self) -> Result<Observation, SourceError> {
        let fields = [
            ("pressure_msl", self.pressure_msl),
            ("temperature_2m", self.temperature_2m),
            ("relative_humidity_2m", self.relative_humidity_2m),
            ("wind_speed_10m", self.wind_speed_10m),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(SourceError::NonFiniteValue { field });
            }
        }
        Ok(Observation {
            pressure_hpa: self.pressure_msl,
            temperature_c: self.temperature_2m,
            humidity_pct: self.relative_humidity_2m,
            wind_kph: self.wind_speed_10m,
        })
    }
}

/// Open-Meteo current-conditions adapter for a fixed coordinate.
pub struct OpenMeteoSource {
    client: Client,
    location: LatLon,
}

impl OpenMeteoSource {
    pub fn new(location: LatLon) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(SourceError::ClientBuild)?;
        Ok(Self { client, location })
    }

    fn request_url(&self) -> String {
        format!(
            "{FORECAST_URL}?latitude={}&longitude={}&current={CURRENT_FIELDS}",
            self.location.0, self.location.1
        )
    }
}

impl WeatherSource for OpenMeteoSource {
    async fn fetch_current(&self) -> Result<Observation, SourceError> {
        let url = self.request_url();
        info!("Fetching current conditions from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::NetworkRequest(url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    SourceError::HttpStatus {
                        url,
                        status,
                        source: e,
                    }
                } else {
                    SourceError::NetworkRequest(url, e)
                });
            }
        };

        // A missing field is a malformed payload, not a zeroed reading.
        let payload: ForecastPayload = response
            .json()
            .await
            .map_err(|e| SourceError::MalformedResponse(url, e))?;

        payload.current.into_observation()
    }
}
