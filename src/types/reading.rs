use chrono::NaiveDateTime;

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use barostation::LatLon;
///
/// let napierville_area = LatLon(45.25, -73.50);
/// assert_eq!(napierville_area.0, 45.25); // Latitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

/// One timestamped observation in the series.
///
/// Numeric fields are always finite once a reading exists; locale-formatted
/// input is normalized by the store before a `Reading` is constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub timestamp: NaiveDateTime,
    pub pressure_hpa: f64,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub wind_kph: f64,
    /// Combined trend summary attached when this reading was collected.
    /// Empty until computed, immutable once persisted.
    pub forecast: String,
}
