use serde::{Deserialize, Serialize};

/// A geographic point. Latitude/longitude, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Key used for dedup and cache lookups: equality on float coordinates
    /// is brittle, so both are rounded to ~1m precision (5 decimal places).
    pub fn rounded_key(&self) -> (i64, i64) {
        ((self.lat * 1e5).round() as i64, (self.lon * 1e5).round() as i64)
    }
}

/// Wrapper that gives `Coordinate` the `Eq`/`Hash` it needs to be a
/// deduplication or cache key, without claiming exact float equality holds
/// for the raw `Coordinate` itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundedCoordinate(pub Coordinate);

impl Eq for RoundedCoordinate {}

impl std::hash::Hash for RoundedCoordinate {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.rounded_key().hash(state);
    }
}
