//! External interface to the travel-time oracle.

use async_trait::async_trait;

use crate::domain::Coordinate;

#[async_trait]
pub trait TravelTimeOracle: Send + Sync {
    /// Duration in seconds between two coordinates, or `None` on failure
    /// (the caller substitutes a sentinel penalty).
    async fn duration_seconds(&self, origin: Coordinate, destination: Coordinate) -> Option<i64>;
}
