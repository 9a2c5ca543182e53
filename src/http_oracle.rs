//! HTTP adapter for the travel-time oracle interface. A thin,
//! per-request-timeout wrapper; any failure (network, non-2xx, malformed
//! body) collapses to `None` so the caller substitutes the sentinel
//! penalty rather than aborting the matrix build.

use std::time::Duration;

use async_trait::async_trait;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::domain::Coordinate;
use crate::oracle::TravelTimeOracle;

pub struct HttpTravelTimeOracle {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpTravelTimeOracle {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self { client: reqwest::Client::new(), endpoint: endpoint.into(), timeout }
    }
}

#[derive(Debug, Serialize)]
struct DurationQuery {
    origin: Coordinate,
    destination: Coordinate,
}

#[derive(Debug, Deserialize)]
struct DurationResponse {
    seconds: i64,
}

#[async_trait]
impl TravelTimeOracle for HttpTravelTimeOracle {
    async fn duration_seconds(&self, origin: Coordinate, destination: Coordinate) -> Option<i64> {
        let call = self
            .client
            .post(&self.endpoint)
            .json(&DurationQuery { origin, destination })
            .send();

        let response = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(response)) => response,
            Ok(Err(why)) => {
                warn!("travel oracle request failed: {why}");
                return None;
            }
            Err(_) => {
                warn!("travel oracle request timed out after {:?}", self.timeout);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!("travel oracle returned status {}", response.status());
            return None;
        }

        match response.json::<DurationResponse>().await {
            Ok(parsed) => Some(parsed.seconds),
            Err(why) => {
                warn!("travel oracle returned an unparseable body: {why}");
                None
            }
        }
    }
}
