//! C6: solver client, and the §6 request/response wire contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::TechnicianId;
use crate::error::SolverCallError;

#[derive(Debug, Clone, Serialize)]
pub struct SolverLocation {
    pub id: usize,
    pub index: usize,
    pub coords: (f64, f64),
}

#[derive(Debug, Clone, Serialize)]
pub struct SolverTechnician {
    pub id: TechnicianId,
    #[serde(rename = "startLocationIndex")]
    pub start_location_index: usize,
    #[serde(rename = "endLocationIndex")]
    pub end_location_index: usize,
    #[serde(rename = "earliestStartTimeISO")]
    pub earliest_start_time: DateTime<Utc>,
    #[serde(rename = "latestEndTimeISO")]
    pub latest_end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SolverItem {
    pub id: String,
    #[serde(rename = "locationIndex")]
    pub location_index: usize,
    #[serde(rename = "durationSeconds")]
    pub duration_seconds: i64,
    pub priority: i32,
    #[serde(rename = "eligibleTechnicianIds")]
    pub eligible_technician_ids: Vec<TechnicianId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SolverFixedConstraint {
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(rename = "fixedTimeISO")]
    pub fixed_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SolverRequest {
    pub locations: Vec<SolverLocation>,
    pub technicians: Vec<SolverTechnician>,
    pub items: Vec<SolverItem>,
    #[serde(rename = "fixedConstraints")]
    pub fixed_constraints: Vec<SolverFixedConstraint>,
    #[serde(rename = "travelTimeMatrix")]
    pub travel_time_matrix: Vec<Vec<i64>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverStatus {
    Success,
    Partial,
    Error,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolverStop {
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(rename = "arrivalTimeISO")]
    pub arrival_time: Option<String>,
    #[serde(rename = "startTimeISO")]
    pub start_time: Option<String>,
    #[serde(rename = "endTimeISO")]
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolverRoute {
    #[serde(rename = "technicianId")]
    pub technician_id: TechnicianId,
    pub stops: Vec<SolverStop>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolverResponse {
    pub status: SolverStatus,
    pub message: Option<String>,
    #[serde(default)]
    pub routes: Vec<SolverRoute>,
    #[serde(rename = "unassignedItemIds", default)]
    pub unassigned_item_ids: Vec<String>,
}

#[async_trait]
pub trait SolverClient: Send + Sync {
    async fn solve(&self, request: SolverRequest) -> Result<SolverResponse, SolverCallError>;
}

/// HTTP implementation: a plain `Client`, a timeout race, and errors
/// mapped to this crate's own error type rather than leaking
/// `reqwest::Error`.
pub struct HttpSolverClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpSolverClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self { client: reqwest::Client::new(), endpoint: endpoint.into(), timeout }
    }
}

#[async_trait]
impl SolverClient for HttpSolverClient {
    async fn solve(&self, request: SolverRequest) -> Result<SolverResponse, SolverCallError> {
        let call = self.client.post(&self.endpoint).json(&request).send();
        let response = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| SolverCallError::Timeout)?
            .map_err(|why| {
                if why.is_connect() {
                    SolverCallError::Connection(why.to_string())
                } else {
                    SolverCallError::Http(why.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(SolverCallError::Http(format!("status {}", response.status())));
        }

        response
            .json::<SolverResponse>()
            .await
            .map_err(|why| SolverCallError::MalformedResponse(why.to_string()))
    }
}
