//! HTTP adapter for the job-store interface. The store's own schema is
//! not this crate's concern; this talks to a configurable set of REST
//! endpoints and normalizes their wire shapes into the canonical domain
//! structs at this boundary, wrapping a bare `reqwest::Client` behind a
//! narrow, error-mapped function per method.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Coordinate, EquipmentModel, JobId, JobRecord, JobStatus, JobUpdate, OrderId, TechnicianId, TechnicianRecord,
    VanId,
};
use crate::error::{StoreError, WriteFailure};
use crate::store::JobStore;

pub struct HttpJobStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpJobStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder().timeout(timeout).build().expect("reqwest client must build");
        Self { client, base_url: base_url.into() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Deserialize)]
struct TechnicianWire {
    id: TechnicianId,
    van_id: Option<VanId>,
    current_location: Option<Coordinate>,
    home_location: Option<Coordinate>,
}

impl From<TechnicianWire> for TechnicianRecord {
    fn from(wire: TechnicianWire) -> Self {
        TechnicianRecord {
            id: wire.id,
            van_id: wire.van_id,
            current_location: wire.current_location,
            home_location: wire.home_location,
        }
    }
}

#[derive(Debug, Deserialize)]
struct JobWire {
    id: JobId,
    order_id: OrderId,
    address: Option<Coordinate>,
    priority: i32,
    duration_minutes: i64,
    service_category: String,
    service_id: String,
    status: JobStatus,
    fixed_start_time: Option<DateTime<Utc>>,
    assigned_technician: Option<TechnicianId>,
    estimated_start_time: Option<DateTime<Utc>>,
}

impl From<JobWire> for JobRecord {
    fn from(wire: JobWire) -> Self {
        JobRecord {
            id: wire.id,
            order_id: wire.order_id,
            address: wire.address,
            priority: wire.priority,
            duration_minutes: wire.duration_minutes,
            service_category: wire.service_category,
            service_id: wire.service_id,
            status: wire.status,
            fixed_start_time: wire.fixed_start_time,
            assigned_technician: wire.assigned_technician,
            estimated_start_time: wire.estimated_start_time,
        }
    }
}

#[derive(Debug, Serialize)]
struct RequiredEquipmentQuery<'a> {
    service_category: &'a str,
    service_id: &'a str,
    order_id: OrderId,
}

#[derive(Debug, Serialize)]
struct UpdateRow {
    #[serde(rename = "jobId")]
    job_id: JobId,
    data: UpdateFields,
}

#[derive(Debug, Serialize)]
struct UpdateFields {
    status: JobStatus,
    assigned_technician: Option<TechnicianId>,
    estimated_sched: Option<DateTime<Utc>>,
}

impl From<&JobUpdate> for UpdateRow {
    fn from(update: &JobUpdate) -> Self {
        UpdateRow {
            job_id: update.job_id,
            data: UpdateFields {
                status: update.status.clone(),
                assigned_technician: update.assigned_technician,
                estimated_sched: update.estimated_sched,
            },
        }
    }
}

#[async_trait]
impl JobStore for HttpJobStore {
    async fn get_active_technicians(&self) -> Result<Vec<TechnicianRecord>, StoreError> {
        let response = self
            .client
            .get(self.url("/technicians/active"))
            .send()
            .await
            .map_err(|why| StoreError::new("getActiveTechnicians", why.to_string()))?;
        let wire: Vec<TechnicianWire> = response
            .json()
            .await
            .map_err(|why| StoreError::new("getActiveTechnicians", why.to_string()))?;
        Ok(wire.into_iter().map(TechnicianRecord::from).collect())
    }

    async fn get_relevant_jobs(&self) -> Result<Vec<JobRecord>, StoreError> {
        let response = self
            .client
            .get(self.url("/jobs/relevant"))
            .send()
            .await
            .map_err(|why| StoreError::new("getRelevantJobs", why.to_string()))?;
        let wire: Vec<JobWire> =
            response.json().await.map_err(|why| StoreError::new("getRelevantJobs", why.to_string()))?;
        Ok(wire.into_iter().map(JobRecord::from).collect())
    }

    async fn get_equipment_for_vans(
        &self,
        van_ids: &[VanId],
    ) -> Result<HashMap<VanId, Vec<EquipmentModel>>, StoreError> {
        if van_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let response = self
            .client
            .post(self.url("/equipment/vans"))
            .json(&van_ids)
            .send()
            .await
            .map_err(|why| StoreError::new("getEquipmentForVans", why.to_string()))?;
        response.json().await.map_err(|why| StoreError::new("getEquipmentForVans", why.to_string()))
    }

    async fn get_required_equipment_for_job(&self, job: &JobRecord) -> Result<Vec<EquipmentModel>, StoreError> {
        let query = RequiredEquipmentQuery {
            service_category: &job.service_category,
            service_id: &job.service_id,
            order_id: job.order_id,
        };
        let response = self
            .client
            .post(self.url("/equipment/required"))
            .json(&query)
            .send()
            .await
            .map_err(|why| StoreError::new("getRequiredEquipmentForJob", why.to_string()))?;
        response.json().await.map_err(|why| StoreError::new("getRequiredEquipmentForJob", why.to_string()))
    }

    async fn get_ymm_id_for_order(&self, order_id: OrderId) -> Result<Option<i64>, StoreError> {
        let response = self
            .client
            .get(self.url(&format!("/orders/{order_id}/ymm")))
            .send()
            .await
            .map_err(|why| StoreError::new("getYmmIdForOrder", why.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        response.json().await.map_err(|why| StoreError::new("getYmmIdForOrder", why.to_string()))
    }

    async fn apply_updates(&self, updates: Vec<JobUpdate>) -> Result<(), WriteFailure> {
        if updates.is_empty() {
            return Ok(());
        }
        let rows: Vec<UpdateRow> = updates.iter().map(UpdateRow::from).collect();
        let result = self.client.post(self.url("/jobs/batch-update")).json(&rows).send().await;
        match result {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => Err(WriteFailure {
                failed_job_ids: updates.iter().map(|u| u.job_id).collect(),
                reasons: vec![format!("batch update returned status {}", response.status())],
            }),
            Err(why) => Err(WriteFailure {
                failed_job_ids: updates.iter().map(|u| u.job_id).collect(),
                reasons: vec![why.to_string()],
            }),
        }
    }
}
