use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::coordinate::Coordinate;

pub type JobId = i64;
pub type OrderId = i64;
pub type TechnicianId = i64;

/// Status as reported by the job store. `Other` absorbs anything the core
/// does not act on, so an unrecognized value never aborts a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    EnRoute,
    InProgress,
    FixedTime,
    PendingReview,
    #[serde(other)]
    Other,
}

impl JobStatus {
    pub fn is_locked(&self) -> bool {
        matches!(self, JobStatus::EnRoute | JobStatus::InProgress | JobStatus::FixedTime)
    }
}

/// A job exactly as fetched from the store (`getRelevantJobs`).
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub id: JobId,
    pub order_id: OrderId,
    /// Absent for a small number of addresses the store has not yet
    /// geocoded; such items are excluded from the pass rather than
    /// failing it.
    pub address: Option<Coordinate>,
    pub priority: i32,
    pub duration_minutes: i64,
    pub service_category: String,
    pub service_id: String,
    pub status: JobStatus,
    pub fixed_start_time: Option<DateTime<Utc>>,
    pub assigned_technician: Option<TechnicianId>,
    pub estimated_start_time: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// `fixed_start_time` if the job is status `fixed_time`, else the
    /// estimated start, used by the availability calculator's locked-job
    /// ordering.
    pub fn effective_start(&self) -> Option<DateTime<Utc>> {
        if self.status == JobStatus::FixedTime {
            self.fixed_start_time
        } else {
            self.estimated_start_time
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.duration_minutes)
    }
}

/// One row of the final batch write.
#[derive(Debug, Clone, PartialEq)]
pub struct JobUpdate {
    pub job_id: JobId,
    pub status: JobStatus,
    pub assigned_technician: Option<TechnicianId>,
    pub estimated_sched: Option<DateTime<Utc>>,
}

impl JobUpdate {
    pub fn planned(job_id: JobId, technician_id: TechnicianId, start: DateTime<Utc>) -> Self {
        Self {
            job_id,
            status: JobStatus::Queued,
            assigned_technician: Some(technician_id),
            estimated_sched: Some(start),
        }
    }

    pub fn pending_review(job_id: JobId) -> Self {
        Self {
            job_id,
            status: JobStatus::PendingReview,
            assigned_technician: None,
            estimated_sched: None,
        }
    }
}
