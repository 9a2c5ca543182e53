//! Result ingester. Parses a solver response into per-job assignments and
//! the unassigned item ids, exactly as returned.

use chrono::{DateTime, Utc};
use log::warn;

use crate::domain::{JobId, TechnicianId};
use crate::solver_client::SolverResponse;

#[derive(Debug, Clone, PartialEq)]
pub struct JobAssignment {
    pub job_id: JobId,
    pub technician_id: TechnicianId,
    pub estimated_sched: DateTime<Utc>,
}

pub struct IngestResult {
    pub assignments: Vec<JobAssignment>,
    pub unassigned_item_ids: Vec<String>,
}

/// Stops whose item id does not begin with `job_`, or that fail to parse,
/// are skipped with a warning; the pass is never aborted. Bundle stops
/// (`bundle_<orderId>`) are ignored here; a bundle's constituents are
/// accounted for only via the bundle's own resolution path in the
/// orchestrator.
pub fn ingest(response: &SolverResponse) -> IngestResult {
    let mut assignments = Vec::new();

    for route in &response.routes {
        for stop in &route.stops {
            let Some(rest) = stop.item_id.strip_prefix("job_") else {
                continue;
            };
            let Ok(job_id) = rest.parse::<JobId>() else {
                warn!("solver stop has unparseable job id '{}'; skipping", stop.item_id);
                continue;
            };
            let Some(raw_start) = stop.start_time.as_deref() else {
                warn!("solver stop for job {job_id} has no start time; skipping");
                continue;
            };
            let Ok(estimated_sched) = DateTime::parse_from_rfc3339(raw_start) else {
                warn!("solver stop for job {job_id} has an unparseable start time '{raw_start}'; skipping");
                continue;
            };

            assignments.push(JobAssignment {
                job_id,
                technician_id: route.technician_id,
                estimated_sched: estimated_sched.with_timezone(&Utc),
            });
        }
    }

    IngestResult {
        assignments,
        unassigned_item_ids: response.unassigned_item_ids.clone(),
    }
}
