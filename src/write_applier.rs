//! Write applier. Translates the orchestrator's internal state into a
//! batch of store updates and applies them concurrently.

use std::sync::Arc;

use futures_util::future::join_all;

use crate::domain::{JobId, JobUpdate, TechnicianId};
use crate::error::WriteFailure;
use crate::store::JobStore;

use chrono::{DateTime, Utc};

/// Builds the final batch: one `queued` update per placed job, one
/// `pending_review` update per job that never found a slot. An empty
/// result means both collections were empty; the caller skips the write
/// entirely.
pub fn build_batch(
    final_assignments: &[(JobId, TechnicianId, DateTime<Utc>)],
    jobs_to_plan: &[JobId],
) -> Vec<JobUpdate> {
    let mut batch = Vec::with_capacity(final_assignments.len() + jobs_to_plan.len());
    for &(job_id, technician_id, start) in final_assignments {
        batch.push(JobUpdate::planned(job_id, technician_id, start));
    }
    for &job_id in jobs_to_plan {
        batch.push(JobUpdate::pending_review(job_id));
    }
    batch
}

/// Dispatches each update concurrently against the store. The store's own
/// `apply_updates` already batches in one call in the common case; this
/// also supports stores that only accept one update at a time by fanning
/// out per-job and aggregating failures here: dispatch all, wait for all,
/// and let the store's own concurrency limits bound how much actually runs
/// at once.
pub async fn apply(store: &Arc<dyn JobStore>, updates: Vec<JobUpdate>) -> Result<(), WriteFailure> {
    if updates.is_empty() {
        return Ok(());
    }

    let futures = updates.into_iter().map(|update| {
        let store = Arc::clone(store);
        async move {
            let job_id = update.job_id;
            store.apply_updates(vec![update]).await.map_err(|failure| {
                (job_id, failure.reasons.into_iter().next().unwrap_or_else(|| "unknown error".to_string()))
            })
        }
    });

    let results = join_all(futures).await;

    let mut failed_job_ids = Vec::new();
    let mut reasons = Vec::new();
    for result in results {
        if let Err((job_id, reason)) = result {
            failed_job_ids.push(job_id);
            reasons.push(reason);
        }
    }

    if failed_job_ids.is_empty() {
        Ok(())
    } else {
        Err(WriteFailure { failed_job_ids, reasons })
    }
}
