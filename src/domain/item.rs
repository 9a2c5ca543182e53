use super::coordinate::Coordinate;
use super::job::{JobId, JobRecord, OrderId, TechnicianId};

/// A schedulable unit: either one job, or a bundle of ≥2 jobs that share an
/// order id (and therefore an address). Modeled as a tagged variant, never
/// a base "item" struct with an optional list hanging off it.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulableItem {
    SingleJob(JobRecord),
    Bundle { order_id: OrderId, jobs: Vec<JobRecord> },
}

impl SchedulableItem {
    /// The id used to key the solver payload and to resolve results back:
    /// `job_<n>` or `bundle_<orderId>`.
    pub fn item_id(&self) -> String {
        match self {
            SchedulableItem::SingleJob(job) => format!("job_{}", job.id),
            SchedulableItem::Bundle { order_id, .. } => format!("bundle_{}", order_id),
        }
    }

    pub fn job_ids(&self) -> Vec<JobId> {
        match self {
            SchedulableItem::SingleJob(job) => vec![job.id],
            SchedulableItem::Bundle { jobs, .. } => jobs.iter().map(|j| j.id).collect(),
        }
    }

    pub fn priority(&self) -> i32 {
        match self {
            SchedulableItem::SingleJob(job) => job.priority,
            SchedulableItem::Bundle { jobs, .. } => {
                jobs.iter().map(|j| j.priority).max().unwrap_or_default()
            }
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        match self {
            SchedulableItem::SingleJob(job) => job.duration_minutes,
            SchedulableItem::Bundle { jobs, .. } => jobs.iter().map(|j| j.duration_minutes).sum(),
        }
    }

    /// All constituents of a bundle share an address (enforced upstream by
    /// the job store); a single job's own address is returned directly.
    /// `None` if that address has not been geocoded yet, in which case the
    /// item is excluded from the pass.
    pub fn address(&self) -> Option<Coordinate> {
        match self {
            SchedulableItem::SingleJob(job) => job.address,
            SchedulableItem::Bundle { jobs, .. } => jobs[0].address,
        }
    }

    pub fn constituents(&self) -> &[JobRecord] {
        match self {
            SchedulableItem::SingleJob(job) => std::slice::from_ref(job),
            SchedulableItem::Bundle { jobs, .. } => jobs,
        }
    }
}

/// Output of the eligibility filter (C3): a schedulable item paired with the
/// technicians allowed to perform it, in technician input order.
#[derive(Debug, Clone, PartialEq)]
pub struct EligibleItem {
    pub item: SchedulableItem,
    pub eligible_technicians: Vec<TechnicianId>,
}
