use std::fmt;

use crate::domain::JobId;

/// Crate-wide fatal error taxonomy. Local/non-fatal kinds
/// (`TravelOracleFailure`, `MalformedSolverStop`, `MissingItemLocation`) are
/// never represented here; they are handled at the point of detection by
/// substituting a sentinel/skip/omit and logging a warning.
#[derive(Debug)]
pub enum ReplanError {
    /// Step 0 returned no active technicians. Not fatal in the sense of an
    /// aborted write, but it does end the cycle with no write performed.
    NoTechnicians,
    /// Step 0 returned no `queued` jobs.
    NoJobs,
    /// Any store fetch failed.
    StoreQuery(StoreError),
    /// Solver responded with `status: "error"`.
    Solver { message: String },
    /// Transport-level solver failure: HTTP error, timeout, connection
    /// error, or a malformed response body.
    SolverTransport(SolverCallError),
    /// Per-job write errors collected into one aggregate failure.
    Write(WriteFailure),
    /// The cycle was cancelled before its final write.
    Cancelled,
}

impl fmt::Display for ReplanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplanError::NoTechnicians => write!(f, "no active technicians; cycle skipped"),
            ReplanError::NoJobs => write!(f, "no queued jobs; cycle skipped"),
            ReplanError::StoreQuery(e) => write!(f, "store query failed: {e}"),
            ReplanError::Solver { message } => write!(f, "solver returned an error: {message}"),
            ReplanError::SolverTransport(e) => write!(f, "solver call failed: {e}"),
            ReplanError::Write(e) => write!(f, "{e}"),
            ReplanError::Cancelled => write!(f, "replan cycle was cancelled"),
        }
    }
}

impl std::error::Error for ReplanError {}

impl From<StoreError> for ReplanError {
    fn from(e: StoreError) -> Self {
        ReplanError::StoreQuery(e)
    }
}

impl From<SolverCallError> for ReplanError {
    fn from(e: SolverCallError) -> Self {
        ReplanError::SolverTransport(e)
    }
}

impl From<WriteFailure> for ReplanError {
    fn from(e: WriteFailure) -> Self {
        ReplanError::Write(e)
    }
}

/// A failed job-store query (`getActiveTechnicians`, `getRelevantJobs`,
/// `getEquipmentForVans`, ...).
#[derive(Debug)]
pub struct StoreError {
    pub operation: &'static str,
    pub reason: String,
}

impl StoreError {
    pub fn new(operation: &'static str, reason: impl Into<String>) -> Self {
        Self { operation, reason: reason.into() }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.operation, self.reason)
    }
}

impl std::error::Error for StoreError {}

/// Transport-level failure talking to the solver: distinguishable from a
/// response-level `status: "error"` so the caller can log differently.
#[derive(Debug)]
pub enum SolverCallError {
    Timeout,
    Http(String),
    Connection(String),
    MalformedResponse(String),
}

impl fmt::Display for SolverCallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverCallError::Timeout => write!(f, "timed out waiting for solver"),
            SolverCallError::Http(why) => write!(f, "solver returned an HTTP error: {why}"),
            SolverCallError::Connection(why) => write!(f, "could not reach solver: {why}"),
            SolverCallError::MalformedResponse(why) => {
                write!(f, "could not parse solver response: {why}")
            }
        }
    }
}

impl std::error::Error for SolverCallError {}

/// Aggregate failure from the write applier (C9): the batch is not
/// transactional, so this names every job id whose update failed while the
/// rest were applied.
#[derive(Debug)]
pub struct WriteFailure {
    pub failed_job_ids: Vec<JobId>,
    pub reasons: Vec<String>,
}

impl fmt::Display for WriteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of the batch's updates failed: {:?}",
            self.failed_job_ids.len(),
            self.failed_job_ids
        )
    }
}

impl std::error::Error for WriteFailure {}
