//! Orchestrator. Owns `jobs_to_plan` and `final_assignments`, runs the
//! multi-pass loop (today, then up to `max_overflow_attempts` future days),
//! and issues the single final batch write.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use crate::availability;
use crate::bundler;
use crate::config::ReplanConfig;
use crate::domain::{
    EligibleItem, JobId, JobRecord, JobStatus, TechnicianAvailability, TechnicianId, TechnicianRecord, VanId,
};
use crate::eligibility;
use crate::error::{ReplanError, StoreError};
use crate::ingester::{self, JobAssignment};
use crate::oracle::TravelTimeOracle;
use crate::payload;
use crate::solver_client::{SolverClient, SolverStatus};
use crate::store::JobStore;
use crate::travel_cache::TravelTimeCache;
use crate::write_applier;

/// Summary of a completed cycle, used for the `info`-level log line after
/// the final write and for asserting the bounded-passes invariant in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplanOutcome {
    pub placed: usize,
    pub pending_review: usize,
    pub solver_calls: usize,
}

pub struct Orchestrator {
    config: ReplanConfig,
    store: Arc<dyn JobStore>,
    oracle: Arc<dyn TravelTimeOracle>,
    cache: TravelTimeCache,
    solver: Arc<dyn SolverClient>,
}

/// One pass's solver outcome, plus the id→item map needed to resolve
/// `unassigned_item_ids` back to constituent job ids. Discarded at the end
/// of the pass that produced it; never leaked across passes.
struct PassResult {
    assignments: Vec<JobAssignment>,
    unassigned_item_ids: Vec<String>,
    eligible_item_map: HashMap<String, EligibleItem>,
}

impl Orchestrator {
    pub fn new(
        config: ReplanConfig,
        store: Arc<dyn JobStore>,
        oracle: Arc<dyn TravelTimeOracle>,
        solver: Arc<dyn SolverClient>,
    ) -> Self {
        let ttl = std::time::Duration::from_secs(config.oracle_cache_ttl_minutes.max(0) as u64 * 60);
        Self { config, store, oracle, cache: TravelTimeCache::new(ttl), solver }
    }

    /// Runs one full replan cycle. `now` is read once here, at the
    /// orchestrator boundary, and threaded through every pure computation
    /// below; nothing further down reads host-local or system time.
    pub async fn run(&self, now: DateTime<Utc>, cancel: CancellationToken) -> Result<ReplanOutcome, ReplanError> {
        if cancel.is_cancelled() {
            return Err(ReplanError::Cancelled);
        }

        // The technician and job fetches run in parallel.
        let (technicians, jobs) = self
            .race(&cancel, async {
                tokio::try_join!(self.store.get_active_technicians(), self.store.get_relevant_jobs())
            })
            .await?;

        if technicians.is_empty() {
            return Err(ReplanError::NoTechnicians);
        }

        let all_fetched_jobs_map: HashMap<JobId, JobRecord> = jobs.into_iter().map(|j| (j.id, j)).collect();

        for job in all_fetched_jobs_map.values() {
            if job.status == JobStatus::Other {
                warn!("job {} has an unrecognized status; excluded from both jobsToPlan and the locked set", job.id);
            }
        }

        let mut jobs_to_plan: HashSet<JobId> = all_fetched_jobs_map
            .values()
            .filter(|j| j.status == JobStatus::Queued)
            .map(|j| j.id)
            .collect();

        if jobs_to_plan.is_empty() {
            return Err(ReplanError::NoJobs);
        }

        let locked_jobs_today: Vec<JobRecord> =
            all_fetched_jobs_map.values().filter(|j| j.status.is_locked()).cloned().collect();
        let fixed_time_jobs_today: Vec<JobRecord> = locked_jobs_today
            .iter()
            .filter(|j| j.status == JobStatus::FixedTime && j.fixed_start_time.is_some())
            .cloned()
            .collect();

        let tz = self.config.time_zone();
        let today: NaiveDate = now.with_timezone(&tz).date_naive();

        let mut final_assignments: HashMap<JobId, (TechnicianId, DateTime<Utc>)> = HashMap::new();
        let mut solver_calls = 0usize;

        // Pass 1: today.
        if !jobs_to_plan.is_empty() {
            let availabilities = availability::today_availability(&self.config, &technicians, &locked_jobs_today, now, today);
            if let Some(pass_result) = self
                .run_pass(&technicians, &availabilities, &jobs_to_plan, &all_fetched_jobs_map, &fixed_time_jobs_today, &cancel)
                .await?
            {
                solver_calls += 1;
                apply_pass_result(pass_result, &mut jobs_to_plan, &mut final_assignments, &all_fetched_jobs_map);
            }
        }

        // Overflow loop: up to MAX_OVERFLOW_ATTEMPTS future days. Weekend/
        // holiday iterations advance the loop counter without a solver call.
        for k in 1..=self.config.max_overflow_attempts {
            if jobs_to_plan.is_empty() {
                break;
            }
            if cancel.is_cancelled() {
                return Err(ReplanError::Cancelled);
            }

            let target_date = today + chrono::Duration::days(k as i64);
            let refreshed_technicians = self.race(&cancel, self.store.get_active_technicians()).await?;

            let future_availabilities = availability::future_day_availability(&self.config, &refreshed_technicians, target_date);
            if future_availabilities.is_empty() {
                continue;
            }

            let availabilities: HashMap<TechnicianId, TechnicianAvailability> =
                future_availabilities.iter().map(|a| (a.technician_id, *a)).collect();
            let restricted_technicians: Vec<TechnicianRecord> =
                refreshed_technicians.into_iter().filter(|t| availabilities.contains_key(&t.id)).collect();

            if let Some(pass_result) = self
                .run_pass(&restricted_technicians, &availabilities, &jobs_to_plan, &all_fetched_jobs_map, &[], &cancel)
                .await?
            {
                solver_calls += 1;
                apply_pass_result(pass_result, &mut jobs_to_plan, &mut final_assignments, &all_fetched_jobs_map);
            }
        }

        if cancel.is_cancelled() {
            return Err(ReplanError::Cancelled);
        }

        // Final write: one atomic-intent batch.
        let assignments_vec: Vec<(JobId, TechnicianId, DateTime<Utc>)> =
            final_assignments.iter().map(|(&id, &(tech_id, start))| (id, tech_id, start)).collect();
        let jobs_to_plan_vec: Vec<JobId> = jobs_to_plan.iter().copied().collect();
        let batch = write_applier::build_batch(&assignments_vec, &jobs_to_plan_vec);

        if !batch.is_empty() {
            write_applier::apply(&self.store, batch).await?;
        }

        let outcome =
            ReplanOutcome { placed: final_assignments.len(), pending_review: jobs_to_plan.len(), solver_calls };
        info!(
            "replan cycle complete: {} placed, {} pending review, {} solver call(s)",
            outcome.placed, outcome.pending_review, outcome.solver_calls
        );
        Ok(outcome)
    }

    /// Runs one full pass: availability (already computed by the caller) →
    /// bundler → eligibility → payload → solver → ingest. Returns `None`
    /// when the pass is skipped (nothing to place, or payload assembly
    /// found no placeable item).
    async fn run_pass(
        &self,
        technicians: &[TechnicianRecord],
        availabilities: &HashMap<TechnicianId, TechnicianAvailability>,
        jobs_to_plan: &HashSet<JobId>,
        all_fetched_jobs_map: &HashMap<JobId, JobRecord>,
        fixed_time_jobs: &[JobRecord],
        cancel: &CancellationToken,
    ) -> Result<Option<PassResult>, ReplanError> {
        let unplaced_jobs: Vec<JobRecord> =
            jobs_to_plan.iter().filter_map(|id| all_fetched_jobs_map.get(id).cloned()).collect();
        if unplaced_jobs.is_empty() || technicians.is_empty() {
            return Ok(None);
        }

        let items = bundler::bundle(&unplaced_jobs);

        let van_ids: Vec<VanId> = technicians
            .iter()
            .filter_map(|t| t.van_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let van_equipment = self.race(cancel, self.store.get_equipment_for_vans(&van_ids)).await?;

        let mut required_equipment_by_job = HashMap::with_capacity(unplaced_jobs.len());
        for job in &unplaced_jobs {
            let required = self.race(cancel, self.store.get_required_equipment_for_job(job)).await?;
            required_equipment_by_job.insert(job.id, required);
        }

        let eligible_items = eligibility::filter(items, technicians, &van_equipment, &required_equipment_by_job);
        let eligible_item_map: HashMap<String, EligibleItem> =
            eligible_items.iter().map(|item| (item.item.item_id(), item.clone())).collect();

        let Some(request) = payload::assemble(
            &self.config,
            availabilities,
            &eligible_items,
            fixed_time_jobs,
            self.oracle.as_ref(),
            &self.cache,
        )
        .await
        else {
            return Ok(None);
        };

        let response = self.race(cancel, self.solver.solve(request)).await?;

        if let SolverStatus::Error = response.status {
            return Err(ReplanError::Solver { message: response.message.clone().unwrap_or_default() });
        }

        let ingested = ingester::ingest(&response);
        Ok(Some(PassResult {
            assignments: ingested.assignments,
            unassigned_item_ids: ingested.unassigned_item_ids,
            eligible_item_map,
        }))
    }

    /// Races a suspension point against the cancellation token: a fired
    /// token wins immediately regardless of the future's progress.
    async fn race<T, E, F>(&self, cancel: &CancellationToken, fut: F) -> Result<T, ReplanError>
    where
        F: Future<Output = Result<T, E>>,
        ReplanError: From<E>,
    {
        tokio::select! {
            _ = cancel.cancelled() => Err(ReplanError::Cancelled),
            result = fut => Ok(result?),
        }
    }
}

/// Folds one pass's ingested result into the cycle's state. A pure
/// function, factored out of `run` so it is unit-testable without any
/// store/solver test doubles.
fn apply_pass_result(
    pass_result: PassResult,
    jobs_to_plan: &mut HashSet<JobId>,
    final_assignments: &mut HashMap<JobId, (TechnicianId, DateTime<Utc>)>,
    all_fetched_jobs_map: &HashMap<JobId, JobRecord>,
) {
    for assignment in pass_result.assignments {
        if jobs_to_plan.remove(&assignment.job_id) {
            final_assignments.insert(assignment.job_id, (assignment.technician_id, assignment.estimated_sched));
        } else {
            warn!("solver assigned job {} which was not in jobsToPlan; ignoring", assignment.job_id);
        }
    }

    for unassigned_id in &pass_result.unassigned_item_ids {
        let Some(eligible_item) = pass_result.eligible_item_map.get(unassigned_id) else {
            warn!("solver returned unassigned item id '{unassigned_id}' unseen in this pass; ignoring");
            continue;
        };
        for job_id in eligible_item.item.job_ids() {
            let already_tracked = jobs_to_plan.contains(&job_id) || final_assignments.contains_key(&job_id);
            if already_tracked {
                continue;
            }
            if all_fetched_jobs_map.get(&job_id).map(|j| j.status == JobStatus::Queued).unwrap_or(false) {
                warn!("job {job_id} missing from jobsToPlan after an unassigned-item resolution; re-adding");
                jobs_to_plan.insert(job_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coordinate, EquipmentModel, OrderId};
    use crate::error::WriteFailure;
    use crate::solver_client::{SolverRequest, SolverResponse, SolverRoute, SolverStop};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn technician(id: TechnicianId, van: VanId, current: Coordinate, home: Coordinate) -> TechnicianRecord {
        TechnicianRecord { id, van_id: Some(van), current_location: Some(current), home_location: Some(home) }
    }

    fn queued_job(id: JobId, priority: i32, duration: i64) -> JobRecord {
        JobRecord {
            id,
            order_id: id,
            address: Some(Coordinate::new(1.0, 1.0)),
            priority,
            duration_minutes: duration,
            service_category: "svc".to_string(),
            service_id: "1".to_string(),
            status: JobStatus::Queued,
            fixed_start_time: None,
            assigned_technician: None,
            estimated_start_time: None,
        }
    }

    struct FakeOracle;

    #[async_trait]
    impl TravelTimeOracle for FakeOracle {
        async fn duration_seconds(&self, _origin: Coordinate, _destination: Coordinate) -> Option<i64> {
            Some(60)
        }
    }

    struct FakeStore {
        technicians: Vec<TechnicianRecord>,
        jobs: Mutex<Vec<JobRecord>>,
        van_equipment: HashMap<VanId, Vec<EquipmentModel>>,
        required_equipment: HashMap<JobId, Vec<EquipmentModel>>,
        applied: Mutex<Vec<crate::domain::JobUpdate>>,
    }

    #[async_trait]
    impl JobStore for FakeStore {
        async fn get_active_technicians(&self) -> Result<Vec<TechnicianRecord>, StoreError> {
            Ok(self.technicians.clone())
        }
        async fn get_relevant_jobs(&self) -> Result<Vec<JobRecord>, StoreError> {
            Ok(self.jobs.lock().unwrap().clone())
        }
        async fn get_equipment_for_vans(
            &self,
            van_ids: &[VanId],
        ) -> Result<HashMap<VanId, Vec<EquipmentModel>>, StoreError> {
            Ok(van_ids
                .iter()
                .filter_map(|id| self.van_equipment.get(id).map(|m| (*id, m.clone())))
                .collect())
        }
        async fn get_required_equipment_for_job(&self, job: &JobRecord) -> Result<Vec<EquipmentModel>, StoreError> {
            Ok(self.required_equipment.get(&job.id).cloned().unwrap_or_default())
        }
        async fn get_ymm_id_for_order(&self, _order_id: OrderId) -> Result<Option<i64>, StoreError> {
            Ok(None)
        }
        async fn apply_updates(&self, updates: Vec<crate::domain::JobUpdate>) -> Result<(), WriteFailure> {
            self.applied.lock().unwrap().extend(updates);
            Ok(())
        }
    }

    /// A solver test double that schedules every item on the first
    /// technician that's eligible for it, one call recorded per `solve`.
    struct ScriptedSolver {
        calls: Mutex<usize>,
        responses: Mutex<Vec<SolverResponse>>,
    }

    impl ScriptedSolver {
        fn new(responses: Vec<SolverResponse>) -> Self {
            Self { calls: Mutex::new(0), responses: Mutex::new(responses) }
        }
    }

    #[async_trait]
    impl SolverClient for ScriptedSolver {
        async fn solve(&self, _request: SolverRequest) -> Result<SolverResponse, crate::error::SolverCallError> {
            *self.calls.lock().unwrap() += 1;
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(SolverResponse { status: SolverStatus::Success, message: None, routes: vec![], unassigned_item_ids: vec![] })
            } else {
                Ok(responses.remove(0))
            }
        }
    }

    fn success_response(technician_id: TechnicianId, job_ids: &[JobId], start: DateTime<Utc>) -> SolverResponse {
        SolverResponse {
            status: SolverStatus::Success,
            message: None,
            routes: vec![SolverRoute {
                technician_id,
                stops: job_ids
                    .iter()
                    .map(|id| SolverStop {
                        item_id: format!("job_{id}"),
                        arrival_time: Some(start.to_rfc3339()),
                        start_time: Some(start.to_rfc3339()),
                        end_time: Some(start.to_rfc3339()),
                    })
                    .collect(),
            }],
            unassigned_item_ids: vec![],
        }
    }

    fn monday_nine_am() -> DateTime<Utc> {
        let cfg = ReplanConfig::default();
        let monday = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
        crate::time_window::working_window_for(&cfg, monday).unwrap().start
    }

    // S1: happy path, today.
    #[tokio::test]
    async fn s1_happy_today() {
        let now = monday_nine_am();
        let store = Arc::new(FakeStore {
            technicians: vec![technician(1, 10, Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.0))],
            jobs: Mutex::new(vec![queued_job(1, 1, 30), queued_job(2, 1, 30)]),
            van_equipment: HashMap::from([(10, vec!["ToolA".to_string()])]),
            required_equipment: HashMap::from([(1, vec!["ToolA".to_string()]), (2, vec!["ToolA".to_string()])]),
            applied: Mutex::new(vec![]),
        });
        let solver = Arc::new(ScriptedSolver::new(vec![success_response(1, &[1, 2], now)]));
        let orchestrator = Orchestrator::new(ReplanConfig::default(), store.clone(), Arc::new(FakeOracle), solver);

        let outcome = orchestrator.run(now, CancellationToken::new()).await.unwrap();
        assert_eq!(outcome.placed, 2);
        assert_eq!(outcome.pending_review, 0);
        assert_eq!(outcome.solver_calls, 1);

        let applied = store.applied.lock().unwrap();
        assert_eq!(applied.len(), 2);
        assert!(applied.iter().all(|u| u.status == JobStatus::Queued));
    }

    // S2: partial placement today, overflow exhausted with no future
    // availability (no home coordinates) → remaining job goes pending_review.
    #[tokio::test]
    async fn s2_partial_today_then_overflow_exhausted() {
        let now = monday_nine_am();
        let store = Arc::new(FakeStore {
            technicians: vec![TechnicianRecord {
                id: 1,
                van_id: Some(10),
                current_location: Some(Coordinate::new(0.0, 0.0)),
                home_location: None,
            }],
            jobs: Mutex::new(vec![queued_job(1, 1, 30), queued_job(2, 1, 30), queued_job(3, 1, 30)]),
            van_equipment: HashMap::from([(10, vec!["ToolA".to_string()])]),
            required_equipment: HashMap::from([
                (1, vec!["ToolA".to_string()]),
                (2, vec!["ToolA".to_string()]),
                (3, vec!["ToolA".to_string()]),
            ]),
            applied: Mutex::new(vec![]),
        });
        let response = SolverResponse {
            status: SolverStatus::Partial,
            message: None,
            routes: vec![SolverRoute {
                technician_id: 1,
                stops: vec![
                    SolverStop {
                        item_id: "job_1".to_string(),
                        arrival_time: Some(now.to_rfc3339()),
                        start_time: Some(now.to_rfc3339()),
                        end_time: Some(now.to_rfc3339()),
                    },
                    SolverStop {
                        item_id: "job_2".to_string(),
                        arrival_time: Some(now.to_rfc3339()),
                        start_time: Some(now.to_rfc3339()),
                        end_time: Some(now.to_rfc3339()),
                    },
                ],
            }],
            unassigned_item_ids: vec!["job_3".to_string()],
        };
        let solver = Arc::new(ScriptedSolver::new(vec![response]));
        let orchestrator = Orchestrator::new(ReplanConfig::default(), store.clone(), Arc::new(FakeOracle), solver.clone());

        let outcome = orchestrator.run(now, CancellationToken::new()).await.unwrap();
        assert_eq!(outcome.placed, 2);
        assert_eq!(outcome.pending_review, 1);
        // Pass 1 calls the solver once; the overflow loop never finds future
        // availability (no home coordinate) so it makes zero further calls.
        assert_eq!(outcome.solver_calls, 1);
        assert_eq!(*solver.calls.lock().unwrap(), 1);
    }

    // S3: a job overflows today and day+1, then is placed on day+2 (the
    // third solver call). Exercises the overflow loop driving multiple
    // future-day passes in sequence.
    #[tokio::test]
    async fn s3_overflow_to_day_three() {
        let now = monday_nine_am();
        let store = Arc::new(FakeStore {
            technicians: vec![technician(1, 10, Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.0))],
            jobs: Mutex::new(vec![queued_job(1, 1, 30)]),
            van_equipment: HashMap::from([(10, vec!["ToolA".to_string()])]),
            required_equipment: HashMap::from([(1, vec!["ToolA".to_string()])]),
            applied: Mutex::new(vec![]),
        });
        let unassigned = SolverResponse {
            status: SolverStatus::Partial,
            message: None,
            routes: vec![],
            unassigned_item_ids: vec!["job_1".to_string()],
        };
        let day_three = now + chrono::Duration::days(3);
        let responses = vec![unassigned.clone(), unassigned, success_response(1, &[1], day_three)];
        let solver = Arc::new(ScriptedSolver::new(responses));
        let orchestrator = Orchestrator::new(ReplanConfig::default(), store.clone(), Arc::new(FakeOracle), solver.clone());

        let outcome = orchestrator.run(now, CancellationToken::new()).await.unwrap();
        assert_eq!(outcome.placed, 1);
        assert_eq!(outcome.pending_review, 0);
        assert_eq!(outcome.solver_calls, 3);
        assert_eq!(*solver.calls.lock().unwrap(), 3);

        let applied = store.applied.lock().unwrap();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].status, JobStatus::Queued);
    }

    // S4: base date is Friday; the Saturday and Sunday overflow iterations
    // make zero solver calls, and the job is placed on the following
    // Monday (the loop's second solver call overall).
    #[tokio::test]
    async fn s4_weekend_overflow_iterations_make_no_solver_call() {
        let cfg = ReplanConfig::default();
        let friday = NaiveDate::from_ymd_opt(2026, 7, 31).unwrap();
        let now = crate::time_window::working_window_for(&cfg, friday).unwrap().start;
        let store = Arc::new(FakeStore {
            technicians: vec![technician(1, 10, Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.0))],
            jobs: Mutex::new(vec![queued_job(1, 1, 30)]),
            van_equipment: HashMap::from([(10, vec!["ToolA".to_string()])]),
            required_equipment: HashMap::from([(1, vec!["ToolA".to_string()])]),
            applied: Mutex::new(vec![]),
        });
        let unassigned = SolverResponse {
            status: SolverStatus::Partial,
            message: None,
            routes: vec![],
            unassigned_item_ids: vec!["job_1".to_string()],
        };
        let monday = now + chrono::Duration::days(3);
        let responses = vec![unassigned, success_response(1, &[1], monday)];
        let solver = Arc::new(ScriptedSolver::new(responses));
        let orchestrator = Orchestrator::new(cfg, store.clone(), Arc::new(FakeOracle), solver.clone());

        let outcome = orchestrator.run(now, CancellationToken::new()).await.unwrap();
        assert_eq!(outcome.placed, 1);
        assert_eq!(outcome.pending_review, 0);
        // Friday's pass plus Monday's pass: Saturday and Sunday contribute
        // zero solver calls even though they each advance the loop counter.
        assert_eq!(outcome.solver_calls, 2);
        assert_eq!(*solver.calls.lock().unwrap(), 2);
    }

    // S5: bundle with no single eligible technician breaks into SingleJobs,
    // each placed under a different technician.
    #[tokio::test]
    async fn s5_bundle_then_break() {
        let now = monday_nine_am();
        let store = Arc::new(FakeStore {
            technicians: vec![
                technician(1, 10, Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.0)),
                technician(2, 20, Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.0)),
            ],
            jobs: Mutex::new(vec![queued_job(1, 1, 30), queued_job(2, 1, 30)]),
            van_equipment: HashMap::from([
                (10, vec!["ToolA".to_string()]),
                (20, vec!["ToolB".to_string()]),
            ]),
            required_equipment: HashMap::from([
                (1, vec!["ToolA".to_string()]),
                (2, vec!["ToolB".to_string()]),
            ]),
            applied: Mutex::new(vec![]),
        });
        // both jobs share order id 1 in `queued_job`; force a shared order.
        {
            let mut jobs = store.jobs.lock().unwrap();
            jobs[1].order_id = jobs[0].order_id;
        }
        let response = SolverResponse {
            status: SolverStatus::Success,
            message: None,
            routes: vec![
                SolverRoute {
                    technician_id: 1,
                    stops: vec![SolverStop {
                        item_id: "job_1".to_string(),
                        arrival_time: Some(now.to_rfc3339()),
                        start_time: Some(now.to_rfc3339()),
                        end_time: Some(now.to_rfc3339()),
                    }],
                },
                SolverRoute {
                    technician_id: 2,
                    stops: vec![SolverStop {
                        item_id: "job_2".to_string(),
                        arrival_time: Some(now.to_rfc3339()),
                        start_time: Some(now.to_rfc3339()),
                        end_time: Some(now.to_rfc3339()),
                    }],
                },
            ],
            unassigned_item_ids: vec![],
        };
        let solver = Arc::new(ScriptedSolver::new(vec![response]));
        let orchestrator = Orchestrator::new(ReplanConfig::default(), store.clone(), Arc::new(FakeOracle), solver);

        let outcome = orchestrator.run(now, CancellationToken::new()).await.unwrap();
        assert_eq!(outcome.placed, 2);
        assert_eq!(outcome.pending_review, 0);
    }

    // S6: a response-level solver error is cycle-fatal; no write happens.
    #[tokio::test]
    async fn s6_solver_error_is_fatal_and_writes_nothing() {
        let now = monday_nine_am();
        let store = Arc::new(FakeStore {
            technicians: vec![technician(1, 10, Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.0))],
            jobs: Mutex::new(vec![queued_job(1, 1, 30)]),
            van_equipment: HashMap::from([(10, vec!["ToolA".to_string()])]),
            required_equipment: HashMap::from([(1, vec!["ToolA".to_string()])]),
            applied: Mutex::new(vec![]),
        });
        let response =
            SolverResponse { status: SolverStatus::Error, message: Some("infeasible".to_string()), routes: vec![], unassigned_item_ids: vec![] };
        let solver = Arc::new(ScriptedSolver::new(vec![response]));
        let orchestrator = Orchestrator::new(ReplanConfig::default(), store.clone(), Arc::new(FakeOracle), solver);

        let result = orchestrator.run(now, CancellationToken::new()).await;
        assert!(matches!(result, Err(ReplanError::Solver { .. })));
        assert!(store.applied.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_technicians_ends_cycle_with_no_write() {
        let now = monday_nine_am();
        let store = Arc::new(FakeStore {
            technicians: vec![],
            jobs: Mutex::new(vec![queued_job(1, 1, 30)]),
            van_equipment: HashMap::new(),
            required_equipment: HashMap::new(),
            applied: Mutex::new(vec![]),
        });
        let solver = Arc::new(ScriptedSolver::new(vec![]));
        let orchestrator = Orchestrator::new(ReplanConfig::default(), store.clone(), Arc::new(FakeOracle), solver);
        let result = orchestrator.run(now, CancellationToken::new()).await;
        assert!(matches!(result, Err(ReplanError::NoTechnicians)));
        assert!(store.applied.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancelled_before_start_produces_no_write() {
        let now = monday_nine_am();
        let store = Arc::new(FakeStore {
            technicians: vec![technician(1, 10, Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.0))],
            jobs: Mutex::new(vec![queued_job(1, 1, 30)]),
            van_equipment: HashMap::from([(10, vec!["ToolA".to_string()])]),
            required_equipment: HashMap::from([(1, vec!["ToolA".to_string()])]),
            applied: Mutex::new(vec![]),
        });
        let solver = Arc::new(ScriptedSolver::new(vec![]));
        let orchestrator = Orchestrator::new(ReplanConfig::default(), store.clone(), Arc::new(FakeOracle), solver);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = orchestrator.run(now, cancel).await;
        assert!(matches!(result, Err(ReplanError::Cancelled)));
        assert!(store.applied.lock().unwrap().is_empty());
    }

    #[test]
    fn apply_pass_result_resolves_bundle_unassigned_back_to_constituents() {
        let mut jobs_to_plan = HashSet::new();
        let mut final_assignments = HashMap::new();
        let job1 = queued_job(1, 1, 30);
        let job2 = queued_job(2, 1, 30);
        let all_jobs = HashMap::from([(1, job1.clone()), (2, job2.clone())]);
        let bundle_item = crate::domain::SchedulableItem::Bundle { order_id: 1, jobs: vec![job1, job2] };
        let eligible_item_map = HashMap::from([(
            "bundle_1".to_string(),
            EligibleItem { item: bundle_item, eligible_technicians: vec![] },
        )]);
        let pass_result =
            PassResult { assignments: vec![], unassigned_item_ids: vec!["bundle_1".to_string()], eligible_item_map };

        apply_pass_result(pass_result, &mut jobs_to_plan, &mut final_assignments, &all_jobs);
        assert_eq!(jobs_to_plan, HashSet::from([1, 2]));
    }
}
