//! External interface to the job store. Its schema is deliberately left
//! open here; the core only depends on this trait, never on a concrete
//! backend.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::{EquipmentModel, JobRecord, JobUpdate, OrderId, TechnicianRecord, VanId};
use crate::error::{StoreError, WriteFailure};

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn get_active_technicians(&self) -> Result<Vec<TechnicianRecord>, StoreError>;

    /// All jobs with status in {queued, en_route, in_progress, fixed_time}.
    async fn get_relevant_jobs(&self) -> Result<Vec<JobRecord>, StoreError>;

    async fn get_equipment_for_vans(
        &self,
        van_ids: &[VanId],
    ) -> Result<HashMap<VanId, Vec<EquipmentModel>>, StoreError>;

    /// Required equipment models for one job, derived from (service
    /// category, service id, order's vehicle year/make/model). Empty if
    /// undeterminable.
    async fn get_required_equipment_for_job(
        &self,
        job: &JobRecord,
    ) -> Result<Vec<EquipmentModel>, StoreError>;

    /// The id keying the equipment-requirements table for an order's
    /// vehicle (year/make/model). `None` if the order has no vehicle on
    /// file. Reserved for stores whose `get_required_equipment_for_job`
    /// needs it internally; the orchestrator never calls this directly.
    async fn get_ymm_id_for_order(&self, order_id: OrderId) -> Result<Option<i64>, StoreError>;

    /// Apply a batch of updates. Not transactional: a partial failure is
    /// reported via `WriteFailure`, not rolled back. An empty batch is a
    /// no-op.
    async fn apply_updates(&self, updates: Vec<JobUpdate>) -> Result<(), WriteFailure>;
}
