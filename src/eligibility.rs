//! Eligibility filter. Rejects technicians lacking required equipment and
//! splits bundles that no single technician can cover.

use std::collections::{HashMap, HashSet};

use crate::domain::{EligibleItem, EquipmentModel, JobRecord, SchedulableItem, TechnicianId, TechnicianRecord, VanId};

/// One job's required-equipment lookup result, batched by the orchestrator
/// ahead of calling this filter so the filter itself stays synchronous.
pub type RequiredEquipmentByJob = HashMap<i64, Vec<EquipmentModel>>;

pub fn filter(
    items: Vec<SchedulableItem>,
    technicians: &[TechnicianRecord],
    van_equipment: &HashMap<VanId, Vec<EquipmentModel>>,
    required_equipment_by_job: &RequiredEquipmentByJob,
) -> Vec<EligibleItem> {
    let technician_equipment: HashMap<TechnicianId, HashSet<&EquipmentModel>> = technicians
        .iter()
        .map(|technician| {
            let models = technician
                .van_id
                .and_then(|van| van_equipment.get(&van))
                .into_iter()
                .flatten()
                .collect::<HashSet<_>>();
            (technician.id, models)
        })
        .collect();

    let mut result = Vec::with_capacity(items.len());
    for item in items {
        let required = required_equipment_for(&item, required_equipment_by_job);
        let eligible = eligible_technicians(technicians, &technician_equipment, &required);

        match (&item, eligible.is_empty()) {
            (SchedulableItem::Bundle { jobs, .. }, true) if jobs.len() >= 2 => {
                // No technician can take the whole bundle: break it apart
                // and re-evaluate each constituent as a SingleJob.
                for job in jobs.clone() {
                    let job_required = required_equipment_by_job.get(&job.id).cloned().unwrap_or_default();
                    let job_eligible = eligible_technicians(technicians, &technician_equipment, &job_required);
                    result.push(EligibleItem {
                        item: SchedulableItem::SingleJob(job),
                        eligible_technicians: job_eligible,
                    });
                }
            }
            _ => result.push(EligibleItem { item, eligible_technicians: eligible }),
        }
    }
    result
}

fn required_equipment_for(item: &SchedulableItem, by_job: &RequiredEquipmentByJob) -> HashSet<EquipmentModel> {
    item.job_ids()
        .into_iter()
        .flat_map(|id| by_job.get(&id).cloned().unwrap_or_default())
        .collect()
}

fn eligible_technicians(
    technicians: &[TechnicianRecord],
    technician_equipment: &HashMap<TechnicianId, HashSet<&EquipmentModel>>,
    required: &HashSet<EquipmentModel>,
) -> Vec<TechnicianId> {
    technicians
        .iter()
        .filter(|technician| technician.van_id.is_some())
        .filter(|technician| {
            if required.is_empty() {
                return true;
            }
            let owned = technician_equipment.get(&technician.id).cloned().unwrap_or_default();
            required.iter().all(|model| owned.contains(model))
        })
        .map(|technician| technician.id)
        .collect()
}
