//! Payload assembler. Transforms availability + eligible items + fixed
//! constraints + matrix into the solver request.

use std::collections::HashMap;

use log::warn;

use crate::config::ReplanConfig;
use crate::domain::{Coordinate, EligibleItem, JobRecord, TechnicianAvailability, TechnicianId};
use crate::oracle::TravelTimeOracle;
use crate::solver_client::{SolverFixedConstraint, SolverItem, SolverLocation, SolverRequest, SolverTechnician};
use crate::travel_cache::TravelTimeCache;
use crate::travel_matrix;

/// Built locations are deduplicated by coordinate equality and assigned a
/// dense index (§3 Location).
struct LocationSet {
    coordinates: Vec<Coordinate>,
    index_of: HashMap<(i64, i64), usize>,
}

impl LocationSet {
    fn new(depot: Coordinate) -> Self {
        let mut set = LocationSet { coordinates: Vec::new(), index_of: HashMap::new() };
        set.index_for(depot);
        set
    }

    fn index_for(&mut self, coordinate: Coordinate) -> usize {
        let key = coordinate.rounded_key();
        if let Some(&index) = self.index_of.get(&key) {
            return index;
        }
        let index = self.coordinates.len();
        self.coordinates.push(coordinate);
        self.index_of.insert(key, index);
        index
    }
}

/// Assembles the solver request for one pass. Returns `None` if, after
/// excluding items without a location, there is nothing left to schedule;
/// the pass is then skipped with no solver call.
pub async fn assemble(
    config: &ReplanConfig,
    availabilities: &HashMap<TechnicianId, TechnicianAvailability>,
    items: &[EligibleItem],
    fixed_time_jobs: &[JobRecord],
    oracle: &dyn TravelTimeOracle,
    cache: &TravelTimeCache,
) -> Option<SolverRequest> {
    let mut locations = LocationSet::new(config.depot);
    let depot_index = 0;

    let mut technician_start_index = HashMap::new();
    for availability in availabilities.values() {
        let start = availability.start_location.unwrap_or(config.depot);
        technician_start_index.insert(availability.technician_id, locations.index_for(start));
    }

    let mut solver_items = Vec::with_capacity(items.len());
    for eligible in items {
        let Some(address) = eligible.item.address() else {
            warn!("item {} has no coordinates; excluded from this pass", eligible.item.item_id());
            continue;
        };
        let location_index = locations.index_for(address);
        solver_items.push(SolverItem {
            id: eligible.item.item_id(),
            location_index,
            duration_seconds: eligible.item.duration_minutes() * 60,
            priority: eligible.item.priority(),
            eligible_technician_ids: eligible.eligible_technicians.clone(),
        });
    }

    if solver_items.is_empty() {
        return None;
    }

    let matrix = travel_matrix::build(
        &locations.coordinates,
        oracle,
        cache,
        config.oracle_concurrency,
        config.oracle_failure_penalty_seconds,
    )
    .await;

    let solver_technicians = availabilities
        .values()
        .map(|availability| SolverTechnician {
            id: availability.technician_id,
            start_location_index: *technician_start_index.get(&availability.technician_id).unwrap(),
            end_location_index: depot_index,
            earliest_start_time: availability.start,
            latest_end_time: availability.end,
        })
        .collect();

    let emitted_item_ids: std::collections::HashSet<_> =
        solver_items.iter().map(|i| i.id.clone()).collect();

    let mut fixed_constraints = Vec::new();
    for job in fixed_time_jobs {
        let item_id = format!("job_{}", job.id);
        if !emitted_item_ids.contains(&item_id) {
            warn!("fixed-time job {} is not among this pass's items; skipping its constraint", job.id);
            continue;
        }
        let Some(fixed_time) = job.fixed_start_time else {
            warn!("fixed-time job {} has no fixed_schedule_time; skipping its constraint", job.id);
            continue;
        };
        fixed_constraints.push(SolverFixedConstraint { item_id, fixed_time });
    }

    Some(SolverRequest {
        locations: locations
            .coordinates
            .iter()
            .enumerate()
            .map(|(index, coordinate)| SolverLocation { id: index, index, coords: (coordinate.lat, coordinate.lon) })
            .collect(),
        technicians: solver_technicians,
        items: solver_items,
        fixed_constraints,
        travel_time_matrix: matrix.matrix,
    })
}
