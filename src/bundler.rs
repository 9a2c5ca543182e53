//! Bundler. Groups jobs sharing an order id into a single schedulable
//! unit. Deterministic for a fixed input order: groups are emitted in the
//! order their first constituent was first seen.

use std::collections::HashMap;

use crate::domain::{JobRecord, SchedulableItem};

pub fn bundle(jobs: &[JobRecord]) -> Vec<SchedulableItem> {
    let mut order_of_first_sight: Vec<i64> = Vec::new();
    let mut groups: HashMap<i64, Vec<JobRecord>> = HashMap::new();

    for job in jobs {
        groups.entry(job.order_id).or_insert_with(|| {
            order_of_first_sight.push(job.order_id);
            Vec::new()
        });
        groups.get_mut(&job.order_id).unwrap().push(job.clone());
    }

    order_of_first_sight
        .into_iter()
        .map(|order_id| {
            let mut constituents = groups.remove(&order_id).unwrap();
            if constituents.len() == 1 {
                SchedulableItem::SingleJob(constituents.pop().unwrap())
            } else {
                SchedulableItem::Bundle { order_id, jobs: constituents }
            }
        })
        .collect()
}
