//! Availability calculator. Pure functions over plain structs; the
//! reference instant is always passed in rather than read from the system
//! clock inside the algorithm, so the pass logic stays unit-testable and
//! never depends on host-local time.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use log::warn;

use crate::config::ReplanConfig;
use crate::domain::{Coordinate, JobRecord, TechnicianAvailability, TechnicianId, TechnicianRecord};
use crate::time_window::{clamp_to_window, working_window_for, WorkingWindow};

/// Today's availability: earliest-available instant and start coordinate
/// per technician, derived from `now` and each technician's locked jobs.
pub fn today_availability(
    config: &ReplanConfig,
    technicians: &[TechnicianRecord],
    locked_jobs: &[JobRecord],
    now: DateTime<Utc>,
    today: NaiveDate,
) -> HashMap<TechnicianId, TechnicianAvailability> {
    let window = working_window_for(config, today);

    let mut locked_by_technician: HashMap<TechnicianId, Vec<&JobRecord>> = HashMap::new();
    for job in locked_jobs {
        if let Some(tech_id) = job.assigned_technician {
            locked_by_technician.entry(tech_id).or_default().push(job);
        } else {
            warn!("locked job {} has no assigned technician; ignoring for availability", job.id);
        }
    }
    for jobs in locked_by_technician.values_mut() {
        jobs.sort_by_key(|j| j.effective_start());
    }

    technicians
        .iter()
        .map(|technician| {
            let availability = match window {
                None => {
                    // Non-working day: technician is effectively unavailable,
                    // represented as a window collapsed to its own end.
                    let end = window_end_or_now(window, now);
                    TechnicianAvailability {
                        technician_id: technician.id,
                        start: end,
                        end,
                        start_location: technician.current_location,
                    }
                }
                Some(window) => {
                    let mut earliest = clamp_to_window(now, window);
                    let mut start_location = technician.current_location;

                    if let Some(jobs) = locked_by_technician.get(&technician.id) {
                        for job in jobs {
                            let Some(job_start) = job.effective_start() else {
                                warn!(
                                    "locked job {} has no effective start time; skipping in availability",
                                    job.id
                                );
                                continue;
                            };
                            let job_end = job_start + job.duration();
                            if job_end > earliest {
                                earliest = job_end;
                                start_location = job.address;
                            }
                        }
                    }

                    earliest = earliest.min(window.end).max(window.start);
                    TechnicianAvailability {
                        technician_id: technician.id,
                        start: earliest,
                        end: window.end,
                        start_location,
                    }
                }
            };
            (technician.id, availability)
        })
        .collect()
}

fn window_end_or_now(window: Option<WorkingWindow>, now: DateTime<Utc>) -> DateTime<Utc> {
    window.map(|w| w.end).unwrap_or(now)
}

/// Future-day availability: a blank slate per technician with a home
/// coordinate. Technicians without one are skipped (with a warning); an
/// empty result means the target date is non-working.
pub fn future_day_availability(
    config: &ReplanConfig,
    technicians: &[TechnicianRecord],
    target_date: NaiveDate,
) -> Vec<TechnicianAvailability> {
    let Some(window) = working_window_for(config, target_date) else {
        return Vec::new();
    };

    technicians
        .iter()
        .filter_map(|technician| match technician.home_location {
            Some(home) => Some(TechnicianAvailability {
                technician_id: technician.id,
                start: window.start,
                end: window.end,
                start_location: Some(home),
            }),
            None => {
                warn!(
                    "technician {} has no home coordinate; excluded from future-day availability",
                    technician.id
                );
                None
            }
        })
        .collect()
}

/// Convenience accessor for when downstream code needs a concrete location
/// and must supply its own default for a missing one.
pub fn start_location_or(availability: &TechnicianAvailability, default: Coordinate) -> Coordinate {
    availability.start_location.unwrap_or(default)
}
