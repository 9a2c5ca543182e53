//! Core entities shared across every pipeline stage. Plain value structs,
//! joined from flat id-keyed collections at query time rather than modeled
//! as pointers chasing cyclic technician/van/equipment references.

pub mod coordinate;
pub mod item;
pub mod job;
pub mod technician;

pub use coordinate::{Coordinate, RoundedCoordinate};
pub use item::{EligibleItem, SchedulableItem};
pub use job::{JobId, JobRecord, JobStatus, JobUpdate, OrderId, TechnicianId};
pub use technician::{EquipmentModel, TechnicianAvailability, TechnicianRecord, VanId};
