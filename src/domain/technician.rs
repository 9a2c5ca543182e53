use super::coordinate::Coordinate;
use super::job::TechnicianId;

pub type VanId = i64;
pub type EquipmentModel = String;

/// A technician exactly as fetched from the store (`getActiveTechnicians`).
/// Read-only for the lifetime of a replan cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct TechnicianRecord {
    pub id: TechnicianId,
    pub van_id: Option<VanId>,
    pub current_location: Option<Coordinate>,
    pub home_location: Option<Coordinate>,
}

/// Per-pass availability window for one technician.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TechnicianAvailability {
    pub technician_id: TechnicianId,
    pub start: chrono::DateTime<chrono::Utc>,
    pub end: chrono::DateTime<chrono::Utc>,
    pub start_location: Option<Coordinate>,
}
