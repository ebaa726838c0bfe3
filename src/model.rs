//! Relational rows produced from decoded feeds.
//!
//! Foreign keys into the static schedule (`trip_id`, `route_id`, `stop_id`,
//! `agency_id`) are plain identifiers; nothing here checks them. Fields the
//! feed leaves unset are stored as NULL.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripUpdate {
    pub trip_id: Option<String>,
    pub route_id: Option<String>,
    pub trip_start_time: Option<String>,
    pub trip_start_date: Option<String>,
    pub schedule_relationship: String,
    pub vehicle_id: Option<String>,
    pub vehicle_label: Option<String>,
    pub vehicle_license_plate: Option<String>,
    pub timestamp: DateTime<Utc>,

    /// In feed order.
    pub stop_time_updates: Vec<StopTimeUpdate>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StopTimeUpdate {
    pub stop_sequence: Option<u32>,
    pub stop_id: Option<String>,
    pub arrival_delay: Option<i32>,
    pub arrival_time: Option<i64>,
    pub arrival_uncertainty: Option<i32>,
    pub departure_delay: Option<i32>,
    pub departure_time: Option<i64>,
    pub departure_uncertainty: Option<i32>,
    /// Always the owning trip's relationship.
    pub schedule_relationship: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alert {
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub cause: String,
    pub effect: String,
    pub url: Option<String>,
    pub header_text: Option<String>,
    pub description_text: Option<String>,

    /// In feed order.
    pub informed_entities: Vec<EntitySelector>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntitySelector {
    pub agency_id: Option<String>,
    pub route_id: Option<String>,
    pub route_type: Option<i32>,
    pub stop_id: Option<String>,
    pub trip_id: Option<String>,
    pub trip_route_id: Option<String>,
    pub trip_start_time: Option<String>,
    pub trip_start_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehiclePosition {
    pub trip_id: Option<String>,
    pub route_id: Option<String>,
    pub trip_start_time: Option<String>,
    pub trip_start_date: Option<String>,
    pub vehicle_id: Option<String>,
    pub vehicle_label: Option<String>,
    pub vehicle_license_plate: Option<String>,
    pub position_latitude: Option<f32>,
    pub position_longitude: Option<f32>,
    pub position_bearing: Option<f32>,
    pub position_speed: Option<f32>,
    pub occupancy_status: String,
    pub timestamp: DateTime<Utc>,
}

/// Everything mapped during one iteration, committed as a unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub trip_updates: Vec<TripUpdate>,
    pub alerts: Vec<Alert>,
    pub vehicle_positions: Vec<VehiclePosition>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.trip_updates.is_empty() && self.alerts.is_empty() && self.vehicle_positions.is_empty()
    }
}
