use chrono::{DateTime, Utc};

use crate::error::MappingError;
use crate::gtfs_rt;
use crate::model::VehiclePosition;
use crate::resolve::EnumKind;

pub fn map_vehicle_position(
    vp: &gtfs_rt::VehiclePosition,
    timestamp: DateTime<Utc>,
) -> Result<VehiclePosition, MappingError> {
    let trip = vp.trip.as_ref();
    let vehicle = vp.vehicle.as_ref();
    let position = vp.position.as_ref();

    Ok(VehiclePosition {
        trip_id: trip.and_then(|t| t.trip_id.clone()),
        route_id: trip.and_then(|t| t.route_id.clone()),
        trip_start_time: trip.and_then(|t| t.start_time.clone()),
        trip_start_date: trip.and_then(|t| t.start_date.clone()),
        vehicle_id: vehicle.and_then(|v| v.id.clone()),
        vehicle_label: vehicle.and_then(|v| v.label.clone()),
        vehicle_license_plate: vehicle.and_then(|v| v.license_plate.clone()),
        position_latitude: position.map(|p| p.latitude),
        position_longitude: position.map(|p| p.longitude),
        position_bearing: position.and_then(|p| p.bearing),
        position_speed: position.and_then(|p| p.speed),
        occupancy_status: EnumKind::OccupancyStatus
            .name_of(vp.occupancy_status)?
            .to_string(),
        timestamp,
    })
}
