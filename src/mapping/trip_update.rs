use chrono::{DateTime, Utc};

use crate::error::MappingError;
use crate::gtfs_rt;
use crate::model::{StopTimeUpdate, TripUpdate};
use crate::resolve::EnumKind;

/// Builds one [`TripUpdate`] owning one [`StopTimeUpdate`] per stop, in feed order.
///
/// Every stop-time row takes the trip's schedule relationship. The per-stop
/// `schedule_relationship` carried by the feed is not read.
pub fn map_trip_update(
    tu: &gtfs_rt::TripUpdate,
    timestamp: DateTime<Utc>,
) -> Result<TripUpdate, MappingError> {
    let trip = &tu.trip;
    let schedule_relationship = EnumKind::ScheduleRelationship.name_of(trip.schedule_relationship)?;
    let vehicle = tu.vehicle.as_ref();

    let stop_time_updates = tu
        .stop_time_update
        .iter()
        .map(|stu| {
            let arrival = stu.arrival.as_ref();
            let departure = stu.departure.as_ref();
            StopTimeUpdate {
                stop_sequence: stu.stop_sequence,
                stop_id: stu.stop_id.clone(),
                arrival_delay: arrival.and_then(|e| e.delay),
                arrival_time: arrival.and_then(|e| e.time),
                arrival_uncertainty: arrival.and_then(|e| e.uncertainty),
                departure_delay: departure.and_then(|e| e.delay),
                departure_time: departure.and_then(|e| e.time),
                departure_uncertainty: departure.and_then(|e| e.uncertainty),
                schedule_relationship: schedule_relationship.to_string(),
            }
        })
        .collect();

    Ok(TripUpdate {
        trip_id: trip.trip_id.clone(),
        route_id: trip.route_id.clone(),
        trip_start_time: trip.start_time.clone(),
        trip_start_date: trip.start_date.clone(),
        schedule_relationship: schedule_relationship.to_string(),
        vehicle_id: vehicle.and_then(|v| v.id.clone()),
        vehicle_label: vehicle.and_then(|v| v.label.clone()),
        vehicle_license_plate: vehicle.and_then(|v| v.license_plate.clone()),
        timestamp,
        stop_time_updates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs_rt::trip_update::{StopTimeEvent, StopTimeUpdate as RtStopTimeUpdate};
    use crate::gtfs_rt::{TripDescriptor, VehicleDescriptor};

    fn stop(seq: u32, stop_id: &str, delay: i32) -> RtStopTimeUpdate {
        RtStopTimeUpdate {
            stop_sequence: Some(seq),
            stop_id: Some(stop_id.to_string()),
            arrival: Some(StopTimeEvent {
                delay: Some(delay),
                time: Some(1_700_000_000 + delay as i64),
                uncertainty: Some(30),
                ..Default::default()
            }),
            // SKIPPED on the stop itself
            schedule_relationship: Some(1),
            ..Default::default()
        }
    }

    fn trip_update(relationship: Option<i32>) -> gtfs_rt::TripUpdate {
        gtfs_rt::TripUpdate {
            trip: TripDescriptor {
                trip_id: Some("trip-1".to_string()),
                route_id: Some("route-9".to_string()),
                start_time: Some("08:15:00".to_string()),
                start_date: Some("20240102".to_string()),
                schedule_relationship: relationship,
                ..Default::default()
            },
            vehicle: Some(VehicleDescriptor {
                id: Some("bus-42".to_string()),
                label: Some("42".to_string()),
                license_plate: Some("ABC123".to_string()),
                ..Default::default()
            }),
            stop_time_update: vec![stop(1, "s1", 0), stop(2, "s2", 60), stop(3, "s3", 120)],
            ..Default::default()
        }
    }

    #[test]
    fn maps_trip_with_three_stops_in_order() {
        let ts = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let row = map_trip_update(&trip_update(Some(1)), ts).unwrap();

        assert_eq!(row.trip_id.as_deref(), Some("trip-1"));
        assert_eq!(row.route_id.as_deref(), Some("route-9"));
        assert_eq!(row.trip_start_date.as_deref(), Some("20240102"));
        assert_eq!(row.schedule_relationship, "ADDED");
        assert_eq!(row.vehicle_license_plate.as_deref(), Some("ABC123"));
        assert_eq!(row.timestamp, ts);

        assert_eq!(row.stop_time_updates.len(), 3);
        let ids: Vec<_> = row
            .stop_time_updates
            .iter()
            .map(|s| s.stop_id.as_deref().unwrap())
            .collect();
        assert_eq!(ids, ["s1", "s2", "s3"]);
        assert!(row
            .stop_time_updates
            .iter()
            .all(|s| s.schedule_relationship == "ADDED"));
        assert_eq!(row.stop_time_updates[1].arrival_delay, Some(60));
        assert_eq!(row.stop_time_updates[1].departure_delay, None);
    }

    #[test]
    fn unset_relationship_is_scheduled() {
        let ts = DateTime::from_timestamp(0, 0).unwrap();
        let row = map_trip_update(&trip_update(None), ts).unwrap();
        assert_eq!(row.schedule_relationship, "SCHEDULED");
    }

    #[test]
    fn undeclared_relationship_fails() {
        let ts = DateTime::from_timestamp(0, 0).unwrap();
        let err = map_trip_update(&trip_update(Some(4)), ts).unwrap_err();
        assert!(matches!(err, MappingError::UnknownEnumValue { value: 4, .. }));
    }
}
