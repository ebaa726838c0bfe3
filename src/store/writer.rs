use serde::Serialize;
use sqlx::Connection;
use sqlx::sqlite::SqliteConnection;
use tracing::debug;

use super::schema::{ALERTS, ENTITY_SELECTORS, STOP_TIME_UPDATES, TRIP_UPDATES, VEHICLE_POSITIONS};
use crate::error::WriteError;
use crate::model::Snapshot;

/// Children before parents, so the wipe never trips a foreign key.
const DISCARD_ORDER: [&str; 5] = [
    STOP_TIME_UPDATES,
    ENTITY_SELECTORS,
    TRIP_UPDATES,
    ALERTS,
    VEHICLE_POSITIONS,
];

/// Rows inserted by one [`write_snapshot`] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SnapshotCounts {
    pub trip_updates: usize,
    pub stop_time_updates: usize,
    pub alerts: usize,
    pub entity_selectors: usize,
    pub vehicle_positions: usize,
}

impl SnapshotCounts {
    /// One-line JSON summary for the iteration log.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Persists `snapshot` in a single transaction.
///
/// With `discard_old`, every stored real-time row is deleted first, inside the
/// same transaction. On any error the transaction is dropped, which rolls it
/// back and leaves the store as it was.
pub async fn write_snapshot(
    conn: &mut SqliteConnection,
    discard_old: bool,
    snapshot: &Snapshot,
) -> Result<SnapshotCounts, WriteError> {
    let mut tx = conn.begin().await?;
    let mut counts = SnapshotCounts::default();

    if discard_old {
        for table in DISCARD_ORDER {
            let deleted = sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await?
                .rows_affected();
            debug!(table, deleted, "Discarded old rows");
        }
    }

    for tu in &snapshot.trip_updates {
        let parent = sqlx::query(
            r#"
            INSERT INTO trip_updates (
                trip_id, route_id, trip_start_time, trip_start_date, schedule_relationship,
                vehicle_id, vehicle_label, vehicle_license_plate, timestamp
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&tu.trip_id)
        .bind(&tu.route_id)
        .bind(&tu.trip_start_time)
        .bind(&tu.trip_start_date)
        .bind(&tu.schedule_relationship)
        .bind(&tu.vehicle_id)
        .bind(&tu.vehicle_label)
        .bind(&tu.vehicle_license_plate)
        .bind(tu.timestamp)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();
        counts.trip_updates += 1;

        for stu in &tu.stop_time_updates {
            sqlx::query(
                r#"
                INSERT INTO stop_time_updates (
                    stop_sequence, stop_id, arrival_delay, arrival_time, arrival_uncertainty,
                    departure_delay, departure_time, departure_uncertainty,
                    schedule_relationship, trip_update_id
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(stu.stop_sequence)
            .bind(&stu.stop_id)
            .bind(stu.arrival_delay)
            .bind(stu.arrival_time)
            .bind(stu.arrival_uncertainty)
            .bind(stu.departure_delay)
            .bind(stu.departure_time)
            .bind(stu.departure_uncertainty)
            .bind(&stu.schedule_relationship)
            .bind(parent)
            .execute(&mut *tx)
            .await?;
            counts.stop_time_updates += 1;
        }
    }

    for alert in &snapshot.alerts {
        let parent = sqlx::query(
            r#"
            INSERT INTO alerts (start, "end", cause, effect, url, header_text, description_text)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(alert.start)
        .bind(alert.end)
        .bind(&alert.cause)
        .bind(&alert.effect)
        .bind(&alert.url)
        .bind(&alert.header_text)
        .bind(&alert.description_text)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();
        counts.alerts += 1;

        for ie in &alert.informed_entities {
            sqlx::query(
                r#"
                INSERT INTO entity_selectors (
                    agency_id, route_id, route_type, stop_id, trip_id, trip_route_id,
                    trip_start_time, trip_start_date, alert_id
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&ie.agency_id)
            .bind(&ie.route_id)
            .bind(ie.route_type)
            .bind(&ie.stop_id)
            .bind(&ie.trip_id)
            .bind(&ie.trip_route_id)
            .bind(&ie.trip_start_time)
            .bind(&ie.trip_start_date)
            .bind(parent)
            .execute(&mut *tx)
            .await?;
            counts.entity_selectors += 1;
        }
    }

    for vp in &snapshot.vehicle_positions {
        sqlx::query(
            r#"
            INSERT INTO vehicle_positions (
                trip_id, route_id, trip_start_time, trip_start_date,
                vehicle_id, vehicle_label, vehicle_license_plate,
                position_latitude, position_longitude, position_bearing, position_speed,
                occupancy_status, timestamp
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&vp.trip_id)
        .bind(&vp.route_id)
        .bind(&vp.trip_start_time)
        .bind(&vp.trip_start_date)
        .bind(&vp.vehicle_id)
        .bind(&vp.vehicle_label)
        .bind(&vp.vehicle_license_plate)
        .bind(vp.position_latitude)
        .bind(vp.position_longitude)
        .bind(vp.position_bearing)
        .bind(vp.position_speed)
        .bind(&vp.occupancy_status)
        .bind(vp.timestamp)
        .execute(&mut *tx)
        .await?;
        counts.vehicle_positions += 1;
    }

    // Deletes and inserts become visible together.
    tx.commit().await?;

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Alert, EntitySelector, StopTimeUpdate, TripUpdate, VehiclePosition};
    use crate::store::{connect, schema};

    async fn store() -> SqliteConnection {
        let mut conn = connect("sqlite::memory:").await.unwrap();
        schema::create_tables(&mut conn).await.unwrap();
        conn
    }

    async fn count(conn: &mut SqliteConnection, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(conn)
            .await
            .unwrap()
    }

    fn snapshot(trip_id: &str) -> Snapshot {
        Snapshot {
            trip_updates: vec![TripUpdate {
                trip_id: Some(trip_id.to_string()),
                schedule_relationship: "SCHEDULED".to_string(),
                stop_time_updates: vec![
                    StopTimeUpdate {
                        stop_sequence: Some(1),
                        schedule_relationship: "SCHEDULED".to_string(),
                        ..Default::default()
                    },
                    StopTimeUpdate {
                        stop_sequence: Some(2),
                        schedule_relationship: "SCHEDULED".to_string(),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }],
            alerts: vec![Alert {
                start: Some(100),
                end: Some(200),
                cause: "STRIKE".to_string(),
                effect: "NO_SERVICE".to_string(),
                informed_entities: vec![EntitySelector {
                    route_id: Some("R1".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            vehicle_positions: vec![VehiclePosition {
                vehicle_id: Some("v1".to_string()),
                position_latitude: Some(1.5),
                occupancy_status: "EMPTY".to_string(),
                ..Default::default()
            }],
        }
    }

    #[tokio::test]
    async fn writes_parents_and_children() {
        let mut conn = store().await;

        let counts = write_snapshot(&mut conn, false, &snapshot("T1")).await.unwrap();

        assert_eq!(
            counts,
            SnapshotCounts {
                trip_updates: 1,
                stop_time_updates: 2,
                alerts: 1,
                entity_selectors: 1,
                vehicle_positions: 1,
            }
        );
        let orphaned: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM stop_time_updates s
             LEFT JOIN trip_updates t ON t.oid = s.trip_update_id WHERE t.oid IS NULL",
        )
        .fetch_one(&mut conn)
        .await
        .unwrap();
        assert_eq!(orphaned, 0);
    }

    #[test]
    fn counts_serialize_as_json() {
        let counts = SnapshotCounts {
            trip_updates: 1,
            stop_time_updates: 3,
            ..Default::default()
        };
        assert_eq!(
            counts.to_json().unwrap(),
            r#"{"trip_updates":1,"stop_time_updates":3,"alerts":0,"entity_selectors":0,"vehicle_positions":0}"#
        );
    }

    #[tokio::test]
    async fn appends_without_discard() {
        let mut conn = store().await;
        write_snapshot(&mut conn, false, &snapshot("T1")).await.unwrap();
        write_snapshot(&mut conn, false, &snapshot("T2")).await.unwrap();

        assert_eq!(count(&mut conn, "trip_updates").await, 2);
        assert_eq!(count(&mut conn, "stop_time_updates").await, 4);
    }

    #[tokio::test]
    async fn discard_replaces_previous_snapshot() {
        let mut conn = store().await;
        write_snapshot(&mut conn, false, &snapshot("T1")).await.unwrap();
        write_snapshot(&mut conn, true, &snapshot("T2")).await.unwrap();

        for table in DISCARD_ORDER {
            assert_eq!(count(&mut conn, table).await, if table == STOP_TIME_UPDATES { 2 } else { 1 });
        }
        let trip_id: String = sqlx::query_scalar("SELECT trip_id FROM trip_updates")
            .fetch_one(&mut conn)
            .await
            .unwrap();
        assert_eq!(trip_id, "T2");
    }

    #[tokio::test]
    async fn failed_write_leaves_old_snapshot_intact() {
        let mut conn = store().await;
        write_snapshot(&mut conn, false, &snapshot("T1")).await.unwrap();
        sqlx::query(
            "CREATE TRIGGER reject_vehicle BEFORE INSERT ON vehicle_positions
             BEGIN SELECT RAISE(ABORT, 'rejected'); END",
        )
        .execute(&mut conn)
        .await
        .unwrap();

        let result = write_snapshot(&mut conn, true, &snapshot("T2")).await;

        assert!(result.is_err());
        let trip_id: String = sqlx::query_scalar("SELECT trip_id FROM trip_updates")
            .fetch_one(&mut conn)
            .await
            .unwrap();
        assert_eq!(trip_id, "T1");
        assert_eq!(count(&mut conn, "stop_time_updates").await, 2);
        assert_eq!(count(&mut conn, "alerts").await, 1);
        assert_eq!(count(&mut conn, "entity_selectors").await, 1);
    }
}
