//! The five real-time tables. Static GTFS tables are never touched here.

use sqlx::sqlite::SqliteConnection;
use tracing::info;

pub const TRIP_UPDATES: &str = "trip_updates";
pub const STOP_TIME_UPDATES: &str = "stop_time_updates";
pub const ALERTS: &str = "alerts";
pub const ENTITY_SELECTORS: &str = "entity_selectors";
pub const VEHICLE_POSITIONS: &str = "vehicle_positions";

/// Creation order; parents precede the children that reference them.
const TABLES: [(&str, &str); 5] = [
    (
        TRIP_UPDATES,
        r#"
        CREATE TABLE IF NOT EXISTS trip_updates (
            oid INTEGER PRIMARY KEY AUTOINCREMENT,
            trip_id TEXT,
            route_id TEXT,
            trip_start_time TEXT,
            trip_start_date TEXT,
            schedule_relationship TEXT,
            vehicle_id TEXT,
            vehicle_label TEXT,
            vehicle_license_plate TEXT,
            timestamp DATETIME
        )
        "#,
    ),
    (
        STOP_TIME_UPDATES,
        r#"
        CREATE TABLE IF NOT EXISTS stop_time_updates (
            oid INTEGER PRIMARY KEY AUTOINCREMENT,
            stop_sequence INTEGER,
            stop_id TEXT,
            arrival_delay INTEGER,
            arrival_time INTEGER,
            arrival_uncertainty INTEGER,
            departure_delay INTEGER,
            departure_time INTEGER,
            departure_uncertainty INTEGER,
            schedule_relationship TEXT,
            trip_update_id INTEGER NOT NULL REFERENCES trip_updates(oid) ON DELETE CASCADE
        )
        "#,
    ),
    (
        ALERTS,
        r#"
        CREATE TABLE IF NOT EXISTS alerts (
            oid INTEGER PRIMARY KEY AUTOINCREMENT,
            start INTEGER,
            "end" INTEGER,
            cause TEXT,
            effect TEXT,
            url TEXT,
            header_text TEXT,
            description_text TEXT
        )
        "#,
    ),
    (
        ENTITY_SELECTORS,
        r#"
        CREATE TABLE IF NOT EXISTS entity_selectors (
            oid INTEGER PRIMARY KEY AUTOINCREMENT,
            agency_id TEXT,
            route_id TEXT,
            route_type INTEGER,
            stop_id TEXT,
            trip_id TEXT,
            trip_route_id TEXT,
            trip_start_time TEXT,
            trip_start_date TEXT,
            alert_id INTEGER NOT NULL REFERENCES alerts(oid) ON DELETE CASCADE
        )
        "#,
    ),
    (
        VEHICLE_POSITIONS,
        r#"
        CREATE TABLE IF NOT EXISTS vehicle_positions (
            oid INTEGER PRIMARY KEY AUTOINCREMENT,
            trip_id TEXT,
            route_id TEXT,
            trip_start_time TEXT,
            trip_start_date TEXT,
            vehicle_id TEXT,
            vehicle_label TEXT,
            vehicle_license_plate TEXT,
            position_latitude REAL,
            position_longitude REAL,
            position_bearing REAL,
            position_speed REAL,
            occupancy_status TEXT,
            timestamp DATETIME
        )
        "#,
    ),
];

/// Real-time tables not present in the store, in creation order.
pub async fn missing_tables(conn: &mut SqliteConnection) -> Result<Vec<&'static str>, sqlx::Error> {
    let existing: Vec<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
            .fetch_all(&mut *conn)
            .await?;

    Ok(TABLES
        .iter()
        .map(|(name, _)| *name)
        .filter(|name| !existing.iter().any(|e| e == name))
        .collect())
}

/// Creates whichever real-time tables are missing.
pub async fn create_tables(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    let missing = missing_tables(conn).await?;
    for (name, ddl) in TABLES.iter().filter(|(name, _)| missing.contains(name)) {
        info!(table = name, "Creating table");
        sqlx::query(ddl).execute(&mut *conn).await?;
    }
    Ok(())
}
