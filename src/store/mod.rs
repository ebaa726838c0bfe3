//! SQLite persistence: the schema bootstrap and the snapshot writer.
//!
//! The ingester holds exactly one [`SqliteConnection`] for its lifetime and
//! runs one transaction at a time on it.

pub mod schema;
mod writer;

pub use writer::{SnapshotCounts, write_snapshot};

use std::str::FromStr;

use sqlx::Connection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use tracing::debug;

/// Opens the store named by `dsn`, e.g. `sqlite:gtfsrdb.db?mode=rwc`.
pub async fn connect(dsn: &str) -> Result<SqliteConnection, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(dsn)?.foreign_keys(true);
    let conn = SqliteConnection::connect_with(&options).await?;
    debug!(dsn, "Connected to store");
    Ok(conn)
}
