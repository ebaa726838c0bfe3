//! Pure transformations from decoded feed entities to relational rows.
//!
//! One submodule per feed kind. None of them perform I/O.

mod alert;
mod trip_update;
mod vehicle;

pub use alert::map_alert;
pub use trip_update::map_trip_update;
pub use vehicle::map_vehicle_position;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::MappingError;
use crate::model::Snapshot;
use crate::parser::{DecodedFeed, FeedKind};

/// Converts a feed header timestamp to a UTC instant.
pub fn feed_timestamp(secs: u64) -> Result<DateTime<Utc>, MappingError> {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .ok_or(MappingError::Timestamp(secs))
}

/// Maps every entity of `feed` and appends the rows to `snapshot`.
///
/// Entities that carry no payload of the feed's kind (a vehicle inside a trip
/// updates feed, say) are skipped with a debug log instead of producing an
/// empty row, so a feed may map to fewer rows than it has entities. Returns
/// the number of top-level rows added.
pub fn map_feed(
    feed: &DecodedFeed,
    language: &str,
    snapshot: &mut Snapshot,
) -> Result<usize, MappingError> {
    let timestamp = feed_timestamp(feed.timestamp())?;
    let mut added = 0;

    for entity in feed.entities() {
        let pushed = match feed.kind {
            FeedKind::TripUpdates => match &entity.trip_update {
                Some(tu) => {
                    snapshot.trip_updates.push(map_trip_update(tu, timestamp)?);
                    true
                }
                None => false,
            },
            FeedKind::Alerts => match &entity.alert {
                Some(alert) => {
                    snapshot.alerts.push(map_alert(&entity.id, alert, language)?);
                    true
                }
                None => false,
            },
            FeedKind::VehiclePositions => match &entity.vehicle {
                Some(vp) => {
                    snapshot.vehicle_positions.push(map_vehicle_position(vp, timestamp)?);
                    true
                }
                None => false,
            },
        };

        if pushed {
            added += 1;
        } else {
            debug!(feed = %feed.kind, entity_id = %entity.id, "Skipping entity without payload");
        }
    }

    Ok(added)
}
