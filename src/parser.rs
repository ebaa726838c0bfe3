//! Protobuf decoder for GTFS Realtime feeds.

use std::fmt;

use prost::Message;
use tracing::warn;

use crate::error::DecodeError;
use crate::gtfs_rt::{FeedEntity, FeedMessage};

/// The `gtfs_realtime_version` this ingester was written against.
pub const EXPECTED_VERSION: &str = "1.0";

/// The three kinds of feed an agency may publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    TripUpdates,
    Alerts,
    VehiclePositions,
}

impl FeedKind {
    /// Processing order within one iteration.
    pub const ALL: [FeedKind; 3] = [
        FeedKind::TripUpdates,
        FeedKind::Alerts,
        FeedKind::VehiclePositions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedKind::TripUpdates => "trip updates",
            FeedKind::Alerts => "alerts",
            FeedKind::VehiclePositions => "vehicle positions",
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded [`FeedMessage`] tagged with the kind it was requested as.
#[derive(Debug, Clone)]
pub struct DecodedFeed {
    pub kind: FeedKind,
    pub message: FeedMessage,
}

impl DecodedFeed {
    /// Header timestamp in POSIX seconds. An unset timestamp reads as 0.
    pub fn timestamp(&self) -> u64 {
        self.message.header.timestamp.unwrap_or(0)
    }

    pub fn version(&self) -> &str {
        &self.message.header.gtfs_realtime_version
    }

    pub fn entities(&self) -> &[FeedEntity] {
        &self.message.entity
    }

    /// Warns when the feed declares a version other than [`EXPECTED_VERSION`].
    ///
    /// A mismatch is not an error; the feed is still ingested.
    pub fn check_version(&self) -> bool {
        let matches = self.version() == EXPECTED_VERSION;
        if !matches {
            warn!(
                feed = %self.kind,
                found = self.version(),
                expected = EXPECTED_VERSION,
                "Feed version has changed"
            );
        }
        matches
    }
}

/// Decodes a protobuf-encoded GTFS-RT [`FeedMessage`] from raw bytes.
///
/// # Errors
///
/// Returns a [`DecodeError`] if the bytes are not valid protobuf for a `FeedMessage`.
pub fn parse_feed(kind: FeedKind, bytes: &[u8]) -> Result<DecodedFeed, DecodeError> {
    let message = FeedMessage::decode(bytes).map_err(|source| DecodeError { kind, source })?;
    Ok(DecodedFeed { kind, message })
}
