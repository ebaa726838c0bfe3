//! Error taxonomy for the ingestion pipeline.
//!
//! Only [`ConfigError`] is fatal. Every other error is produced by one stage of
//! an iteration and is caught at the iteration boundary in [`crate::ingest`].

use thiserror::Error;

use crate::parser::FeedKind;
use crate::resolve::EnumKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No database specified!")]
    MissingDatabase,
    #[error("No trip updates, alerts, or vehicle positions URLs were specified!")]
    NoFeedUrls,
    #[error("Invalid header JSON: {0}")]
    HeaderJson(#[from] serde_json::Error),
    #[error("Header JSON must be an object of string values, got: {0}")]
    HeaderShape(String),
    #[error("Invalid header name {0:?}")]
    HeaderName(String),
    #[error("Invalid value for header {0:?}")]
    HeaderValue(String),
    #[error("Invalid kill-after value: {0}")]
    KillAfter(f64),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid feed URL {url}: {message}")]
    Url { url: String, message: String },
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

#[derive(Debug, Error)]
#[error("Malformed {kind} feed: {source}")]
pub struct DecodeError {
    pub kind: FeedKind,
    #[source]
    pub source: prost::DecodeError,
}

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("{value} is not a declared {kind} value")]
    UnknownEnumValue { kind: EnumKind, value: i32 },
    #[error("Alert entity {entity_id} has no active period")]
    NoActivePeriod { entity_id: String },
    #[error("Timestamp {0} is out of range")]
    Timestamp(u64),
}

#[derive(Debug, Error)]
#[error("Snapshot write failed: {0}")]
pub struct WriteError(#[from] pub sqlx::Error);

/// Any failure that can end a single iteration early.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{kind} fetch failed: {source}")]
    Fetch {
        kind: FeedKind,
        #[source]
        source: FetchError,
    },
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("{kind} mapping failed: {source}")]
    Mapping {
        kind: FeedKind,
        #[source]
        source: MappingError,
    },
    #[error(transparent)]
    Write(#[from] WriteError),
}
