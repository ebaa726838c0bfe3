//! Command-line surface and the validated configuration built from it.

use std::time::{Duration, Instant};

use clap::Parser;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::warn;

use crate::error::ConfigError;
use crate::parser::FeedKind;

#[derive(Parser, Debug, Clone)]
#[command(name = "gtfs_rt_db")]
#[command(about = "Load GTFS-realtime feeds into a database", long_about = None)]
pub struct Args {
    /// The trip updates URL
    #[arg(short = 't', long, env = "GTFSRDB_TRIP_UPDATES", value_name = "URL")]
    pub trip_updates: Option<String>,

    /// The alerts URL
    #[arg(short = 'a', long, env = "GTFSRDB_ALERTS", value_name = "URL")]
    pub alerts: Option<String>,

    /// The vehicle positions URL
    #[arg(short = 'p', long, env = "GTFSRDB_VEHICLE_POSITIONS", value_name = "URL")]
    pub vehicle_positions: Option<String>,

    /// Database connection string, e.g. "sqlite:gtfsrdb.db?mode=rwc"
    #[arg(short = 'd', long, env = "DATABASE_URL", value_name = "DSN")]
    pub database: Option<String>,

    /// Discard old updates, so the database is always current
    #[arg(short = 'o', long)]
    pub discard_old: bool,

    /// Create tables if they aren't found
    #[arg(short = 'c', long)]
    pub create_tables: bool,

    /// Only issue a request once
    #[arg(short = '1', long)]
    pub once: bool,

    /// Time to wait between requests (in seconds)
    #[arg(short = 'w', long, default_value_t = 10, value_name = "SECS")]
    pub wait: u64,

    /// Kill process after this many minutes (0 = never)
    #[arg(short = 'k', long, default_value_t = 0.0, value_name = "MINUTES")]
    pub kill_after: f64,

    /// Log debug output, including decoded feeds
    #[arg(short = 'v', long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Don't print warnings and status messages
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// When multiple translations are available, prefer this language
    #[arg(short = 'l', long, default_value = "en", value_name = "LANG")]
    pub language: String,

    /// Extra HTTP headers such as an API key, as a JSON object
    #[arg(short = 'H', long, value_name = "JSON")]
    pub header: Option<String>,
}

/// Feed URLs by kind. Any subset may be configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedUrls {
    pub trip_updates: Option<String>,
    pub alerts: Option<String>,
    pub vehicle_positions: Option<String>,
}

impl FeedUrls {
    pub fn get(&self, kind: FeedKind) -> Option<&str> {
        match kind {
            FeedKind::TripUpdates => self.trip_updates.as_deref(),
            FeedKind::Alerts => self.alerts.as_deref(),
            FeedKind::VehiclePositions => self.vehicle_positions.as_deref(),
        }
    }

    /// Configured feeds in processing order.
    pub fn configured(&self) -> impl Iterator<Item = (FeedKind, &str)> {
        FeedKind::ALL
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|url| (kind, url)))
    }

    pub fn is_empty(&self) -> bool {
        self.configured().next().is_none()
    }
}

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub database: String,
    pub feeds: FeedUrls,
    pub headers: HeaderMap,
    pub discard_old: bool,
    pub create_tables: bool,
    pub once: bool,
    pub interval: Duration,
    /// Wall-clock cutoff checked before each iteration.
    pub deadline: Option<Instant>,
    pub language: String,
}

impl IngestConfig {
    /// Validates `args`. The kill-after deadline starts counting now.
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let database = args
            .database
            .clone()
            .filter(|d| !d.is_empty())
            .ok_or(ConfigError::MissingDatabase)?;

        let non_empty = |url: &Option<String>| url.clone().filter(|u| !u.is_empty());
        let feeds = FeedUrls {
            trip_updates: non_empty(&args.trip_updates),
            alerts: non_empty(&args.alerts),
            vehicle_positions: non_empty(&args.vehicle_positions),
        };
        if feeds.is_empty() {
            return Err(ConfigError::NoFeedUrls);
        }
        for kind in FeedKind::ALL {
            if feeds.get(kind).is_none() {
                warn!(feed = %kind, "No {kind} URL specified, proceeding without {kind}");
            }
        }

        let headers = match &args.header {
            Some(json) => parse_headers(json)?,
            None => HeaderMap::new(),
        };

        let deadline = if args.kill_after > 0.0 {
            let after = Duration::try_from_secs_f64(args.kill_after * 60.0)
                .map_err(|_| ConfigError::KillAfter(args.kill_after))?;
            let deadline = Instant::now()
                .checked_add(after)
                .ok_or(ConfigError::KillAfter(args.kill_after))?;
            Some(deadline)
        } else if args.kill_after.is_nan() {
            return Err(ConfigError::KillAfter(args.kill_after));
        } else {
            None
        };

        Ok(Self {
            database,
            feeds,
            headers,
            discard_old: args.discard_old,
            create_tables: args.create_tables,
            once: args.once,
            interval: Duration::from_secs(args.wait),
            deadline,
            language: args.language.clone(),
        })
    }
}

/// Parses a JSON object such as `{"x-api-key": "secret"}` into request headers.
pub fn parse_headers(json: &str) -> Result<HeaderMap, ConfigError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let serde_json::Value::Object(entries) = value else {
        return Err(ConfigError::HeaderShape(json.to_string()));
    };

    let mut headers = HeaderMap::new();
    for (name, value) in entries {
        let serde_json::Value::String(value) = value else {
            return Err(ConfigError::HeaderShape(json.to_string()));
        };
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ConfigError::HeaderName(name.clone()))?;
        let header_value =
            HeaderValue::from_str(&value).map_err(|_| ConfigError::HeaderValue(name.clone()))?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}
