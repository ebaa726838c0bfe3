//! The polling loop: fetch every configured feed, map it, commit one snapshot,
//! sleep, repeat.
//!
//! Errors from fetching, decoding, mapping or committing end the current
//! iteration only. They are logged in [`Ingester::run`] and never stop the
//! loop. Run-once, the kill-after deadline and the shutdown channel are checked
//! outside that boundary so a stop request is never swallowed.

use std::time::Instant;

use sqlx::Connection;
use sqlx::sqlite::SqliteConnection;
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, info_span, trace, warn};

use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::fetch::{HttpClient, fetch_bytes};
use crate::mapping::map_feed;
use crate::model::Snapshot;
use crate::parser::{FeedKind, parse_feed};
use crate::store::{SnapshotCounts, write_snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Fetching,
    Mapping,
    Committing,
    Sleeping,
    Stopped,
}

/// Why [`Ingester::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Run-once mode finished its single iteration.
    Once,
    /// The kill-after deadline passed before an iteration started.
    Deadline,
    /// The shutdown channel was set.
    Shutdown,
}

pub struct Ingester<C> {
    client: C,
    conn: SqliteConnection,
    config: IngestConfig,
    state: State,
}

impl<C: HttpClient> Ingester<C> {
    /// Takes ownership of the store connection; it is closed when [`run`](Self::run) returns.
    pub fn new(client: C, conn: SqliteConnection, config: IngestConfig) -> Self {
        Self {
            client,
            conn,
            config,
            state: State::Idle,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }

    fn transition(&mut self, next: State) {
        trace!(from = ?self.state, to = ?next, "State transition");
        self.state = next;
    }

    fn deadline_passed(&self) -> bool {
        self.config
            .deadline
            .is_some_and(|deadline| Instant::now() > deadline)
    }

    /// Drives iterations until run-once completes, the deadline passes, or
    /// `shutdown` becomes `true`. Closes the store connection on every path.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> StopReason {
        let mut iteration: u64 = 0;

        let reason = loop {
            if *shutdown.borrow_and_update() {
                break StopReason::Shutdown;
            }
            if self.deadline_passed() {
                info!("Kill-after deadline reached");
                break StopReason::Deadline;
            }

            iteration += 1;
            let span = info_span!("iteration", n = iteration);
            match self.run_iteration().instrument(span).await {
                Ok(counts) => info!(
                    iteration,
                    counts = %counts.to_json().unwrap_or_else(|_| format!("{counts:?}")),
                    "Snapshot committed"
                ),
                Err(e) => error!(iteration, error = %e, "Exception occurred in iteration"),
            }

            if self.config.once {
                info!("Executed the load once, stopping");
                break StopReason::Once;
            }

            self.transition(State::Sleeping);
            debug!(secs = self.config.interval.as_secs(), "Waiting before next request");
            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                _ = shutdown_requested(&mut shutdown) => break StopReason::Shutdown,
            }
        };

        self.transition(State::Stopped);
        info!(?reason, "Closing store connection");
        if let Err(e) = self.conn.close().await {
            warn!(error = %e, "Failed to close store connection cleanly");
        }
        reason
    }

    /// Fetches and maps every configured feed, then commits them as one snapshot.
    ///
    /// The first failing feed aborts the iteration and nothing is committed.
    pub async fn run_iteration(&mut self) -> Result<SnapshotCounts, IngestError> {
        let feeds: Vec<(FeedKind, String)> = self
            .config
            .feeds
            .configured()
            .map(|(kind, url)| (kind, url.to_string()))
            .collect();

        let mut snapshot = Snapshot::default();
        for (kind, url) in &feeds {
            let span = info_span!("feed", kind = %kind, url = %url);
            self.ingest_feed(*kind, url, &mut snapshot)
                .instrument(span)
                .await?;
        }

        if snapshot.is_empty() {
            debug!(discard_old = self.config.discard_old, "No entities mapped this iteration");
        }

        self.transition(State::Committing);
        let counts = write_snapshot(&mut self.conn, self.config.discard_old, &snapshot).await?;
        Ok(counts)
    }

    async fn ingest_feed(
        &mut self,
        kind: FeedKind,
        url: &str,
        snapshot: &mut Snapshot,
    ) -> Result<usize, IngestError> {
        self.transition(State::Fetching);
        let bytes = fetch_bytes(&self.client, url)
            .await
            .map_err(|source| IngestError::Fetch { kind, source })?;

        self.transition(State::Mapping);
        let feed = parse_feed(kind, &bytes)?;
        trace!(decoded = ?feed.message, "Decoded feed");
        feed.check_version();

        let added = map_feed(&feed, &self.config.language, snapshot)
            .map_err(|source| IngestError::Mapping { kind, source })?;
        info!(
            header_timestamp = feed.timestamp(),
            entities = feed.entities().len(),
            added,
            "Adding {added} {kind}"
        );
        Ok(added)
    }
}

/// Resolves once `rx` holds `true`. A dropped sender never resolves.
async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
