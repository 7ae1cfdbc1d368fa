//! Refresh coordinator
//!
//! Fetches the document for one location on a fixed interval and publishes
//! it as an immutable snapshot. Every reading renders from the same snapshot,
//! so a refresh never shows half of an old document and half of a new one.

use crate::api::DataSource;
use crate::models::{Document, Location};
use crate::Result;
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Time between two refreshes
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// The document readers see; `None` until the first non-empty fetch
pub type Snapshot = Option<Arc<Document>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinatorState {
    Idle,
    Refreshing,
}

/// Outcome of the last refreshes, for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateStatus {
    pub state: CoordinatorState,
    pub last_update_success: bool,
    pub last_error: Option<String>,
    pub last_success_at: Option<DateTime<Utc>>,
}

impl Default for UpdateStatus {
    fn default() -> Self {
        Self {
            state: CoordinatorState::Idle,
            last_update_success: true,
            last_error: None,
            last_success_at: None,
        }
    }
}

/// What a call to [`RefreshCoordinator::refresh`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new document was published
    Updated,
    /// The API answered with an empty document; the previous one is kept
    NoData(String),
    /// Another refresh was already in flight
    Skipped,
}

/// Message recorded when the API has nothing for a location
#[must_use]
pub fn no_data_message(insee: &str, date: NaiveDate) -> String {
    format!(
        "No data from Recosanté for INSEE code {insee} and date {}",
        date.format("%Y-%m-%d")
    )
}

pub struct RefreshCoordinator<S> {
    source: S,
    location: Location,
    interval: Duration,
    document: watch::Sender<Snapshot>,
    status: watch::Sender<UpdateStatus>,
    in_flight: Mutex<()>,
}

// Puts the coordinator back to idle however the refresh ends, cancellation included.
struct RefreshingGuard<'a>(&'a watch::Sender<UpdateStatus>);

impl<'a> RefreshingGuard<'a> {
    fn enter(status: &'a watch::Sender<UpdateStatus>) -> Self {
        status.send_modify(|s| s.state = CoordinatorState::Refreshing);
        Self(status)
    }
}

impl Drop for RefreshingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|s| s.state = CoordinatorState::Idle);
    }
}

impl<S: DataSource> RefreshCoordinator<S> {
    /// Coordinator refreshing every [`REFRESH_INTERVAL`]
    pub fn new(source: S, location: Location) -> Self {
        Self::with_interval(source, location, REFRESH_INTERVAL)
    }

    pub fn with_interval(source: S, location: Location, interval: Duration) -> Self {
        let (document, _) = watch::channel(None);
        let (status, _) = watch::channel(UpdateStatus::default());
        Self {
            source,
            location,
            interval,
            document,
            status,
            in_flight: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The current document
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.document.borrow().clone()
    }

    /// Receiver notified every time a new document is published
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.document.subscribe()
    }

    #[must_use]
    pub fn status(&self) -> UpdateStatus {
        self.status.borrow().clone()
    }

    /// Initial refresh run during setup, before readings are first rendered.
    ///
    /// Transport and parse failures abort setup; an empty document does not.
    pub async fn first_refresh(&self) -> Result<RefreshOutcome> {
        info!(
            "First refresh for {} ({})",
            self.location.name, self.location.insee
        );
        self.refresh().await
    }

    /// Fetch once and publish the result.
    ///
    /// Empty documents are reported as [`RefreshOutcome::NoData`] and leave
    /// the published snapshot untouched. Fetch errors are recorded in the
    /// status and returned.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let Ok(_in_flight) = self.in_flight.try_lock() else {
            debug!("Refresh already in flight for INSEE {}", self.location.insee);
            return Ok(RefreshOutcome::Skipped);
        };
        let _refreshing = RefreshingGuard::enter(&self.status);

        match self.source.fetch(&self.location.insee).await {
            Ok(document) if document.is_empty() => {
                let message = no_data_message(&self.location.insee, Local::now().date_naive());
                warn!("{}", message);
                self.status.send_modify(|s| {
                    s.last_update_success = false;
                    s.last_error = Some(message.clone());
                });
                Ok(RefreshOutcome::NoData(message))
            }
            Ok(document) => {
                info!(
                    "Published {} categories for {}",
                    document.len(),
                    self.location.name
                );
                self.document.send_replace(Some(Arc::new(document)));
                self.status.send_modify(|s| {
                    s.last_update_success = true;
                    s.last_error = None;
                    s.last_success_at = Some(Utc::now());
                });
                Ok(RefreshOutcome::Updated)
            }
            Err(e) => {
                error!(
                    "Error fetching Recosanté data for INSEE {}: {}",
                    self.location.insee, e
                );
                self.status.send_modify(|s| {
                    s.last_update_success = false;
                    s.last_error = Some(e.to_string());
                });
                Err(e)
            }
        }
    }
}

impl<S: DataSource + 'static> RefreshCoordinator<S> {
    /// Refresh every interval until `cancel` fires.
    ///
    /// The first tick comes one interval from now: setup is expected to have
    /// called [`first_refresh`](Self::first_refresh) already. A fetch still
    /// in flight on cancellation is dropped.
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                tokio::select! {
                    () = cancel.cancelled() => {
                        debug!("Abandoning in-flight refresh for INSEE {}", self.location.insee);
                        break;
                    }
                    result = self.refresh() => {
                        if let Err(e) = result {
                            warn!("Scheduled refresh failed, retrying next tick: {}", e);
                        }
                    }
                }
            }

            debug!("Refresh loop for INSEE {} stopped", self.location.insee);
        })
    }
}
