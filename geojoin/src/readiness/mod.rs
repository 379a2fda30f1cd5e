//! Readiness coordination across independently-loaded sources.
//!
//! The [`ReadinessCoordinator`] waits until every required source has been
//! announced, in any order, and resolves to an immutable [`ReadySources`]
//! mapping. Only the first event per name counts; later duplicates and
//! events for names outside the required set are ignored.
//!
//! The wait is all-or-nothing: it never resolves with a partial mapping.
//! If a required source never arrives the coordinator fails with
//! [`ReadinessError::MissingSource`] once the optional timeout elapses or
//! the event stream closes.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use geojoin::readiness::ReadinessCoordinator;
//! use geojoin::registry::SourceRegistry;
//! use geojoin::source::{InMemoryDataset, SourceName};
//! use tokio_util::sync::CancellationToken;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let registry = SourceRegistry::new();
//! let coordinator = ReadinessCoordinator::new(["coastal-buffer", "flood-hazard"].map(SourceName::from))
//!     .unwrap()
//!     .with_timeout(Some(Duration::from_secs(5)));
//!
//! let subscription = registry.subscribe();
//! registry.announce("flood-hazard".into(), Arc::new(InMemoryDataset::new("flood-hazard", vec![])));
//! registry.announce("coastal-buffer".into(), Arc::new(InMemoryDataset::new("coastal-buffer", vec![])));
//!
//! let ready = coordinator.wait(subscription, &CancellationToken::new()).await.unwrap();
//! assert_eq!(ready.len(), 2);
//! # });
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::registry::{ReadinessEvent, ReadinessSubscription};
use crate::source::{DatasetHandle, SourceName};

/// Errors from waiting on source readiness.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadinessError {
    /// One or more required sources never became ready
    #[error("required sources never became ready: {}", join_names(.missing))]
    MissingSource { missing: Vec<SourceName> },

    /// The coordinator was created with no required sources
    #[error("at least one required source must be declared")]
    EmptyRequirement,

    /// The wait was cancelled
    #[error("readiness wait cancelled")]
    Cancelled,
}

fn join_names(names: &[SourceName]) -> String {
    names
        .iter()
        .map(SourceName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Immutable name → dataset mapping produced by a completed wait.
///
/// Holds exactly one entry per required name. Cheap to clone and safe to
/// share across tasks.
pub struct ReadySources<D> {
    sources: Arc<BTreeMap<SourceName, Arc<D>>>,
}

impl<D> Clone for ReadySources<D> {
    fn clone(&self) -> Self {
        Self {
            sources: Arc::clone(&self.sources),
        }
    }
}

impl<D> fmt::Debug for ReadySources<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.sources.keys()).finish()
    }
}

impl<D> ReadySources<D> {
    pub fn get(&self, name: &SourceName) -> Option<&Arc<D>> {
        self.sources.get(name)
    }

    /// Like [`get`](Self::get), but a missing name is a `MissingSource` error.
    pub fn require(&self, name: &SourceName) -> Result<&Arc<D>, ReadinessError> {
        self.sources
            .get(name)
            .ok_or_else(|| ReadinessError::MissingSource {
                missing: vec![name.clone()],
            })
    }

    pub fn contains(&self, name: &SourceName) -> bool {
        self.sources.contains_key(name)
    }

    /// Names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &SourceName> {
        self.sources.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SourceName, &Arc<D>)> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Waits for a fixed set of sources to become ready.
#[derive(Debug, Clone)]
pub struct ReadinessCoordinator {
    required: BTreeSet<SourceName>,
    timeout: Option<Duration>,
}

impl ReadinessCoordinator {
    /// Create a coordinator for a non-empty set of names.
    ///
    /// Repeated names collapse to one requirement. No timeout is set.
    pub fn new(required: impl IntoIterator<Item = SourceName>) -> Result<Self, ReadinessError> {
        let required: BTreeSet<SourceName> = required.into_iter().collect();
        if required.is_empty() {
            return Err(ReadinessError::EmptyRequirement);
        }
        Ok(Self {
            required,
            timeout: None,
        })
    }

    /// Fail with `MissingSource` if not complete within `timeout`.
    ///
    /// `None` waits until every source arrives or the stream closes.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn required(&self) -> &BTreeSet<SourceName> {
        &self.required
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Wait until every required source is ready.
    ///
    /// Replayed events are consumed first, then live events. If the receiver
    /// lags, the sources already announced to the registry are re-read so
    /// dropped events are not lost. Resolves exactly once with one entry per
    /// required name.
    pub async fn wait<D: DatasetHandle>(
        &self,
        mut subscription: ReadinessSubscription<D>,
        cancel: &CancellationToken,
    ) -> Result<ReadySources<D>, ReadinessError> {
        let deadline = self.timeout.map(|t| Instant::now() + t);
        let mut resolved: BTreeMap<SourceName, Arc<D>> = BTreeMap::new();

        debug!(
            required = %join_names(&self.required.iter().cloned().collect::<Vec<_>>()),
            timeout = ?self.timeout,
            "Waiting for sources"
        );

        for event in subscription.take_replay() {
            self.accept(event, &mut resolved);
        }

        while resolved.len() < self.required.len() {
            let received = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ReadinessError::Cancelled),
                _ = sleep_until(deadline) => {
                    let missing = self.missing(&resolved);
                    warn!(missing = %join_names(&missing), "Timed out waiting for sources");
                    return Err(ReadinessError::MissingSource { missing });
                }
                received = subscription.recv() => received,
            };

            match received {
                Ok(event) => self.accept(event, &mut resolved),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Readiness receiver lagged; re-reading announced sources");
                    for event in subscription.snapshot() {
                        self.accept(event, &mut resolved);
                    }
                }
                Err(RecvError::Closed) => {
                    let missing = self.missing(&resolved);
                    warn!(missing = %join_names(&missing), "Readiness stream closed before all sources were ready");
                    return Err(ReadinessError::MissingSource { missing });
                }
            }
        }

        info!(sources = resolved.len(), "All required sources ready");
        Ok(ReadySources {
            sources: Arc::new(resolved),
        })
    }

    fn accept<D>(&self, event: ReadinessEvent<D>, resolved: &mut BTreeMap<SourceName, Arc<D>>) {
        if !self.required.contains(&event.name) {
            trace!(source = %event.name, "Ignoring readiness of unrequired source");
            return;
        }
        if resolved.contains_key(&event.name) {
            debug!(source = %event.name, "Ignoring duplicate readiness event");
            return;
        }
        debug!(
            source = %event.name,
            ready = resolved.len() + 1,
            required = self.required.len(),
            "Source resolved"
        );
        resolved.insert(event.name, event.dataset);
    }

    fn missing<D>(&self, resolved: &BTreeMap<SourceName, Arc<D>>) -> Vec<SourceName> {
        self.required
            .iter()
            .filter(|name| !resolved.contains_key(*name))
            .cloned()
            .collect()
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
