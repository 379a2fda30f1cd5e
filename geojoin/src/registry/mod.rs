//! Source registry: owns loaded datasets and announces their readiness.
//!
//! Each dataset is loaded independently and, once queryable, announced as a
//! [`ReadinessEvent`] on a broadcast channel. Consumers subscribe with
//! [`SourceRegistry::subscribe`], which also hands back every source already
//! announced so that a late subscriber never misses an event.
//!
//! # Architecture
//!
//! ```text
//!   spawn_load("coastal-buffer") ──┐
//!                                  ├─► announce() ──► broadcast ──► ReadinessCoordinator
//!   spawn_load("flood-hazard")  ───┘        │                             ▲
//!                                           └─► announced (replay) ───────┘
//! ```

mod loader;

pub use loader::{GeoJsonFileLoader, LoadError, SourceLoader};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::source::{DatasetHandle, SourceName};

/// Default broadcast capacity for readiness events.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// One-shot notification that a named dataset is queryable.
pub struct ReadinessEvent<D> {
    pub name: SourceName,
    pub dataset: Arc<D>,
}

impl<D> Clone for ReadinessEvent<D> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            dataset: Arc::clone(&self.dataset),
        }
    }
}

impl<D> fmt::Debug for ReadinessEvent<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadinessEvent")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

type Announced<D> = Arc<Mutex<BTreeMap<SourceName, Arc<D>>>>;

/// A readiness event stream that starts with a replay of past events.
///
/// A subscription taken from a [`SourceRegistry`] can also re-read the
/// registry's announced sources, which recovers events a lagging receiver
/// dropped.
pub struct ReadinessSubscription<D> {
    replay: Vec<ReadinessEvent<D>>,
    receiver: broadcast::Receiver<ReadinessEvent<D>>,
    announced: Option<Announced<D>>,
}

impl<D> ReadinessSubscription<D> {
    /// Build a subscription from an explicit replay and a live receiver.
    ///
    /// Such a subscription has no registry to re-read, so
    /// [`snapshot`](Self::snapshot) is always empty.
    pub fn new(
        replay: Vec<ReadinessEvent<D>>,
        receiver: broadcast::Receiver<ReadinessEvent<D>>,
    ) -> Self {
        Self {
            replay,
            receiver,
            announced: None,
        }
    }

    /// Events announced before the subscription was taken, in name order.
    pub fn replay(&self) -> &[ReadinessEvent<D>] {
        &self.replay
    }

    /// Take the replay, leaving it empty.
    pub fn take_replay(&mut self) -> Vec<ReadinessEvent<D>> {
        std::mem::take(&mut self.replay)
    }

    /// Receive the next live event. Cancel safe.
    pub async fn recv(&mut self) -> Result<ReadinessEvent<D>, RecvError> {
        self.receiver.recv().await
    }

    /// Every source announced so far, in name order.
    pub fn snapshot(&self) -> Vec<ReadinessEvent<D>> {
        match &self.announced {
            Some(announced) => replay_of(&announced.lock()),
            None => Vec::new(),
        }
    }
}

fn replay_of<D>(announced: &BTreeMap<SourceName, Arc<D>>) -> Vec<ReadinessEvent<D>> {
    announced
        .iter()
        .map(|(name, dataset)| ReadinessEvent {
            name: name.clone(),
            dataset: Arc::clone(dataset),
        })
        .collect()
}

/// Owner of named datasets and publisher of their readiness.
pub struct SourceRegistry<D> {
    sender: broadcast::Sender<ReadinessEvent<D>>,
    announced: Announced<D>,
}

impl<D: DatasetHandle> SourceRegistry<D> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create a registry whose broadcast channel buffers `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            announced: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Announce that `name` is ready.
    ///
    /// The first announcement per name is recorded for replay. Repeat
    /// announcements are still broadcast (subscribers must tolerate
    /// redelivery) but never replace the recorded handle.
    pub fn announce(&self, name: SourceName, dataset: Arc<D>) {
        let mut announced = self.announced.lock();
        if announced.contains_key(&name) {
            debug!(source = %name, "Source announced again; keeping first handle");
        } else {
            info!(source = %name, "Source ready");
            announced.insert(name.clone(), Arc::clone(&dataset));
        }
        // No subscribers is fine: the replay covers late subscribers.
        let _ = self.sender.send(ReadinessEvent { name, dataset });
    }

    /// Subscribe to readiness events, including those already announced.
    pub fn subscribe(&self) -> ReadinessSubscription<D> {
        let announced = self.announced.lock();
        let receiver = self.sender.subscribe();
        ReadinessSubscription {
            replay: replay_of(&announced),
            receiver,
            announced: Some(Arc::clone(&self.announced)),
        }
    }

    /// Handle recorded for `name`, if announced.
    pub fn get(&self, name: &SourceName) -> Option<Arc<D>> {
        self.announced.lock().get(name).cloned()
    }

    /// Names announced so far, sorted.
    pub fn ready_names(&self) -> Vec<SourceName> {
        self.announced.lock().keys().cloned().collect()
    }

    /// Load a dataset in the background and announce it when done.
    ///
    /// A failed load is logged and announces nothing; anyone waiting on the
    /// name sees it as missing.
    pub fn spawn_load<L>(self: &Arc<Self>, name: SourceName, loader: L) -> JoinHandle<Result<(), LoadError>>
    where
        L: SourceLoader<Dataset = D>,
    {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            debug!(source = %name, "Loading source");
            match loader.load(name.clone()).await {
                Ok(dataset) => {
                    registry.announce(name, Arc::new(dataset));
                    Ok(())
                }
                Err(e) => {
                    warn!(source = %name, error = %e, "Source failed to load");
                    Err(e)
                }
            }
        })
    }
}

impl<D: DatasetHandle> Default for SourceRegistry<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemoryDataset;

    fn dataset(name: &str) -> Arc<InMemoryDataset> {
        Arc::new(InMemoryDataset::new(name, Vec::new()))
    }

    #[tokio::test]
    async fn test_subscriber_receives_announcement() {
        let registry = SourceRegistry::new();
        let mut subscription = registry.subscribe();
        assert!(subscription.take_replay().is_empty());

        registry.announce(SourceName::new("a"), dataset("a"));
        let event = subscription.recv().await.unwrap();
        assert_eq!(event.name.as_str(), "a");
    }

    #[tokio::test]
    async fn test_late_subscriber_gets_replay() {
        let registry = SourceRegistry::new();
        registry.announce(SourceName::new("b"), dataset("b"));
        registry.announce(SourceName::new("a"), dataset("a"));

        let subscription = registry.subscribe();
        let names: Vec<_> = subscription
            .replay()
            .iter()
            .map(|e| e.name.to_string())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_snapshot_sees_announcements_after_subscribe() {
        let registry = SourceRegistry::new();
        let subscription = registry.subscribe();
        registry.announce(SourceName::new("b"), dataset("b"));
        registry.announce(SourceName::new("a"), dataset("a"));

        assert!(subscription.replay().is_empty());
        let names: Vec<_> = subscription
            .snapshot()
            .iter()
            .map(|e| e.name.to_string())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_reannouncement_keeps_first_handle() {
        let registry = SourceRegistry::new();
        let first = dataset("a");
        registry.announce(SourceName::new("a"), Arc::clone(&first));
        registry.announce(SourceName::new("a"), dataset("a"));

        let recorded = registry.get(&SourceName::new("a")).unwrap();
        assert!(Arc::ptr_eq(&recorded, &first));
        assert_eq!(registry.ready_names().len(), 1);
    }

    #[tokio::test]
    async fn test_spawn_load_failure_announces_nothing() {
        let registry: Arc<SourceRegistry<InMemoryDataset>> = Arc::new(SourceRegistry::new());
        let loader = GeoJsonFileLoader::new("/definitely/not/here.geojson");

        let result = registry
            .spawn_load(SourceName::new("missing"), loader)
            .await
            .unwrap();
        assert!(result.is_err());
        assert!(registry.ready_names().is_empty());
    }
}
