//! Batched spatial join between a probe feature set and a target dataset.
//!
//! For every probe feature, the target dataset is queried for features
//! intersecting the probe's geometry. Queries run in fixed-size batches:
//! all queries of a batch are in flight together, and the next batch does
//! not start until the current one has fully completed. This bounds the
//! number of outstanding requests against the query service to the batch
//! size.
//!
//! ```text
//! probes:  [0 .. 9] [10 .. 19] [20 .. 22]
//!             │          │          │
//!          batch 0 ──► batch 1 ──► batch 2      (sequential)
//!          10 queries  10 queries  3 queries    (concurrent within)
//! ```
//!
//! Results are reassembled in probe order regardless of completion order.
//! A failing query fails its whole batch and aborts the join.

mod batch;

pub use batch::{
    batch_count, batch_ranges, clamp_batch_size, DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE,
    MIN_BATCH_SIZE,
};

use futures::future::try_join_all;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::feature::Feature;
use crate::source::{DatasetHandle, QueryError, QueryParams};

/// Errors from the spatial join.
#[derive(Debug, Error)]
pub enum JoinError {
    /// A query in the batch failed; the batch and the join are abandoned
    #[error("batch {batch} failed at probe {probe_index}: {source}")]
    QueryFailed {
        batch: usize,
        probe_index: usize,
        #[source]
        source: QueryError,
    },

    /// The join was cancelled between or during batches
    #[error("join cancelled after {completed_batches} completed batches")]
    Cancelled { completed_batches: usize },
}

/// Per-probe matches, in probe order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinResult {
    matches: Vec<Vec<Feature>>,
    batches: usize,
}

impl JoinResult {
    /// Matches for each probe feature, indexed like the probe sequence.
    pub fn matches(&self) -> &[Vec<Feature>] {
        &self.matches
    }

    pub fn into_matches(self) -> Vec<Vec<Feature>> {
        self.matches
    }

    /// Number of batches executed.
    pub fn batches(&self) -> usize {
        self.batches
    }

    pub fn probe_count(&self) -> usize {
        self.matches.len()
    }

    /// Total matched features before deduplication.
    pub fn matched_count(&self) -> usize {
        self.matches.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Runs intersection queries in sequential, bounded-size batches.
#[derive(Debug, Clone)]
pub struct SpatialJoinExecutor {
    batch_size: usize,
}

impl Default for SpatialJoinExecutor {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl SpatialJoinExecutor {
    /// Create an executor; the batch size is clamped to the allowed range.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: clamp_batch_size(batch_size),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Query `target` for the features intersecting each probe.
    ///
    /// Cancellation is checked before each batch and raced against the
    /// batch in flight; a cancelled batch drops its outstanding queries.
    pub async fn execute<D: DatasetHandle>(
        &self,
        probes: &[Feature],
        target: &D,
        cancel: &CancellationToken,
    ) -> Result<JoinResult, JoinError> {
        let total = batch_count(probes.len(), self.batch_size);
        info!(
            target = %target.name(),
            probes = probes.len(),
            batch_size = self.batch_size,
            batches = total,
            "Starting spatial join"
        );

        let mut matches = Vec::with_capacity(probes.len());
        for (batch, range) in batch_ranges(probes.len(), self.batch_size).enumerate() {
            if cancel.is_cancelled() {
                return Err(JoinError::Cancelled {
                    completed_batches: batch,
                });
            }

            let start = range.start;
            let queries = probes[range.clone()]
                .iter()
                .enumerate()
                .map(|(offset, probe)| query_probe(target, start + offset, probe));

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(JoinError::Cancelled { completed_batches: batch });
                }
                outcome = try_join_all(queries) => outcome,
            };

            let results = outcome.map_err(|(probe_index, source)| JoinError::QueryFailed {
                batch,
                probe_index,
                source,
            })?;

            debug!(
                batch,
                of = total,
                probes = ?range,
                matched = results.iter().map(Vec::len).sum::<usize>(),
                "Batch complete"
            );
            matches.extend(results);
        }

        let result = JoinResult {
            matches,
            batches: total,
        };
        info!(
            batches = result.batches,
            matched = result.matched_count(),
            "Spatial join complete"
        );
        Ok(result)
    }
}

async fn query_probe<D: DatasetHandle>(
    target: &D,
    index: usize,
    probe: &Feature,
) -> Result<Vec<Feature>, (usize, QueryError)> {
    let Some(geometry) = probe.geometry.as_ref() else {
        trace!(probe = index, "Probe has no geometry; nothing can intersect it");
        return Ok(Vec::new());
    };
    let params = QueryParams::intersecting(geometry.clone());
    target.query(&params).await.map_err(|e| (index, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use parking_lot::Mutex;

    use crate::feature::{AttributeValue, Geometry};
    use crate::source::{InMemoryDataset, SourceName};

    fn probe(i: usize) -> Feature {
        Feature::new(Geometry::point(i as f64, 0.0).unwrap()).with_attribute("PROBE", i as i64)
    }

    fn probe_index(params: &QueryParams) -> usize {
        match &params.geometry {
            Some(Geometry::Point(p)) => p.x as usize,
            other => panic!("unexpected probe geometry {:?}", other),
        }
    }

    /// Records, for every query, how many queries had completed when it started.
    struct InstrumentedDataset {
        name: SourceName,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        completed: AtomicUsize,
        completed_at_start: Mutex<BTreeMap<usize, usize>>,
        fail_on: Option<usize>,
    }

    impl InstrumentedDataset {
        fn new(fail_on: Option<usize>) -> Self {
            Self {
                name: SourceName::new("target"),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                completed: AtomicUsize::new(0),
                completed_at_start: Mutex::new(BTreeMap::new()),
                fail_on,
            }
        }

        fn queries(&self) -> usize {
            self.completed_at_start.lock().len()
        }
    }

    impl DatasetHandle for InstrumentedDataset {
        fn name(&self) -> &SourceName {
            &self.name
        }

        async fn query(&self, params: &QueryParams) -> Result<Vec<Feature>, QueryError> {
            let index = probe_index(params);
            self.completed_at_start
                .lock()
                .insert(index, self.completed.load(Ordering::SeqCst));
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            tokio::task::yield_now().await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.completed.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(index) {
                return Err(QueryError::Backend {
                    source_name: self.name.clone(),
                    message: "service unavailable".to_string(),
                });
            }
            Ok(vec![Feature::without_geometry().with_attribute("MATCH", index as i64)])
        }
    }

    #[tokio::test]
    async fn test_batches_run_sequentially_with_bounded_concurrency() {
        let target = InstrumentedDataset::new(None);
        let probes: Vec<_> = (0..23).map(probe).collect();

        let result = SpatialJoinExecutor::new(10)
            .execute(&probes, &target, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.batches(), 3);
        assert_eq!(target.queries(), 23);
        assert_eq!(target.peak.load(Ordering::SeqCst), 10);

        // A probe in batch k starts only after every query of batches < k completed.
        let starts = target.completed_at_start.lock().clone();
        for (index, completed) in starts {
            assert_eq!(completed, (index / 10) * 10, "probe {}", index);
        }
    }

    #[tokio::test]
    async fn test_results_in_probe_order() {
        let target = InstrumentedDataset::new(None);
        let probes: Vec<_> = (0..7).map(probe).collect();

        let result = SpatialJoinExecutor::new(3)
            .execute(&probes, &target, &CancellationToken::new())
            .await
            .unwrap();

        let order: Vec<_> = result
            .matches()
            .iter()
            .map(|m| m[0].attribute("MATCH").cloned())
            .collect();
        let expected: Vec<_> = (0..7)
            .map(|i| Some(AttributeValue::Integer(i)))
            .collect();
        assert_eq!(order, expected);
        assert_eq!(result.matched_count(), 7);
    }

    #[tokio::test]
    async fn test_empty_probe_set() {
        let target = InstrumentedDataset::new(None);
        let result = SpatialJoinExecutor::default()
            .execute(&[], &target, &CancellationToken::new())
            .await
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(result.batches(), 0);
        assert_eq!(target.queries(), 0);
    }

    #[tokio::test]
    async fn test_query_failure_aborts_before_next_batch() {
        let target = InstrumentedDataset::new(Some(13));
        let probes: Vec<_> = (0..25).map(probe).collect();

        let err = SpatialJoinExecutor::new(10)
            .execute(&probes, &target, &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            JoinError::QueryFailed {
                batch, probe_index, ..
            } => {
                assert_eq!(batch, 1);
                assert_eq!(probe_index, 13);
            }
            other => panic!("expected QueryFailed, got {:?}", other),
        }
        // Batch 2 (probes 20..25) never started.
        assert!(target.completed_at_start.lock().keys().all(|&i| i < 20));
    }

    #[tokio::test]
    async fn test_probe_without_geometry_is_not_queried() {
        let target = InstrumentedDataset::new(None);
        let probes = vec![probe(0), Feature::without_geometry(), probe(2)];

        let result = SpatialJoinExecutor::new(10)
            .execute(&probes, &target, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(target.queries(), 2);
        assert_eq!(result.probe_count(), 3);
        assert!(result.matches()[1].is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let target = InstrumentedDataset::new(None);
        let probes: Vec<_> = (0..5).map(probe).collect();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = SpatialJoinExecutor::new(2)
            .execute(&probes, &target, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, JoinError::Cancelled { completed_batches: 0 }));
        assert_eq!(target.queries(), 0);
    }

    /// Cancels the shared token from inside the second batch.
    struct CancellingDataset {
        inner: InMemoryDataset,
        cancel: CancellationToken,
        calls: Arc<AtomicUsize>,
    }

    impl DatasetHandle for CancellingDataset {
        fn name(&self) -> &SourceName {
            self.inner.name()
        }

        async fn query(&self, params: &QueryParams) -> Result<Vec<Feature>, QueryError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 2 {
                self.cancel.cancel();
                std::future::pending::<()>().await;
            }
            self.inner.query(params).await
        }
    }

    #[tokio::test]
    async fn test_cancelled_mid_join() {
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let target = CancellingDataset {
            inner: InMemoryDataset::new("target", Vec::new()),
            cancel: cancel.clone(),
            calls: Arc::clone(&calls),
        };
        let probes: Vec<_> = (0..6).map(probe).collect();

        let err = SpatialJoinExecutor::new(2)
            .execute(&probes, &target, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, JoinError::Cancelled { completed_batches: 1 }));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_zero_batch_size_clamped() {
        assert_eq!(SpatialJoinExecutor::new(0).batch_size(), 1);
    }
}
