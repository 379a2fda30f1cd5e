//! One run of the spatial join engine.
//!
//! ```text
//!  ReadinessSubscription
//!          │
//!          ▼
//!  ReadinessCoordinator ──► probe.query(all) ──► SpatialJoinExecutor
//!                                                       │
//!                        MapSink ◄── Publisher ◄── Deduplicator
//! ```
//!
//! Any stage failure aborts the run before the publisher is reached, so a
//! failed run never leaves a partial layer in the sink.

mod error;

pub use error::PipelineError;

use std::fmt;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::dedupe::{DedupeReport, Deduplicator, IdentityKey};
use crate::join::{SpatialJoinExecutor, DEFAULT_BATCH_SIZE};
use crate::publish::{LayerId, MapSink, Publisher};
use crate::readiness::ReadinessCoordinator;
use crate::registry::ReadinessSubscription;
use crate::source::{DatasetHandle, QueryParams, SourceName};

/// Default readiness timeout.
pub const DEFAULT_READINESS_TIMEOUT: Duration = Duration::from_secs(30);

/// Which sources to join and how.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Dataset whose features drive the join.
    pub probe: SourceName,
    /// Dataset queried for each probe feature.
    pub target: SourceName,
    /// Further sources that must be ready before the run starts.
    pub extra_required: Vec<SourceName>,
    pub batch_size: usize,
    /// `None` waits indefinitely.
    pub readiness_timeout: Option<Duration>,
    /// Attribute identifying a target feature.
    pub identity_field: String,
    /// Qualify identity keys with the target source name.
    pub namespaced: bool,
}

impl PipelineConfig {
    pub fn new(probe: impl Into<SourceName>, target: impl Into<SourceName>) -> Self {
        Self {
            probe: probe.into(),
            target: target.into(),
            extra_required: Vec::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            readiness_timeout: Some(DEFAULT_READINESS_TIMEOUT),
            identity_field: "OBJECTID".to_string(),
            namespaced: false,
        }
    }

    /// Every source the run waits for.
    pub fn required_sources(&self) -> Vec<SourceName> {
        let mut names = vec![self.probe.clone(), self.target.clone()];
        names.extend(self.extra_required.iter().cloned());
        names
    }

    pub fn identity_key(&self) -> IdentityKey {
        if self.namespaced {
            IdentityKey::namespaced(self.target.clone(), self.identity_field.clone())
        } else {
            IdentityKey::field(self.identity_field.clone())
        }
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub probe_features: usize,
    pub batches: usize,
    /// Matches before deduplication.
    pub matched: usize,
    pub dedupe: DedupeReport,
    pub layer_id: LayerId,
    /// Elements in the published layer.
    pub published: usize,
    pub elapsed: Duration,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Layer:          {}", self.layer_id)?;
        writeln!(f, "Probe features: {}", self.probe_features)?;
        writeln!(f, "Batches:        {}", self.batches)?;
        writeln!(f, "Matches:        {}", self.matched)?;
        writeln!(f, "Deduplication:  {}", self.dedupe)?;
        writeln!(f, "Published:      {}", self.published)?;
        write!(f, "Elapsed:        {:.2?}", self.elapsed)
    }
}

/// Readiness → probe query → join → dedupe → publish.
#[derive(Debug, Clone)]
pub struct SpatialJoinPipeline {
    config: PipelineConfig,
    publisher: Publisher,
}

impl SpatialJoinPipeline {
    pub fn new(config: PipelineConfig, publisher: Publisher) -> Self {
        Self { config, publisher }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    /// Execute one run.
    ///
    /// Publishes exactly one layer on success and nothing on failure.
    pub async fn run<D, S>(
        &self,
        subscription: ReadinessSubscription<D>,
        sink: &S,
        cancel: &CancellationToken,
    ) -> Result<PipelineReport, PipelineError>
    where
        D: DatasetHandle,
        S: MapSink + ?Sized,
    {
        let started = Instant::now();
        let config = &self.config;
        info!(
            probe = %config.probe,
            target = %config.target,
            batch_size = config.batch_size,
            "Pipeline run started"
        );

        let coordinator = ReadinessCoordinator::new(config.required_sources())?
            .with_timeout(config.readiness_timeout);
        let ready = coordinator.wait(subscription, cancel).await?;
        let probe = ready.require(&config.probe)?;
        let target = ready.require(&config.target)?;

        let all = QueryParams::all();
        let probes = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            result = probe.query(&all) => result.map_err(PipelineError::ProbeQuery)?,
        };
        debug!(source = %config.probe, features = probes.len(), "Probe features fetched");

        let joined = SpatialJoinExecutor::new(config.batch_size)
            .execute(&probes, target.as_ref(), cancel)
            .await?;
        let batches = joined.batches();
        let matched = joined.matched_count();

        let outcome = Deduplicator::new(config.identity_key()).dedupe(joined.into_matches());

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        let published = self.publisher.publish(outcome.features, sink)?;

        let report = PipelineReport {
            probe_features: probes.len(),
            batches,
            matched,
            dedupe: outcome.report,
            layer_id: self.publisher.layer_id().clone(),
            published,
            elapsed: started.elapsed(),
        };
        info!(
            layer = %report.layer_id,
            probes = report.probe_features,
            matched = report.matched,
            published = report.published,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Pipeline run complete"
        );
        Ok(report)
    }
}
