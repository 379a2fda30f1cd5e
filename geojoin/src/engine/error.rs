//! Error types for a pipeline run.
//!
//! Each stage has its own error; a run fails with the first one raised and
//! publishes nothing.

use thiserror::Error;

use crate::join::JoinError;
use crate::publish::SinkError;
use crate::readiness::ReadinessError;
use crate::source::QueryError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Required sources did not all become ready
    #[error("readiness failed: {0}")]
    Readiness(#[from] ReadinessError),

    /// Fetching the probe feature set failed
    #[error("probe query failed: {0}")]
    ProbeQuery(#[source] QueryError),

    /// A join batch failed or the join was cancelled
    #[error("spatial join failed: {0}")]
    Join(#[from] JoinError),

    /// The sink refused or failed to store the layer
    #[error("publish failed: {0}")]
    Publish(#[from] SinkError),

    /// The run was cancelled outside the readiness and join stages
    #[error("pipeline cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Whether the run ended because it was cancelled rather than failed.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            PipelineError::Cancelled
                | PipelineError::Readiness(ReadinessError::Cancelled)
                | PipelineError::Join(JoinError::Cancelled { .. })
        )
    }
}
