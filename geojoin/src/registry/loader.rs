//! Dataset loaders.

use std::future::Future;
use std::path::PathBuf;

use thiserror::Error;

use crate::geojson::{parse_feature_collection, GeoJsonError};
use crate::source::{DatasetHandle, ExpressionError, InMemoryDataset, SourceName};

/// Errors raised while loading a dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source file could not be read
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source file is not usable GeoJSON
    #[error(transparent)]
    GeoJson(#[from] GeoJsonError),

    /// The configured definition expression does not parse
    #[error("invalid definition expression: {0}")]
    Expression(#[from] ExpressionError),
}

/// Produces a queryable dataset for a name.
pub trait SourceLoader: Send + 'static {
    type Dataset: DatasetHandle;

    /// Load the dataset. Called once.
    fn load(self, name: SourceName) -> impl Future<Output = Result<Self::Dataset, LoadError>> + Send;
}

/// Loads a GeoJSON FeatureCollection file into an [`InMemoryDataset`].
#[derive(Debug, Clone)]
pub struct GeoJsonFileLoader {
    path: PathBuf,
    expression: Option<String>,
}

impl GeoJsonFileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            expression: None,
        }
    }

    /// Apply a definition expression to the loaded dataset.
    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }
}

impl SourceLoader for GeoJsonFileLoader {
    type Dataset = InMemoryDataset;

    async fn load(self, name: SourceName) -> Result<InMemoryDataset, LoadError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| LoadError::Io {
                path: self.path.clone(),
                source,
            })?;
        let features = parse_feature_collection(&text)?;
        let dataset = InMemoryDataset::new(name, features);
        match self.expression.as_deref() {
            Some(expression) => Ok(dataset.with_expression(expression)?),
            None => Ok(dataset),
        }
    }
}
