//! In-memory dataset backed by a feature vector.

use super::{
    DatasetHandle, DefinitionExpression, ExpressionError, QueryError, QueryParams, SourceName,
};
use crate::feature::Feature;

/// A [`DatasetHandle`] over features held in memory.
///
/// An optional [`DefinitionExpression`] restricts every query to the
/// features it matches, the same way a remote layer's definition
/// expression would.
///
/// # Example
///
/// ```
/// use geojoin::feature::{Feature, Geometry};
/// use geojoin::source::{DatasetHandle, InMemoryDataset, QueryParams};
///
/// # tokio_test_block(async {
/// let dataset = InMemoryDataset::new(
///     "flood-hazard",
///     vec![Feature::new(Geometry::point(1.0, 1.0).unwrap()).with_attribute("OBJECTID", 1)],
/// );
/// let hits = dataset
///     .query(&QueryParams::intersecting(Geometry::point(1.0, 1.0).unwrap()))
///     .await
///     .unwrap();
/// assert_eq!(hits.len(), 1);
/// # });
/// # fn tokio_test_block(f: impl std::future::Future<Output = ()>) {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    name: SourceName,
    features: Vec<Feature>,
    expression: DefinitionExpression,
}

impl InMemoryDataset {
    /// Create a dataset with no definition expression.
    pub fn new(name: impl Into<SourceName>, features: Vec<Feature>) -> Self {
        Self {
            name: name.into(),
            features,
            expression: DefinitionExpression::default(),
        }
    }

    /// Restrict the dataset with a definition expression.
    pub fn with_expression(mut self, expression: &str) -> Result<Self, ExpressionError> {
        self.expression = DefinitionExpression::parse(expression)?;
        Ok(self)
    }

    /// Number of features visible through the definition expression.
    pub fn len(&self) -> usize {
        self.visible().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn expression(&self) -> &DefinitionExpression {
        &self.expression
    }

    fn visible(&self) -> impl Iterator<Item = &Feature> {
        self.features
            .iter()
            .filter(|feature| self.expression.matches(&feature.attributes))
    }
}

impl DatasetHandle for InMemoryDataset {
    fn name(&self) -> &SourceName {
        &self.name
    }

    async fn query(&self, params: &QueryParams) -> Result<Vec<Feature>, QueryError> {
        Ok(self
            .visible()
            .filter(|feature| params.matches_geometry(feature))
            .map(|feature| params.project(feature))
            .collect())
    }
}
