//! Named datasets and their query capability.
//!
//! A dataset is identified by a [`SourceName`] and queried through the
//! [`DatasetHandle`] trait. The join engine only ever borrows handles; the
//! [`SourceRegistry`](crate::registry::SourceRegistry) owns them.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  query(QueryParams)  ┌────────────────────┐
//! │ join engine  │ ───────────────────► │ impl DatasetHandle │
//! └──────────────┘ ◄─────────────────── │  (InMemoryDataset) │
//!                     Vec<Feature>      └────────────────────┘
//! ```

mod filter;
mod memory;

pub use filter::{DefinitionExpression, ExpressionError};
pub use memory::InMemoryDataset;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

use crate::feature::{Feature, Geometry};

/// Identifier of a feature dataset, e.g. `"flood-hazard"`.
///
/// Cheap to clone; immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceName(Arc<str>);

impl SourceName {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceName {
    fn from(value: &str) -> Self {
        SourceName::new(value)
    }
}

impl From<String> for SourceName {
    fn from(value: String) -> Self {
        SourceName::new(value)
    }
}

/// Spatial predicate applied by a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpatialRelationship {
    #[default]
    Intersects,
}

/// Which attributes a query returns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutFields {
    /// Every attribute (`"*"`).
    #[default]
    All,
    /// Only the named attributes.
    Named(Vec<String>),
}

impl OutFields {
    pub fn includes(&self, field: &str) -> bool {
        match self {
            OutFields::All => true,
            OutFields::Named(fields) => fields.iter().any(|f| f == field),
        }
    }
}

/// Parameters of a single dataset query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    /// Filter geometry; `None` selects every feature.
    pub geometry: Option<Geometry>,
    /// Predicate between `geometry` and each candidate feature.
    pub relationship: SpatialRelationship,
    /// Whether matched features carry their geometry.
    pub return_geometry: bool,
    /// Attribute projection.
    pub out_fields: OutFields,
}

impl QueryParams {
    /// Select every feature with full attributes and geometry.
    pub fn all() -> Self {
        Self {
            geometry: None,
            relationship: SpatialRelationship::Intersects,
            return_geometry: true,
            out_fields: OutFields::All,
        }
    }

    /// The join query: features intersecting `geometry`, with full
    /// attributes and geometry in the response.
    pub fn intersecting(geometry: Geometry) -> Self {
        Self {
            geometry: Some(geometry),
            ..Self::all()
        }
    }

    pub fn with_out_fields(mut self, out_fields: OutFields) -> Self {
        self.out_fields = out_fields;
        self
    }

    pub fn with_return_geometry(mut self, return_geometry: bool) -> Self {
        self.return_geometry = return_geometry;
        self
    }

    /// Whether `feature` satisfies the spatial part of this query.
    pub fn matches_geometry(&self, feature: &Feature) -> bool {
        match (&self.geometry, self.relationship) {
            (None, _) => true,
            (Some(filter), SpatialRelationship::Intersects) => feature.intersects(filter),
        }
    }

    /// Apply the attribute projection and geometry flag to a matched feature.
    pub fn project(&self, feature: &Feature) -> Feature {
        let attributes = match &self.out_fields {
            OutFields::All => feature.attributes.clone(),
            OutFields::Named(_) => feature
                .attributes
                .iter()
                .filter(|(field, _)| self.out_fields.includes(field))
                .map(|(field, value)| (field.clone(), value.clone()))
                .collect(),
        };
        Feature {
            geometry: if self.return_geometry {
                feature.geometry.clone()
            } else {
                None
            },
            attributes,
        }
    }
}

/// Errors returned by dataset queries.
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    /// The backing service rejected or failed the request
    #[error("query against '{source_name}' failed: {message}")]
    Backend {
        source_name: SourceName,
        message: String,
    },

    /// The dataset was torn down while the query was pending
    #[error("dataset '{0}' is no longer available")]
    Unavailable(SourceName),
}

/// The loaded, queryable form of a named dataset.
///
/// Implementations are shared read-only across one pipeline run and must be
/// safe to query concurrently.
pub trait DatasetHandle: Send + Sync + 'static {
    /// Name of the dataset.
    fn name(&self) -> &SourceName;

    /// Run a query and return the matching features.
    fn query(
        &self,
        params: &QueryParams,
    ) -> impl Future<Output = Result<Vec<Feature>, QueryError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::AttributeValue;

    #[test]
    fn test_source_name_display_and_order() {
        let mut names = vec![SourceName::new("flood-hazard"), SourceName::new("coastal-buffer")];
        names.sort();
        assert_eq!(names[0].to_string(), "coastal-buffer");
        assert_eq!(names[1].as_str(), "flood-hazard");
    }

    #[test]
    fn test_intersecting_requests_full_response() {
        let params = QueryParams::intersecting(Geometry::point(1.0, 2.0).unwrap());
        assert_eq!(params.relationship, SpatialRelationship::Intersects);
        assert!(params.return_geometry);
        assert_eq!(params.out_fields, OutFields::All);
    }

    #[test]
    fn test_project_named_fields_without_geometry() {
        let feature = Feature::new(Geometry::point(0.0, 0.0).unwrap())
            .with_attribute("OBJECTID", 1)
            .with_attribute("FLD_ZONE", "AE");
        let params = QueryParams::all()
            .with_out_fields(OutFields::Named(vec!["FLD_ZONE".to_string()]))
            .with_return_geometry(false);

        let projected = params.project(&feature);
        assert!(projected.geometry.is_none());
        assert_eq!(projected.attributes.len(), 1);
        assert_eq!(
            projected.attribute("FLD_ZONE"),
            Some(&AttributeValue::Text("AE".to_string()))
        );
    }
}
