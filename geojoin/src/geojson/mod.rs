//! GeoJSON reading and writing.
//!
//! Datasets are loaded from `FeatureCollection` documents and published
//! layers can be written back out as one. Supported geometry types are
//! `Point`, `Polygon` and `MultiPolygon`; a `null` geometry yields an
//! attribute-only feature. Envelopes are written as polygons.

mod read;
mod write;

pub use read::{load_feature_collection, parse_feature_collection};
pub use write::{feature_to_value, geometry_to_value};

use std::path::PathBuf;

use thiserror::Error;

use crate::feature::GeometryError;

/// Errors raised while reading GeoJSON.
#[derive(Debug, Error)]
pub enum GeoJsonError {
    /// The file could not be read
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON or has the wrong shape
    #[error("invalid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The top-level object is not a FeatureCollection
    #[error("expected a FeatureCollection, found '{0}'")]
    NotAFeatureCollection(String),

    /// A geometry type outside the supported set
    #[error("unsupported geometry type '{0}'")]
    UnsupportedGeometry(String),

    /// Coordinates did not have the shape the geometry type requires
    #[error("invalid {kind} coordinates: {reason}")]
    InvalidCoordinates { kind: String, reason: String },

    /// Coordinates were well-formed but describe an invalid shape
    #[error("invalid geometry: {0}")]
    Geometry(#[from] GeometryError),
}
