//! GeoJoin - spatial join engine for independently loaded feature datasets
//!
//! This library waits for a set of named datasets to become ready, queries a
//! target dataset for the features intersecting each feature of a probe
//! dataset in bounded concurrent batches, removes duplicates by identity key,
//! and publishes the result as a display layer.
//!
//! # High-Level API
//!
//! ```
//! use std::sync::Arc;
//!
//! use geojoin::engine::{PipelineConfig, SpatialJoinPipeline};
//! use geojoin::feature::{Feature, Geometry, Polygon};
//! use geojoin::publish::{MemoryMapSink, Publisher};
//! use geojoin::registry::SourceRegistry;
//! use geojoin::source::InMemoryDataset;
//! use tokio_util::sync::CancellationToken;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let square = |x: f64, y: f64| {
//!     Geometry::Polygon(Polygon::from_xy(&[(x, y), (x + 2.0, y), (x + 2.0, y + 2.0), (x, y + 2.0)]).unwrap())
//! };
//!
//! let registry = SourceRegistry::new();
//! registry.announce(
//!     "coastal-buffer".into(),
//!     Arc::new(InMemoryDataset::new("coastal-buffer", vec![Feature::new(square(0.0, 0.0))])),
//! );
//! registry.announce(
//!     "flood-hazard".into(),
//!     Arc::new(InMemoryDataset::new(
//!         "flood-hazard",
//!         vec![Feature::new(square(1.0, 1.0)).with_attribute("OBJECTID", 10)],
//!     )),
//! );
//!
//! let pipeline = SpatialJoinPipeline::new(
//!     PipelineConfig::new("coastal-buffer", "flood-hazard"),
//!     Publisher::default(),
//! );
//! let sink = MemoryMapSink::new();
//! let report = pipeline
//!     .run(registry.subscribe(), &sink, &CancellationToken::new())
//!     .await
//!     .unwrap();
//!
//! assert_eq!(report.published, 1);
//! # });
//! ```

pub mod config;
pub mod dedupe;
pub mod engine;
pub mod feature;
pub mod geojson;
pub mod join;
pub mod logging;
pub mod publish;
pub mod readiness;
pub mod registry;
pub mod source;

/// Version of the GeoJoin library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
