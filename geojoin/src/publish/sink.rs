//! Map sinks receiving published layers.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use super::{DisplayElement, DisplayLayer, LayerId};
use crate::geojson::geometry_to_value;

/// Errors raised by a sink while accepting a layer.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The destination could not be written
    #[error("failed to write layer to '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The layer could not be encoded
    #[error("failed to encode layer: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The sink refused the layer
    #[error("layer '{layer}' rejected: {reason}")]
    Rejected { layer: LayerId, reason: String },
}

/// Destination for published layers.
///
/// Called at most once per pipeline run. How a repeated layer id is
/// handled (replace, stack, reject) is up to the sink.
pub trait MapSink: Send + Sync {
    fn add_layer(&self, layer: DisplayLayer) -> Result<(), SinkError>;
}

/// Keeps published layers in memory, in publication order.
///
/// Repeated layer ids stack; [`find_layer`](Self::find_layer) returns the
/// most recent.
#[derive(Debug, Default)]
pub struct MemoryMapSink {
    layers: Mutex<Vec<DisplayLayer>>,
}

impl MemoryMapSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All layers received so far.
    pub fn layers(&self) -> Vec<DisplayLayer> {
        self.layers.lock().clone()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.lock().len()
    }

    /// Most recently published layer with `id`.
    pub fn find_layer(&self, id: &LayerId) -> Option<DisplayLayer> {
        self.layers
            .lock()
            .iter()
            .rev()
            .find(|layer| &layer.id == id)
            .cloned()
    }
}

impl MapSink for MemoryMapSink {
    fn add_layer(&self, layer: DisplayLayer) -> Result<(), SinkError> {
        debug!(layer = %layer.id, elements = layer.elements.len(), "Layer added to memory sink");
        self.layers.lock().push(layer);
        Ok(())
    }
}

/// Writes each layer as a GeoJSON FeatureCollection, replacing the file.
///
/// Every feature's properties gain a `display` member holding the style and
/// the rendered popup.
#[derive(Debug, Clone)]
pub struct GeoJsonFileSink {
    path: PathBuf,
}

impl GeoJsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MapSink for GeoJsonFileSink {
    fn add_layer(&self, layer: DisplayLayer) -> Result<(), SinkError> {
        let document = layer_to_value(&layer)?;
        let text = serde_json::to_string_pretty(&document)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| SinkError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&self.path, text).map_err(|source| SinkError::Io {
            path: self.path.clone(),
            source,
        })?;

        info!(
            layer = %layer.id,
            elements = layer.elements.len(),
            path = %self.path.display(),
            "Layer written"
        );
        Ok(())
    }
}

fn element_to_value(element: &DisplayElement) -> Result<Value, SinkError> {
    let mut properties = Map::new();
    for (field, value) in &element.attributes {
        properties.insert(field.clone(), serde_json::to_value(value)?);
    }
    properties.insert(
        "display".to_string(),
        json!({
            "style": serde_json::to_value(element.style.as_ref())?,
            "popup": {
                "title": element.popup.render_title(&element.attributes),
                "content": element.popup.render_content(&element.attributes),
            },
        }),
    );
    Ok(json!({
        "type": "Feature",
        "geometry": element.geometry.as_ref().map(geometry_to_value),
        "properties": properties,
    }))
}

fn layer_to_value(layer: &DisplayLayer) -> Result<Value, SinkError> {
    let features = layer
        .elements
        .iter()
        .map(element_to_value)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(json!({
        "type": "FeatureCollection",
        "id": layer.id.as_str(),
        "name": layer.title,
        "features": features,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{Feature, Geometry, Polygon};
    use crate::geojson::parse_feature_collection;
    use crate::publish::Publisher;

    fn zone(id: i64) -> Feature {
        Feature::new(Geometry::Polygon(
            Polygon::from_xy(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]).unwrap(),
        ))
        .with_attribute("OBJECTID", id)
        .with_attribute("FLD_ZONE", "VE")
        .with_attribute("ESRI_SYMBOLOGY", "Coastal High Hazard")
    }

    #[test]
    fn test_memory_sink_finds_latest_layer() {
        let sink = MemoryMapSink::new();
        let publisher = Publisher::default();
        publisher.publish(vec![zone(1)], &sink).unwrap();
        publisher.publish(vec![zone(1), zone(2)], &sink).unwrap();

        assert_eq!(sink.layer_count(), 2);
        let latest = sink.find_layer(publisher.layer_id()).unwrap();
        assert_eq!(latest.elements.len(), 2);
        assert!(sink.find_layer(&LayerId::new("other")).is_none());
    }

    #[test]
    fn test_file_sink_writes_feature_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("zones.geojson");
        let sink = GeoJsonFileSink::new(&path);

        Publisher::default().publish(vec![zone(7)], &sink).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["id"], "coastal-flood-zones");
        let display = &value["features"][0]["properties"]["display"];
        assert_eq!(display["popup"]["title"], "VE");
        assert_eq!(display["popup"]["content"], "Esri Symbology: Coastal High Hazard");
        assert_eq!(display["style"]["fill"], json!([0, 120, 255, 0.5]));

        let features = parse_feature_collection(&text).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].attribute("OBJECTID"), zone(7).attribute("OBJECTID"));
    }

    #[test]
    fn test_file_sink_writes_empty_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.geojson");
        Publisher::default()
            .publish(Vec::new(), &GeoJsonFileSink::new(&path))
            .unwrap();

        let value: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["features"], json!([]));
    }

    #[test]
    fn test_file_sink_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be overwritten as a file.
        let err = Publisher::default()
            .publish(Vec::new(), &GeoJsonFileSink::new(dir.path()))
            .unwrap_err();
        assert!(matches!(err, SinkError::Io { .. }));
    }
}
