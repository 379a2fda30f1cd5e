//! Publishing deduplicated features as a display layer.
//!
//! The [`Publisher`] wraps every feature in a [`DisplayElement`] sharing one
//! style and one popup template, names the layer, and hands it to a
//! [`MapSink`] in a single call. An empty feature set still publishes an
//! (empty) layer.

mod sink;
mod style;
mod template;

pub use sink::{GeoJsonFileSink, MapSink, MemoryMapSink, SinkError};
pub use style::{
    ColorParseError, DisplayStyle, Rgba, DEFAULT_FILL, DEFAULT_OUTLINE, DEFAULT_OUTLINE_WIDTH,
};
pub use template::{render, PopupTemplate, DEFAULT_POPUP_CONTENT, DEFAULT_POPUP_TITLE};

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::feature::{Attributes, Feature, Geometry};

/// Default identifier of the published layer.
pub const DEFAULT_LAYER_ID: &str = "coastal-flood-zones";

/// Default human-readable layer title.
pub const DEFAULT_LAYER_TITLE: &str = "Coastal Flood Zones";

/// Identifier of a layer within a sink.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LayerId(String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new(DEFAULT_LAYER_ID)
    }
}

/// One renderable feature.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayElement {
    pub geometry: Option<Geometry>,
    pub attributes: Attributes,
    pub style: Arc<DisplayStyle>,
    pub popup: Arc<PopupTemplate>,
}

/// A named collection of display elements.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayLayer {
    pub id: LayerId,
    pub title: String,
    pub elements: Vec<DisplayElement>,
}

impl DisplayLayer {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Builds layers and delivers them to a sink.
#[derive(Debug, Clone)]
pub struct Publisher {
    layer_id: LayerId,
    title: String,
    style: Arc<DisplayStyle>,
    popup: Arc<PopupTemplate>,
}

impl Default for Publisher {
    fn default() -> Self {
        Self::new(LayerId::default(), DEFAULT_LAYER_TITLE)
    }
}

impl Publisher {
    /// Publisher with the default style and popup.
    pub fn new(layer_id: LayerId, title: impl Into<String>) -> Self {
        Self {
            layer_id,
            title: title.into(),
            style: Arc::new(DisplayStyle::default()),
            popup: Arc::new(PopupTemplate::default()),
        }
    }

    pub fn with_style(mut self, style: DisplayStyle) -> Self {
        self.style = Arc::new(style);
        self
    }

    pub fn with_popup(mut self, popup: PopupTemplate) -> Self {
        self.popup = Arc::new(popup);
        self
    }

    pub fn layer_id(&self) -> &LayerId {
        &self.layer_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn style(&self) -> &DisplayStyle {
        &self.style
    }

    pub fn popup(&self) -> &PopupTemplate {
        &self.popup
    }

    /// Wrap `features` into a layer, one element each, in order.
    pub fn build_layer(&self, features: Vec<Feature>) -> DisplayLayer {
        let elements = features
            .into_iter()
            .map(|feature| DisplayElement {
                geometry: feature.geometry,
                attributes: feature.attributes,
                style: Arc::clone(&self.style),
                popup: Arc::clone(&self.popup),
            })
            .collect();
        DisplayLayer {
            id: self.layer_id.clone(),
            title: self.title.clone(),
            elements,
        }
    }

    /// Build the layer and add it to `sink`. Returns the element count.
    pub fn publish<S>(&self, features: Vec<Feature>, sink: &S) -> Result<usize, SinkError>
    where
        S: MapSink + ?Sized,
    {
        let layer = self.build_layer(features);
        let count = layer.len();
        sink.add_layer(layer)?;
        info!(layer = %self.layer_id, elements = count, "Layer published");
        Ok(count)
    }
}
