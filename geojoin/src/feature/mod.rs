//! Feature records: a geometry plus an attribute bag.
//!
//! A [`Feature`] is what datasets return from queries and what the join,
//! dedupe and publish stages pass along. One attribute (commonly `OBJECTID`)
//! acts as the identity key; see [`crate::dedupe::IdentityKey`].
//!
//! # Example
//!
//! ```
//! use geojoin::feature::{Feature, Geometry};
//!
//! let feature = Feature::new(Geometry::point(-80.1, 25.8).unwrap())
//!     .with_attribute("OBJECTID", 10)
//!     .with_attribute("FLD_ZONE", "AE");
//!
//! assert_eq!(feature.attribute("FLD_ZONE").and_then(|v| v.as_str()), Some("AE"));
//! ```

mod attributes;
mod geometry;

pub use attributes::{AttributeValue, Attributes};
pub use geometry::{Coord, Envelope, Geometry, GeometryError, Polygon};

/// A geospatial record.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Spatial shape; `None` when a query asked for attributes only.
    pub geometry: Option<Geometry>,
    /// Field name → value.
    pub attributes: Attributes,
}

impl Feature {
    /// Create a feature with a geometry and no attributes.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry: Some(geometry),
            attributes: Attributes::new(),
        }
    }

    /// Create an attribute-only feature.
    pub fn without_geometry() -> Self {
        Self {
            geometry: None,
            attributes: Attributes::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(mut self, field: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(field.into(), value.into());
        self
    }

    /// Look up an attribute by field name.
    pub fn attribute(&self, field: &str) -> Option<&AttributeValue> {
        self.attributes.get(field)
    }

    /// Whether this feature's geometry intersects `other`.
    ///
    /// Features without geometry intersect nothing.
    pub fn intersects(&self, other: &Geometry) -> bool {
        self.geometry
            .as_ref()
            .is_some_and(|geometry| geometry.intersects(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_without_geometry_never_intersects() {
        let feature = Feature::without_geometry().with_attribute("OBJECTID", 1);
        assert!(!feature.intersects(&Geometry::point(0.0, 0.0).unwrap()));
    }

    #[test]
    fn test_with_attribute_overwrites() {
        let feature = Feature::without_geometry()
            .with_attribute("OBJECTID", 1)
            .with_attribute("OBJECTID", 2);
        assert_eq!(feature.attribute("OBJECTID"), Some(&AttributeValue::Integer(2)));
    }
}
