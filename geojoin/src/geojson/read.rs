//! FeatureCollection parsing.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::GeoJsonError;
use crate::feature::{AttributeValue, Attributes, Coord, Feature, Geometry, Polygon};

#[derive(Debug, Deserialize)]
struct RawCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    geometry: Option<RawGeometry>,
    #[serde(default)]
    properties: Option<serde_json::Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

/// Read and parse a GeoJSON FeatureCollection file.
pub fn load_feature_collection(path: &Path) -> Result<Vec<Feature>, GeoJsonError> {
    let text = std::fs::read_to_string(path).map_err(|source| GeoJsonError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_feature_collection(&text)
}

/// Parse a GeoJSON FeatureCollection document.
///
/// Feature order is preserved.
pub fn parse_feature_collection(text: &str) -> Result<Vec<Feature>, GeoJsonError> {
    let raw: RawCollection = serde_json::from_str(text)?;
    if raw.kind != "FeatureCollection" {
        return Err(GeoJsonError::NotAFeatureCollection(raw.kind));
    }
    raw.features.into_iter().map(convert_feature).collect()
}

fn convert_feature(raw: RawFeature) -> Result<Feature, GeoJsonError> {
    let geometry = raw.geometry.map(convert_geometry).transpose()?;
    let attributes: Attributes = raw
        .properties
        .unwrap_or_default()
        .iter()
        .map(|(k, v)| (k.clone(), AttributeValue::from_json(v)))
        .collect();
    Ok(Feature {
        geometry,
        attributes,
    })
}

fn convert_geometry(raw: RawGeometry) -> Result<Geometry, GeoJsonError> {
    match raw.kind.as_str() {
        "Point" => {
            let position: Vec<f64> = coordinates(&raw)?;
            Ok(Geometry::Point(to_coord(&raw.kind, &position)?))
        }
        "Polygon" => {
            let rings: Vec<Vec<Vec<f64>>> = coordinates(&raw)?;
            Ok(Geometry::Polygon(to_polygon(&raw.kind, &rings)?))
        }
        "MultiPolygon" => {
            let polygons: Vec<Vec<Vec<Vec<f64>>>> = coordinates(&raw)?;
            let polygons = polygons
                .iter()
                .map(|rings| to_polygon(&raw.kind, rings))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Geometry::multi_polygon(polygons)?)
        }
        other => Err(GeoJsonError::UnsupportedGeometry(other.to_string())),
    }
}

fn coordinates<T: serde::de::DeserializeOwned>(raw: &RawGeometry) -> Result<T, GeoJsonError> {
    serde_json::from_value(raw.coordinates.clone()).map_err(|e| GeoJsonError::InvalidCoordinates {
        kind: raw.kind.clone(),
        reason: e.to_string(),
    })
}

fn to_coord(kind: &str, position: &[f64]) -> Result<Coord, GeoJsonError> {
    match position {
        // Altitude, if present, is ignored.
        [x, y, ..] => Ok(Coord::new(*x, *y)?),
        _ => Err(GeoJsonError::InvalidCoordinates {
            kind: kind.to_string(),
            reason: format!("position has {} values, expected at least 2", position.len()),
        }),
    }
}

fn to_polygon(kind: &str, rings: &[Vec<Vec<f64>>]) -> Result<Polygon, GeoJsonError> {
    let mut rings = rings.iter().map(|ring| {
        ring.iter()
            .map(|position| to_coord(kind, position))
            .collect::<Result<Vec<_>, _>>()
    });
    let exterior = rings.next().ok_or_else(|| GeoJsonError::InvalidCoordinates {
        kind: kind.to_string(),
        reason: "polygon has no rings".to_string(),
    })??;
    let holes = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, holes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::GeometryError;

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [-80.1, 25.8, 3.0]},
                "properties": {"OBJECTID": 1, "NAME": "Miami", "TAGS": ["a"]}
            },
            {
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0, 0], [4, 0], [4, 4], [0, 4], [0, 0]]]
                },
                "properties": {"OBJECTID": 2, "FLD_ZONE": "AE"}
            },
            {
                "type": "Feature",
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[0, 0], [1, 0], [1, 1], [0, 0]]],
                        [[[5, 5], [6, 5], [6, 6], [5, 5]]]
                    ]
                },
                "properties": null
            },
            {"type": "Feature", "geometry": null, "properties": {"OBJECTID": 4}}
        ]
    }"#;

    #[test]
    fn test_parse_collection() {
        let features = parse_feature_collection(COLLECTION).unwrap();
        assert_eq!(features.len(), 4);

        assert_eq!(features[0].geometry, Some(Geometry::point(-80.1, 25.8).unwrap()));
        assert_eq!(
            features[0].attribute("TAGS"),
            Some(&AttributeValue::Text(r#"["a"]"#.to_string()))
        );

        match &features[1].geometry {
            Some(Geometry::Polygon(poly)) => assert_eq!(poly.exterior().len(), 4),
            other => panic!("expected polygon, got {:?}", other),
        }
        assert!(matches!(features[2].geometry, Some(Geometry::MultiPolygon(ref p)) if p.len() == 2));
        assert!(features[2].attributes.is_empty());
        assert!(features[3].geometry.is_none());
        assert_eq!(features[3].attribute("OBJECTID"), Some(&AttributeValue::Integer(4)));
    }

    #[test]
    fn test_rejects_non_collection() {
        let err = parse_feature_collection(r#"{"type": "Feature"}"#).unwrap_err();
        assert!(matches!(err, GeoJsonError::NotAFeatureCollection(ref k) if k == "Feature"));
    }

    #[test]
    fn test_rejects_unsupported_geometry() {
        let text = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[0,0],[1,1]]}}
        ]}"#;
        let err = parse_feature_collection(text).unwrap_err();
        assert!(matches!(err, GeoJsonError::UnsupportedGeometry(ref k) if k == "LineString"));
    }

    #[test]
    fn test_rejects_short_position() {
        let text = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1]}}
        ]}"#;
        assert!(matches!(
            parse_feature_collection(text).unwrap_err(),
            GeoJsonError::InvalidCoordinates { .. }
        ));
    }

    #[test]
    fn test_rejects_degenerate_polygon() {
        let text = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,1],[0,0]]]}}
        ]}"#;
        assert!(matches!(
            parse_feature_collection(text).unwrap_err(),
            GeoJsonError::Geometry(GeometryError::DegenerateRing(2))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_feature_collection(&dir.path().join("missing.geojson")).unwrap_err();
        assert!(matches!(err, GeoJsonError::Io { .. }));
    }
}
