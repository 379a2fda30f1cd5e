//! GeoJSON serialisation of geometries and features.

use serde_json::{json, Map, Value};

use crate::feature::{Coord, Feature, Geometry, Polygon};

fn position(c: &Coord) -> Value {
    json!([c.x, c.y])
}

/// Rings are written closed, as GeoJSON requires.
fn ring(points: &[Coord]) -> Value {
    let mut positions: Vec<Value> = points.iter().map(position).collect();
    if let Some(first) = points.first() {
        positions.push(position(first));
    }
    Value::Array(positions)
}

fn polygon_rings(polygon: &Polygon) -> Value {
    let mut rings = vec![ring(polygon.exterior())];
    rings.extend(polygon.holes().iter().map(|hole| ring(hole)));
    Value::Array(rings)
}

/// Convert a geometry to its GeoJSON object.
pub fn geometry_to_value(geometry: &Geometry) -> Value {
    match geometry {
        Geometry::Point(p) => json!({"type": "Point", "coordinates": position(p)}),
        Geometry::Envelope(env) => {
            json!({"type": "Polygon", "coordinates": polygon_rings(&env.to_polygon())})
        }
        Geometry::Polygon(poly) => json!({"type": "Polygon", "coordinates": polygon_rings(poly)}),
        Geometry::MultiPolygon(polys) => json!({
            "type": "MultiPolygon",
            "coordinates": polys.iter().map(polygon_rings).collect::<Vec<_>>(),
        }),
    }
}

/// Convert a feature to a GeoJSON `Feature` object.
///
/// `extra` members are merged into `properties` after the attributes.
pub fn feature_to_value(feature: &Feature, extra: Map<String, Value>) -> Value {
    let mut properties = Map::new();
    for (field, value) in &feature.attributes {
        properties.insert(field.clone(), json!(value));
    }
    properties.extend(extra);
    json!({
        "type": "Feature",
        "geometry": feature.geometry.as_ref().map(geometry_to_value),
        "properties": properties,
    })
}
