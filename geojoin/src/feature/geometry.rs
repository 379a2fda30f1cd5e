//! Planar geometry primitives and the intersection predicate.
//!
//! Geometries are compared only through [`Geometry::intersects`]; the join
//! engine never relies on structural equality. Coordinates are treated as
//! planar `(x, y)` pairs (longitude, latitude for geographic data).

use thiserror::Error;

/// Errors raised when constructing geometries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// A ring needs at least three distinct vertices
    #[error("ring has {0} distinct vertices, at least 3 are required")]
    DegenerateRing(usize),

    /// A coordinate was NaN or infinite
    #[error("coordinate ({x}, {y}) is not finite")]
    NonFinite { x: f64, y: f64 },

    /// A multi-polygon without members
    #[error("multi-polygon has no member polygons")]
    EmptyMultiPolygon,
}

/// A single planar position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    /// Horizontal component (longitude).
    pub x: f64,
    /// Vertical component (latitude).
    pub y: f64,
}

impl Coord {
    /// Create a coordinate, rejecting NaN and infinities.
    pub fn new(x: f64, y: f64) -> Result<Self, GeometryError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(GeometryError::NonFinite { x, y });
        }
        Ok(Self { x, y })
    }
}

/// Axis-aligned bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Envelope {
    /// Create an envelope from two opposite corners in any order.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            min_x: x1.min(x2),
            min_y: y1.min(y2),
            max_x: x1.max(x2),
            max_y: y1.max(y2),
        }
    }

    fn of_points(points: &[Coord]) -> Self {
        let mut env = Envelope {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        for p in points {
            env.min_x = env.min_x.min(p.x);
            env.min_y = env.min_y.min(p.y);
            env.max_x = env.max_x.max(p.x);
            env.max_y = env.max_y.max(p.y);
        }
        env
    }

    /// Smallest envelope containing both.
    pub fn union(&self, other: &Envelope) -> Envelope {
        Envelope {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Closed-interval overlap test (touching edges intersect).
    pub fn intersects(&self, other: &Envelope) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// Whether the point lies inside or on the boundary.
    pub fn contains(&self, p: Coord) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// The envelope as a counter-clockwise polygon.
    pub fn to_polygon(&self) -> Polygon {
        Polygon {
            exterior: vec![
                Coord { x: self.min_x, y: self.min_y },
                Coord { x: self.max_x, y: self.min_y },
                Coord { x: self.max_x, y: self.max_y },
                Coord { x: self.min_x, y: self.max_y },
            ],
            holes: Vec::new(),
        }
    }
}

/// A polygon with an exterior ring and optional interior rings (holes).
///
/// Rings are stored open: a closing vertex equal to the first one is
/// dropped on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    exterior: Vec<Coord>,
    holes: Vec<Vec<Coord>>,
}

impl Polygon {
    /// Build a polygon, validating every ring.
    pub fn new(exterior: Vec<Coord>, holes: Vec<Vec<Coord>>) -> Result<Self, GeometryError> {
        let exterior = open_ring(exterior)?;
        let holes = holes
            .into_iter()
            .map(open_ring)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { exterior, holes })
    }

    /// Convenience constructor from `(x, y)` tuples with no holes.
    pub fn from_xy(points: &[(f64, f64)]) -> Result<Self, GeometryError> {
        let ring = points
            .iter()
            .map(|&(x, y)| Coord::new(x, y))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(ring, Vec::new())
    }

    /// Exterior ring, open.
    pub fn exterior(&self) -> &[Coord] {
        &self.exterior
    }

    /// Interior rings, open.
    pub fn holes(&self) -> &[Vec<Coord>] {
        &self.holes
    }

    /// Bounding envelope of the exterior ring.
    pub fn envelope(&self) -> Envelope {
        Envelope::of_points(&self.exterior)
    }

    fn rings(&self) -> impl Iterator<Item = &[Coord]> {
        std::iter::once(self.exterior.as_slice()).chain(self.holes.iter().map(Vec::as_slice))
    }

    fn edges(&self) -> impl Iterator<Item = (Coord, Coord)> + '_ {
        self.rings().flat_map(ring_edges)
    }

    /// Point lies in the interior or on any boundary.
    pub fn covers(&self, p: Coord) -> bool {
        if self.edges().any(|(a, b)| on_segment(a, b, p)) {
            return true;
        }
        ring_contains(&self.exterior, p) && !self.holes.iter().any(|h| ring_contains(h, p))
    }

    fn intersects_polygon(&self, other: &Polygon) -> bool {
        if !self.envelope().intersects(&other.envelope()) {
            return false;
        }
        for (a1, a2) in self.edges() {
            if other.edges().any(|(b1, b2)| segments_intersect(a1, a2, b1, b2)) {
                return true;
            }
        }
        // No boundary crossings: one polygon is inside the other or they are disjoint.
        self.covers(other.exterior[0]) || other.covers(self.exterior[0])
    }
}

/// Spatial shape attached to a feature.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coord),
    Envelope(Envelope),
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
}

impl Geometry {
    /// Point geometry from raw coordinates.
    pub fn point(x: f64, y: f64) -> Result<Self, GeometryError> {
        Coord::new(x, y).map(Geometry::Point)
    }

    /// Multi-polygon geometry; at least one member is required.
    pub fn multi_polygon(polygons: Vec<Polygon>) -> Result<Self, GeometryError> {
        if polygons.is_empty() {
            return Err(GeometryError::EmptyMultiPolygon);
        }
        Ok(Geometry::MultiPolygon(polygons))
    }

    /// Bounding envelope of the geometry.
    pub fn envelope(&self) -> Envelope {
        match self {
            Geometry::Point(p) => Envelope::new(p.x, p.y, p.x, p.y),
            Geometry::Envelope(env) => *env,
            Geometry::Polygon(poly) => poly.envelope(),
            Geometry::MultiPolygon(polys) => polys
                .iter()
                .map(Polygon::envelope)
                .reduce(|a, b| a.union(&b))
                .unwrap_or_else(|| Envelope::of_points(&[])),
        }
    }

    /// The `intersects` spatial relationship: the two shapes share at least
    /// one point, boundaries included.
    pub fn intersects(&self, other: &Geometry) -> bool {
        if !self.envelope().intersects(&other.envelope()) {
            return false;
        }
        match (self, other) {
            (Geometry::Point(a), Geometry::Point(b)) => a == b,
            (Geometry::Point(p), shape) | (shape, Geometry::Point(p)) => {
                shape.polygons().iter().any(|poly| poly.covers(*p))
            }
            (Geometry::Envelope(a), Geometry::Envelope(b)) => a.intersects(b),
            (a, b) => {
                let left = a.polygons();
                let right = b.polygons();
                left.iter()
                    .any(|pa| right.iter().any(|pb| pa.intersects_polygon(pb)))
            }
        }
    }

    fn polygons(&self) -> Vec<Polygon> {
        match self {
            Geometry::Point(_) => Vec::new(),
            Geometry::Envelope(env) => vec![env.to_polygon()],
            Geometry::Polygon(poly) => vec![poly.clone()],
            Geometry::MultiPolygon(polys) => polys.clone(),
        }
    }
}

fn open_ring(mut ring: Vec<Coord>) -> Result<Vec<Coord>, GeometryError> {
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    for p in &ring {
        Coord::new(p.x, p.y)?;
    }
    let mut distinct: Vec<Coord> = Vec::with_capacity(ring.len());
    for p in &ring {
        if !distinct.contains(p) {
            distinct.push(*p);
        }
    }
    if distinct.len() < 3 {
        return Err(GeometryError::DegenerateRing(distinct.len()));
    }
    Ok(ring)
}

fn ring_edges(ring: &[Coord]) -> impl Iterator<Item = (Coord, Coord)> + '_ {
    (0..ring.len()).map(move |i| (ring[i], ring[(i + 1) % ring.len()]))
}

/// Even-odd crossing test; boundary handling is the caller's job.
fn ring_contains(ring: &[Coord], p: Coord) -> bool {
    let mut inside = false;
    for (a, b) in ring_edges(ring) {
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

fn orientation(a: Coord, b: Coord, c: Coord) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn on_segment(a: Coord, b: Coord, p: Coord) -> bool {
    orientation(a, b, p) == 0.0
        && p.x >= a.x.min(b.x)
        && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y)
        && p.y <= a.y.max(b.y)
}

fn segments_intersect(p1: Coord, p2: Coord, q1: Coord, q2: Coord) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    on_segment(q1, q2, p1) || on_segment(q1, q2, p2) || on_segment(p1, p2, q1) || on_segment(p1, p2, q2)
}
