use geo::{Area, Centroid, Contains, Coord, Intersects, LineString};
use serde::{Deserialize, Serialize};

/// Error types for geometric construction
#[derive(Debug)]
pub enum GeometryError {
    /// A polygon ring needs at least 3 points
    TooFewPoints(usize),
    /// A symbol bounding box needs exactly 4 distinct corners
    BadSymbolBox(usize),
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::TooFewPoints(n) => {
                write!(f, "polygon needs at least 3 points, got {}", n)
            }
            GeometryError::BadSymbolBox(n) => {
                write!(f, "symbol bbox needs 4 distinct corners, got {}", n)
            }
        }
    }
}

impl std::error::Error for GeometryError {}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Recover original image-pixel coordinates from the vectorization
    /// service's normalized frame.
    pub fn unscale(&self, factor: f64) -> Point {
        Point::new(self.x / factor, self.y / factor)
    }

    /// Forward scaling into the normalized frame (the inverse of
    /// [`Point::unscale`]).
    pub fn scale(&self, factor: f64) -> Point {
        Point::new(self.x * factor, self.y * factor)
    }

    fn to_coord(self) -> Coord<f64> {
        Coord { x: self.x, y: self.y }
    }
}

/// Closed ring of at least 3 points. Used both for room boundaries and
/// for symbol bounding boxes; the closing edge from the last point back
/// to the first is implicit.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    points: Vec<Point>,
    ring: geo::Polygon<f64>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Result<Self, GeometryError> {
        if points.len() < 3 {
            return Err(GeometryError::TooFewPoints(points.len()));
        }
        let coords: Vec<Coord<f64>> = points.iter().map(|p| p.to_coord()).collect();
        let ring = geo::Polygon::new(LineString::new(coords), vec![]);
        Ok(Self { points, ring })
    }

    /// Axis-aligned 4-corner box, the shape of a detector bounding box.
    pub fn axis_aligned(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self, GeometryError> {
        let (min_x, max_x) = (x1.min(x2), x1.max(x2));
        let (min_y, max_y) = (y1.min(y2), y1.max(y2));
        Polygon::new(vec![
            Point::new(min_x, min_y),
            Point::new(max_x, min_y),
            Point::new(max_x, max_y),
            Point::new(min_x, max_y),
        ])
    }

    /// The ring's vertices in order, without the implicit closing point.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn contains(&self, point: &Point) -> bool {
        self.ring.contains(&geo::Point::new(point.x, point.y))
    }

    pub fn intersects(&self, other: &Polygon) -> bool {
        self.ring.intersects(&other.ring)
    }

    pub fn area(&self) -> f64 {
        self.ring.unsigned_area()
    }

    /// Area-weighted centroid. Degenerate (zero-area) rings fall back to
    /// the vertex average so the operation stays total.
    pub fn centroid(&self) -> Point {
        match self.ring.centroid() {
            Some(c) => Point::new(c.x(), c.y()),
            None => {
                let n = self.points.len() as f64;
                let (sx, sy) = self
                    .points
                    .iter()
                    .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
                Point::new(sx / n, sy / n)
            }
        }
    }
}
