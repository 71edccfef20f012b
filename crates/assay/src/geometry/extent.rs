//! Expected territorial extent for adequacy checks.

use geo::{BoundingRect, CoordsIter};
use geo_types::{Coord, Geometry};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BBox {
    pub fn new(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        }
    }

    pub fn contains_point(&self, lat: f64, lng: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lng >= self.min_lng && lng <= self.max_lng
    }

    fn contains_coord(&self, coord: &Coord<f64>) -> bool {
        self.contains_point(coord.y, coord.x)
    }

    /// Compute from a geo-types Geometry.
    pub fn from_geometry(geom: &Geometry<f64>) -> Option<Self> {
        let rect = geom.bounding_rect()?;
        Some(Self {
            min_lat: rect.min().y,
            max_lat: rect.max().y,
            min_lng: rect.min().x,
            max_lng: rect.max().x,
        })
    }

    fn contains_bbox(&self, other: &BBox) -> bool {
        self.min_lat <= other.min_lat
            && self.max_lat >= other.max_lat
            && self.min_lng <= other.min_lng
            && self.max_lng >= other.max_lng
    }
}

/// Union of boxes a geometry must fall within. Coordinates are read as
/// `x = longitude, y = latitude`. An empty extent accepts everything.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Extent {
    boxes: Vec<BBox>,
}

impl Extent {
    pub fn new(boxes: Vec<BBox>) -> Self {
        Self { boxes }
    }

    /// No territorial constraint.
    pub fn world() -> Self {
        Self::default()
    }

    /// Russian Federation, split at the antimeridian.
    pub fn russia() -> Self {
        Self::new(vec![
            BBox::new(41.18, 81.86, 19.64, 180.0),
            BBox::new(64.0, 72.0, -180.0, -168.97),
        ])
    }

    pub fn is_unbounded(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Returns true if every coordinate of `geometry` lies inside the extent.
    pub fn contains(&self, geometry: &Geometry<f64>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        if let Some(bounds) = BBox::from_geometry(geometry) {
            if self.boxes.iter().any(|b| b.contains_bbox(&bounds)) {
                return true;
            }
        }
        // Rings can straddle boxes; fall back to a per-coordinate check.
        geometry
            .coords_iter()
            .all(|c| self.boxes.iter().any(|b| b.contains_coord(&c)))
    }
}
