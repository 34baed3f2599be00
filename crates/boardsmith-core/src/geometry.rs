use serde::{Deserialize, Serialize};

/// Tolerance used when comparing board-plane coordinates.
pub const EPSILON: f64 = 1e-4;

/// Snap `v` to the nearest multiple of `pitch`, rounding halves away from zero.
///
/// A non-positive or non-finite pitch leaves the value untouched, as does a
/// non-finite value.
pub fn snap(v: f64, pitch: f64) -> f64 {
    if !v.is_finite() || !pitch.is_finite() || pitch <= 0.0 {
        return v;
    }
    (v / pitch).round() * pitch
}

/// A point on the board plane, in millimetres.
///
/// The board lies in the horizontal X/Z plane; height above the board is a
/// per-layer constant and never part of a placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub z: f64,
}

impl Point2D {
    pub fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    pub fn origin() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.z.is_finite()
    }

    pub fn snapped(&self, pitch: f64) -> Self {
        Self::new(snap(self.x, pitch), snap(self.z, pitch))
    }

    pub fn distance_to(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.z - other.z).powi(2)).sqrt()
    }

    pub fn translate(&self, dx: f64, dz: f64) -> Self {
        Self {
            x: self.x + dx,
            z: self.z + dz,
        }
    }

    /// Component-wise difference `self - other`.
    pub fn delta(&self, other: &Point2D) -> (f64, f64) {
        (self.x - other.x, self.z - other.z)
    }

    /// Equality within [`EPSILON`].
    pub fn approx_eq(&self, other: &Point2D) -> bool {
        (self.x - other.x).abs() < EPSILON && (self.z - other.z).abs() < EPSILON
    }

    pub fn to_array(self) -> [f64; 2] {
        [self.x, self.z]
    }
}

impl From<[f64; 2]> for Point2D {
    fn from(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

/// An axis-aligned bounding box on the board plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min: Point2D,
    pub max: Point2D,
}

impl BBox {
    pub fn new(min: Point2D, max: Point2D) -> Self {
        Self { min, max }
    }

    /// Box of the given full width/depth centred on `center`.
    pub fn centered(center: Point2D, width: f64, depth: f64) -> Self {
        let hw = width / 2.0;
        let hd = depth / 2.0;
        Self {
            min: Point2D::new(center.x - hw, center.z - hd),
            max: Point2D::new(center.x + hw, center.z + hd),
        }
    }

    pub fn from_points(points: &[Point2D]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_x = f64::MAX;
        let mut min_z = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_z = f64::MIN;
        for p in points {
            min_x = min_x.min(p.x);
            min_z = min_z.min(p.z);
            max_x = max_x.max(p.x);
            max_z = max_z.max(p.z);
        }
        Some(Self {
            min: Point2D::new(min_x, min_z),
            max: Point2D::new(max_x, max_z),
        })
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn depth(&self) -> f64 {
        self.max.z - self.min.z
    }

    pub fn center(&self) -> Point2D {
        Point2D::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.z + self.max.z) / 2.0,
        )
    }

    pub fn contains_point(&self, p: &Point2D) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.z >= self.min.z && p.z <= self.max.z
    }

    pub fn intersects(&self, other: &BBox) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn union(&self, other: &BBox) -> Self {
        Self {
            min: Point2D::new(self.min.x.min(other.min.x), self.min.z.min(other.min.z)),
            max: Point2D::new(self.max.x.max(other.max.x), self.max.z.max(other.max.z)),
        }
    }

    pub fn expand(&self, margin: f64) -> Self {
        Self {
            min: self.min.translate(-margin, -margin),
            max: self.max.translate(margin, margin),
        }
    }

    pub fn translate(&self, dx: f64, dz: f64) -> Self {
        Self {
            min: self.min.translate(dx, dz),
            max: self.max.translate(dx, dz),
        }
    }
}

/// Orientation of an axis-aligned segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    /// Runs along X (constant Z).
    Horizontal,
    /// Runs along Z (constant X).
    Vertical,
}

/// Classify the segment `a -> b`, or `None` if it is not axis-aligned.
///
/// A zero-length segment is reported as horizontal; callers that care reject
/// degenerate segments before classifying.
pub fn classify_segment(a: &Point2D, b: &Point2D) -> Option<Axis> {
    if (b.z - a.z).abs() < EPSILON {
        Some(Axis::Horizontal)
    } else if (b.x - a.x).abs() < EPSILON {
        Some(Axis::Vertical)
    } else {
        None
    }
}

/// Footprint of an axis-aligned segment of the given width: a rectangle centred
/// on the segment axis covering its full length.
pub fn segment_footprint(a: &Point2D, b: &Point2D, width: f64) -> Option<BBox> {
    let half = width / 2.0;
    match classify_segment(a, b)? {
        Axis::Horizontal => Some(BBox::new(
            Point2D::new(a.x.min(b.x), a.z - half),
            Point2D::new(a.x.max(b.x), a.z + half),
        )),
        Axis::Vertical => Some(BBox::new(
            Point2D::new(a.x - half, a.z.min(b.z)),
            Point2D::new(a.x + half, a.z.max(b.z)),
        )),
    }
}
