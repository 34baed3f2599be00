//! Manhattan routing between two board-plane points.
//!
//! Routes have at most one bend. The bend direction is picked from the larger
//! of the two deltas, with horizontal winning ties, so that routing A -> B and
//! B -> A always bends on the same axis.

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{classify_segment, Axis, BBox, Point2D};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("a path needs at least two points, got {0}")]
    TooFewPoints(usize),

    #[error("zero-length segment at index {0}")]
    ZeroLength(usize),

    #[error("segment {0} is not axis-aligned")]
    Diagonal(usize),

    #[error("path contains a non-finite coordinate")]
    NonFinite,
}

/// An ordered run of axis-aligned segments.
///
/// Always holds at least two points, and no two consecutive points coincide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point2D>", into = "Vec<Point2D>")]
pub struct OrthogonalPath {
    points: Vec<Point2D>,
}

impl OrthogonalPath {
    pub fn new(points: Vec<Point2D>) -> Result<Self, PathError> {
        if points.len() < 2 {
            return Err(PathError::TooFewPoints(points.len()));
        }
        if points.iter().any(|p| !p.is_finite()) {
            return Err(PathError::NonFinite);
        }
        for (i, w) in points.windows(2).enumerate() {
            if w[0].approx_eq(&w[1]) {
                return Err(PathError::ZeroLength(i));
            }
            if classify_segment(&w[0], &w[1]).is_none() {
                return Err(PathError::Diagonal(i));
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    pub fn start(&self) -> Point2D {
        self.points[0]
    }

    pub fn end(&self) -> Point2D {
        self.points[self.points.len() - 1]
    }

    pub fn segment_count(&self) -> usize {
        self.points.len() - 1
    }

    pub fn segments(&self) -> impl Iterator<Item = (Point2D, Point2D)> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }

    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| a.distance_to(&b)).sum()
    }

    /// Bounding box of the centreline expanded by half the trace width.
    pub fn bbox(&self, width: f64) -> BBox {
        let bbox = BBox::from_points(&self.points)
            .unwrap_or_else(|| BBox::new(self.start(), self.start()));
        bbox.expand(width / 2.0)
    }
}

impl TryFrom<Vec<Point2D>> for OrthogonalPath {
    type Error = PathError;

    fn try_from(points: Vec<Point2D>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<OrthogonalPath> for Vec<Point2D> {
    fn from(path: OrthogonalPath) -> Self {
        path.points
    }
}

/// Axis of the first leg of a route from `start` to `end`.
///
/// `|dx| >= |dz|` bends horizontally first. The comparison is symmetric in
/// its arguments, so both directions agree.
pub fn bend_axis(start: &Point2D, end: &Point2D) -> Axis {
    let dx = (end.x - start.x).abs();
    let dz = (end.z - start.z).abs();
    if dx >= dz {
        Axis::Horizontal
    } else {
        Axis::Vertical
    }
}

/// Route from `start` to `end` on a grid of `pitch`.
///
/// Both endpoints are snapped first. Returns `None` when they snap to the same
/// point: a zero-length trace is declined, not an error. Colinear endpoints
/// give a single segment.
pub fn route(start: Point2D, end: Point2D, pitch: f64) -> Option<OrthogonalPath> {
    let a = start.snapped(pitch);
    let b = end.snapped(pitch);

    if !a.is_finite() || !b.is_finite() {
        debug!("route declined: non-finite endpoint");
        return None;
    }
    if a.approx_eq(&b) {
        debug!("route declined: endpoints coincide at ({}, {})", a.x, a.z);
        return None;
    }

    let bend = match bend_axis(&a, &b) {
        Axis::Horizontal => Point2D::new(b.x, a.z),
        Axis::Vertical => Point2D::new(a.x, b.z),
    };

    let mut points = vec![a];
    if !bend.approx_eq(&a) && !bend.approx_eq(&b) {
        points.push(bend);
    }
    points.push(b);

    debug!(
        "routed ({}, {}) -> ({}, {}) with {} segment(s)",
        a.x,
        a.z,
        b.x,
        b.z,
        points.len() - 1
    );
    OrthogonalPath::new(points).ok()
}
