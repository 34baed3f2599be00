//! Trace meshing: turns an orthogonal path into one merged, indexed mesh.

use log::debug;
use thiserror::Error;

use crate::geometry::{classify_segment, Axis, Point2D};
use crate::mesh::TriangleMesh;
use crate::routing::OrthogonalPath;

/// Triangles emitted for every rectangular segment.
pub const TRIANGLES_PER_SEGMENT: usize = 2;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    #[error("segment {index} from ({from_x}, {from_z}) to ({to_x}, {to_z}) is not axis-aligned")]
    NotAxisAligned {
        index: usize,
        from_x: f64,
        from_z: f64,
        to_x: f64,
        to_z: f64,
    },

    #[error("trace width must be finite and positive, got {0}")]
    InvalidWidth(f64),
}

/// Outline of one trace segment on the board plane, corners in
/// counter-clockwise order seen from above.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentOutline {
    pub axis: Axis,
    pub corners: [Point2D; 4],
}

/// Build the rectangle outline of `a -> b` with the given width.
pub fn segment_outline(
    index: usize,
    a: &Point2D,
    b: &Point2D,
    width: f64,
) -> Result<SegmentOutline, MeshError> {
    let half = width / 2.0;
    let axis = classify_segment(a, b).ok_or(MeshError::NotAxisAligned {
        index,
        from_x: a.x,
        from_z: a.z,
        to_x: b.x,
        to_z: b.z,
    })?;

    let (min, max) = match axis {
        Axis::Horizontal => (
            Point2D::new(a.x.min(b.x), a.z - half),
            Point2D::new(a.x.max(b.x), a.z + half),
        ),
        Axis::Vertical => (
            Point2D::new(a.x - half, a.z.min(b.z)),
            Point2D::new(a.x + half, a.z.max(b.z)),
        ),
    };

    Ok(SegmentOutline {
        axis,
        corners: [
            min,
            Point2D::new(max.x, min.z),
            max,
            Point2D::new(min.x, max.z),
        ],
    })
}

/// Triangulate one outline as a flat quad at height `y` facing up.
fn triangulate_outline(outline: &SegmentOutline, y: f64) -> TriangleMesh {
    let mut mesh = TriangleMesh::new();
    for c in &outline.corners {
        mesh.push_vertex([c.x, y, c.z], [0.0, 1.0, 0.0], [c.x, c.z]);
    }
    // Corners run min -> +x -> max -> +z; this winding faces +Y.
    mesh.push_triangle(0, 2, 1);
    mesh.push_triangle(0, 3, 2);
    mesh
}

/// Mesh an orthogonal path as a flat copper trace of `width` at `layer_height`.
///
/// Each segment becomes its own rectangle; rectangles overlap at bends and are
/// not welded. The result has exactly [`TRIANGLES_PER_SEGMENT`] triangles per
/// segment.
pub fn mesh_path(
    path: &OrthogonalPath,
    width: f64,
    layer_height: f64,
) -> Result<TriangleMesh, MeshError> {
    mesh_points(path.points(), width, layer_height)
}

/// Same as [`mesh_path`] for a raw point list. Segments that are not
/// axis-aligned are rejected rather than approximated.
pub fn mesh_points(
    points: &[Point2D],
    width: f64,
    layer_height: f64,
) -> Result<TriangleMesh, MeshError> {
    if !width.is_finite() || width <= 0.0 {
        return Err(MeshError::InvalidWidth(width));
    }

    let outlines = points
        .windows(2)
        .enumerate()
        .map(|(i, w)| segment_outline(i, &w[0], &w[1], width))
        .collect::<Result<Vec<_>, _>>()?;

    let mut merged = TriangleMesh::new();
    for outline in &outlines {
        merged.merge(&triangulate_outline(outline, layer_height));
    }

    debug!(
        "meshed trace: {} segments, {} vertices, {} triangles",
        outlines.len(),
        merged.num_vertices(),
        merged.num_triangles()
    );
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::route;

    fn path(points: &[(f64, f64)]) -> OrthogonalPath {
        OrthogonalPath::new(points.iter().map(|&(x, z)| Point2D::new(x, z)).collect()).unwrap()
    }

    #[test]
    fn test_two_segment_path_has_four_triangles() {
        let p = path(&[(0.0, 0.0), (5.0, 0.0), (5.0, 2.0)]);
        let mesh = mesh_path(&p, 0.55, 0.037).unwrap();
        assert_eq!(mesh.num_triangles(), 4);
        assert_eq!(mesh.num_vertices(), 8);
        assert!(mesh.is_consistent());
    }

    #[test]
    fn test_triangle_count_per_segment() {
        let p = path(&[(0.0, 0.0), (5.0, 0.0), (5.0, 5.0), (-5.0, 5.0), (-5.0, -2.5)]);
        let mesh = mesh_path(&p, 1.0, 0.0).unwrap();
        assert_eq!(mesh.num_triangles(), TRIANGLES_PER_SEGMENT * p.segment_count());
    }

    #[test]
    fn test_second_segment_indices_are_offset() {
        let p = path(&[(0.0, 0.0), (5.0, 0.0), (5.0, 2.0)]);
        let mesh = mesh_path(&p, 0.5, 0.0).unwrap();
        assert_eq!(&mesh.indices[..6], &[0, 2, 1, 0, 3, 2]);
        assert_eq!(&mesh.indices[6..], &[4, 6, 5, 4, 7, 6]);
    }

    #[test]
    fn test_outline_covers_segment_with_width() {
        let p = path(&[(5.0, 2.0), (0.0, 2.0)]);
        let mesh = mesh_path(&p, 1.0, 0.25).unwrap();
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, [0.0, 0.25, 1.5]);
        assert_eq!(max, [5.0, 0.25, 2.5]);
    }

    #[test]
    fn test_faces_up() {
        let p = path(&[(0.0, 0.0), (0.0, 3.0)]);
        let mesh = mesh_path(&p, 1.0, 0.0).unwrap();
        let pos = |i: u32| {
            let i = i as usize * 3;
            [mesh.positions[i], mesh.positions[i + 1], mesh.positions[i + 2]]
        };
        for t in mesh.indices.chunks_exact(3) {
            let (a, b, c) = (pos(t[0]), pos(t[1]), pos(t[2]));
            let e1 = [b[0] - a[0], b[2] - a[2]];
            let e2 = [c[0] - a[0], c[2] - a[2]];
            // y component of e1 x e2 with both edges in the X/Z plane
            assert!(e1[1] * e2[0] - e1[0] * e2[1] > 0.0);
        }
        assert!(mesh.normals.chunks_exact(3).all(|n| n == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn test_rejects_diagonal_segment() {
        let points = [Point2D::new(0.0, 0.0), Point2D::new(3.0, 4.0)];
        let err = mesh_points(&points, 0.5, 0.0).unwrap_err();
        assert!(matches!(err, MeshError::NotAxisAligned { index: 0, .. }));
    }

    #[test]
    fn test_rejects_bad_width() {
        let p = path(&[(0.0, 0.0), (0.0, 3.0)]);
        assert_eq!(mesh_path(&p, 0.0, 0.0), Err(MeshError::InvalidWidth(0.0)));
        assert!(mesh_path(&p, f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_routed_path_meshes() {
        let p = route(Point2D::new(0.0, 0.0), Point2D::new(5.0, 2.5), 1.25).unwrap();
        let mesh = mesh_path(&p, 0.55, 0.037).unwrap();
        assert_eq!(mesh.num_triangles(), 4);
    }
}
