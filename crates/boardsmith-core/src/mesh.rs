//! Indexed triangle meshes and the parametric shapes the primitive factory
//! is built from.
//!
//! Coordinates follow the board convention: X and Z span the board plane,
//! Y points up out of the top face.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Output triangle mesh consumed by the rendering collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    /// Flat vertex positions: `[x0, y0, z0, x1, y1, z1, ...]`.
    pub positions: Vec<f32>,
    /// Flat vertex normals, same length as `positions`.
    pub normals: Vec<f32>,
    /// Flat texture coordinates: `[u0, v0, u1, v1, ...]`.
    pub uvs: Vec<f32>,
    /// Triangle indices into the vertex buffers.
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_vertices(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Append a vertex and return its index.
    pub fn push_vertex(&mut self, position: [f64; 3], normal: [f64; 3], uv: [f64; 2]) -> u32 {
        let index = self.num_vertices() as u32;
        self.positions
            .extend(position.iter().map(|&c| c as f32));
        self.normals.extend(normal.iter().map(|&c| c as f32));
        self.uvs.extend(uv.iter().map(|&c| c as f32));
        index
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Merge another mesh into this one.
    ///
    /// Vertex attributes are concatenated and the other mesh's indices are
    /// shifted by this mesh's vertex count so they stay valid.
    pub fn merge(&mut self, other: &TriangleMesh) {
        let offset = self.num_vertices() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.uvs.extend_from_slice(&other.uvs);
        self.indices
            .extend(other.indices.iter().map(|&i| i + offset));
    }

    /// Translate every vertex.
    pub fn translate(&mut self, dx: f64, dy: f64, dz: f64) {
        for v in self.positions.chunks_exact_mut(3) {
            v[0] += dx as f32;
            v[1] += dy as f32;
            v[2] += dz as f32;
        }
    }

    /// Axis-aligned bounds as `([min_x, min_y, min_z], [max_x, max_y, max_z])`.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let mut chunks = self.positions.chunks_exact(3);
        let first = chunks.next()?;
        let mut min = [first[0], first[1], first[2]];
        let mut max = min;
        for v in chunks {
            for axis in 0..3 {
                min[axis] = min[axis].min(v[axis]);
                max[axis] = max[axis].max(v[axis]);
            }
        }
        Some((min, max))
    }

    /// Check that every index refers to an existing vertex and that the
    /// attribute buffers agree on the vertex count.
    pub fn is_consistent(&self) -> bool {
        let n = self.num_vertices();
        self.positions.len() % 3 == 0
            && self.normals.len() == self.positions.len()
            && self.uvs.len() / 2 == n
            && self.indices.len() % 3 == 0
            && self.indices.iter().all(|&i| (i as usize) < n)
    }
}

/// Axis-aligned box centred on the origin, one quad per face.
///
/// 24 vertices and 12 triangles, wound counter-clockwise seen from outside.
pub fn box_mesh(width: f64, height: f64, depth: f64) -> TriangleMesh {
    let half = [width / 2.0, height / 2.0, depth / 2.0];
    // (normal axis, sign, u axis, v axis) with u x v pointing along the normal.
    let faces: [(usize, f64, usize, usize); 6] = [
        (0, 1.0, 1, 2),
        (0, -1.0, 2, 1),
        (1, 1.0, 2, 0),
        (1, -1.0, 0, 2),
        (2, 1.0, 0, 1),
        (2, -1.0, 1, 0),
    ];

    let mut mesh = TriangleMesh::new();
    for (n_axis, sign, u_axis, v_axis) in faces {
        let mut normal = [0.0; 3];
        normal[n_axis] = sign;
        let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
        let base = mesh.num_vertices() as u32;
        for (su, sv) in corners {
            let mut p = [0.0; 3];
            p[n_axis] = sign * half[n_axis];
            p[u_axis] = su * half[u_axis];
            p[v_axis] = sv * half[v_axis];
            mesh.push_vertex(p, normal, [(su + 1.0) / 2.0, (sv + 1.0) / 2.0]);
        }
        mesh.push_triangle(base, base + 1, base + 2);
        mesh.push_triangle(base, base + 2, base + 3);
    }
    mesh
}

/// Open-ended cylinder along Y, centred on the origin.
///
/// The seam column is duplicated so UVs wrap cleanly: `(segments + 1) * 2`
/// vertices and `segments * 2` outward-facing triangles.
pub fn open_cylinder_mesh(radius: f64, height: f64, segments: u32) -> TriangleMesh {
    let n = segments.max(3);
    let half = height / 2.0;
    let mut mesh = TriangleMesh::new();

    for i in 0..=n {
        let u = i as f64 / n as f64;
        let theta = 2.0 * PI * u;
        let (s, c) = theta.sin_cos();
        let normal = [c, 0.0, s];
        mesh.push_vertex([radius * c, -half, radius * s], normal, [u, 0.0]);
        mesh.push_vertex([radius * c, half, radius * s], normal, [u, 1.0]);
    }

    for i in 0..n {
        let b0 = 2 * i;
        let t0 = b0 + 1;
        let b1 = b0 + 2;
        let t1 = b0 + 3;
        mesh.push_triangle(b0, t0, b1);
        mesh.push_triangle(t0, t1, b1);
    }
    mesh
}

/// Flat annulus in the X/Z plane at y = 0.
///
/// `(segments + 1) * 2` vertices and `segments * 2` triangles, facing +Y when
/// `facing_up`, -Y otherwise.
pub fn ring_mesh(inner_radius: f64, outer_radius: f64, segments: u32, facing_up: bool) -> TriangleMesh {
    let n = segments.max(3);
    let ny = if facing_up { 1.0 } else { -1.0 };
    let mut mesh = TriangleMesh::new();

    for i in 0..=n {
        let theta = 2.0 * PI * (i as f64 / n as f64);
        let (s, c) = theta.sin_cos();
        for r in [inner_radius, outer_radius] {
            let (x, z) = (r * c, r * s);
            let uv = if outer_radius > 0.0 {
                [(x / outer_radius + 1.0) / 2.0, (z / outer_radius + 1.0) / 2.0]
            } else {
                [0.5, 0.5]
            };
            mesh.push_vertex([x, 0.0, z], [0.0, ny, 0.0], uv);
        }
    }

    for i in 0..n {
        let in0 = 2 * i;
        let out0 = in0 + 1;
        let in1 = in0 + 2;
        let out1 = in0 + 3;
        if facing_up {
            mesh.push_triangle(in0, in1, out0);
            mesh.push_triangle(out0, in1, out1);
        } else {
            mesh.push_triangle(in0, out0, in1);
            mesh.push_triangle(out0, out1, in1);
        }
    }
    mesh
}
