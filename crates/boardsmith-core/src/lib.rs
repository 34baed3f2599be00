//! # Boardsmith Core
//!
//! Geometry and routing engine for the Boardsmith PCB editor: grid snapping,
//! parametric board/pad/through-hole geometry, deterministic Manhattan routing,
//! trace meshing, and the element registry with its R-tree hit testing.
//!
//! Everything here is synchronous and renderer-agnostic; meshes are plain
//! vertex/index buffers handed to whatever draws them.

pub mod config;
pub mod element;
pub mod geometry;
pub mod layer;
pub mod mesh;
pub mod mesher;
pub mod primitives;
pub mod registry;
pub mod routing;
pub mod spatial;

pub use config::{ConfigError, EngineConfig, RoutingPolicy};
pub use element::{
    ElementData, ElementGeometry, ElementId, ElementKind, GeometryPart, Highlight, HoleData, PartRole,
    PlacedElement, SelectionExtent, SelectionInfo, TraceData, TraceEndpoints, Transform,
};
pub use geometry::{snap, Axis, BBox, Point2D};
pub use layer::Layer;
pub use mesh::TriangleMesh;
pub use mesher::{mesh_path, MeshError};
pub use primitives::{make_board, make_hole, make_pad, BoardConfig, ConstructionError, HoleSpec, PadSpec};
pub use registry::{ElementRegistry, GeometryReleaser, RegistryError};
pub use routing::{route, OrthogonalPath, PathError};
