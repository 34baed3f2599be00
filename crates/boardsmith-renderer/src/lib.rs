//! # Boardsmith Renderer
//!
//! Camera mapping and render snapshots for the 3D board canvas.
//!
//! The engine does not draw anything itself: it hands [`RenderFrame`]s to the
//! rendering collaborator, which owns the GPU surface, lighting and shaders.

pub mod viewport;
pub mod render_data;

pub use viewport::Viewport;
pub use render_data::{RenderFrame, RenderMesh};
