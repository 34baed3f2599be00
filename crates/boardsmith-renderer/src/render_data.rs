use log::trace;
use serde::{Deserialize, Serialize};

use boardsmith_core::layer::{LayerColor, COPPER, DRILL_BLACK, SOLDER_MASK_GREEN};
use boardsmith_core::{ElementId, ElementKind, ElementRegistry, PartRole, TriangleMesh};

/// Opacity of an element under the pointer.
pub const HOVER_OPACITY: f32 = 0.7;

pub fn part_color(role: PartRole) -> LayerColor {
    match role {
        PartRole::Substrate => SOLDER_MASK_GREEN,
        PartRole::Copper => COPPER,
        PartRole::Drill => DRILL_BLACK,
    }
}

/// One mesh part ready for the GPU, with its placement and highlight state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderMesh {
    pub element_id: ElementId,
    pub kind: ElementKind,
    pub part: String,
    pub color: [f32; 4], // RGBA
    /// Translation applied to the mesh's local coordinates.
    pub translation: [f32; 3],
    pub hovered: bool,
    pub selected: bool,
    pub mesh: TriangleMesh,
}

/// Complete frame data handed from the engine to the rendering collaborator.
///
/// Captured from a shared borrow of the registry: producing a frame never
/// mutates editor state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderFrame {
    pub meshes: Vec<RenderMesh>,
    pub viewport: super::Viewport,
    pub grid_visible: bool,
    pub grid_spacing: f64,
    pub selection_bbox: Option<[f64; 4]>, // [min_x, min_z, max_x, max_z]
    /// Seconds since the engine started, for animated materials.
    pub time: f64,
}

impl RenderFrame {
    pub fn empty(viewport: super::Viewport) -> Self {
        Self {
            meshes: Vec::new(),
            viewport,
            grid_visible: true,
            grid_spacing: 1.0,
            selection_bbox: None,
            time: 0.0,
        }
    }

    /// Snapshot every element in the registry, in draw (insertion) order.
    pub fn capture(
        registry: &ElementRegistry,
        viewport: super::Viewport,
        grid_spacing: f64,
        time: f64,
    ) -> Self {
        let mut frame = Self::empty(viewport);
        frame.grid_spacing = grid_spacing;
        frame.time = time;

        for element in registry.iter() {
            let highlight = element.highlight();
            let t = element.transform();
            let translation = [
                t.position.x as f32,
                t.elevation as f32,
                t.position.z as f32,
            ];
            let opacity = if highlight.hovered { HOVER_OPACITY } else { 1.0 };

            for part in &element.geometry().parts {
                frame.meshes.push(RenderMesh {
                    element_id: element.id().clone(),
                    kind: element.kind(),
                    part: part.name.clone(),
                    color: part_color(part.role).to_f32_array(opacity),
                    translation,
                    hovered: highlight.hovered,
                    selected: highlight.selected,
                    mesh: part.mesh.clone(),
                });
            }

            if highlight.selected {
                let b = element.extents();
                frame.selection_bbox = Some([b.min.x, b.min.z, b.max.x, b.max.z]);
            }
        }
        trace!(
            "captured frame at t={:.3}: {} meshes, {} triangles",
            time,
            frame.meshes.len(),
            frame.triangle_count()
        );
        frame
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.mesh.num_triangles()).sum()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
