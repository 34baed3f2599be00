//! Primitive factory: parametric board, pad and through-hole geometry.
//!
//! Factories only build elements. Registering them is the caller's job, and a
//! rejected parameter never yields a partial element.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::element::{
    ElementData, ElementGeometry, ElementId, ElementKind, GeometryPart, HoleData, PartRole,
    PlacedElement, Transform,
};
use crate::geometry::Point2D;
use crate::layer::Layer;
use crate::mesh::{box_mesh, open_cylinder_mesh, ring_mesh};

/// Radial segments of a drill bore.
pub const DRILL_SEGMENTS: u32 = 32;
/// Segments of an annular ring.
pub const RING_SEGMENTS: u32 = 48;
/// How far the drill bore sticks out of each board face.
pub const DRILL_OVERSHOOT: f64 = 0.01;
/// Gap between a ring and the board face it sits on.
pub const RING_LIFT: f64 = 0.001;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstructionError {
    #[error("non-finite value for `{0}`")]
    NonFinite(&'static str),

    #[error("`{field}` must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("`{field}` must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },
}

fn require_finite(field: &'static str, value: f64) -> Result<(), ConstructionError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConstructionError::NonFinite(field))
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<(), ConstructionError> {
    require_finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConstructionError::NonPositive { field, value })
    }
}

/// Board dimensions in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Extent along X.
    pub width: f64,
    /// Extent along Z.
    pub height: f64,
    pub thickness: f64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: 100.0,
            height: 80.0,
            thickness: 1.6,
        }
    }
}

impl BoardConfig {
    pub fn new(width: f64, height: f64, thickness: f64) -> Self {
        Self {
            width,
            height,
            thickness,
        }
    }

    pub fn validate(&self) -> Result<(), ConstructionError> {
        require_positive("board.width", self.width)?;
        require_positive("board.height", self.height)?;
        require_positive("board.thickness", self.thickness)
    }
}

/// Copper pad dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PadSpec {
    /// Extent along X.
    pub width: f64,
    /// Extent along Z.
    pub depth: f64,
    /// Copper thickness along Y.
    pub thickness: f64,
}

impl Default for PadSpec {
    fn default() -> Self {
        Self {
            width: 4.0,
            depth: 2.0,
            thickness: 0.04,
        }
    }
}

/// Through-hole parameters used when none are given explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoleSpec {
    pub drill_radius: f64,
    pub ring_width: f64,
}

impl Default for HoleSpec {
    fn default() -> Self {
        Self {
            drill_radius: 0.8,
            ring_width: 1.3,
        }
    }
}

/// The board slab: a box centred on the origin with its top face at y = 0.
pub fn make_board(config: &BoardConfig) -> Result<PlacedElement, ConstructionError> {
    config.validate()?;

    let mut slab = box_mesh(config.width, config.thickness, config.height);
    slab.translate(0.0, -config.thickness / 2.0, 0.0);

    Ok(PlacedElement::new(
        ElementId::board(),
        Layer::Substrate,
        Transform::identity(),
        ElementGeometry::single(GeometryPart::new("slab", PartRole::Substrate, slab)),
        ElementData::Board(*config),
    ))
}

/// A flat copper pad at `(x, z)` on the top layer.
///
/// Coordinates are expected to be snapped already.
pub fn make_pad(
    x: f64,
    z: f64,
    spec: &PadSpec,
    layer_height: f64,
) -> Result<PlacedElement, ConstructionError> {
    require_finite("x", x)?;
    require_finite("z", z)?;
    require_finite("layer_height", layer_height)?;
    require_positive("pad.width", spec.width)?;
    require_positive("pad.depth", spec.depth)?;
    require_positive("pad.thickness", spec.thickness)?;

    let copper = box_mesh(spec.width, spec.thickness, spec.depth);

    Ok(PlacedElement::new(
        ElementId::generate(ElementKind::Pad),
        Layer::Top,
        Transform::new(Point2D::new(x, z), layer_height),
        ElementGeometry::single(GeometryPart::new("copper", PartRole::Copper, copper)),
        ElementData::Pad(*spec),
    ))
}

/// A plated through-hole at `(x, z)`.
///
/// The bore spans the full board thickness plus [`DRILL_OVERSHOOT`] on both
/// faces so it reads as a break-through from either side. Copper rings sit on
/// the top face (facing up) and the bottom face (facing down). The element's
/// origin is on the board's top face.
pub fn make_hole(
    x: f64,
    z: f64,
    drill_radius: f64,
    ring_width: f64,
    board_thickness: f64,
) -> Result<PlacedElement, ConstructionError> {
    require_finite("x", x)?;
    require_finite("z", z)?;
    require_positive("drill_radius", drill_radius)?;
    require_finite("ring_width", ring_width)?;
    if ring_width < 0.0 {
        return Err(ConstructionError::Negative {
            field: "ring_width",
            value: ring_width,
        });
    }
    require_positive("board_thickness", board_thickness)?;

    let outer = drill_radius + ring_width;

    let mut drill = open_cylinder_mesh(
        drill_radius,
        board_thickness + 2.0 * DRILL_OVERSHOOT,
        DRILL_SEGMENTS,
    );
    drill.translate(0.0, -board_thickness / 2.0, 0.0);

    let mut ring_top = ring_mesh(drill_radius, outer, RING_SEGMENTS, true);
    ring_top.translate(0.0, RING_LIFT, 0.0);

    let mut ring_bottom = ring_mesh(drill_radius, outer, RING_SEGMENTS, false);
    ring_bottom.translate(0.0, -board_thickness - RING_LIFT, 0.0);

    let geometry = ElementGeometry {
        parts: vec![
            GeometryPart::new("drill", PartRole::Drill, drill),
            GeometryPart::new("ring_top", PartRole::Copper, ring_top),
            GeometryPart::new("ring_bottom", PartRole::Copper, ring_bottom),
        ],
    };

    Ok(PlacedElement::new(
        ElementId::generate(ElementKind::Hole),
        Layer::Board,
        Transform::new(Point2D::new(x, z), 0.0),
        geometry,
        ElementData::Hole(HoleData {
            drill_radius,
            ring_width,
            board_thickness,
        }),
    ))
}
