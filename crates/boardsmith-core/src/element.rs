use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{segment_footprint, BBox, Point2D};
use crate::layer::Layer;
use crate::mesh::TriangleMesh;
use crate::primitives::{BoardConfig, PadSpec};
use crate::routing::OrthogonalPath;

/// Stable identifier of a placed element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

/// Id of the single board element.
pub const BOARD_ID: &str = "board";

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh id of the form `<kind>-<uuid>`.
    pub fn generate(kind: ElementKind) -> Self {
        Self(format!("{}-{}", kind.name(), Uuid::new_v4()))
    }

    pub fn board() -> Self {
        Self(BOARD_ID.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Pad,
    Hole,
    Trace,
    Board,
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Pad => "pad",
            ElementKind::Hole => "hole",
            ElementKind::Trace => "trace",
            ElementKind::Board => "board",
        }
    }

    /// Whether pointer hit tests may resolve to this kind.
    pub fn is_pickable(&self) -> bool {
        !matches!(self, ElementKind::Board)
    }

    /// Whether the element can be dragged around the board.
    pub fn is_movable(&self) -> bool {
        matches!(self, ElementKind::Pad | ElementKind::Hole)
    }

    /// Hit-test precedence: components sit on top of the traces that end on them.
    pub(crate) fn pick_priority(&self) -> u8 {
        match self {
            ElementKind::Pad | ElementKind::Hole => 2,
            ElementKind::Trace => 1,
            ElementKind::Board => 0,
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Placement of an element: a board-plane position and a fixed elevation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Point2D,
    pub elevation: f64,
}

impl Transform {
    pub fn new(position: Point2D, elevation: f64) -> Self {
        Self {
            position,
            elevation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Point2D::origin(), 0.0)
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.position.x, self.elevation, self.position.z]
    }
}

/// What a mesh part is made of; the renderer picks a material from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartRole {
    Substrate,
    Copper,
    Drill,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryPart {
    pub name: String,
    pub role: PartRole,
    pub mesh: TriangleMesh,
}

impl GeometryPart {
    pub fn new(name: &str, role: PartRole, mesh: TriangleMesh) -> Self {
        Self {
            name: name.to_string(),
            role,
            mesh,
        }
    }
}

/// Render geometry owned by an element, in the element's local frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementGeometry {
    pub parts: Vec<GeometryPart>,
}

impl ElementGeometry {
    pub fn single(part: GeometryPart) -> Self {
        Self { parts: vec![part] }
    }

    pub fn part(&self, name: &str) -> Option<&GeometryPart> {
        self.parts.iter().find(|p| p.name == name)
    }

    pub fn num_triangles(&self) -> usize {
        self.parts.iter().map(|p| p.mesh.num_triangles()).sum()
    }

    pub fn num_vertices(&self) -> usize {
        self.parts.iter().map(|p| p.mesh.num_vertices()).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoleData {
    pub drill_radius: f64,
    pub ring_width: f64,
    pub board_thickness: f64,
}

impl HoleData {
    pub fn outer_radius(&self) -> f64 {
        self.drill_radius + self.ring_width
    }
}

/// The two elements a trace connects. Moving either rebuilds the trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEndpoints {
    pub from: ElementId,
    pub to: ElementId,
}

impl TraceEndpoints {
    pub fn references(&self, id: &ElementId) -> bool {
        &self.from == id || &self.to == id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceData {
    pub path: OrthogonalPath,
    pub width: f64,
    pub layer_height: f64,
    pub endpoints: Option<TraceEndpoints>,
}

/// Kind-specific parameters of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementData {
    Board(BoardConfig),
    Pad(PadSpec),
    Hole(HoleData),
    Trace(TraceData),
}

impl ElementData {
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementData::Board(_) => ElementKind::Board,
            ElementData::Pad(_) => ElementKind::Pad,
            ElementData::Hole(_) => ElementKind::Hole,
            ElementData::Trace(_) => ElementKind::Trace,
        }
    }
}

/// Per-element visual state toggled by the interaction layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub hovered: bool,
    pub selected: bool,
}

/// Size information reported with a selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionExtent {
    Size([f64; 2]),
    Radius(f64),
}

/// Payload of the selection-changed notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionInfo {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub position: [f64; 3],
    pub extent: SelectionExtent,
    pub layer: Layer,
}

/// An element placed on the board.
///
/// Geometry is stored in the element's local frame; the renderer places it
/// with `transform`. Trace geometry is built directly in board coordinates, so
/// traces carry the identity transform.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedElement {
    id: ElementId,
    layer: Layer,
    transform: Transform,
    geometry: ElementGeometry,
    data: ElementData,
    highlight: Highlight,
}

impl PlacedElement {
    pub fn new(
        id: ElementId,
        layer: Layer,
        transform: Transform,
        geometry: ElementGeometry,
        data: ElementData,
    ) -> Self {
        Self {
            id,
            layer,
            transform,
            geometry,
            data,
            highlight: Highlight::default(),
        }
    }

    /// Replace the generated id, e.g. with one read back from a layout file.
    pub fn with_id(mut self, id: ElementId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn kind(&self) -> ElementKind {
        self.data.kind()
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn position(&self) -> Point2D {
        self.transform.position
    }

    pub fn geometry(&self) -> &ElementGeometry {
        &self.geometry
    }

    pub fn data(&self) -> &ElementData {
        &self.data
    }

    pub fn highlight(&self) -> Highlight {
        self.highlight
    }

    pub fn trace(&self) -> Option<&TraceData> {
        match &self.data {
            ElementData::Trace(t) => Some(t),
            _ => None,
        }
    }

    pub(crate) fn set_position(&mut self, position: Point2D) {
        self.transform.position = position;
    }

    pub(crate) fn set_highlight(&mut self, highlight: Highlight) {
        self.highlight = highlight;
    }

    /// World-space footprint on the board plane.
    pub fn extents(&self) -> BBox {
        let p = self.transform.position;
        match &self.data {
            ElementData::Board(b) => BBox::centered(p, b.width, b.height),
            ElementData::Pad(pad) => BBox::centered(p, pad.width, pad.depth),
            ElementData::Hole(h) => {
                let d = 2.0 * h.outer_radius();
                BBox::centered(p, d, d)
            }
            ElementData::Trace(t) => t.path.bbox(t.width),
        }
    }

    /// Exact point containment against the element's footprint.
    pub fn contains(&self, point: &Point2D) -> bool {
        match &self.data {
            ElementData::Hole(h) => self.transform.position.distance_to(point) <= h.outer_radius(),
            ElementData::Trace(t) => t.path.segments().any(|(a, b)| {
                segment_footprint(&a, &b, t.width).is_some_and(|fp| fp.contains_point(point))
            }),
            _ => self.extents().contains_point(point),
        }
    }

    pub fn selection_info(&self) -> SelectionInfo {
        let extent = match &self.data {
            ElementData::Board(b) => SelectionExtent::Size([b.width, b.height]),
            ElementData::Pad(pad) => SelectionExtent::Size([pad.width, pad.depth]),
            ElementData::Hole(h) => SelectionExtent::Radius(h.drill_radius),
            ElementData::Trace(t) => {
                let bbox = t.path.bbox(t.width);
                SelectionExtent::Size([bbox.width(), bbox.depth()])
            }
        };
        SelectionInfo {
            id: self.id.clone(),
            kind: self.kind(),
            position: self.transform.to_array(),
            extent,
            layer: self.layer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace_element() -> PlacedElement {
        let path = OrthogonalPath::new(vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(10.0, 5.0),
        ])
        .unwrap();
        PlacedElement::new(
            ElementId::new("trace-1"),
            Layer::Top,
            Transform::identity(),
            ElementGeometry::default(),
            ElementData::Trace(TraceData {
                path,
                width: 1.0,
                layer_height: 0.037,
                endpoints: None,
            }),
        )
    }

    #[test]
    fn test_generated_ids_are_prefixed_and_unique() {
        let a = ElementId::generate(ElementKind::Pad);
        let b = ElementId::generate(ElementKind::Pad);
        assert!(a.as_str().starts_with("pad-"));
        assert_ne!(a, b);
        assert_eq!(ElementId::board().as_str(), BOARD_ID);

        let renamed = trace_element().with_id(ElementId::from("trace-7"));
        assert_eq!(renamed.id().as_str(), "trace-7");
    }

    #[test]
    fn test_trace_contains_only_along_segments() {
        let trace = trace_element();
        assert!(trace.contains(&Point2D::new(5.0, 0.4)));
        assert!(trace.contains(&Point2D::new(10.2, 3.0)));
        // Inside the bounding box, outside both legs.
        assert!(!trace.contains(&Point2D::new(5.0, 3.0)));
        assert!(trace.extents().contains_point(&Point2D::new(5.0, 3.0)));
    }

    #[test]
    fn test_kind_flags() {
        assert!(!ElementKind::Board.is_pickable());
        assert!(ElementKind::Trace.is_pickable());
        assert!(!ElementKind::Trace.is_movable());
        assert!(ElementKind::Hole.is_movable());
        assert_eq!(serde_json::to_string(&ElementKind::Hole).unwrap(), "\"hole\"");
    }

    #[test]
    fn test_selection_info_for_trace() {
        let info = trace_element().selection_info();
        assert_eq!(info.kind, ElementKind::Trace);
        assert_eq!(info.extent, SelectionExtent::Size([11.0, 6.0]));
    }
}
