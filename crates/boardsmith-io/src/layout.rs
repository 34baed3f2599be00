//! The portable JSON layout format.
//!
//! ```json
//! {
//!   "board": { "width": 100.0, "height": 80.0, "thickness": 1.6 },
//!   "components": [
//!     { "id": "pad-…", "type": "pad", "layer": "top",
//!       "position": [10.0, 0.035, 10.0], "size": [4.0, 2.0],
//!       "points": null, "width": null }
//!   ]
//! }
//! ```
//!
//! A document is validated as a whole before anyone gets to act on it, so a
//! malformed file can be rejected without touching the layout currently
//! loaded.

use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use boardsmith_core::{
    BoardConfig, ConstructionError, ElementData, ElementKind, Layer, OrthogonalPath, PathError,
    PlacedElement, Point2D,
};

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("layout is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid board: {0}")]
    InvalidBoard(#[from] ConstructionError),

    #[error("component #{index} has an empty id")]
    EmptyId { index: usize },

    #[error("duplicate component id `{0}`")]
    DuplicateId(String),

    #[error("component `{id}`: {reason}")]
    InvalidComponent { id: String, reason: String },

    #[error("component `{id}` has an invalid path: {source}")]
    InvalidPath {
        id: String,
        #[source]
        source: PathError,
    },

    #[error("layout contains more than one board component")]
    MultipleBoards,
}

/// One entry of the `components` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub layer: Layer,
    /// `[x, y, z]` with y the elevation.
    pub position: [f64; 3],
    /// Pads: `[width, depth]`. Holes: `[drill_radius, ring_width]`.
    /// Board: `[width, height]`.
    #[serde(default)]
    pub size: Option<[f64; 2]>,
    /// Trace centreline as `[x, z]` pairs.
    #[serde(default)]
    pub points: Option<Vec<[f64; 2]>>,
    /// Trace width.
    #[serde(default)]
    pub width: Option<f64>,
}

impl ComponentRecord {
    pub fn plane_position(&self) -> Point2D {
        Point2D::new(self.position[0], self.position[2])
    }

    /// The trace centreline as a validated path.
    pub fn path(&self) -> Result<Option<OrthogonalPath>, LayoutError> {
        let Some(points) = &self.points else {
            return Ok(None);
        };
        let points = points.iter().map(|&p| Point2D::from(p)).collect();
        OrthogonalPath::new(points)
            .map(Some)
            .map_err(|source| LayoutError::InvalidPath {
                id: self.id.clone(),
                source,
            })
    }

    fn invalid(&self, reason: impl Into<String>) -> LayoutError {
        LayoutError::InvalidComponent {
            id: self.id.clone(),
            reason: reason.into(),
        }
    }

    fn validate(&self) -> Result<(), LayoutError> {
        if self.position.iter().any(|c| !c.is_finite()) {
            return Err(self.invalid("position has a non-finite coordinate"));
        }

        match self.kind {
            ElementKind::Pad | ElementKind::Board => {
                if let Some([a, b]) = self.size {
                    if !(a.is_finite() && b.is_finite() && a > 0.0 && b > 0.0) {
                        return Err(self.invalid(format!("size must be positive, got [{a}, {b}]")));
                    }
                }
            }
            ElementKind::Hole => {
                if let Some([radius, ring]) = self.size {
                    if !(radius.is_finite() && radius > 0.0) {
                        return Err(self.invalid(format!("drill radius must be positive, got {radius}")));
                    }
                    if !(ring.is_finite() && ring >= 0.0) {
                        return Err(self.invalid(format!("ring width must not be negative, got {ring}")));
                    }
                }
            }
            ElementKind::Trace => {
                if self.path()?.is_none() {
                    return Err(self.invalid("trace has no points"));
                }
                if let Some(width) = self.width {
                    if !(width.is_finite() && width > 0.0) {
                        return Err(self.invalid(format!("width must be positive, got {width}")));
                    }
                }
            }
        }
        Ok(())
    }
}

impl From<&PlacedElement> for ComponentRecord {
    fn from(element: &PlacedElement) -> Self {
        let mut record = Self {
            id: element.id().to_string(),
            kind: element.kind(),
            layer: element.layer(),
            position: element.transform().to_array(),
            size: None,
            points: None,
            width: None,
        };
        match element.data() {
            ElementData::Board(b) => record.size = Some([b.width, b.height]),
            ElementData::Pad(pad) => record.size = Some([pad.width, pad.depth]),
            ElementData::Hole(h) => record.size = Some([h.drill_radius, h.ring_width]),
            ElementData::Trace(t) => {
                record.position = [0.0, 0.0, 0.0];
                record.points = Some(t.path.points().iter().map(|p| p.to_array()).collect());
                record.width = Some(t.width);
            }
        }
        record
    }
}

/// A whole persisted layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDocument {
    pub board: BoardConfig,
    #[serde(default)]
    pub components: Vec<ComponentRecord>,
}

impl LayoutDocument {
    pub fn new(board: BoardConfig) -> Self {
        Self {
            board,
            components: Vec::new(),
        }
    }

    /// Snapshot a set of placed elements, in the order given.
    pub fn from_elements<'a>(
        board: BoardConfig,
        elements: impl IntoIterator<Item = &'a PlacedElement>,
    ) -> Self {
        Self {
            board,
            components: elements.into_iter().map(ComponentRecord::from).collect(),
        }
    }

    /// Check the document against the schema's expectations.
    pub fn validate(&self) -> Result<(), LayoutError> {
        self.board.validate()?;

        let mut seen = HashSet::new();
        let mut boards = 0;
        for (index, component) in self.components.iter().enumerate() {
            if component.id.is_empty() {
                return Err(LayoutError::EmptyId { index });
            }
            if !seen.insert(component.id.as_str()) {
                return Err(LayoutError::DuplicateId(component.id.clone()));
            }
            if component.kind == ElementKind::Board {
                boards += 1;
                if boards > 1 {
                    return Err(LayoutError::MultipleBoards);
                }
            }
            component.validate()?;
        }
        Ok(())
    }

    pub fn components_of(&self, kind: ElementKind) -> impl Iterator<Item = &ComponentRecord> {
        self.components.iter().filter(move |c| c.kind == kind)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse and validate a layout.
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        let doc: Self = serde_json::from_str(json)?;
        doc.validate()?;
        debug!(
            "parsed layout: board {}x{}x{}, {} components",
            doc.board.width,
            doc.board.height,
            doc.board.thickness,
            doc.components.len()
        );
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "board": { "width": 100, "height": 80, "thickness": 1.6 },
        "components": [
            { "id": "board", "type": "board", "layer": "substrate",
              "position": [0, 0, 0], "size": [100, 80], "points": null, "width": null },
            { "id": "pad-1", "type": "pad", "layer": "top",
              "position": [10, 0.035, 10], "size": [4, 2], "points": null, "width": null },
            { "id": "hole-1", "type": "hole", "layer": "board",
              "position": [10, 0, 30], "size": [0.8, 1.3], "points": null, "width": null },
            { "id": "trace-1", "type": "trace", "layer": "top",
              "position": [0, 0, 0], "size": null,
              "points": [[10, 10], [10, 30]], "width": 0.55 }
        ]
    }"#;

    fn with_component(json: &str) -> String {
        format!(
            r#"{{ "board": {{ "width": 100, "height": 80, "thickness": 1.6 }}, "components": [{json}] }}"#
        )
    }

    #[test]
    fn test_parse_sample() {
        let doc = LayoutDocument::from_json(SAMPLE).unwrap();
        assert_eq!(doc.components.len(), 4);
        assert_eq!(doc.components_of(ElementKind::Trace).count(), 1);
        let trace = &doc.components[3];
        let path = trace.path().unwrap().unwrap();
        assert_eq!(path.segment_count(), 1);
        assert_eq!(doc.components[1].plane_position(), Point2D::new(10.0, 10.0));
    }

    #[test]
    fn test_missing_optionals_default_to_none() {
        let json = with_component(
            r#"{ "id": "p", "type": "pad", "layer": "top", "position": [0, 0, 0] }"#,
        );
        let doc = LayoutDocument::from_json(&json).unwrap();
        assert_eq!(doc.components[0].size, None);
        assert_eq!(doc.components[0].width, None);
    }

    #[test]
    fn test_export_writes_nulls() {
        let doc = LayoutDocument::from_json(SAMPLE).unwrap();
        let json = doc.to_json().unwrap();
        assert!(json.contains("\"points\": null"));
        assert!(json.contains("\"type\": \"trace\""));
        assert_eq!(LayoutDocument::from_json(&json).unwrap(), doc);
    }

    #[test]
    fn test_rejects_non_positive_board() {
        let json = r#"{ "board": { "width": 0, "height": 80, "thickness": 1.6 }, "components": [] }"#;
        assert!(matches!(
            LayoutDocument::from_json(json),
            Err(LayoutError::InvalidBoard(ConstructionError::NonPositive { field: "board.width", .. }))
        ));
        let json = r#"{ "board": { "width": -5, "height": 80, "thickness": 1.6 } }"#;
        assert!(LayoutDocument::from_json(json).is_err());
    }

    #[test]
    fn test_rejects_schema_violations() {
        assert!(matches!(LayoutDocument::from_json("{"), Err(LayoutError::Json(_))));
        assert!(matches!(
            LayoutDocument::from_json(r#"{ "components": [] }"#),
            Err(LayoutError::Json(_))
        ));

        let bad_type = with_component(
            r#"{ "id": "x", "type": "via", "layer": "top", "position": [0, 0, 0] }"#,
        );
        assert!(matches!(LayoutDocument::from_json(&bad_type), Err(LayoutError::Json(_))));

        let no_points = with_component(
            r#"{ "id": "t", "type": "trace", "layer": "top", "position": [0, 0, 0] }"#,
        );
        assert!(matches!(
            LayoutDocument::from_json(&no_points),
            Err(LayoutError::InvalidComponent { .. })
        ));

        let diagonal = with_component(
            r#"{ "id": "t", "type": "trace", "layer": "top", "position": [0, 0, 0],
                 "points": [[0, 0], [3, 4]] }"#,
        );
        assert!(matches!(
            LayoutDocument::from_json(&diagonal),
            Err(LayoutError::InvalidPath { source: PathError::Diagonal(0), .. })
        ));

        let bad_hole = with_component(
            r#"{ "id": "h", "type": "hole", "layer": "board", "position": [0, 0, 0], "size": [0, 1] }"#,
        );
        assert!(LayoutDocument::from_json(&bad_hole).is_err());
    }

    #[test]
    fn test_records_from_elements() {
        use boardsmith_core::{make_board, make_hole, make_pad, PadSpec};

        let board = make_board(&BoardConfig::default()).unwrap();
        let pad = make_pad(10.0, 10.0, &PadSpec::default(), 0.035).unwrap();
        let hole = make_hole(10.0, 30.0, 0.8, 1.3, 1.6).unwrap();
        let doc = LayoutDocument::from_elements(BoardConfig::default(), [&board, &pad, &hole]);

        assert_eq!(doc.components[0].id, "board");
        assert_eq!(doc.components[0].size, Some([100.0, 80.0]));
        assert_eq!(doc.components[1].kind, ElementKind::Pad);
        assert_eq!(doc.components[1].position, [10.0, 0.035, 10.0]);
        assert_eq!(doc.components[1].size, Some([4.0, 2.0]));
        assert_eq!(doc.components[2].layer, Layer::Board);
        assert_eq!(doc.components[2].size, Some([0.8, 1.3]));
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_rejects_duplicate_and_empty_ids() {
        let dup = with_component(
            r#"{ "id": "p", "type": "pad", "layer": "top", "position": [0, 0, 0] },
               { "id": "p", "type": "pad", "layer": "top", "position": [5, 0, 0] }"#,
        );
        assert!(matches!(
            LayoutDocument::from_json(&dup),
            Err(LayoutError::DuplicateId(id)) if id == "p"
        ));

        let empty = with_component(
            r#"{ "id": "", "type": "pad", "layer": "top", "position": [0, 0, 0] }"#,
        );
        assert!(matches!(
            LayoutDocument::from_json(&empty),
            Err(LayoutError::EmptyId { index: 0 })
        ));
    }
}
