use rstar::{RTree, RTreeObject, AABB};

use crate::element::ElementId;
use crate::geometry::{BBox, Point2D};

/// An entry in the R-tree spatial index, referencing an element by id.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialEntry {
    pub element_id: ElementId,
    /// Footprint of the element on the board plane.
    pub bbox: BBox,
}

impl RTreeObject for SpatialEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bbox.min.x, self.bbox.min.z],
            [self.bbox.max.x, self.bbox.max.z],
        )
    }
}

/// Spatial index for pointer hit tests and region queries.
#[derive(Debug)]
pub struct SpatialIndex {
    tree: RTree<SpatialEntry>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Build the index from a list of element footprints.
    pub fn build(entries: Vec<SpatialEntry>) -> Self {
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn insert(&mut self, element_id: ElementId, bbox: BBox) {
        self.tree.insert(SpatialEntry { element_id, bbox });
    }

    /// Remove the entry for `element_id` registered with `bbox`.
    pub fn remove(&mut self, element_id: &ElementId, bbox: &BBox) -> bool {
        let entry = SpatialEntry {
            element_id: element_id.clone(),
            bbox: *bbox,
        };
        self.tree.remove(&entry).is_some()
    }

    /// All entries whose footprint box contains the point.
    pub fn query_point(&self, point: &Point2D) -> Vec<&SpatialEntry> {
        let at = AABB::from_point([point.x, point.z]);
        self.tree.locate_in_envelope_intersecting(&at).collect()
    }

    /// All entries whose footprint box intersects `region`.
    pub fn query_region(&self, region: &BBox) -> Vec<&SpatialEntry> {
        let envelope = AABB::from_corners(
            [region.min.x, region.min.z],
            [region.max.x, region.max.z],
        );
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .collect()
    }

    pub fn clear(&mut self) {
        self.tree = RTree::new();
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}
