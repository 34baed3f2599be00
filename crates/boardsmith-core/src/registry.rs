use std::collections::HashMap;

use log::{debug, trace};
use thiserror::Error;

use crate::element::{ElementGeometry, ElementId, ElementKind, Highlight, PlacedElement};
use crate::geometry::{BBox, Point2D};
use crate::spatial::SpatialIndex;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("an element with id `{0}` is already registered")]
    Conflict(ElementId),

    #[error("no element with id `{0}`")]
    NotFound(ElementId),

    #[error("element `{id}` is a {kind} and cannot be moved")]
    NotMovable { id: ElementId, kind: ElementKind },
}

/// Hook through which the rendering collaborator frees GPU resources.
///
/// Called for every element leaving the registry, before the removal
/// completes.
pub trait GeometryReleaser {
    fn release(&mut self, id: &ElementId, geometry: &ElementGeometry);
}

struct Slot {
    element: PlacedElement,
    /// Insertion sequence; later elements are drawn, and picked, on top.
    seq: u64,
}

/// The single owner of everything placed on the board.
pub struct ElementRegistry {
    slots: HashMap<ElementId, Slot>,
    /// Ids in insertion order.
    order: Vec<ElementId>,
    index: SpatialIndex,
    next_seq: u64,
    releaser: Option<Box<dyn GeometryReleaser>>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            order: Vec::new(),
            index: SpatialIndex::new(),
            next_seq: 0,
            releaser: None,
        }
    }

    pub fn with_releaser(releaser: Box<dyn GeometryReleaser>) -> Self {
        Self {
            releaser: Some(releaser),
            ..Self::new()
        }
    }

    pub fn set_releaser(&mut self, releaser: Box<dyn GeometryReleaser>) {
        self.releaser = Some(releaser);
    }

    // ── Membership ───────────────────────────────────────────────────

    /// Register an element under its own id. Duplicate ids are rejected and
    /// leave the existing element untouched.
    pub fn add(&mut self, element: PlacedElement) -> Result<ElementId, RegistryError> {
        let id = element.id().clone();
        if self.slots.contains_key(&id) {
            return Err(RegistryError::Conflict(id));
        }

        self.index.insert(id.clone(), element.extents());
        self.order.push(id.clone());
        let seq = self.next_seq;
        self.next_seq += 1;
        trace!("registered {} `{}`", element.kind(), id);
        self.slots.insert(id.clone(), Slot { element, seq });
        Ok(id)
    }

    pub fn get(&self, id: &ElementId) -> Option<&PlacedElement> {
        self.slots.get(id).map(|s| &s.element)
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.slots.contains_key(id)
    }

    /// Remove an element. Its geometry goes through the releaser before the
    /// element is handed back.
    pub fn remove(&mut self, id: &ElementId) -> Option<PlacedElement> {
        let slot = self.slots.remove(id)?;
        let element = slot.element;
        self.index.remove(id, &element.extents());
        self.order.retain(|o| o != id);
        self.release(&element);
        trace!("removed {} `{}`", element.kind(), id);
        Some(element)
    }

    /// Remove everything, releasing every element's geometry.
    pub fn clear(&mut self) {
        let order = std::mem::take(&mut self.order);
        for id in &order {
            if let Some(slot) = self.slots.remove(id) {
                self.release(&slot.element);
            }
        }
        self.slots.clear();
        self.index.clear();
        debug!("registry cleared ({} elements released)", order.len());
    }

    fn release(&mut self, element: &PlacedElement) {
        if let Some(releaser) = self.releaser.as_mut() {
            releaser.release(element.id(), element.geometry());
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    // ── Iteration ────────────────────────────────────────────────────

    /// Elements in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PlacedElement> {
        self.order.iter().filter_map(|id| self.get(id))
    }

    pub fn for_each<F: FnMut(&PlacedElement)>(&self, f: F) {
        self.iter().for_each(f);
    }

    pub fn ids(&self) -> Vec<ElementId> {
        self.order.clone()
    }

    pub fn count_of(&self, kind: ElementKind) -> usize {
        self.iter().filter(|e| e.kind() == kind).count()
    }

    /// Traces with an endpoint bound to `id`.
    pub fn traces_attached_to(&self, id: &ElementId) -> Vec<ElementId> {
        self.iter()
            .filter(|e| {
                e.trace()
                    .and_then(|t| t.endpoints.as_ref())
                    .is_some_and(|ends| ends.references(id))
            })
            .map(|e| e.id().clone())
            .collect()
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Move a pad or hole to `position`, keeping the spatial index in step.
    pub fn translate(&mut self, id: &ElementId, position: Point2D) -> Result<(), RegistryError> {
        let slot = self
            .slots
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        let kind = slot.element.kind();
        if !kind.is_movable() {
            return Err(RegistryError::NotMovable {
                id: id.clone(),
                kind,
            });
        }

        let old = slot.element.extents();
        slot.element.set_position(position);
        let new = slot.element.extents();
        self.index.remove(id, &old);
        self.index.insert(id.clone(), new);
        Ok(())
    }

    pub fn set_highlight(&mut self, id: &ElementId, highlight: Highlight) -> Result<(), RegistryError> {
        let slot = self
            .slots
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        slot.element.set_highlight(highlight);
        Ok(())
    }

    pub fn clear_highlights(&mut self) {
        for slot in self.slots.values_mut() {
            slot.element.set_highlight(Highlight::default());
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// The topmost pickable element under `point`.
    ///
    /// Pads and holes win over traces; among equals the most recently added
    /// element wins.
    pub fn hit_test(&self, point: &Point2D) -> Option<&PlacedElement> {
        self.index
            .query_point(point)
            .into_iter()
            .filter_map(|entry| self.slots.get(&entry.element_id))
            .filter(|slot| slot.element.kind().is_pickable() && slot.element.contains(point))
            .max_by_key(|slot| (slot.element.kind().pick_priority(), slot.seq))
            .map(|slot| &slot.element)
    }

    /// Elements whose footprint box intersects `region`, in insertion order.
    pub fn query_region(&self, region: &BBox) -> Vec<&PlacedElement> {
        let mut hits: Vec<&Slot> = self
            .index
            .query_region(region)
            .into_iter()
            .filter_map(|entry| self.slots.get(&entry.element_id))
            .collect();
        hits.sort_by_key(|slot| slot.seq);
        hits.into_iter().map(|slot| &slot.element).collect()
    }
}

impl Default for ElementRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ElementRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementRegistry")
            .field("order", &self.order)
            .field("has_releaser", &self.releaser.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::element::{ElementData, TraceData, TraceEndpoints, Transform};
    use crate::layer::Layer;
    use crate::primitives::{make_board, make_hole, make_pad, BoardConfig, PadSpec};
    use crate::routing::route;

    #[derive(Clone, Default)]
    struct Released(Rc<RefCell<Vec<ElementId>>>);

    impl GeometryReleaser for Released {
        fn release(&mut self, id: &ElementId, _geometry: &ElementGeometry) {
            self.0.borrow_mut().push(id.clone());
        }
    }

    fn pad(x: f64, z: f64) -> PlacedElement {
        make_pad(x, z, &PadSpec::default(), 0.035).unwrap()
    }

    fn trace_between(a: &PlacedElement, b: &PlacedElement) -> PlacedElement {
        let path = route(a.position(), b.position(), 1.25).unwrap();
        PlacedElement::new(
            ElementId::generate(ElementKind::Trace),
            Layer::Top,
            Transform::identity(),
            ElementGeometry::default(),
            ElementData::Trace(TraceData {
                path,
                width: 0.55,
                layer_height: 0.037,
                endpoints: Some(TraceEndpoints {
                    from: a.id().clone(),
                    to: b.id().clone(),
                }),
            }),
        )
    }

    #[test]
    fn test_add_then_remove_restores_size() {
        let mut registry = ElementRegistry::new();
        registry.add(pad(0.0, 0.0)).unwrap();
        let before = registry.len();

        let id = registry.add(pad(10.0, 10.0)).unwrap();
        assert_eq!(registry.len(), before + 1);
        assert!(registry.remove(&id).is_some());
        assert!(registry.get(&id).is_none());
        assert_eq!(registry.len(), before);
        assert!(registry.remove(&id).is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut registry = ElementRegistry::new();
        let first = pad(0.0, 0.0);
        let id = first.id().clone();
        registry.add(first).unwrap();

        let clash = PlacedElement::new(
            id.clone(),
            Layer::Top,
            Transform::new(Point2D::new(50.0, 50.0), 0.0),
            ElementGeometry::default(),
            ElementData::Pad(PadSpec::default()),
        );
        assert_eq!(registry.add(clash), Err(RegistryError::Conflict(id.clone())));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&id).unwrap().position(), Point2D::new(0.0, 0.0));
    }

    #[test]
    fn test_iteration_in_insertion_order() {
        let mut registry = ElementRegistry::new();
        let ids: Vec<ElementId> = (0..5)
            .map(|i| registry.add(pad(i as f64 * 5.0, 0.0)).unwrap())
            .collect();
        registry.remove(&ids[2]);
        let seen: Vec<ElementId> = registry.iter().map(|e| e.id().clone()).collect();
        assert_eq!(seen, vec![ids[0].clone(), ids[1].clone(), ids[3].clone(), ids[4].clone()]);
    }

    #[test]
    fn test_remove_and_clear_release_geometry() {
        let released = Released::default();
        let mut registry = ElementRegistry::with_releaser(Box::new(released.clone()));
        let a = registry.add(pad(0.0, 0.0)).unwrap();
        let b = registry.add(make_hole(10.0, 0.0, 0.8, 1.3, 1.6).unwrap()).unwrap();
        let c = registry.add(make_board(&BoardConfig::default()).unwrap()).unwrap();

        registry.remove(&a);
        assert_eq!(*released.0.borrow(), vec![a.clone()]);

        registry.clear();
        assert_eq!(*released.0.borrow(), vec![a, b, c]);
        assert!(registry.is_empty());
        assert!(registry.hit_test(&Point2D::new(10.0, 0.0)).is_none());
    }

    #[test]
    fn test_hit_test_prefers_components_over_traces() {
        let mut registry = ElementRegistry::new();
        registry.add(make_board(&BoardConfig::default()).unwrap()).unwrap();
        let a = pad(0.0, 0.0);
        let b = pad(10.0, 0.0);
        let t = trace_between(&a, &b);
        let (a_id, t_id) = (a.id().clone(), t.id().clone());
        registry.add(a).unwrap();
        registry.add(b).unwrap();
        registry.add(t).unwrap();

        assert_eq!(registry.hit_test(&Point2D::new(0.5, 0.0)).unwrap().id(), &a_id);
        assert_eq!(registry.hit_test(&Point2D::new(5.0, 0.1)).unwrap().id(), &t_id);
        // Only the board is here, and the board is not pickable.
        assert!(registry.hit_test(&Point2D::new(30.0, 30.0)).is_none());
    }

    #[test]
    fn test_translate_updates_index() {
        let mut registry = ElementRegistry::new();
        let id = registry.add(pad(0.0, 0.0)).unwrap();
        registry.translate(&id, Point2D::new(20.0, 20.0)).unwrap();

        assert!(registry.hit_test(&Point2D::new(0.0, 0.0)).is_none());
        assert_eq!(registry.hit_test(&Point2D::new(20.0, 20.0)).unwrap().id(), &id);
        assert_eq!(registry.get(&id).unwrap().position(), Point2D::new(20.0, 20.0));
    }

    #[test]
    fn test_translate_rejects_traces_and_unknown_ids() {
        let mut registry = ElementRegistry::new();
        let a = pad(0.0, 0.0);
        let b = pad(10.0, 5.0);
        let t = trace_between(&a, &b);
        let t_id = registry.add(t).unwrap();

        assert!(matches!(
            registry.translate(&t_id, Point2D::new(1.0, 1.0)),
            Err(RegistryError::NotMovable { kind: ElementKind::Trace, .. })
        ));
        let ghost = ElementId::new("ghost");
        assert_eq!(
            registry.translate(&ghost, Point2D::origin()),
            Err(RegistryError::NotFound(ghost))
        );
    }

    #[test]
    fn test_traces_attached_to() {
        let mut registry = ElementRegistry::new();
        let a = pad(0.0, 0.0);
        let b = pad(10.0, 5.0);
        let c = pad(-10.0, 5.0);
        let t1 = trace_between(&a, &b);
        let t2 = trace_between(&c, &a);
        let (a_id, b_id) = (a.id().clone(), b.id().clone());
        let (t1_id, t2_id) = (t1.id().clone(), t2.id().clone());
        for e in [a, b, c, t1, t2] {
            registry.add(e).unwrap();
        }

        assert_eq!(registry.traces_attached_to(&a_id), vec![t1_id.clone(), t2_id]);
        assert_eq!(registry.traces_attached_to(&b_id), vec![t1_id]);
        assert_eq!(registry.count_of(ElementKind::Trace), 2);
    }

    #[test]
    fn test_highlight_round_trip() {
        let mut registry = ElementRegistry::new();
        let id = registry.add(pad(0.0, 0.0)).unwrap();
        let lit = Highlight {
            hovered: true,
            selected: false,
        };
        registry.set_highlight(&id, lit).unwrap();
        assert_eq!(registry.get(&id).unwrap().highlight(), lit);
        registry.clear_highlights();
        assert_eq!(registry.get(&id).unwrap().highlight(), Highlight::default());
    }
}
