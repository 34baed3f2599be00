//! Pointer interaction as an explicit state machine.
//!
//! Events arrive with their hit test already resolved. Each transition
//! returns the [`Action`]s the engine must apply, so the machine itself never
//! touches the registry and can be driven directly from tests.

use log::trace;

use boardsmith_core::{ElementId, ElementKind, Point2D, RoutingPolicy};

/// What the pointer is doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerState {
    Idle,
    Hovering(ElementId),
    Dragging(ElementId),
}

/// A routing endpoint: the element clicked and where it sat at the time.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub id: ElementId,
    pub point: Point2D,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoutingState {
    Disarmed,
    Armed { anchor: Option<Anchor> },
}

impl RoutingState {
    pub fn is_armed(&self) -> bool {
        matches!(self, RoutingState::Armed { .. })
    }
}

/// The element under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: ElementId,
    pub kind: ElementKind,
    pub position: Point2D,
}

impl Hit {
    fn anchor(&self) -> Anchor {
        Anchor {
            id: self.id.clone(),
            point: self.position,
        }
    }
}

/// Pointer input in board coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    Move { at: Point2D, hit: Option<Hit> },
    Click { hit: Option<Hit> },
    DragStart { at: Point2D, hit: Option<Hit> },
    DragMove { at: Point2D },
    DragEnd { at: Point2D, hit: Option<Hit> },
}

/// Side effects requested by a transition, in the order they must happen.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    HoverExit(ElementId),
    HoverEnter(ElementId),
    Select(ElementId),
    Deselect(ElementId),
    AttachHandle(ElementId),
    DetachHandle(ElementId),
    /// Move an element; `to` is unsnapped.
    MoveElement { id: ElementId, to: Point2D },
    CreateTrace { from: Anchor, to: Anchor },
    /// Notify the selection listener with the current selection.
    SelectionChanged(Option<ElementId>),
}

#[derive(Debug, Clone)]
pub struct Interaction {
    pointer: PointerState,
    routing: RoutingState,
    selected: Option<ElementId>,
    /// Element position minus pointer position at drag start.
    grab_offset: (f64, f64),
    policy: RoutingPolicy,
}

impl Interaction {
    pub fn new(policy: RoutingPolicy) -> Self {
        Self {
            pointer: PointerState::Idle,
            routing: RoutingState::Disarmed,
            selected: None,
            grab_offset: (0.0, 0.0),
            policy,
        }
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn routing(&self) -> &RoutingState {
        &self.routing
    }

    pub fn selected(&self) -> Option<&ElementId> {
        self.selected.as_ref()
    }

    pub fn hovered(&self) -> Option<&ElementId> {
        match &self.pointer {
            PointerState::Hovering(id) | PointerState::Dragging(id) => Some(id),
            PointerState::Idle => None,
        }
    }

    pub fn set_policy(&mut self, policy: RoutingPolicy) {
        self.policy = policy;
    }

    /// Enter routing mode with no anchor, abandoning any half-made trace.
    pub fn arm(&mut self) {
        self.routing = RoutingState::Armed { anchor: None };
    }

    pub fn disarm(&mut self) {
        self.routing = RoutingState::Disarmed;
    }

    /// Drop all pointer and selection state, keeping the routing mode.
    pub fn reset(&mut self) {
        self.pointer = PointerState::Idle;
        self.selected = None;
        self.grab_offset = (0.0, 0.0);
        if let RoutingState::Armed { anchor } = &mut self.routing {
            *anchor = None;
        }
    }

    /// Forget an element that has left the registry.
    pub fn forget(&mut self, id: &ElementId) {
        if self.hovered() == Some(id) {
            self.pointer = PointerState::Idle;
        }
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        if let RoutingState::Armed { anchor } = &mut self.routing {
            if anchor.as_ref().is_some_and(|a| &a.id == id) {
                *anchor = None;
            }
        }
    }

    pub fn handle(&mut self, event: PointerEvent) -> Vec<Action> {
        trace!("pointer event {:?} in {:?}", event, self.pointer);
        let mut actions = Vec::new();
        match event {
            PointerEvent::Move { hit, .. } => {
                if !matches!(self.pointer, PointerState::Dragging(_)) {
                    self.retarget_hover(hit.map(|h| h.id), &mut actions);
                }
            }
            PointerEvent::Click { hit } => self.click(hit, &mut actions),
            PointerEvent::DragStart { at, hit } => self.drag_start(at, hit, &mut actions),
            PointerEvent::DragMove { at } => {
                if let PointerState::Dragging(id) = &self.pointer {
                    let to = at.translate(self.grab_offset.0, self.grab_offset.1);
                    actions.push(Action::MoveElement { id: id.clone(), to });
                    if self.selected.as_ref() == Some(id) {
                        actions.push(Action::SelectionChanged(Some(id.clone())));
                    }
                }
            }
            PointerEvent::DragEnd { hit, .. } => {
                if let PointerState::Dragging(id) = &self.pointer {
                    actions.push(Action::DetachHandle(id.clone()));
                    self.grab_offset = (0.0, 0.0);
                    self.retarget_hover(hit.map(|h| h.id), &mut actions);
                }
            }
        }
        actions
    }

    fn retarget_hover(&mut self, target: Option<ElementId>, actions: &mut Vec<Action>) {
        let current = self.hovered().cloned();
        if current == target {
            self.pointer = match target {
                Some(id) => PointerState::Hovering(id),
                None => PointerState::Idle,
            };
            return;
        }
        if let Some(old) = current {
            actions.push(Action::HoverExit(old));
        }
        self.pointer = match target {
            Some(id) => {
                actions.push(Action::HoverEnter(id.clone()));
                PointerState::Hovering(id)
            }
            None => PointerState::Idle,
        };
    }

    fn select(&mut self, id: Option<ElementId>, actions: &mut Vec<Action>) {
        if let Some(prev) = self.selected.take() {
            actions.push(Action::Deselect(prev));
        }
        if let Some(id) = &id {
            actions.push(Action::Select(id.clone()));
        }
        self.selected = id.clone();
        actions.push(Action::SelectionChanged(id));
    }

    fn click(&mut self, hit: Option<Hit>, actions: &mut Vec<Action>) {
        if matches!(self.pointer, PointerState::Dragging(_)) {
            return;
        }

        if let RoutingState::Armed { anchor } = &mut self.routing {
            // Traces and empty space are not valid endpoints.
            let Some(hit) = hit.filter(|h| h.kind.is_movable()) else {
                return;
            };
            match anchor.take() {
                None => *anchor = Some(hit.anchor()),
                Some(from) if from.point.approx_eq(&hit.position) => *anchor = Some(from),
                Some(from) => {
                    actions.push(Action::CreateTrace {
                        from,
                        to: hit.anchor(),
                    });
                    if self.policy == RoutingPolicy::DisarmAfterTrace {
                        self.routing = RoutingState::Disarmed;
                    }
                }
            }
            return;
        }

        match hit {
            Some(hit) => self.select(Some(hit.id), actions),
            None if self.selected.is_some() => self.select(None, actions),
            None => {}
        }
    }

    fn drag_start(&mut self, at: Point2D, hit: Option<Hit>, actions: &mut Vec<Action>) {
        if self.routing.is_armed() || matches!(self.pointer, PointerState::Dragging(_)) {
            return;
        }
        let Some(hit) = hit.filter(|h| h.kind.is_movable()) else {
            return;
        };

        self.retarget_hover(Some(hit.id.clone()), actions);
        self.select(Some(hit.id.clone()), actions);
        self.grab_offset = hit.position.delta(&at);
        actions.push(Action::AttachHandle(hit.id.clone()));
        self.pointer = PointerState::Dragging(hit.id);
    }
}

impl Default for Interaction {
    fn default() -> Self {
        Self::new(RoutingPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, x: f64, z: f64) -> Option<Hit> {
        Some(Hit {
            id: ElementId::from(id),
            kind: ElementKind::Pad,
            position: Point2D::new(x, z),
        })
    }

    fn id(s: &str) -> ElementId {
        ElementId::from(s)
    }

    fn moved(h: Option<Hit>) -> PointerEvent {
        PointerEvent::Move {
            at: Point2D::origin(),
            hit: h,
        }
    }

    #[test]
    fn test_hover_transitions() {
        let mut ix = Interaction::default();
        assert_eq!(ix.handle(moved(hit("a", 0.0, 0.0))), vec![Action::HoverEnter(id("a"))]);
        assert_eq!(ix.pointer(), &PointerState::Hovering(id("a")));

        // Staying on the same element is silent.
        assert!(ix.handle(moved(hit("a", 0.0, 0.0))).is_empty());

        assert_eq!(
            ix.handle(moved(hit("b", 0.0, 0.0))),
            vec![Action::HoverExit(id("a")), Action::HoverEnter(id("b"))]
        );
        assert_eq!(ix.handle(moved(None)), vec![Action::HoverExit(id("b"))]);
        assert_eq!(ix.pointer(), &PointerState::Idle);
    }

    #[test]
    fn test_click_selects_and_deselects() {
        let mut ix = Interaction::default();
        assert_eq!(
            ix.handle(PointerEvent::Click { hit: hit("a", 0.0, 0.0) }),
            vec![Action::Select(id("a")), Action::SelectionChanged(Some(id("a")))]
        );
        assert_eq!(
            ix.handle(PointerEvent::Click { hit: hit("b", 0.0, 0.0) }),
            vec![
                Action::Deselect(id("a")),
                Action::Select(id("b")),
                Action::SelectionChanged(Some(id("b")))
            ]
        );
        assert_eq!(
            ix.handle(PointerEvent::Click { hit: None }),
            vec![Action::Deselect(id("b")), Action::SelectionChanged(None)]
        );
        assert_eq!(ix.selected(), None);
        // Clicking empty space with nothing selected does nothing.
        assert!(ix.handle(PointerEvent::Click { hit: None }).is_empty());
    }

    #[test]
    fn test_drag_moves_with_grab_offset() {
        let mut ix = Interaction::default();
        ix.handle(moved(hit("a", 10.0, 10.0)));

        let actions = ix.handle(PointerEvent::DragStart {
            at: Point2D::new(11.0, 9.5),
            hit: hit("a", 10.0, 10.0),
        });
        assert_eq!(
            actions,
            vec![
                Action::Select(id("a")),
                Action::SelectionChanged(Some(id("a"))),
                Action::AttachHandle(id("a"))
            ]
        );
        assert_eq!(ix.pointer(), &PointerState::Dragging(id("a")));

        // Hover moves are ignored mid-drag.
        assert!(ix.handle(moved(hit("b", 0.0, 0.0))).is_empty());

        let actions = ix.handle(PointerEvent::DragMove {
            at: Point2D::new(21.0, 19.5),
        });
        assert_eq!(
            actions,
            vec![
                Action::MoveElement {
                    id: id("a"),
                    to: Point2D::new(20.0, 20.0)
                },
                Action::SelectionChanged(Some(id("a")))
            ]
        );

        let actions = ix.handle(PointerEvent::DragEnd {
            at: Point2D::new(21.0, 19.5),
            hit: None,
        });
        assert_eq!(actions, vec![Action::DetachHandle(id("a")), Action::HoverExit(id("a"))]);
        assert_eq!(ix.pointer(), &PointerState::Idle);
        assert_eq!(ix.selected(), Some(&id("a")));
    }

    #[test]
    fn test_drag_end_over_same_element_keeps_hover() {
        let mut ix = Interaction::default();
        ix.handle(PointerEvent::DragStart {
            at: Point2D::origin(),
            hit: hit("a", 0.0, 0.0),
        });
        let actions = ix.handle(PointerEvent::DragEnd {
            at: Point2D::origin(),
            hit: hit("a", 0.0, 0.0),
        });
        assert_eq!(actions, vec![Action::DetachHandle(id("a"))]);
        assert_eq!(ix.pointer(), &PointerState::Hovering(id("a")));
    }

    #[test]
    fn test_traces_cannot_be_dragged() {
        let mut ix = Interaction::default();
        let trace = Some(Hit {
            id: id("t"),
            kind: ElementKind::Trace,
            position: Point2D::origin(),
        });
        assert!(ix
            .handle(PointerEvent::DragStart {
                at: Point2D::origin(),
                hit: trace
            })
            .is_empty());
        assert!(ix.handle(PointerEvent::DragMove { at: Point2D::new(5.0, 5.0) }).is_empty());
    }

    #[test]
    fn test_routing_gesture_stays_armed() {
        let mut ix = Interaction::default();
        ix.arm();

        assert!(ix.handle(PointerEvent::Click { hit: None }).is_empty());
        assert!(ix.handle(PointerEvent::Click { hit: hit("a", 10.0, 10.0) }).is_empty());
        assert_eq!(
            ix.routing(),
            &RoutingState::Armed {
                anchor: Some(Anchor {
                    id: id("a"),
                    point: Point2D::new(10.0, 10.0)
                })
            }
        );

        // Same position again: nothing happens and the anchor is kept.
        assert!(ix.handle(PointerEvent::Click { hit: hit("a", 10.0, 10.0) }).is_empty());

        let actions = ix.handle(PointerEvent::Click { hit: hit("b", 10.0, 30.0) });
        assert_eq!(
            actions,
            vec![Action::CreateTrace {
                from: Anchor {
                    id: id("a"),
                    point: Point2D::new(10.0, 10.0)
                },
                to: Anchor {
                    id: id("b"),
                    point: Point2D::new(10.0, 30.0)
                },
            }]
        );
        assert_eq!(ix.routing(), &RoutingState::Armed { anchor: None });
        // Routing clicks never select.
        assert_eq!(ix.selected(), None);
    }

    #[test]
    fn test_routing_disarms_after_trace_when_configured() {
        let mut ix = Interaction::new(RoutingPolicy::DisarmAfterTrace);
        ix.arm();
        ix.handle(PointerEvent::Click { hit: hit("a", 0.0, 0.0) });
        let actions = ix.handle(PointerEvent::Click { hit: hit("b", 5.0, 0.0) });
        assert_eq!(actions.len(), 1);
        assert_eq!(ix.routing(), &RoutingState::Disarmed);
    }

    #[test]
    fn test_armed_blocks_dragging() {
        let mut ix = Interaction::default();
        ix.arm();
        assert!(ix
            .handle(PointerEvent::DragStart {
                at: Point2D::origin(),
                hit: hit("a", 0.0, 0.0)
            })
            .is_empty());
        ix.disarm();
        assert!(!ix.routing().is_armed());
    }

    #[test]
    fn test_rearming_drops_anchor() {
        let mut ix = Interaction::default();
        ix.arm();
        ix.handle(PointerEvent::Click { hit: hit("a", 0.0, 0.0) });
        ix.arm();
        assert_eq!(ix.routing(), &RoutingState::Armed { anchor: None });
    }

    #[test]
    fn test_forget_and_reset() {
        let mut ix = Interaction::default();
        ix.handle(moved(hit("a", 0.0, 0.0)));
        ix.handle(PointerEvent::Click { hit: hit("a", 0.0, 0.0) });
        ix.forget(&id("a"));
        assert_eq!(ix.pointer(), &PointerState::Idle);
        assert_eq!(ix.selected(), None);

        ix.handle(PointerEvent::DragStart {
            at: Point2D::origin(),
            hit: hit("b", 0.0, 0.0),
        });
        ix.reset();
        assert_eq!(ix.pointer(), &PointerState::Idle);
        assert_eq!(ix.selected(), None);
    }
}
