use log::{debug, info, warn};
use thiserror::Error;

use boardsmith_core::{
    make_board, make_hole, make_pad, mesh_path, route, BoardConfig, ConfigError,
    ConstructionError, ElementData, ElementGeometry, ElementId, ElementKind, ElementRegistry,
    EngineConfig, GeometryPart, GeometryReleaser, Highlight, Layer, MeshError, OrthogonalPath, PadSpec,
    PartRole, PlacedElement, Point2D, RegistryError, SelectionInfo, TraceData, TraceEndpoints,
    Transform,
};
use boardsmith_io::{LayoutDocument, LayoutError};
use boardsmith_renderer::{RenderFrame, Viewport};

use crate::interaction::{Action, Hit, Interaction, PointerEvent};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("element `{id}` is a {kind} and cannot be a trace endpoint")]
    NotRoutable { id: ElementId, kind: ElementKind },

    #[error("the board cannot be removed")]
    BoardRemoval,
}

pub type SelectionListener = Box<dyn FnMut(Option<&SelectionInfo>)>;

/// Default canvas size until the host reports a real one.
const DEFAULT_CANVAS: (f64, f64) = (800.0, 600.0);

/// One editing session: the board, everything placed on it, and the pointer
/// state driving it.
pub struct Engine {
    config: EngineConfig,
    registry: ElementRegistry,
    interaction: Interaction,
    viewport: Viewport,
    /// Element the move gizmo is attached to.
    handle: Option<ElementId>,
    selection_listener: Option<SelectionListener>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let mut registry = ElementRegistry::new();
        registry.add(make_board(&config.board)?)?;

        info!(
            "engine started: board {}x{}x{}, grid {}",
            config.board.width, config.board.height, config.board.thickness, config.grid_pitch
        );
        Ok(Self {
            interaction: Interaction::new(config.routing_policy),
            config,
            registry,
            viewport: Viewport::new(DEFAULT_CANVAS.0, DEFAULT_CANVAS.1),
            handle: None,
            selection_listener: None,
        })
    }

    /// Tear the session down, releasing every element's geometry.
    pub fn dispose(mut self) {
        self.interaction.reset();
        self.handle = None;
        self.registry.clear();
        info!("engine disposed");
    }

    /// Route GPU resource cleanup for every element that leaves the registry.
    pub fn set_geometry_releaser(&mut self, releaser: Box<dyn GeometryReleaser>) {
        self.registry.set_releaser(releaser);
    }

    pub fn on_selection_change(&mut self, listener: impl FnMut(Option<&SelectionInfo>) + 'static) {
        self.selection_listener = Some(Box::new(listener));
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn elements(&self) -> impl Iterator<Item = &PlacedElement> {
        self.registry.iter()
    }

    pub fn element(&self, id: &ElementId) -> Option<&PlacedElement> {
        self.registry.get(id)
    }

    pub fn selection(&self) -> Option<SelectionInfo> {
        self.interaction
            .selected()
            .and_then(|id| self.registry.get(id))
            .map(PlacedElement::selection_info)
    }

    pub fn drag_handle(&self) -> Option<&ElementId> {
        self.handle.as_ref()
    }

    pub fn is_routing(&self) -> bool {
        self.interaction.routing().is_armed()
    }

    // ── Placement ────────────────────────────────────────────────────

    pub fn add_pad(&mut self) -> Result<ElementId, EngineError> {
        self.add_pad_at(0.0, 0.0)
    }

    /// Place a pad at the grid point nearest `(x, z)`.
    pub fn add_pad_at(&mut self, x: f64, z: f64) -> Result<ElementId, EngineError> {
        let at = self.snap(Point2D::new(x, z));
        let pad = make_pad(at.x, at.z, &self.config.pad, self.config.top_layer_height)?;
        let id = self.registry.add(pad)?;
        info!("added pad `{}` at ({}, {})", id, at.x, at.z);
        Ok(id)
    }

    pub fn add_hole(&mut self) -> Result<ElementId, EngineError> {
        self.add_hole_at(0.0, 0.0)
    }

    /// Place a through-hole at the grid point nearest `(x, z)`.
    pub fn add_hole_at(&mut self, x: f64, z: f64) -> Result<ElementId, EngineError> {
        let at = self.snap(Point2D::new(x, z));
        let hole = make_hole(
            at.x,
            at.z,
            self.config.hole.drill_radius,
            self.config.hole.ring_width,
            self.config.board.thickness,
        )?;
        let id = self.registry.add(hole)?;
        info!("added hole `{}` at ({}, {})", id, at.x, at.z);
        Ok(id)
    }

    /// Route a trace between two pads or holes.
    ///
    /// Returns `Ok(None)` when both sit on the same grid point.
    pub fn connect(&mut self, a: &ElementId, b: &ElementId) -> Result<Option<ElementId>, EngineError> {
        let from = self.endpoint_position(a)?;
        let to = self.endpoint_position(b)?;
        let Some(path) = route(from, to, self.config.grid_pitch) else {
            debug!("connect `{}` -> `{}` declined: same grid point", a, b);
            return Ok(None);
        };

        let trace = self.trace_element(
            ElementId::generate(ElementKind::Trace),
            path,
            self.config.trace_width,
            Some(TraceEndpoints {
                from: a.clone(),
                to: b.clone(),
            }),
        )?;
        let id = self.registry.add(trace)?;
        info!("routed trace `{}` from `{}` to `{}`", id, a, b);
        Ok(Some(id))
    }

    /// Move a pad or hole, snapping the target to the grid, and re-route every
    /// trace attached to it before returning.
    ///
    /// Returns `false` when the element already sits on that grid point.
    pub fn move_element(&mut self, id: &ElementId, to: Point2D) -> Result<bool, EngineError> {
        let target = self.snap(to);
        let current = self
            .registry
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?
            .position();
        if current.approx_eq(&target) {
            return Ok(false);
        }

        self.registry.translate(id, target)?;
        debug!("moved `{}` to ({}, {})", id, target.x, target.z);
        self.reroute_attached(id)?;
        Ok(true)
    }

    /// Remove an element. Removing a pad or hole also removes the traces
    /// attached to it.
    pub fn remove(&mut self, id: &ElementId) -> Result<(), EngineError> {
        let kind = self
            .registry
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?
            .kind();
        if kind == ElementKind::Board {
            return Err(EngineError::BoardRemoval);
        }

        let had_selection = self.interaction.selected().is_some();
        let mut doomed = self.registry.traces_attached_to(id);
        doomed.push(id.clone());
        for victim in &doomed {
            self.registry.remove(victim);
            self.interaction.forget(victim);
            if self.handle.as_ref() == Some(victim) {
                self.handle = None;
            }
        }
        info!("removed {} `{}` ({} attached traces)", kind, id, doomed.len() - 1);

        if had_selection && self.interaction.selected().is_none() {
            self.notify_selection();
        }
        Ok(())
    }

    /// Remove every element except the board.
    pub fn clear(&mut self) {
        let had_selection = self.interaction.selected().is_some();
        let board = ElementId::board();
        for id in self.registry.ids() {
            if id != board {
                self.registry.remove(&id);
            }
        }
        self.interaction.reset();
        self.handle = None;
        info!("layout cleared");
        if had_selection {
            self.notify_selection();
        }
    }

    /// Start over on a fresh board. Everything placed on the old one is
    /// removed; an invalid board leaves the session untouched.
    pub fn reload_board(&mut self, board: BoardConfig) -> Result<(), EngineError> {
        let slab = make_board(&board)?;
        self.replace_all(board, vec![slab])?;
        info!(
            "board reloaded: {}x{}x{}",
            board.width, board.height, board.thickness
        );
        Ok(())
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Replace the whole layout with the contents of a JSON document.
    ///
    /// The document is parsed, validated and fully built before anything
    /// currently loaded is touched; on error the session is unchanged.
    pub fn load_layout(&mut self, json: &str) -> Result<(), EngineError> {
        let doc = LayoutDocument::from_json(json)?;
        let elements = self.build_layout(&doc)?;
        self.replace_all(doc.board, elements)?;
        info!(
            "loaded layout: {} pads, {} holes, {} traces",
            self.registry.count_of(ElementKind::Pad),
            self.registry.count_of(ElementKind::Hole),
            self.registry.count_of(ElementKind::Trace)
        );
        Ok(())
    }

    pub fn export_layout(&self) -> Result<String, EngineError> {
        let doc = LayoutDocument::from_elements(self.config.board, self.registry.iter());
        let json = doc.to_json().map_err(LayoutError::from)?;
        info!("exported layout with {} components", doc.components.len());
        Ok(json)
    }

    /// Swap in a fully built element set. Ids are unique by construction.
    fn replace_all(&mut self, board: BoardConfig, elements: Vec<PlacedElement>) -> Result<(), EngineError> {
        let had_selection = self.interaction.selected().is_some();
        self.registry.clear();
        self.interaction.reset();
        self.handle = None;
        for element in elements {
            self.registry.add(element)?;
        }
        self.config.board = board;
        if had_selection {
            self.notify_selection();
        }
        Ok(())
    }

    fn build_layout(&self, doc: &LayoutDocument) -> Result<Vec<PlacedElement>, EngineError> {
        let board_id = ElementId::board();
        let mut elements = vec![make_board(&doc.board)?];

        for record in &doc.components {
            let id = ElementId::new(record.id.as_str());
            if record.kind != ElementKind::Board && id == board_id {
                return Err(LayoutError::DuplicateId(record.id.clone()).into());
            }
            let at = self.snap(record.plane_position());

            let element = match record.kind {
                // Rebuilt from the document's board dimensions.
                ElementKind::Board => continue,
                ElementKind::Pad => {
                    let spec = match record.size {
                        Some([width, depth]) => PadSpec {
                            width,
                            depth,
                            ..self.config.pad
                        },
                        None => self.config.pad,
                    };
                    make_pad(at.x, at.z, &spec, self.config.top_layer_height)?.with_id(id)
                }
                ElementKind::Hole => {
                    let [radius, ring] = record
                        .size
                        .unwrap_or([self.config.hole.drill_radius, self.config.hole.ring_width]);
                    make_hole(at.x, at.z, radius, ring, doc.board.thickness)?.with_id(id)
                }
                ElementKind::Trace => {
                    let path = record.path()?.ok_or_else(|| LayoutError::InvalidComponent {
                        id: record.id.clone(),
                        reason: "trace has no points".to_string(),
                    })?;
                    let path = self.snap_path(&record.id, &path)?;
                    let endpoints = self.reattach(doc, &path);
                    let width = record.width.unwrap_or(self.config.trace_width);
                    self.trace_element(id, path, width, endpoints)?
                }
            };
            elements.push(element);
        }
        Ok(elements)
    }

    /// Put a loaded trace on the grid. Points that snap together are merged.
    fn snap_path(&self, id: &str, path: &OrthogonalPath) -> Result<OrthogonalPath, LayoutError> {
        let mut points: Vec<Point2D> = Vec::with_capacity(path.points().len());
        for point in path.points().iter().map(|p| self.snap(*p)) {
            if points.last().is_some_and(|last| last.approx_eq(&point)) {
                continue;
            }
            points.push(point);
        }
        OrthogonalPath::new(points).map_err(|source| LayoutError::InvalidPath {
            id: id.to_string(),
            source,
        })
    }

    /// Find the pads or holes sitting on a loaded trace's end points.
    fn reattach(&self, doc: &LayoutDocument, path: &OrthogonalPath) -> Option<TraceEndpoints> {
        let at = |point: Point2D| {
            doc.components
                .iter()
                .filter(|c| c.kind.is_movable())
                .find(|c| self.snap(c.plane_position()).approx_eq(&point))
                .map(|c| ElementId::new(c.id.as_str()))
        };
        Some(TraceEndpoints {
            from: at(path.start())?,
            to: at(path.end())?,
        })
    }

    // ── Rendering & view ─────────────────────────────────────────────

    pub fn render_frame(&self, time: f64) -> RenderFrame {
        RenderFrame::capture(&self.registry, self.viewport, self.config.grid_pitch, time)
    }

    pub fn resize(&mut self, canvas_width: f64, canvas_height: f64) {
        self.viewport.resize(canvas_width, canvas_height);
    }

    /// Mouse-wheel zoom around the view centre.
    pub fn zoom(&mut self, wheel_delta: f64) {
        self.viewport.zoom_by_wheel(wheel_delta);
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.viewport.pan(dx, dy);
    }

    // ── Routing mode ─────────────────────────────────────────────────

    pub fn start_routing(&mut self) {
        self.interaction.arm();
        debug!("routing armed");
    }

    pub fn stop_routing(&mut self) {
        self.interaction.disarm();
        debug!("routing disarmed");
    }

    // ── Pointer input (screen pixels) ────────────────────────────────

    pub fn pointer_moved(&mut self, screen_x: f64, screen_y: f64) {
        let at = self.viewport.screen_to_board(screen_x, screen_y);
        let hit = self.hit_at(&at);
        self.dispatch(PointerEvent::Move { at, hit });
    }

    pub fn click(&mut self, screen_x: f64, screen_y: f64) {
        let at = self.viewport.screen_to_board(screen_x, screen_y);
        let hit = self.hit_at(&at);
        self.dispatch(PointerEvent::Click { hit });
    }

    pub fn drag_start(&mut self, screen_x: f64, screen_y: f64) {
        let at = self.viewport.screen_to_board(screen_x, screen_y);
        let hit = self.hit_at(&at);
        self.dispatch(PointerEvent::DragStart { at, hit });
    }

    pub fn drag_moved(&mut self, screen_x: f64, screen_y: f64) {
        let at = self.viewport.screen_to_board(screen_x, screen_y);
        self.dispatch(PointerEvent::DragMove { at });
    }

    pub fn drag_ended(&mut self, screen_x: f64, screen_y: f64) {
        let at = self.viewport.screen_to_board(screen_x, screen_y);
        let hit = self.hit_at(&at);
        self.dispatch(PointerEvent::DragEnd { at, hit });
    }

    fn hit_at(&self, at: &Point2D) -> Option<Hit> {
        self.registry.hit_test(at).map(|e| Hit {
            id: e.id().clone(),
            kind: e.kind(),
            position: e.position(),
        })
    }

    fn dispatch(&mut self, event: PointerEvent) {
        for action in self.interaction.handle(event) {
            if let Err(e) = self.apply(action) {
                warn!("pointer interaction failed: {}", e);
                self.recover();
                break;
            }
        }
    }

    fn apply(&mut self, action: Action) -> Result<(), EngineError> {
        match action {
            Action::HoverExit(id) => {
                // The element may have been removed while hovered.
                if self.registry.contains(&id) {
                    self.update_highlight(&id, |h| h.hovered = false)?;
                }
            }
            Action::HoverEnter(id) => self.update_highlight(&id, |h| h.hovered = true)?,
            Action::Select(id) => self.update_highlight(&id, |h| h.selected = true)?,
            Action::Deselect(id) => {
                if self.registry.contains(&id) {
                    self.update_highlight(&id, |h| h.selected = false)?;
                }
            }
            Action::AttachHandle(id) => self.handle = Some(id),
            Action::DetachHandle(_) => self.handle = None,
            Action::MoveElement { id, to } => {
                self.move_element(&id, to)?;
            }
            Action::CreateTrace { from, to } => {
                self.connect(&from.id, &to.id)?;
            }
            Action::SelectionChanged(_) => self.notify_selection(),
        }
        Ok(())
    }

    /// Fall back to idle with nothing selected.
    fn recover(&mut self) {
        let had_selection = self.interaction.selected().is_some();
        self.interaction.reset();
        self.handle = None;
        self.registry.clear_highlights();
        if had_selection {
            self.notify_selection();
        }
    }

    fn update_highlight(
        &mut self,
        id: &ElementId,
        f: impl FnOnce(&mut Highlight),
    ) -> Result<(), EngineError> {
        let mut highlight = self
            .registry
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?
            .highlight();
        f(&mut highlight);
        self.registry.set_highlight(id, highlight)?;
        Ok(())
    }

    fn notify_selection(&mut self) {
        let info = self.selection();
        if let Some(listener) = self.selection_listener.as_mut() {
            listener(info.as_ref());
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn snap(&self, p: Point2D) -> Point2D {
        p.snapped(self.config.grid_pitch)
    }

    fn endpoint_position(&self, id: &ElementId) -> Result<Point2D, EngineError> {
        let element = self
            .registry
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        let kind = element.kind();
        if !kind.is_movable() {
            return Err(EngineError::NotRoutable {
                id: id.clone(),
                kind,
            });
        }
        Ok(element.position())
    }

    fn trace_element(
        &self,
        id: ElementId,
        path: OrthogonalPath,
        width: f64,
        endpoints: Option<TraceEndpoints>,
    ) -> Result<PlacedElement, EngineError> {
        let layer_height = self.config.trace_layer_height();
        let mesh = mesh_path(&path, width, layer_height)?;
        Ok(PlacedElement::new(
            id,
            Layer::Top,
            Transform::identity(),
            ElementGeometry::single(GeometryPart::new("copper", PartRole::Copper, mesh)),
            ElementData::Trace(TraceData {
                path,
                width,
                layer_height,
                endpoints,
            }),
        ))
    }

    /// Destroy and rebuild every trace attached to `id`, keeping trace ids.
    /// A trace whose ends now share a grid point is dropped.
    fn reroute_attached(&mut self, id: &ElementId) -> Result<(), EngineError> {
        for trace_id in self.registry.traces_attached_to(id) {
            let Some(old) = self.registry.remove(&trace_id) else {
                continue;
            };
            let highlight = old.highlight();
            let Some(trace) = old.trace() else {
                continue;
            };
            let Some(ends) = trace.endpoints.clone() else {
                continue;
            };
            let width = trace.width;

            let from = self.registry.get(&ends.from).map(PlacedElement::position);
            let to = self.registry.get(&ends.to).map(PlacedElement::position);
            let path = match (from, to) {
                (Some(from), Some(to)) => route(from, to, self.config.grid_pitch),
                _ => None,
            };
            let Some(path) = path else {
                debug!("trace `{}` dropped: endpoints coincide", trace_id);
                let was_selected = self.interaction.selected() == Some(&trace_id);
                self.interaction.forget(&trace_id);
                if was_selected {
                    self.notify_selection();
                }
                continue;
            };

            let rebuilt = self.trace_element(trace_id.clone(), path, width, Some(ends))?;
            self.registry.add(rebuilt)?;
            self.registry.set_highlight(&trace_id, highlight)?;
            debug!("re-routed trace `{}`", trace_id);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("interaction", &self.interaction)
            .field("viewport", &self.viewport)
            .finish_non_exhaustive()
    }
}
