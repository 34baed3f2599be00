use serde::{Deserialize, Serialize};

use boardsmith_core::{BBox, Point2D};

/// Zoom limits of the board camera.
pub const MIN_ZOOM: f64 = 0.6;
pub const MAX_ZOOM: f64 = 12.0;
/// Board-plane height (mm) visible at zoom 1.
pub const DEFAULT_FRUSTUM: f64 = 80.0;

/// Top-down orthographic view of the board.
///
/// Screen X maps to board X; screen Y grows downward and maps to board +Z
/// (the camera's up vector points along -Z).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Board-plane point at the centre of the canvas.
    pub center_x: f64,
    pub center_z: f64,
    /// Magnification relative to the default frustum.
    pub zoom: f64,
    /// Visible board height at zoom 1 (mm).
    pub frustum: f64,
    /// Canvas width in pixels.
    pub canvas_width: f64,
    /// Canvas height in pixels.
    pub canvas_height: f64,
}

impl Viewport {
    pub fn new(canvas_width: f64, canvas_height: f64) -> Self {
        Self {
            center_x: 0.0,
            center_z: 0.0,
            zoom: 1.0,
            frustum: DEFAULT_FRUSTUM,
            canvas_width,
            canvas_height,
        }
    }

    /// Screen pixels per board millimetre.
    pub fn pixels_per_mm(&self) -> f64 {
        self.canvas_height * self.zoom / self.frustum
    }

    pub fn resize(&mut self, canvas_width: f64, canvas_height: f64) {
        self.canvas_width = canvas_width;
        self.canvas_height = canvas_height;
    }

    /// Pan the viewport by a delta in screen pixels.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let ppm = self.pixels_per_mm();
        self.center_x -= dx / ppm;
        self.center_z -= dy / ppm;
    }

    /// Mouse-wheel zoom: scrolling down (positive delta) zooms out.
    pub fn zoom_by_wheel(&mut self, delta_y: f64) {
        let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
        self.set_zoom(self.zoom * factor);
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Centre on a bounding box and zoom so it fits with a 10% margin.
    pub fn fit_bbox(&mut self, bbox: &BBox) {
        let width = bbox.width();
        let depth = bbox.depth();
        if width <= 0.0 || depth <= 0.0 {
            return;
        }

        let center = bbox.center();
        self.center_x = center.x;
        self.center_z = center.z;

        let aspect = self.canvas_width / self.canvas_height;
        let zoom_z = self.frustum / depth * 0.9;
        let zoom_x = self.frustum * aspect / width * 0.9;
        self.set_zoom(zoom_x.min(zoom_z));
    }

    /// Convert a screen position (pixels, origin top-left) to the board plane.
    pub fn screen_to_board(&self, screen_x: f64, screen_y: f64) -> Point2D {
        let ppm = self.pixels_per_mm();
        Point2D::new(
            (screen_x - self.canvas_width / 2.0) / ppm + self.center_x,
            (screen_y - self.canvas_height / 2.0) / ppm + self.center_z,
        )
    }

    pub fn board_to_screen(&self, point: &Point2D) -> (f64, f64) {
        let ppm = self.pixels_per_mm();
        (
            (point.x - self.center_x) * ppm + self.canvas_width / 2.0,
            (point.z - self.center_z) * ppm + self.canvas_height / 2.0,
        )
    }

    /// Normalised device coordinates (-1..1, +Y up) of a screen position.
    pub fn screen_to_ndc(&self, screen_x: f64, screen_y: f64) -> (f64, f64) {
        (
            screen_x / self.canvas_width * 2.0 - 1.0,
            -(screen_y / self.canvas_height) * 2.0 + 1.0,
        )
    }

    /// The board-plane region currently on screen.
    pub fn visible_bounds(&self) -> BBox {
        let ppm = self.pixels_per_mm();
        let half_w = self.canvas_width / (2.0 * ppm);
        let half_h = self.canvas_height / (2.0 * ppm);
        BBox::new(
            Point2D::new(self.center_x - half_w, self.center_z - half_h),
            Point2D::new(self.center_x + half_w, self.center_z + half_h),
        )
    }
}
