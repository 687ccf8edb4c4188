//! Pan/zoom camera: screen ↔ world conversion.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Screen position of the world origin.
    pub pan_x: f32,
    pub pan_y: f32,
    pub zoom: f32,
    min_zoom: f32,
    max_zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(0.05, 64.0)
    }
}

impl Camera {
    pub fn new(min_zoom: f32, max_zoom: f32) -> Self {
        Self {
            pan_x: 0.0,
            pan_y: 0.0,
            zoom: 1.0,
            min_zoom,
            max_zoom,
        }
    }

    pub fn screen_to_world(&self, sx: f32, sy: f32) -> (f32, f32) {
        ((sx - self.pan_x) / self.zoom, (sy - self.pan_y) / self.zoom)
    }

    pub fn world_to_screen(&self, wx: f32, wy: f32) -> (f32, f32) {
        (wx * self.zoom + self.pan_x, wy * self.zoom + self.pan_y)
    }

    /// Convert a screen-pixel length to world units.
    pub fn screen_len(&self, len: f32) -> f32 {
        len / self.zoom
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Zoom by `factor`, keeping the world point under `(sx, sy)` fixed.
    pub fn zoom_at(&mut self, factor: f32, sx: f32, sy: f32) {
        let (wx, wy) = self.screen_to_world(sx, sy);
        self.zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        self.pan_x = sx - wx * self.zoom;
        self.pan_y = sy - wy * self.zoom;
    }
}
