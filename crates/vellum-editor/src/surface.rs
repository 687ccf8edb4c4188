//! Overlay drawing seam.
//!
//! States describe their feedback (selection outlines, handles, marquee,
//! guides, previews) through [`OverlaySurface`]; the host rasterizes it.

use vellum_core::ResolvedBounds;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayStyle {
    Selection,
    Hover,
    Handle,
    RotateZone,
    Marquee,
    Guide,
    /// Shape being drawn, or an insertion indicator.
    Preview,
    GradientPoint,
    ActiveGradientPoint,
}

pub trait OverlaySurface {
    fn rect(&mut self, bounds: ResolvedBounds, style: OverlayStyle);
    fn line(&mut self, from: (f32, f32), to: (f32, f32), style: OverlayStyle);
    fn handle(&mut self, at: (f32, f32), style: OverlayStyle);
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayItem {
    Rect(ResolvedBounds, OverlayStyle),
    Line((f32, f32), (f32, f32), OverlayStyle),
    Handle((f32, f32), OverlayStyle),
}

/// Surface that records draw calls. Useful for tests and debugging.
#[derive(Debug, Default)]
pub struct OverlayRecorder {
    pub items: Vec<OverlayItem>,
}

impl OverlayRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, style: OverlayStyle) -> usize {
        self.items
            .iter()
            .filter(|item| match item {
                OverlayItem::Rect(_, s) | OverlayItem::Line(_, _, s) | OverlayItem::Handle(_, s) => *s == style,
            })
            .count()
    }
}

impl OverlaySurface for OverlayRecorder {
    fn rect(&mut self, bounds: ResolvedBounds, style: OverlayStyle) {
        self.items.push(OverlayItem::Rect(bounds, style));
    }

    fn line(&mut self, from: (f32, f32), to: (f32, f32), style: OverlayStyle) {
        self.items.push(OverlayItem::Line(from, to, style));
    }

    fn handle(&mut self, at: (f32, f32), style: OverlayStyle) {
        self.items.push(OverlayItem::Handle(at, style));
    }
}
