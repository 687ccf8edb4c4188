//! Resizing: drag a selection handle.
//!
//! Shift keeps the aspect ratio, Alt resizes about the centre. With several
//! nodes selected each one is scaled within the combined box.

use super::handles::{ResizeHandle, render_handles, selection_bounds};
use super::{Cx, InteractionState, StateKind, Transition};
use crate::batch::MutationBatch;
use crate::commands::editable_selection;
use crate::document::{CommitOptions, Document};
use crate::input::{KeyEvent, PointerEvent};
use crate::session::Session;
use crate::surface::OverlaySurface;
use vellum_core::{NodeId, PropKey, PropertyPatch, ResolvedBounds};

const MIN_SIZE: f32 = 1.0;

#[derive(Debug, Clone)]
struct Item {
    id: NodeId,
    bounds: ResolvedBounds,
    parent_origin: (f32, f32),
    /// Parent positions the node itself; only the size is written.
    in_layout: bool,
}

pub struct Resizing {
    handle: ResizeHandle,
    start: (f32, f32),
    gesture: Option<MutationBatch>,
    bounds: ResolvedBounds,
    items: Vec<Item>,
}

impl Resizing {
    pub fn new(handle: ResizeHandle, start: (f32, f32)) -> Self {
        Self {
            handle,
            start,
            gesture: None,
            bounds: ResolvedBounds::default(),
            items: Vec::new(),
        }
    }
}

/// New box for the selection after dragging `handle` by `(dx, dy)`.
pub fn resized_bounds(
    b: &ResolvedBounds,
    handle: ResizeHandle,
    (dx, dy): (f32, f32),
    keep_aspect: bool,
    from_center: bool,
) -> ResolvedBounds {
    let (sx, sy) = handle.signs();
    let grow = if from_center { 2.0 } else { 1.0 };
    let mut w = b.width + sx * dx * grow;
    let mut h = b.height + sy * dy * grow;

    if keep_aspect && b.width > 0.0 && b.height > 0.0 {
        let (fx, fy) = (w / b.width, h / b.height);
        let scale = match (sx == 0.0, sy == 0.0) {
            (true, _) => fy,
            (_, true) => fx,
            _ => fx.max(fy),
        };
        w = b.width * scale;
        h = b.height * scale;
    }
    w = w.max(MIN_SIZE);
    h = h.max(MIN_SIZE);

    let (cx, cy) = b.center();
    let place = |sign: f32, start: f32, end: f32, center: f32, size: f32, follows: bool| {
        if from_center || (sign == 0.0 && follows) {
            center - size / 2.0
        } else if sign < 0.0 {
            end - size
        } else {
            start
        }
    };
    let x = place(sx, b.x, b.right(), cx, w, keep_aspect);
    let y = place(sy, b.y, b.bottom(), cy, h, keep_aspect);
    ResolvedBounds::new(x, y, w, h)
}

impl InteractionState for Resizing {
    fn kind(&self) -> StateKind {
        StateKind::Resizing
    }

    fn on_enter(&mut self, cx: &mut Cx) -> Transition {
        let graph = cx.doc.graph();
        let ids = editable_selection(graph, cx.session.selection.ids());
        let Some(bounds) = selection_bounds(cx.doc, &ids) else {
            return Transition::idle();
        };
        let mut gesture = cx.doc.begin_update();
        for &id in &ids {
            let Some(b) = cx.doc.visual_bounds(id) else {
                continue;
            };
            gesture.snapshot_properties(
                graph,
                id,
                [PropKey::X, PropKey::Y, PropKey::Width, PropKey::Height],
            );
            self.items.push(Item {
                id,
                bounds: b,
                parent_origin: cx.doc.parent_origin(id),
                in_layout: graph.parent_id(id).is_some_and(|p| cx.doc.has_layout(p)),
            });
        }
        self.bounds = bounds;
        self.gesture = Some(gesture);
        cx.session.set_cursor(self.handle.cursor());
        Transition::Stay
    }

    fn on_exit(&mut self, cx: &mut Cx) {
        if let Some(gesture) = self.gesture.take() {
            let restore = gesture.restore_batch(cx.doc.graph());
            cx.doc.commit_block(restore, CommitOptions::transient());
        }
        cx.session.set_cursor(cx.session.tool().cursor());
    }

    fn on_pointer_move(&mut self, cx: &mut Cx, ev: &PointerEvent) -> Transition {
        if self.gesture.is_none() {
            return Transition::Stay;
        }
        let (px, py) = ev.world();
        let b = &self.bounds;
        let next = resized_bounds(
            b,
            self.handle,
            (px - self.start.0, py - self.start.1),
            ev.modifiers.shift,
            ev.modifiers.alt,
        );
        let (fx, fy) = (
            next.width / b.width.max(f32::EPSILON),
            next.height / b.height.max(f32::EPSILON),
        );

        let mut frame = cx.doc.begin_update();
        for item in &self.items {
            let ib = &item.bounds;
            let mut patch = PropertyPatch::new()
                .set(PropKey::Width, (ib.width * fx).max(MIN_SIZE))
                .set(PropKey::Height, (ib.height * fy).max(MIN_SIZE));
            if !item.in_layout {
                patch = patch
                    .set(PropKey::X, next.x + (ib.x - b.x) * fx - item.parent_origin.0)
                    .set(PropKey::Y, next.y + (ib.y - b.y) * fy - item.parent_origin.1);
            }
            frame.update(item.id, patch);
        }
        log::trace!("resize to {}x{}", next.width, next.height);
        cx.doc.commit_block(frame, CommitOptions::transient());
        cx.session.request_frame();
        Transition::Stay
    }

    fn on_pointer_up(&mut self, cx: &mut Cx, _ev: &PointerEvent) -> Transition {
        if let Some(gesture) = self.gesture.take() {
            cx.doc.commit_block(gesture, CommitOptions::record());
        }
        Transition::idle()
    }

    fn on_key_down(&mut self, cx: &mut Cx, ev: &KeyEvent) -> Transition {
        if ev.is("Escape") {
            return self.on_cancel(cx);
        }
        Transition::Stay
    }

    fn render(&self, doc: &Document, session: &Session, surface: &mut dyn OverlaySurface) {
        render_handles(doc, session, surface);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn corner_drag_moves_opposite_edges_only() {
        let b = ResolvedBounds::new(100.0, 100.0, 100.0, 50.0);
        let r = resized_bounds(&b, ResizeHandle::TopLeft, (-10.0, -20.0), false, false);
        assert_eq!(r, ResolvedBounds::new(90.0, 80.0, 110.0, 70.0));
    }

    #[test]
    fn shift_keeps_aspect_ratio() {
        let b = ResolvedBounds::new(0.0, 0.0, 100.0, 50.0);
        let r = resized_bounds(&b, ResizeHandle::BottomRight, (100.0, 0.0), true, false);
        assert_eq!(r, ResolvedBounds::new(0.0, 0.0, 200.0, 100.0));
    }

    #[test]
    fn alt_resizes_about_center() {
        let b = ResolvedBounds::new(0.0, 0.0, 100.0, 100.0);
        let r = resized_bounds(&b, ResizeHandle::Right, (10.0, 0.0), false, true);
        assert_eq!(r, ResolvedBounds::new(-10.0, 0.0, 120.0, 100.0));
    }

    #[test]
    fn size_never_collapses() {
        let b = ResolvedBounds::new(0.0, 0.0, 10.0, 10.0);
        let r = resized_bounds(&b, ResizeHandle::Right, (-50.0, 0.0), false, false);
        assert_eq!(r.width, MIN_SIZE);
        assert_eq!(r.x, 0.0);
    }
}
