//! Rotating: drag outside a selection corner.
//!
//! Angles are in degrees, clockwise (y points down), normalized to
//! `[0, 360)`. Shift snaps to `EditorConfig::rotation_snap_degrees`.

use super::handles::{render_handles, selection_bounds};
use super::{Cx, InteractionState, StateKind, Transition};
use crate::batch::MutationBatch;
use crate::commands::editable_selection;
use crate::document::{CommitOptions, Document};
use crate::input::{KeyEvent, PointerEvent};
use crate::session::{Cursor, Session};
use crate::surface::OverlaySurface;
use vellum_core::{NodeId, PropKey, PropertyPatch};

#[derive(Debug, Clone)]
struct Item {
    id: NodeId,
    rotation: f32,
    center: (f32, f32),
    size: (f32, f32),
    parent_origin: (f32, f32),
    in_layout: bool,
}

pub struct Rotating {
    start: (f32, f32),
    pivot: (f32, f32),
    gesture: Option<MutationBatch>,
    items: Vec<Item>,
}

impl Rotating {
    pub fn new(start: (f32, f32)) -> Self {
        Self {
            start,
            pivot: (0.0, 0.0),
            gesture: None,
            items: Vec::new(),
        }
    }
}

pub fn normalize_degrees(deg: f32) -> f32 {
    let d = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360
    if d >= 360.0 { 0.0 } else { d }
}

/// Rotate `p` about `pivot` by `deg` degrees.
fn orbit(p: (f32, f32), pivot: (f32, f32), deg: f32) -> (f32, f32) {
    let (sin, cos) = deg.to_radians().sin_cos();
    let (x, y) = (p.0 - pivot.0, p.1 - pivot.1);
    (pivot.0 + x * cos - y * sin, pivot.1 + x * sin + y * cos)
}

impl InteractionState for Rotating {
    fn kind(&self) -> StateKind {
        StateKind::Rotating
    }

    fn on_enter(&mut self, cx: &mut Cx) -> Transition {
        let graph = cx.doc.graph();
        let ids = editable_selection(graph, cx.session.selection.ids());
        let Some(bounds) = selection_bounds(cx.doc, &ids) else {
            log::debug!("rotate without a selection");
            return Transition::idle();
        };
        let mut gesture = cx.doc.begin_update();
        for &id in &ids {
            let (Some(idx), Some(b)) = (graph.index_of(id), cx.doc.visual_bounds(id)) else {
                continue;
            };
            gesture.snapshot_properties(graph, id, [PropKey::X, PropKey::Y, PropKey::Rotation]);
            self.items.push(Item {
                id,
                rotation: graph.resolved_number(idx, PropKey::Rotation),
                center: b.center(),
                size: (b.width, b.height),
                parent_origin: cx.doc.parent_origin(id),
                in_layout: graph.parent_id(id).is_some_and(|p| cx.doc.has_layout(p)),
            });
        }
        self.pivot = bounds.center();
        self.gesture = Some(gesture);
        cx.session.set_cursor(Cursor::Rotate);
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
        let (cx0, cy0) = self.pivot;
        let from = (self.start.1 - cy0).atan2(self.start.0 - cx0);
        let to = (py - cy0).atan2(px - cx0);
        let mut delta = (to - from).to_degrees();
        if ev.modifiers.shift {
            let step = cx.session.config.rotation_snap_degrees;
            delta = (delta / step).round() * step;
        }

        let mut frame = cx.doc.begin_update();
        for item in &self.items {
            let mut patch =
                PropertyPatch::new().set(PropKey::Rotation, normalize_degrees(item.rotation + delta));
            if !item.in_layout && self.items.len() > 1 {
                let (ncx, ncy) = orbit(item.center, self.pivot, delta);
                patch = patch
                    .set(PropKey::X, ncx - item.size.0 / 2.0 - item.parent_origin.0)
                    .set(PropKey::Y, ncy - item.size.1 / 2.0 - item.parent_origin.1);
            }
            frame.update(item.id, patch);
        }
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
