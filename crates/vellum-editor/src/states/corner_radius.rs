//! CornerRadiusAdjusting: drag the inset handle of a single node.

use super::handles::render_handles;
use super::{Cx, InteractionState, StateKind, Transition};
use crate::batch::MutationBatch;
use crate::document::{CommitOptions, Document};
use crate::input::{KeyEvent, PointerEvent};
use crate::session::{Cursor, Session};
use crate::surface::OverlaySurface;
use vellum_core::{NodeId, PropKey, PropertyPatch, ResolvedBounds};

#[derive(Default)]
pub struct CornerRadiusAdjusting {
    target: Option<(NodeId, ResolvedBounds)>,
    gesture: Option<MutationBatch>,
}

impl CornerRadiusAdjusting {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Radius for a handle dragged to `(px, py)` inside `b`.
pub fn radius_at(b: &ResolvedBounds, px: f32, py: f32) -> f32 {
    let r = ((px - b.x) + (py - b.y)) / 2.0;
    r.clamp(0.0, b.width.min(b.height) / 2.0)
}

impl InteractionState for CornerRadiusAdjusting {
    fn kind(&self) -> StateKind {
        StateKind::CornerRadiusAdjusting
    }

    fn on_enter(&mut self, cx: &mut Cx) -> Transition {
        let [id] = cx.session.selection.ids() else {
            return Transition::idle();
        };
        let id = *id;
        let graph = cx.doc.graph();
        let eligible = graph.get_by_id(id).is_some_and(|n| n.kind.has_corner_radius());
        let (true, Some(bounds)) = (eligible, cx.doc.visual_bounds(id)) else {
            log::debug!("{id:?} has no corner radius");
            return Transition::idle();
        };
        let mut gesture = cx.doc.begin_update();
        gesture.snapshot_properties(graph, id, [PropKey::CornerRadius]);
        self.target = Some((id, bounds));
        self.gesture = Some(gesture);
        cx.session.set_cursor(Cursor::Pointer);
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
        let Some((id, bounds)) = self.target else {
            return Transition::Stay;
        };
        let (px, py) = ev.world();
        let mut frame = cx.doc.begin_update();
        frame.update(
            id,
            PropertyPatch::new().set(PropKey::CornerRadius, radius_at(&bounds, px, py)),
        );
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
