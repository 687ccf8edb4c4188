//! GradientPointEditing: drag the control points of a mesh fill.
//!
//! Entered from the fill editor, not from a pointer gesture. Each point
//! drag is one undo step; clicking away from every point returns to idle.

use super::{Cx, InteractionState, StateKind, Transition};
use crate::batch::MutationBatch;
use crate::document::{CommitOptions, Document};
use crate::input::{KeyEvent, PointerEvent};
use crate::session::{Cursor, Session};
use crate::surface::{OverlayStyle, OverlaySurface};
use vellum_core::{MeshGradient, NodeId, Paint, PropKey, PropertyPatch, ResolvedBounds};

pub struct GradientPointEditing {
    node: NodeId,
    mesh: MeshGradient,
    active: Option<usize>,
    gesture: Option<MutationBatch>,
}

impl GradientPointEditing {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            mesh: MeshGradient {
                columns: 0,
                rows: 0,
                points: Vec::new(),
            },
            active: None,
            gesture: None,
        }
    }

    fn point_at(&self, b: &ResolvedBounds, i: usize) -> Option<(f32, f32)> {
        let p = self.mesh.points.get(i)?;
        Some((b.x + p.x * b.width, b.y + p.y * b.height))
    }
}

/// Mesh fill of `node`, if it has one.
fn mesh_fill(doc: &Document, node: NodeId) -> Option<MeshGradient> {
    let graph = doc.graph();
    let idx = graph.index_of(node)?;
    match graph.resolved(idx)?.get(PropKey::Fill)?.as_paint()? {
        Paint::Mesh(mesh) => Some(mesh.clone()),
        _ => None,
    }
}

impl InteractionState for GradientPointEditing {
    fn kind(&self) -> StateKind {
        StateKind::GradientPointEditing
    }

    fn on_enter(&mut self, cx: &mut Cx) -> Transition {
        cx.doc.relayout();
        let Some(mesh) = mesh_fill(cx.doc, self.node) else {
            log::debug!("{:?} has no mesh fill", self.node);
            return Transition::idle();
        };
        self.mesh = mesh;
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

    fn on_pointer_down(&mut self, cx: &mut Cx, ev: &PointerEvent) -> Transition {
        let Some(b) = cx.doc.visual_bounds(self.node) else {
            return Transition::idle();
        };
        let (px, py) = ev.world();
        let reach = cx.session.world_len(cx.session.config.handle_size);
        let hit = (0..self.mesh.points.len()).find(|&i| {
            self.point_at(&b, i)
                .is_some_and(|(x, y)| (px - x).hypot(py - y) <= reach)
        });
        let Some(i) = hit else {
            return Transition::idle();
        };

        let mut gesture = cx.doc.begin_update();
        gesture.snapshot_properties(cx.doc.graph(), self.node, [PropKey::Fill]);
        self.gesture = Some(gesture);
        self.active = Some(i);
        cx.session.request_frame();
        Transition::Stay
    }

    fn on_pointer_move(&mut self, cx: &mut Cx, ev: &PointerEvent) -> Transition {
        let Some(i) = self.active else {
            return Transition::Stay;
        };
        let Some(b) = cx.doc.visual_bounds(self.node) else {
            return Transition::Stay;
        };
        let (px, py) = ev.world();
        if let Some(point) = self.mesh.points.get_mut(i) {
            point.x = ((px - b.x) / b.width.max(f32::EPSILON)).clamp(0.0, 1.0);
            point.y = ((py - b.y) / b.height.max(f32::EPSILON)).clamp(0.0, 1.0);
        }
        let mut frame = cx.doc.begin_update();
        frame.update(
            self.node,
            PropertyPatch::new().set(PropKey::Fill, Paint::Mesh(self.mesh.clone())),
        );
        cx.doc.commit_block(frame, CommitOptions::transient().without_animation());
        cx.session.request_frame();
        Transition::Stay
    }

    fn on_pointer_up(&mut self, cx: &mut Cx, _ev: &PointerEvent) -> Transition {
        self.active = None;
        if let Some(gesture) = self.gesture.take() {
            cx.doc.commit_block(gesture, CommitOptions::record());
        }
        Transition::Stay
    }

    fn on_key_down(&mut self, cx: &mut Cx, ev: &KeyEvent) -> Transition {
        if ev.is("Escape") {
            return self.on_cancel(cx);
        }
        Transition::Stay
    }

    fn render(&self, doc: &Document, _session: &Session, surface: &mut dyn OverlaySurface) {
        let Some(b) = doc.visual_bounds(self.node) else {
            return;
        };
        surface.rect(b, OverlayStyle::Selection);
        for i in 0..self.mesh.points.len() {
            let style = if self.active == Some(i) {
                OverlayStyle::ActiveGradientPoint
            } else {
                OverlayStyle::GradientPoint
            };
            if let Some(at) = self.point_at(&b, i) {
                surface.handle(at, style);
            }
        }
    }
}
