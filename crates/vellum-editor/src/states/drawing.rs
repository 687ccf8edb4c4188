//! Drawing: rubber-band a new shape.
//!
//! Shift draws a square, Alt draws from the centre. A click without a drag
//! creates a shape of the default size. The tool reverts to Select after
//! each shape; sticky notes go straight into text editing.

use super::moving::drop_container;
use super::{Cx, EditingText, InteractionState, StateKind, Transition, render_selection};
use crate::document::{CommitOptions, Document};
use crate::input::{KeyEvent, PointerEvent};
use crate::selection::SelectionMode;
use crate::session::{Cursor, Session};
use crate::surface::{OverlayStyle, OverlaySurface};
use crate::tools::ToolKind;
use vellum_core::{NodeId, NodeKind, PropKey, ResolvedBounds, SceneNode};

pub struct Drawing {
    kind: NodeKind,
    start: (f32, f32),
    current: Option<ResolvedBounds>,
}

impl Drawing {
    pub fn new(kind: NodeKind, start: (f32, f32)) -> Self {
        Self {
            kind,
            start,
            current: None,
        }
    }

    /// Insert the shape and return its id.
    fn create(&self, cx: &mut Cx, rect: ResolvedBounds, record: bool) -> Option<NodeId> {
        let parent = drop_container(cx.doc, self.start, &[])?;
        let (ox, oy) = cx.doc.content_origin(parent);
        let id = NodeId::with_prefix(self.kind.id_prefix());
        let node = SceneNode::new(id, self.kind)
            .with(PropKey::X, rect.x - ox)
            .with(PropKey::Y, rect.y - oy)
            .with(PropKey::Width, rect.width)
            .with(PropKey::Height, rect.height);

        let mut batch = cx.doc.begin_update();
        batch.add_node(cx.doc.graph(), node, parent, None);
        let options = if record {
            CommitOptions::record()
        } else {
            CommitOptions::transient()
        };
        cx.doc.commit_block(batch, options);
        log::debug!("drew {:?} {id:?} in {parent:?}", self.kind);
        Some(id)
    }
}

/// Rectangle spanned by a drag from `start` to `end`.
pub fn drawn_rect(start: (f32, f32), end: (f32, f32), square: bool, from_center: bool) -> ResolvedBounds {
    let (mut dx, mut dy) = (end.0 - start.0, end.1 - start.1);
    if square {
        let side = dx.abs().max(dy.abs());
        dx = side.copysign(dx);
        dy = side.copysign(dy);
    }
    if from_center {
        ResolvedBounds::from_corners((start.0 - dx, start.1 - dy), (start.0 + dx, start.1 + dy))
    } else {
        ResolvedBounds::from_corners(start, (start.0 + dx, start.1 + dy))
    }
}

impl InteractionState for Drawing {
    fn kind(&self) -> StateKind {
        StateKind::Drawing
    }

    fn on_enter(&mut self, cx: &mut Cx) -> Transition {
        cx.session.set_cursor(Cursor::Crosshair);
        Transition::Stay
    }

    fn on_exit(&mut self, cx: &mut Cx) {
        cx.session.set_cursor(cx.session.tool().cursor());
    }

    fn on_pointer_move(&mut self, cx: &mut Cx, ev: &PointerEvent) -> Transition {
        let screen = ev.screen();
        let origin = cx.session.camera.world_to_screen(self.start.0, self.start.1);
        if self.current.is_none()
            && (screen.0 - origin.0).hypot(screen.1 - origin.1) <= cx.session.config.drag_threshold
        {
            return Transition::Stay;
        }
        self.current = Some(drawn_rect(
            self.start,
            ev.world(),
            ev.modifiers.shift,
            ev.modifiers.alt,
        ));
        cx.session.request_frame();
        Transition::Stay
    }

    fn on_pointer_up(&mut self, cx: &mut Cx, _ev: &PointerEvent) -> Transition {
        let size = cx.session.config.default_shape_size;
        let rect = self
            .current
            .take()
            .unwrap_or_else(|| ResolvedBounds::new(self.start.0, self.start.1, size, size));

        let sticky = self.kind == NodeKind::StickyNote;
        let Some(id) = self.create(cx, rect, !sticky) else {
            return Transition::idle();
        };
        cx.session.selection.select(id, SelectionMode::Replace);
        cx.session.set_tool(ToolKind::Select);
        if sticky {
            Transition::to(EditingText::created(id))
        } else {
            Transition::idle()
        }
    }

    fn on_key_down(&mut self, cx: &mut Cx, ev: &KeyEvent) -> Transition {
        if ev.is("Escape") {
            return self.on_cancel(cx);
        }
        Transition::Stay
    }

    fn on_tool_change(&mut self, _cx: &mut Cx, _prev: ToolKind, _next: ToolKind) -> Transition {
        Transition::idle()
    }

    fn render(&self, doc: &Document, session: &Session, surface: &mut dyn OverlaySurface) {
        render_selection(doc, session, surface);
        if let Some(rect) = self.current {
            surface.rect(rect, OverlayStyle::Preview);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn drag_up_left_normalizes() {
        let r = drawn_rect((100.0, 100.0), (60.0, 80.0), false, false);
        assert_eq!(r, ResolvedBounds::new(60.0, 80.0, 40.0, 20.0));
    }

    #[test]
    fn shift_squares_alt_centers() {
        let r = drawn_rect((100.0, 100.0), (130.0, 110.0), true, true);
        assert_eq!(r, ResolvedBounds::new(70.0, 70.0, 60.0, 60.0));
    }
}
