//! TextTool: click to place a text node, then hand off to editing.

use super::moving::drop_container;
use super::{Cx, EditingText, InteractionState, StateKind, Transition};
use crate::document::CommitOptions;
use crate::input::{PointerButton, PointerEvent};
use crate::selection::SelectionMode;
use crate::session::Cursor;
use crate::tools::ToolKind;
use vellum_core::{NodeId, NodeKind, PropKey, SceneNode};

/// Narrowest text box a drag can create.
const MIN_TEXT_WIDTH: f32 = 8.0;

#[derive(Default)]
pub struct TextTool {
    press: Option<(f32, f32)>,
}

impl TextTool {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InteractionState for TextTool {
    fn kind(&self) -> StateKind {
        StateKind::TextTool
    }

    fn on_enter(&mut self, cx: &mut Cx) -> Transition {
        cx.session.set_cursor(Cursor::Text);
        Transition::Stay
    }

    fn on_exit(&mut self, cx: &mut Cx) {
        cx.session.set_cursor(cx.session.tool().cursor());
    }

    fn on_pointer_down(&mut self, _cx: &mut Cx, ev: &PointerEvent) -> Transition {
        if ev.button == PointerButton::Primary {
            self.press = Some(ev.world());
        }
        Transition::Stay
    }

    fn on_pointer_up(&mut self, cx: &mut Cx, ev: &PointerEvent) -> Transition {
        let Some(start) = self.press.take() else {
            return Transition::Stay;
        };
        let Some(parent) = drop_container(cx.doc, start, &[]) else {
            return Transition::Stay;
        };
        let (ox, oy) = cx.doc.content_origin(parent);
        let id = NodeId::with_prefix(NodeKind::Text.id_prefix());
        let mut node = SceneNode::new(id, NodeKind::Text)
            .with(PropKey::X, start.0 - ox)
            .with(PropKey::Y, start.1 - oy);
        let width = (ev.world().0 - start.0).abs();
        if width >= MIN_TEXT_WIDTH.max(cx.session.config.drag_threshold) {
            node = node
                .with(PropKey::X, start.0.min(ev.world().0) - ox)
                .with(PropKey::Width, width);
        }

        // The text edit that follows records the creation
        let mut batch = cx.doc.begin_update();
        batch.add_node(cx.doc.graph(), node, parent, None);
        cx.doc.commit_block(batch, CommitOptions::transient());

        cx.session.selection.select(id, SelectionMode::Replace);
        cx.session.set_tool(ToolKind::Select);
        Transition::to(EditingText::created(id))
    }

    fn on_cancel(&mut self, cx: &mut Cx) -> Transition {
        // Idle would bounce straight back here while the text tool is active
        cx.session.set_tool(ToolKind::Select);
        Transition::idle()
    }

    fn on_tool_change(&mut self, _cx: &mut Cx, _prev: ToolKind, next: ToolKind) -> Transition {
        if next == ToolKind::Text {
            Transition::Stay
        } else {
            Transition::idle()
        }
    }
}
