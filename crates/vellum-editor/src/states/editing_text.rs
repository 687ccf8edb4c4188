//! EditingText: the host's text input owns the keyboard.
//!
//! On exit the edited text is written back as one undo step. A node that
//! was created for this edit (text tool, sticky note) is adopted by that
//! step, or deleted again when it was left empty.

use super::{Cx, InteractionState, StateKind, Transition, render_selection};
use crate::document::{CommitOptions, Document};
use crate::input::{KeyEvent, PointerEvent};
use crate::session::{Cursor, Session};
use crate::surface::OverlaySurface;
use vellum_core::{NodeId, PropKey, PropertyPatch};

pub struct EditingText {
    node: NodeId,
    /// Created by a non-recording commit just before editing began.
    created: bool,
    original: String,
    active: bool,
}

impl EditingText {
    /// Edit the text of an existing node.
    pub fn existing(node: NodeId) -> Self {
        Self {
            node,
            created: false,
            original: String::new(),
            active: false,
        }
    }

    /// Edit a node that was just created without a history entry.
    pub fn created(node: NodeId) -> Self {
        Self {
            created: true,
            ..Self::existing(node)
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl InteractionState for EditingText {
    fn kind(&self) -> StateKind {
        StateKind::EditingText
    }

    fn on_enter(&mut self, cx: &mut Cx) -> Transition {
        cx.doc.relayout();
        let graph = cx.doc.graph();
        let Some(idx) = graph.index_of(self.node) else {
            return Transition::idle();
        };
        let is_text = graph.node(idx).is_some_and(|n| n.kind.has_text());
        if !is_text {
            log::debug!("{:?} has no text to edit", self.node);
            return Transition::idle();
        }
        self.original = graph
            .resolved(idx)
            .and_then(|p| p.get(PropKey::Text))
            .and_then(|v| v.as_text())
            .unwrap_or_default()
            .to_string();
        cx.session.text_host.begin(self.node, &self.original);
        cx.session.set_cursor(Cursor::Text);
        self.active = true;
        Transition::Stay
    }

    fn on_exit(&mut self, cx: &mut Cx) {
        if !std::mem::take(&mut self.active) {
            return;
        }
        let text = cx.session.text_host.end().unwrap_or_else(|| self.original.clone());
        let node = self.node;
        let mut batch = cx.doc.begin_update();

        if self.created && text.is_empty() {
            batch.delete_node(cx.doc.graph(), node);
            cx.session.selection.clear();
            cx.doc.commit_block(batch, CommitOptions::transient());
            log::debug!("discarded empty text node {node:?}");
        } else if self.created {
            batch.record_creation(node);
            batch.update(node, PropertyPatch::new().set(PropKey::Text, text));
            cx.doc.commit_block(batch, CommitOptions::record());
        } else if text != self.original {
            batch.update_with_snapshot(
                cx.doc.graph(),
                node,
                PropertyPatch::new().set(PropKey::Text, text),
            );
            cx.doc.commit_block(batch, CommitOptions::record());
        }
        cx.session.set_cursor(cx.session.tool().cursor());
    }

    fn on_pointer_down(&mut self, cx: &mut Cx, ev: &PointerEvent) -> Transition {
        let (x, y) = ev.world();
        let inside = cx
            .doc
            .visual_bounds(self.node)
            .is_some_and(|b| b.contains(x, y));
        if inside {
            Transition::Stay
        } else {
            Transition::idle()
        }
    }

    fn on_key_down(&mut self, _cx: &mut Cx, ev: &KeyEvent) -> Transition {
        if ev.is("Escape") {
            return Transition::idle();
        }
        Transition::Stay
    }

    fn render(&self, doc: &Document, session: &Session, surface: &mut dyn OverlaySurface) {
        render_selection(doc, session, surface);
    }
}
