//! Moving: drag the selection, live reorder and reparent.
//!
//! The whole gesture shares one batch holding the `X`/`Y` and parent
//! snapshots of every dragged node. Each pointer move writes through its
//! own non-recording commit; pointer up commits the gesture batch with
//! undo, so one drag is one history entry.
//!
//! Drop modes per frame:
//! - **reorder**: pointer still inside the starting auto-layout container.
//!   Only the sibling order changes; the dragged nodes follow the pointer
//!   through visual offsets, `X`/`Y` are left to the layout.
//! - **deferred**: hovering another auto-layout container (or a slot). The
//!   nodes are parked at the end of the root and follow the pointer; the
//!   reparent happens on release.
//! - **immediate**: hovering a free container. Reparent now, write `X`/`Y`.

use super::handles::selection_bounds;
use super::{Cx, InteractionState, StateKind, Transition, render_selection};
use crate::batch::MutationBatch;
use crate::commands::editable_selection;
use crate::document::{CommitOptions, Document};
use crate::input::{KeyEvent, PointerEvent};
use crate::session::{Cursor, Session};
use crate::snapping::GuideAxis;
use crate::surface::{OverlayStyle, OverlaySurface};
use vellum_core::{LayoutMode, NodeId, PropKey, PropertyPatch, ResolvedBounds, layout_mode};

#[derive(Debug, Clone)]
struct DragItem {
    id: NodeId,
    /// Offset from the combined bounds' top-left at gesture start.
    offset: (f32, f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DropMode {
    None,
    Reorder,
    Deferred { container: NodeId, point: (f32, f32) },
    Immediate { container: NodeId },
}

pub struct Moving {
    start: (f32, f32),
    gesture: Option<MutationBatch>,
    items: Vec<DragItem>,
    bounds: ResolvedBounds,
    /// Parent shared by every dragged node, if any.
    start_container: Option<NodeId>,
    mode: DropMode,
}

impl Moving {
    pub fn new(start: (f32, f32)) -> Self {
        Self {
            start,
            gesture: None,
            items: Vec::new(),
            bounds: ResolvedBounds::default(),
            start_container: None,
            mode: DropMode::None,
        }
    }

    fn ids(&self) -> Vec<NodeId> {
        self.items.iter().map(|item| item.id).collect()
    }

    /// Whether the reorder-only path applies at `(px, py)`.
    fn in_start_container(&self, doc: &Document, px: f32, py: f32) -> Option<NodeId> {
        let container = self.start_container?;
        if !doc.has_layout(container) {
            return None;
        }
        doc.visual_bounds(container)?
            .contains(px, py)
            .then_some(container)
    }

    fn reorder(&mut self, cx: &mut Cx, container: NodeId, point: (f32, f32), origin: (f32, f32)) {
        let ids = self.ids();
        let graph = cx.doc.graph();
        let Some(container_idx) = graph.index_of(container) else {
            return;
        };
        let children: Vec<NodeId> = graph
            .children(container_idx)
            .iter()
            .filter_map(|&c| graph.id_of(c))
            .collect();

        let raw = cx.doc.insertion_index(container, point, &ids);
        let passed = children[..raw.min(children.len())]
            .iter()
            .filter(|id| ids.contains(id))
            .count();
        let others: Vec<NodeId> = children.iter().copied().filter(|id| !ids.contains(id)).collect();
        let at = (raw - passed).min(others.len());

        let mut order = others[..at].to_vec();
        order.extend(ids.iter().copied());
        order.extend_from_slice(&others[at..]);

        let mut frame = cx.doc.begin_update();
        if order != children {
            log::trace!("reorder in {container:?} at {at}");
            frame.arrange_children(graph, container, &order, &ids);
        }
        if matches!(self.mode, DropMode::Deferred { .. } | DropMode::Immediate { .. })
            && let Some(gesture) = &self.gesture
        {
            // Back from a free or parked position: X/Y belong to the layout again
            for &id in &ids {
                frame.update(id, snapshot_position(gesture, id));
            }
        }
        cx.doc
            .commit_block(frame, CommitOptions::transient().ignoring(ids.iter().copied()));
        self.mode = DropMode::Reorder;

        for item in &self.items {
            cx.doc
                .set_visual_position(item.id, (origin.0 + item.offset.0, origin.1 + item.offset.1));
        }
    }

    /// Reparent into (or park for) the container under the pointer.
    fn relocate(&mut self, cx: &mut Cx, point: (f32, f32), origin: (f32, f32)) {
        let ids = self.ids();
        let Some(container) = drop_container(cx.doc, point, &ids) else {
            return;
        };
        let graph = cx.doc.graph();
        let accepts_later = cx.doc.has_layout(container)
            || graph
                .get_by_id(container)
                .is_some_and(|n| n.props.flag(PropKey::Slot));

        let (host, mode) = if accepts_later {
            (graph.root_id(), DropMode::Deferred { container, point })
        } else {
            (container, DropMode::Immediate { container })
        };
        let (hx, hy) = cx.doc.content_origin(host);

        let mut frame = cx.doc.begin_update();
        for item in &self.items {
            if graph.parent_id(item.id) != Some(host) {
                frame.change_parent(graph, item.id, host, None);
            }
            let x = origin.0 + item.offset.0 - hx;
            let y = origin.1 + item.offset.1 - hy;
            frame.update(item.id, PropertyPatch::new().set(PropKey::X, x).set(PropKey::Y, y));
        }
        for &id in &ids {
            cx.doc.set_visual_offset(id, (0.0, 0.0));
        }
        cx.doc
            .commit_block(frame, CommitOptions::transient().ignoring(ids.iter().copied()));
        self.mode = mode;
    }

    /// Apply a deferred drop: insert the parked nodes into `container`.
    fn finish_deferred(&mut self, cx: &mut Cx, container: NodeId, point: (f32, f32)) {
        let mut ids = self.ids();
        let axis = cx
            .doc
            .graph()
            .index_of(container)
            .map_or(LayoutMode::Free, |idx| layout_mode(cx.doc.graph(), idx));
        let key = |id: &NodeId| {
            let b = cx.doc.visual_bounds(*id).unwrap_or_default();
            match axis {
                LayoutMode::Row { .. } => (b.x, b.y),
                LayoutMode::Column { .. } => (b.y, b.x),
                LayoutMode::Grid { .. } | LayoutMode::Free => (b.y, b.x),
            }
        };
        ids.sort_by(|a, b| key(a).partial_cmp(&key(b)).unwrap_or(std::cmp::Ordering::Equal));

        let graph = cx.doc.graph();
        let Some(container_idx) = graph.index_of(container) else {
            return;
        };
        let raw = cx.doc.insertion_index(container, point, &ids);
        let passed = graph.children(container_idx)[..raw.min(graph.children(container_idx).len())]
            .iter()
            .filter_map(|&c| graph.id_of(c))
            .filter(|id| ids.contains(id))
            .count();
        let at = raw - passed;

        let on_screen: Vec<(NodeId, (f32, f32))> = ids
            .iter()
            .filter_map(|&id| cx.doc.visual_bounds(id).map(|b| (id, (b.x, b.y))))
            .collect();

        let mut landing = cx.doc.begin_update();
        for (i, &id) in ids.iter().enumerate() {
            landing.change_parent(graph, id, container, Some(at + i));
            if let Some(gesture) = &self.gesture {
                landing.update(id, snapshot_position(gesture, id));
            }
        }
        log::debug!("dropped {} node(s) into {container:?} at {at}", ids.len());
        cx.doc
            .commit_block(landing, CommitOptions::transient().ignoring(ids.iter().copied()));

        // Slide from where they were released
        for (id, position) in on_screen {
            cx.doc.set_visual_position(id, position);
        }
        cx.doc.settle(&ids);
    }
}

/// Snapshotted `X`/`Y` of `id` as a patch restoring them.
fn snapshot_position(gesture: &MutationBatch, id: NodeId) -> PropertyPatch {
    let mut patch = PropertyPatch::new();
    for key in [PropKey::X, PropKey::Y] {
        if let Some(value) = gesture.snapshot_value(id, key) {
            patch.insert(key, value.clone());
        }
    }
    patch
}

/// Nearest container at `point`, walking up from the hit node, that may
/// take new children.
pub(super) fn drop_container(doc: &Document, point: (f32, f32), dragged: &[NodeId]) -> Option<NodeId> {
    let graph = doc.graph();
    let hit = doc.hit_test(point.0, point.1, dragged).unwrap_or(graph.root_id());
    let mut idx = graph.index_of(hit)?;
    loop {
        if let Some(node) = graph.node(idx) {
            let slot = node.props.flag(PropKey::Slot);
            let accepts = node.kind.is_container()
                && !node.is_structure_locked()
                && (slot || !graph.is_locked_child(idx))
                && !dragged.contains(&node.id);
            if accepts {
                return Some(node.id);
            }
        }
        idx = graph.parent(idx)?;
    }
}

impl InteractionState for Moving {
    fn kind(&self) -> StateKind {
        StateKind::Moving
    }

    fn on_enter(&mut self, cx: &mut Cx) -> Transition {
        cx.doc.relayout();
        let graph = cx.doc.graph();
        let ids = editable_selection(graph, cx.session.selection.ids());
        let Some(bounds) = selection_bounds(cx.doc, &ids) else {
            return Transition::idle();
        };

        let mut keyed: Vec<((usize, usize), DragItem)> = Vec::new();
        let mut gesture = cx.doc.begin_update();
        for &id in &ids {
            let (Some(idx), Some(vb)) = (graph.index_of(id), cx.doc.visual_bounds(id)) else {
                continue;
            };
            let parent = graph.parent(idx).map_or(0, |p| p.index());
            let index = graph.child_index(idx).unwrap_or(0);
            gesture.snapshot_properties(graph, id, [PropKey::X, PropKey::Y]);
            gesture.snapshot_parent(graph, id);
            keyed.push((
                (parent, index),
                DragItem {
                    id,
                    offset: (vb.x - bounds.x, vb.y - bounds.y),
                },
            ));
        }
        keyed.sort_by_key(|(key, _)| *key);
        self.items = keyed.into_iter().map(|(_, item)| item).collect();

        let parents: Vec<Option<NodeId>> = ids.iter().map(|&id| graph.parent_id(id)).collect();
        self.start_container = match parents.split_first() {
            Some((first, rest)) if rest.iter().all(|p| p == first) => *first,
            _ => None,
        };
        self.bounds = bounds;
        self.gesture = Some(gesture);

        cx.doc.stop_animation(&ids);
        cx.session.snapper.reset();
        cx.session.set_cursor(Cursor::Move);
        log::debug!("move gesture on {} node(s)", self.items.len());
        Transition::Stay
    }

    fn on_exit(&mut self, cx: &mut Cx) {
        if let Some(gesture) = self.gesture.take() {
            // Cancelled: put everything back without a history entry
            let restore = gesture.restore_batch(cx.doc.graph());
            let ids = self.ids();
            cx.doc
                .commit_block(restore, CommitOptions::transient().ignoring(ids.iter().copied()));
            for id in ids {
                cx.doc.set_visual_offset(id, (0.0, 0.0));
            }
            log::debug!("move gesture cancelled");
        }
        cx.session.snapper.reset();
        cx.session.set_cursor(cx.session.tool().cursor());
    }

    fn on_pointer_move(&mut self, cx: &mut Cx, ev: &PointerEvent) -> Transition {
        if self.gesture.is_none() {
            return Transition::Stay;
        }
        cx.doc.relayout();
        let (px, py) = ev.world();
        let (dx, dy) = (px - self.start.0, py - self.start.1);

        let ids = self.ids();
        let enabled = cx.session.config.snapping && !ev.modifiers.command();
        let moved = self.bounds.translate(dx, dy);
        let (sx, sy) = cx.session.snapper.snap_bounds(
            cx.doc.graph(),
            cx.doc.layout(),
            moved,
            &ids,
            enabled,
        );
        let origin = (moved.x + sx, moved.y + sy);

        match self.in_start_container(cx.doc, px, py) {
            Some(container) => self.reorder(cx, container, (px, py), origin),
            None => self.relocate(cx, (px, py), origin),
        }
        cx.session.request_frame();
        Transition::Stay
    }

    fn on_pointer_up(&mut self, cx: &mut Cx, _ev: &PointerEvent) -> Transition {
        match self.mode {
            DropMode::Deferred { container, point } => self.finish_deferred(cx, container, point),
            DropMode::Reorder => cx.doc.settle(&self.ids()),
            DropMode::Immediate { .. } | DropMode::None => {}
        }
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
        render_selection(doc, session, surface);
        if let DropMode::Deferred { container, .. } | DropMode::Immediate { container } = self.mode
            && container != doc.graph().root_id()
            && let Some(bounds) = doc.visual_bounds(container)
        {
            surface.rect(bounds, OverlayStyle::Preview);
        }
        for guide in session.snapper.guides() {
            let (from, to) = match guide.axis {
                GuideAxis::Vertical => ((guide.position, guide.from), (guide.position, guide.to)),
                GuideAxis::Horizontal => ((guide.from, guide.position), (guide.to, guide.position)),
            };
            surface.line(from, to, OverlayStyle::Guide);
        }
    }
}
