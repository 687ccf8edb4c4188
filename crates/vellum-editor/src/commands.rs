//! Editing commands on the current selection.
//!
//! Each command builds one batch and commits it as one undo step.

use crate::batch::MutationBatch;
use crate::document::{CommitOptions, Document};
use crate::selection::SelectionMode;
use crate::session::Session;
use crate::shortcuts::ShortcutAction;
use vellum_core::{NodeId, NodeIndex, PropKey, PropertyPatch, SceneGraph};

/// Offset applied to duplicated nodes.
const DUPLICATE_OFFSET: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZOrder {
    Backward,
    Forward,
    ToBack,
    ToFront,
}

/// Selected nodes that may be edited as a unit: existing, not the root,
/// not inside a locked instance, and without a selected ancestor.
pub fn editable_selection(graph: &SceneGraph, selected: &[NodeId]) -> Vec<NodeId> {
    selected
        .iter()
        .copied()
        .filter(|&id| {
            let Some(idx) = graph.index_of(id) else {
                return false;
            };
            idx != graph.root
                && !graph.is_locked_child(idx)
                && !selected
                    .iter()
                    .any(|&other| other != id && graph.is_ancestor_of(other, id))
        })
        .collect()
}

/// Run a selection command. Returns `true` when the document changed.
/// Tool, undo and redo shortcuts are not handled here.
pub fn run_shortcut(doc: &mut Document, session: &mut Session, action: ShortcutAction) -> bool {
    match action {
        ShortcutAction::Delete => delete_selection(doc, session),
        ShortcutAction::Duplicate => duplicate_selection(doc, session),
        ShortcutAction::SelectAll => {
            select_all(doc, session);
            false
        }
        ShortcutAction::Deselect => {
            session.selection.clear();
            false
        }
        ShortcutAction::Nudge { dx, dy, large } => {
            let step = if large {
                session.config.nudge_large
            } else {
                session.config.nudge_small
            };
            nudge_selection(doc, session, dx * step, dy * step)
        }
        ShortcutAction::SendBackward => reorder_selection(doc, session, ZOrder::Backward),
        ShortcutAction::BringForward => reorder_selection(doc, session, ZOrder::Forward),
        ShortcutAction::SendToBack => reorder_selection(doc, session, ZOrder::ToBack),
        ShortcutAction::BringToFront => reorder_selection(doc, session, ZOrder::ToFront),
        ShortcutAction::Tool(_) | ShortcutAction::Undo | ShortcutAction::Redo => false,
    }
}

pub fn select_all(doc: &Document, session: &mut Session) {
    let graph = doc.graph();
    let ids: Vec<NodeId> = graph
        .children(graph.root)
        .iter()
        .filter_map(|&c| graph.id_of(c))
        .collect();
    session.selection.select_many(ids, SelectionMode::Replace);
}

pub fn delete_selection(doc: &mut Document, session: &mut Session) -> bool {
    let targets = editable_selection(doc.graph(), session.selection.ids());
    if targets.is_empty() {
        return false;
    }
    let mut batch = doc.begin_update();
    for &id in &targets {
        batch.delete_node(doc.graph(), id);
    }
    session.selection.clear();
    doc.commit_block(batch, CommitOptions::record())
}

/// Copy each selected subtree next to its original, shifted down-right,
/// and select the copies.
pub fn duplicate_selection(doc: &mut Document, session: &mut Session) -> bool {
    let targets = editable_selection(doc.graph(), session.selection.ids());
    let mut batch = doc.begin_update();
    let mut copies = Vec::with_capacity(targets.len());

    for &id in &targets {
        let graph = doc.graph();
        let (Some(idx), Some(parent)) = (graph.index_of(id), graph.parent_id(id)) else {
            continue;
        };
        let index = graph.child_index(idx).map(|i| i + 1);
        let copy = copy_subtree(graph, idx, parent, index, &mut batch);
        let shift = |key: PropKey| {
            graph
                .node(idx)
                .and_then(|n| n.props.number(key))
                .unwrap_or(0.0)
                + DUPLICATE_OFFSET
        };
        batch.update(
            copy,
            PropertyPatch::new()
                .set(PropKey::X, shift(PropKey::X))
                .set(PropKey::Y, shift(PropKey::Y)),
        );
        copies.push(copy);
    }
    if copies.is_empty() {
        return false;
    }
    log::debug!("duplicated {} node(s)", copies.len());
    session.selection.select_many(copies, SelectionMode::Replace);
    doc.commit_block(batch, CommitOptions::record())
}

/// Queue a fresh-id copy of `idx` and its descendants. Returns the copy's id.
fn copy_subtree(
    graph: &SceneGraph,
    idx: NodeIndex,
    parent: NodeId,
    index: Option<usize>,
    batch: &mut MutationBatch,
) -> NodeId {
    let Some(original) = graph.node(idx) else {
        return parent;
    };
    let id = NodeId::with_prefix(original.kind.id_prefix());
    let mut copy = original.detached_copy();
    copy.id = id;
    batch.add_node(graph, copy, parent, index);
    for &child in graph.children(idx) {
        copy_subtree(graph, child, id, None, batch);
    }
    id
}

/// Shift free-positioned selected nodes. Nodes inside auto-layout are skipped.
pub fn nudge_selection(doc: &mut Document, session: &Session, dx: f32, dy: f32) -> bool {
    let targets = editable_selection(doc.graph(), session.selection.ids());
    let mut batch = doc.begin_update();
    for id in targets {
        if doc.graph().parent_id(id).is_some_and(|p| doc.has_layout(p)) {
            continue;
        }
        let Some(node) = doc.graph().get_by_id(id) else {
            continue;
        };
        let x = node.props.number(PropKey::X).unwrap_or(0.0);
        let y = node.props.number(PropKey::Y).unwrap_or(0.0);
        batch.update(
            id,
            PropertyPatch::new().set(PropKey::X, x + dx).set(PropKey::Y, y + dy),
        );
    }
    doc.commit_block(batch, CommitOptions::record())
}

/// Change the stacking order of the selection within each parent.
pub fn reorder_selection(doc: &mut Document, session: &Session, order: ZOrder) -> bool {
    let targets = editable_selection(doc.graph(), session.selection.ids());
    let graph = doc.graph();

    let mut parents: Vec<NodeId> = Vec::new();
    for &id in &targets {
        if let Some(p) = graph.parent_id(id)
            && !parents.contains(&p)
        {
            parents.push(p);
        }
    }

    let mut batch = doc.begin_update();
    for parent in parents {
        let Some(parent_idx) = graph.index_of(parent) else {
            continue;
        };
        let current: Vec<NodeId> = graph
            .children(parent_idx)
            .iter()
            .filter_map(|&c| graph.id_of(c))
            .collect();
        let target = restack(&current, &targets, order);
        if target != current {
            let moving: Vec<NodeId> = current.iter().copied().filter(|id| targets.contains(id)).collect();
            batch.arrange_children(graph, parent, &target, &moving);
        }
    }
    doc.commit_block(batch, CommitOptions::record())
}

/// New child order after applying `order` to the `selected` members.
fn restack(current: &[NodeId], selected: &[NodeId], order: ZOrder) -> Vec<NodeId> {
    let is_selected = |id: &NodeId| selected.contains(id);
    let mut out = current.to_vec();
    match order {
        ZOrder::ToFront => {
            out.sort_by_key(|id| is_selected(id));
        }
        ZOrder::ToBack => {
            out.sort_by_key(|id| !is_selected(id));
        }
        ZOrder::Forward => {
            for i in (0..out.len().saturating_sub(1)).rev() {
                if is_selected(&out[i]) && !is_selected(&out[i + 1]) {
                    out.swap(i, i + 1);
                }
            }
        }
        ZOrder::Backward => {
            for i in 1..out.len() {
                if is_selected(&out[i]) && !is_selected(&out[i - 1]) {
                    out.swap(i, i - 1);
                }
            }
        }
    }
    out
}
