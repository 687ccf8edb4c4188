//! The document: scene graph + layout + history + animation.
//!
//! All edits go through [`Document::commit_block`]:
//!
//! 1. queued actions are performed in order, each yielding its live inverse;
//! 2. properties are re-resolved and layout is recomputed;
//! 3. children of auto-layout containers that moved are given a visual
//!    offset so they slide into place instead of jumping;
//! 4. one `Modified` event is emitted;
//! 5. if requested, the inverses become one undo record.

use crate::action::Action;
use crate::animation::LayoutAnimator;
use crate::batch::MutationBatch;
use crate::history::{ChangeRecord, History};
use std::collections::{HashMap, HashSet};
use vellum_core::{
    LayoutEngine, LayoutMap, NodeId, NodeIndex, PropertyPatch, ResolvedBounds, SceneGraph,
    StackLayout, Viewport, ensure_resolved, hit_test, visual_bounds,
};

/// Change notifications for persistence and UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentEvent {
    /// The graph changed. `recorded` when the change produced an undo step.
    Modified { recorded: bool },
    /// Undo/redo availability may have changed.
    HistoryChanged,
}

/// How a batch is committed.
#[derive(Debug, Clone, Default)]
pub struct CommitOptions {
    /// Push the inverse as one undo record.
    pub undo: bool,
    /// Smooth layout-driven position changes.
    pub animate: bool,
    /// Nodes that must not receive layout-change offsets.
    pub ignore: HashSet<NodeId>,
}

impl CommitOptions {
    /// Undoable and animated.
    pub fn record() -> Self {
        Self {
            undo: true,
            animate: true,
            ignore: HashSet::new(),
        }
    }

    /// Not undoable (intermediate gesture frames, restores), animated.
    pub fn transient() -> Self {
        Self {
            undo: false,
            animate: true,
            ignore: HashSet::new(),
        }
    }

    pub fn without_animation(mut self) -> Self {
        self.animate = false;
        self
    }

    pub fn ignoring(mut self, ids: impl IntoIterator<Item = NodeId>) -> Self {
        self.ignore.extend(ids);
        self
    }
}

pub struct Document {
    graph: SceneGraph,
    layout: LayoutMap,
    viewport: Viewport,
    engine: Box<dyn LayoutEngine>,
    history: History,
    animator: LayoutAnimator,
    events: Vec<DocumentEvent>,
    frame_requests: u32,
    layout_dirty: bool,
}

impl Document {
    pub fn new(graph: SceneGraph, viewport: Viewport) -> Self {
        let mut doc = Self {
            graph,
            layout: LayoutMap::new(),
            viewport,
            engine: Box::new(StackLayout),
            history: History::new(200),
            animator: LayoutAnimator::new(18.0, 0.05),
            events: Vec::new(),
            frame_requests: 0,
            layout_dirty: true,
        };
        doc.relayout();
        doc
    }

    pub fn with_layout_engine(mut self, engine: Box<dyn LayoutEngine>) -> Self {
        self.engine = engine;
        self.layout_dirty = true;
        self.relayout();
        self
    }

    pub fn with_history_depth(mut self, max_depth: usize) -> Self {
        self.history = History::new(max_depth);
        self
    }

    pub fn with_animation(mut self, decay_rate: f32, settle_epsilon: f32) -> Self {
        self.animator = LayoutAnimator::new(decay_rate, settle_epsilon);
        self
    }

    // ─── Read access ─────────────────────────────────────────────────────

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn layout(&self) -> &LayoutMap {
        &self.layout
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        if self.viewport != viewport {
            self.viewport = viewport;
            self.layout_dirty = true;
            self.relayout();
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn animator(&self) -> &LayoutAnimator {
        &self.animator
    }

    /// Layout bounds of `id`.
    pub fn bounds(&self, id: NodeId) -> Option<ResolvedBounds> {
        self.layout.get(self.graph.index_of(id)?)
    }

    /// Bounds as drawn: layout bounds plus accumulated visual offsets.
    pub fn visual_bounds(&self, id: NodeId) -> Option<ResolvedBounds> {
        visual_bounds(&self.graph, &self.layout, self.graph.index_of(id)?)
    }

    /// Point that `id`'s own `X`/`Y` are relative to.
    pub fn parent_origin(&self, id: NodeId) -> (f32, f32) {
        self.graph
            .index_of(id)
            .and_then(|idx| self.graph.parent(idx))
            .map_or((0.0, 0.0), |p| self.layout.origin(p))
    }

    /// Content origin of a container.
    pub fn content_origin(&self, id: NodeId) -> (f32, f32) {
        self.graph
            .index_of(id)
            .map_or((0.0, 0.0), |idx| self.layout.origin(idx))
    }

    pub fn hit_test(&self, x: f32, y: f32, exclude: &[NodeId]) -> Option<NodeId> {
        hit_test(&self.graph, &self.layout, x, y, exclude)
    }

    pub fn has_layout(&self, id: NodeId) -> bool {
        self.graph
            .index_of(id)
            .is_some_and(|idx| self.engine.has_layout(&self.graph, idx))
    }

    /// Index in `container`'s child list for a drop at `point`, with
    /// `exclude` ignored for geometry.
    pub fn insertion_index(&self, container: NodeId, point: (f32, f32), exclude: &[NodeId]) -> usize {
        let Some(container_idx) = self.graph.index_of(container) else {
            return 0;
        };
        let exclude: Vec<NodeIndex> = exclude.iter().filter_map(|&id| self.graph.index_of(id)).collect();
        self.engine
            .find_insertion_index(&self.graph, &self.layout, container_idx, point, &exclude)
    }

    // ─── Commit ──────────────────────────────────────────────────────────

    /// An empty batch. Nothing happens until it is committed.
    pub fn begin_update(&self) -> MutationBatch {
        MutationBatch::new()
    }

    /// Apply `batch`. Returns `false` (and does nothing) for an empty batch
    /// or one that only holds snapshots of values that never changed.
    pub fn commit_block(&mut self, batch: MutationBatch, options: CommitOptions) -> bool {
        if batch.is_empty() {
            return false;
        }

        let MutationBatch {
            ops,
            prop_snapshots,
            parent_snapshots,
            created,
        } = batch;

        if ops.is_empty()
            && created.is_empty()
            && self.snapshot_inverses(&prop_snapshots, &parent_snapshots).is_empty()
        {
            log::trace!("commit of unchanged snapshots skipped");
            return false;
        }
        self.relayout();

        let containers = if options.animate {
            self.touched_containers(&ops)
        } else {
            Vec::new()
        };
        let before = self.capture_child_positions(&containers);

        // Perform FIFO, keeping each live inverse unless a snapshot covers it
        let mut op_inverses: Vec<Action> = Vec::new();
        for op in ops {
            let mut inverses = Vec::new();
            op.perform(&mut self.graph, Some(&mut inverses));
            for inverse in inverses {
                if let Some(kept) = strip_snapshotted(inverse, &prop_snapshots, &parent_snapshots) {
                    op_inverses.push(kept);
                }
            }
        }

        let mut record: ChangeRecord = Vec::new();
        if options.undo {
            for &node in &created {
                if self.graph.contains(node) {
                    record.push(Action::DeleteNode { node });
                }
            }
            record.extend(self.snapshot_inverses(&prop_snapshots, &parent_snapshots));
            record.extend(op_inverses);
        }

        self.layout_dirty = true;
        self.relayout();
        if options.animate {
            self.apply_layout_animation(before, &options.ignore);
        }

        let recorded = options.undo && self.history.push_undo(record);
        self.emit(DocumentEvent::Modified { recorded });
        if recorded {
            self.emit(DocumentEvent::HistoryChanged);
        }
        self.request_frame();
        true
    }

    /// Inverse actions for snapshotted values that actually changed.
    fn snapshot_inverses(
        &self,
        prop_snapshots: &HashMap<NodeId, PropertyPatch>,
        parent_snapshots: &HashMap<NodeId, (NodeId, usize)>,
    ) -> Vec<Action> {
        let mut out = Vec::new();

        for (&node, snapshot) in prop_snapshots {
            let mut patch = snapshot.clone();
            if let Some(current) = self.graph.get_by_id(node) {
                patch.retain(|key, old| current.props.get(key) != old);
            }
            if !patch.is_empty() {
                out.push(Action::UpdateProperties { node, patch });
            }
        }

        // Descending, so that undo (which runs back to front) restores
        // ascending indices.
        let mut parents: Vec<_> = parent_snapshots.iter().collect();
        parents.sort_by(|a, b| b.1.1.cmp(&a.1.1));
        for (&node, &(parent, index)) in parents {
            let Some(idx) = self.graph.index_of(node) else {
                out.push(Action::ChangeParent {
                    node,
                    parent,
                    index: Some(index),
                });
                continue;
            };
            let current_parent = self.graph.parent(idx).and_then(|p| self.graph.id_of(p));
            let current_index = self.graph.child_index(idx);
            if current_parent == Some(parent) {
                if current_index != Some(index) {
                    out.push(Action::reorder(node, index));
                }
            } else {
                out.push(Action::ChangeParent {
                    node,
                    parent,
                    index: Some(index),
                });
            }
        }
        out
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        self.step_history(true)
    }

    pub fn redo(&mut self) -> bool {
        self.step_history(false)
    }

    fn step_history(&mut self, undo: bool) -> bool {
        let pending = if undo {
            self.history.peek_undo()
        } else {
            self.history.peek_redo()
        };
        let Some(pending) = pending.map(<[Action]>::to_vec) else {
            return false;
        };
        self.relayout();
        let containers = self.touched_containers(&pending);
        let before = self.capture_child_positions(&containers);

        let done = if undo {
            self.history.undo(&mut self.graph)
        } else {
            self.history.redo(&mut self.graph)
        };
        if !done {
            return false;
        }

        self.layout_dirty = true;
        self.relayout();
        self.apply_layout_animation(before, &HashSet::new());
        self.emit(DocumentEvent::Modified { recorded: true });
        self.emit(DocumentEvent::HistoryChanged);
        self.request_frame();
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_len(&self) -> usize {
        self.history.undo_len()
    }

    pub fn redo_len(&self) -> usize {
        self.history.redo_len()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.emit(DocumentEvent::HistoryChanged);
    }

    // ─── Layout ──────────────────────────────────────────────────────────

    /// Resolve properties and recompute layout if anything changed.
    pub fn relayout(&mut self) {
        if !self.layout_dirty && !self.graph.needs_resolve() {
            return;
        }
        ensure_resolved(&mut self.graph);
        self.layout = self.engine.recompute(&self.graph, self.viewport);
        self.layout_dirty = false;
    }

    /// Containers with auto-layout whose children `actions` would move.
    fn touched_containers(&self, actions: &[Action]) -> Vec<NodeIndex> {
        let mut out: Vec<NodeIndex> = Vec::new();
        for action in actions {
            for id in action.touched_parents(&self.graph) {
                if let Some(idx) = self.graph.index_of(id)
                    && self.engine.has_layout(&self.graph, idx)
                    && !out.contains(&idx)
                {
                    out.push(idx);
                }
            }
        }
        out
    }

    fn capture_child_positions(&self, containers: &[NodeIndex]) -> Vec<(NodeIndex, (f32, f32))> {
        containers
            .iter()
            .flat_map(|&c| self.graph.children(c).iter().copied())
            .filter_map(|child| self.layout.get(child).map(|b| (child, (b.x, b.y))))
            .collect()
    }

    /// Turn layout jumps into visual offsets so nodes stay put on screen.
    fn apply_layout_animation(&mut self, before: Vec<(NodeIndex, (f32, f32))>, ignore: &HashSet<NodeId>) {
        for (idx, (old_x, old_y)) in before {
            let Some(node) = self.graph.node(idx) else {
                continue;
            };
            if ignore.contains(&node.id) {
                continue;
            }
            let Some(now) = self.layout.get(idx) else {
                continue;
            };
            let (dx, dy) = (old_x - now.x, old_y - now.y);
            if dx == 0.0 && dy == 0.0 {
                continue;
            }
            let (ox, oy) = node.visual_offset;
            self.graph.set_visual_offset(idx, (ox + dx, oy + dy));
            self.animator.register(idx);
        }
    }

    // ─── Visual offsets ──────────────────────────────────────────────────

    pub fn visual_offset(&self, id: NodeId) -> (f32, f32) {
        self.graph
            .index_of(id)
            .map_or((0.0, 0.0), |idx| self.graph.visual_offset(idx))
    }

    pub fn set_visual_offset(&mut self, id: NodeId, offset: (f32, f32)) {
        if let Some(idx) = self.graph.index_of(id) {
            self.graph.set_visual_offset(idx, offset);
            self.request_frame();
        }
    }

    /// Offset `id` so that it is drawn with its top-left corner at `position`.
    pub fn set_visual_position(&mut self, id: NodeId, position: (f32, f32)) {
        let Some(idx) = self.graph.index_of(id) else {
            return;
        };
        let Some(laid_out) = self.layout.get(idx) else {
            return;
        };
        let (mut ax, mut ay) = (0.0, 0.0);
        for ancestor in self.graph.ancestors(idx) {
            let (x, y) = self.graph.visual_offset(ancestor);
            ax += x;
            ay += y;
        }
        self.graph
            .set_visual_offset(idx, (position.0 - laid_out.x - ax, position.1 - laid_out.y - ay));
        self.request_frame();
    }

    /// Let the current visual offsets of `ids` decay to zero.
    pub fn settle(&mut self, ids: &[NodeId]) {
        for &id in ids {
            if let Some(idx) = self.graph.index_of(id)
                && self.graph.visual_offset(idx) != (0.0, 0.0)
            {
                self.animator.register(idx);
            }
        }
        self.request_frame();
    }

    /// Stop decaying `ids`; their offsets are left as they are.
    pub fn stop_animation(&mut self, ids: &[NodeId]) {
        let indices: Vec<NodeIndex> = ids.iter().filter_map(|&id| self.graph.index_of(id)).collect();
        self.animator.stop(indices);
    }

    /// Advance animations by `dt` seconds. Returns `true` while animating.
    pub fn tick_animations(&mut self, dt: f32) -> bool {
        let running = self.animator.tick(&mut self.graph, dt);
        if running {
            self.request_frame();
        }
        running
    }

    // ─── Events & frames ─────────────────────────────────────────────────

    fn emit(&mut self, event: DocumentEvent) {
        let unrecorded = DocumentEvent::Modified { recorded: false };
        if event == unrecorded && self.events.last() == Some(&unrecorded) {
            return;
        }
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<DocumentEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn request_frame(&mut self) {
        self.frame_requests = self.frame_requests.saturating_add(1);
    }

    pub fn take_frame_request(&mut self) -> bool {
        std::mem::take(&mut self.frame_requests) > 0
    }
}

/// Drop the parts of an op inverse that a snapshot will restore instead.
fn strip_snapshotted(
    inverse: Action,
    prop_snapshots: &HashMap<NodeId, PropertyPatch>,
    parent_snapshots: &HashMap<NodeId, (NodeId, usize)>,
) -> Option<Action> {
    match inverse {
        Action::UpdateProperties { node, mut patch } => {
            if let Some(snapshot) = prop_snapshots.get(&node) {
                patch.retain(|key, _| !snapshot.contains_key(key));
            }
            (!patch.is_empty()).then_some(Action::UpdateProperties { node, patch })
        }
        other => match other.moved_node() {
            Some(node) if parent_snapshots.contains_key(&node) => None,
            _ => Some(other),
        },
    }
}
