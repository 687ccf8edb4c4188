//! Mutation batches: the unit of change.
//!
//! A [`MutationBatch`] is a plain value obtained from
//! [`Document::begin_update`](crate::document::Document::begin_update). It
//! queues actions FIFO and may carry snapshots of property values and
//! parent positions taken when a gesture starts. Nothing touches the graph
//! until the batch is committed; a batch that is dropped uncommitted simply
//! disappears.

use crate::action::{Action, FunctionAction};
use std::collections::HashMap;
use vellum_core::{NodeId, PropKey, PropValue, PropertyPatch, SceneGraph, SceneNode, VariableId};

#[derive(Debug, Default)]
pub struct MutationBatch {
    pub(crate) ops: Vec<Action>,
    /// First-captured authored values, per node.
    pub(crate) prop_snapshots: HashMap<NodeId, PropertyPatch>,
    /// First-captured (parent, index), per node.
    pub(crate) parent_snapshots: HashMap<NodeId, (NodeId, usize)>,
    /// Nodes created by earlier non-recording commits that this batch adopts.
    pub(crate) created: Vec<NodeId>,
}

impl MutationBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// No queued actions, snapshots or adopted creations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
            && self.prop_snapshots.is_empty()
            && self.parent_snapshots.is_empty()
            && self.created.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn actions(&self) -> &[Action] {
        &self.ops
    }

    // ─── Queueing ────────────────────────────────────────────────────────

    /// Queue a property merge.
    pub fn update(&mut self, node: NodeId, patch: PropertyPatch) {
        if patch.is_empty() {
            return;
        }
        self.ops.push(Action::UpdateProperties { node, patch });
    }

    /// Snapshot every key of `patch` on `node`, then queue it.
    pub fn update_with_snapshot(&mut self, graph: &SceneGraph, node: NodeId, patch: PropertyPatch) {
        let keys: Vec<PropKey> = patch.keys().collect();
        self.snapshot_properties(graph, node, keys);
        self.update(node, patch);
    }

    /// Queue insertion of `node` under `parent` (`None` appends).
    pub fn add_node(&mut self, graph: &SceneGraph, node: SceneNode, parent: NodeId, index: Option<usize>) {
        self.unlock_structure(graph, parent);
        self.ops.push(Action::AddNode {
            node: Box::new(node),
            parent,
            index,
        });
    }

    /// Queue deletion of `node` and, deepest first, its descendants.
    pub fn delete_node(&mut self, graph: &SceneGraph, node: NodeId) {
        let Some(idx) = graph.index_of(node) else {
            log::debug!("delete of unknown node {node:?} ignored");
            return;
        };
        if let Some(parent) = graph.parent_id(node) {
            self.unlock_structure(graph, parent);
        }
        for child in graph.descendants_post_order(idx) {
            if let Some(id) = graph.id_of(child) {
                self.ops.push(Action::DeleteNode { node: id });
            }
        }
        self.ops.push(Action::DeleteNode { node });
    }

    /// Queue a move of `node` under `parent` at `index`.
    pub fn change_parent(&mut self, graph: &SceneGraph, node: NodeId, parent: NodeId, index: Option<usize>) {
        if let Some(old_parent) = graph.parent_id(node) {
            self.unlock_structure(graph, old_parent);
        }
        self.unlock_structure(graph, parent);
        self.ops.push(Action::ChangeParent {
            node,
            parent,
            index,
        });
    }

    /// Queue the moves that turn `parent`'s child list into `order`.
    ///
    /// Only `moving` nodes change position; everything else must keep its
    /// relative order in `order`. The moving nodes are first sent to the
    /// end, then inserted at ascending target indices, so each insertion
    /// lands in a prefix that is already final.
    pub fn arrange_children(&mut self, graph: &SceneGraph, parent: NodeId, order: &[NodeId], moving: &[NodeId]) {
        for &node in moving {
            self.change_parent(graph, node, parent, None);
        }
        for (index, &node) in order.iter().enumerate() {
            if moving.contains(&node) {
                self.change_parent(graph, node, parent, Some(index));
            }
        }
    }

    pub fn update_variable(&mut self, variable: VariableId, value: Option<PropValue>) {
        self.ops.push(Action::UpdateVariable { variable, value });
    }

    pub fn run_function(&mut self, func: FunctionAction) {
        self.ops.push(Action::RunFunction(func));
    }

    pub fn push(&mut self, action: Action) {
        self.ops.push(action);
    }

    /// Structural edits on a locked instance become a children override.
    fn unlock_structure(&mut self, graph: &SceneGraph, container: NodeId) {
        let locked = graph
            .get_by_id(container)
            .is_some_and(SceneNode::is_structure_locked);
        if !locked {
            return;
        }
        let already_queued = self.ops.iter().any(|op| {
            matches!(op, Action::UpdateProperties { node, patch }
                if *node == container && patch.contains_key(PropKey::ChildrenOverridden))
        });
        if already_queued {
            return;
        }
        log::debug!("structural edit on instance {container:?}: overriding its children");
        self.snapshot_properties(graph, container, [PropKey::ChildrenOverridden]);
        self.update(
            container,
            PropertyPatch::new().set(PropKey::ChildrenOverridden, true),
        );
    }

    // ─── Snapshots ───────────────────────────────────────────────────────

    /// Record the current authored values of `keys` on `node`. A key that
    /// was already captured keeps its first value.
    pub fn snapshot_properties(
        &mut self,
        graph: &SceneGraph,
        node: NodeId,
        keys: impl IntoIterator<Item = PropKey>,
    ) {
        let Some(current) = graph.get_by_id(node) else {
            return;
        };
        let snapshot = self.prop_snapshots.entry(node).or_default();
        for key in keys {
            if !snapshot.contains_key(key) {
                snapshot.insert(key, current.props.get(key).cloned());
            }
        }
    }

    /// Record the current parent and sibling index of `node`, once.
    pub fn snapshot_parent(&mut self, graph: &SceneGraph, node: NodeId) {
        if self.parent_snapshots.contains_key(&node) {
            return;
        }
        let Some(idx) = graph.index_of(node) else {
            return;
        };
        if let (Some(parent), Some(index)) = (graph.parent_id(node), graph.child_index(idx)) {
            self.parent_snapshots.insert(node, (parent, index));
        }
    }

    /// Adopt a node created by an earlier non-recording commit: undoing this
    /// batch's record will delete it.
    pub fn record_creation(&mut self, node: NodeId) {
        if !self.created.contains(&node) {
            self.created.push(node);
        }
    }

    pub fn has_snapshot(&self, node: NodeId) -> bool {
        self.prop_snapshots.contains_key(&node) || self.parent_snapshots.contains_key(&node)
    }

    /// Snapshotted value of `key` on `node`, if captured.
    pub fn snapshot_value(&self, node: NodeId, key: PropKey) -> Option<&Option<PropValue>> {
        self.prop_snapshots.get(&node).and_then(|s| s.get(key))
    }

    /// A batch writing every snapshot back. Used to cancel a gesture.
    pub fn restore_batch(&self, graph: &SceneGraph) -> MutationBatch {
        let mut restore = MutationBatch::new();

        let mut parents: Vec<_> = self.parent_snapshots.iter().collect();
        parents.sort_by_key(|(_, (_, index))| *index);
        for (&node, &(parent, index)) in parents {
            if graph.contains(node) {
                restore.ops.push(Action::ChangeParent {
                    node,
                    parent,
                    index: Some(index),
                });
            }
        }

        for (&node, patch) in &self.prop_snapshots {
            restore.update(node, patch.clone());
        }
        restore
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_core::NodeKind;

    #[test]
    fn snapshot_keeps_first_value() {
        let mut graph = SceneGraph::new();
        let idx = graph.add_node(
            graph.root,
            SceneNode::new(NodeId::intern("b_snap"), NodeKind::Rectangle).with(PropKey::X, 1.0),
            None,
        );
        let mut batch = MutationBatch::new();
        batch.snapshot_properties(&graph, NodeId::intern("b_snap"), [PropKey::X]);
        graph.apply_patch(idx, &PropertyPatch::new().set(PropKey::X, 9.0));
        batch.snapshot_properties(&graph, NodeId::intern("b_snap"), [PropKey::X, PropKey::Y]);

        assert_eq!(
            batch.snapshot_value(NodeId::intern("b_snap"), PropKey::X),
            Some(&Some(PropValue::Number(1.0)))
        );
        assert_eq!(batch.snapshot_value(NodeId::intern("b_snap"), PropKey::Y), Some(&None));
    }

    #[test]
    fn delete_queues_descendants_first() {
        let mut graph = SceneGraph::new();
        let frame = graph.add_node(
            graph.root,
            SceneNode::new(NodeId::intern("b_frame"), NodeKind::Frame),
            None,
        );
        graph.add_node(
            frame,
            SceneNode::new(NodeId::intern("b_leaf"), NodeKind::Rectangle),
            None,
        );
        let mut batch = MutationBatch::new();
        batch.delete_node(&graph, NodeId::intern("b_frame"));

        let targets: Vec<_> = batch
            .actions()
            .iter()
            .map(|a| match a {
                Action::DeleteNode { node } => *node,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(targets, vec![NodeId::intern("b_leaf"), NodeId::intern("b_frame")]);
    }

    #[test]
    fn structural_edit_on_instance_is_redirected() {
        let mut graph = SceneGraph::new();
        graph.add_node(
            graph.root,
            SceneNode::new(NodeId::intern("b_proto"), NodeKind::Frame),
            None,
        );
        graph.add_node(
            graph.root,
            SceneNode::new(NodeId::intern("b_inst"), NodeKind::Frame).instance_of(NodeId::intern("b_proto")),
            None,
        );
        let mut batch = MutationBatch::new();
        batch.add_node(
            &graph,
            SceneNode::new(NodeId::intern("b_new"), NodeKind::Rectangle),
            NodeId::intern("b_inst"),
            None,
        );

        assert_eq!(batch.len(), 2);
        assert!(matches!(
            &batch.actions()[0],
            Action::UpdateProperties { node, patch }
                if *node == NodeId::intern("b_inst") && patch.contains_key(PropKey::ChildrenOverridden)
        ));
        assert!(batch.has_snapshot(NodeId::intern("b_inst")));
    }

    #[test]
    fn arrange_children_reaches_target_order() {
        let mut graph = SceneGraph::new();
        let names = ["b_o0", "b_o1", "b_o2", "b_o3"];
        for name in names {
            graph.add_node(graph.root, SceneNode::new(NodeId::intern(name), NodeKind::Rectangle), None);
        }
        let ids: Vec<NodeId> = names.iter().map(|n| NodeId::intern(n)).collect();
        let target = vec![ids[1], ids[3], ids[0], ids[2]];

        let mut batch = MutationBatch::new();
        batch.arrange_children(&graph, graph.root_id(), &target, &[ids[3], ids[0]]);
        for op in batch.ops {
            op.perform(&mut graph, None);
        }
        let now: Vec<NodeId> = graph
            .children(graph.root)
            .iter()
            .filter_map(|&c| graph.id_of(c))
            .collect();
        assert_eq!(now, target);
    }

    #[test]
    fn empty_patch_is_not_queued() {
        let mut batch = MutationBatch::new();
        batch.update(NodeId::intern("b_any"), PropertyPatch::new());
        assert!(batch.is_empty());
    }
}
