//! Primitive document edits.
//!
//! An `Action` performs itself against the scene graph and, when given an
//! accumulator, appends the action that would undo what it just did. The
//! inverse is computed from the live graph at perform time, never cached,
//! so history stays valid after out-of-band edits.

use smallvec::SmallVec;
use std::fmt;
use std::rc::Rc;
use vellum_core::{NodeId, PropKey, PropValue, PropertyPatch, SceneGraph, SceneNode, VariableId};

/// Closure body of a [`FunctionAction`]. Returns its own inverse, if any.
pub type ActionFn = dyn Fn(&mut SceneGraph) -> Option<Action>;

/// An opaque edit expressed as a closure.
#[derive(Clone)]
pub struct FunctionAction {
    pub label: &'static str,
    /// Node whose position among its siblings this function changes.
    pub moves: Option<NodeId>,
    pub func: Rc<ActionFn>,
}

impl FunctionAction {
    pub fn new(label: &'static str, func: impl Fn(&mut SceneGraph) -> Option<Action> + 'static) -> Self {
        Self {
            label,
            moves: None,
            func: Rc::new(func),
        }
    }
}

impl fmt::Debug for FunctionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionAction")
            .field("label", &self.label)
            .field("moves", &self.moves)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    UpdateProperties {
        node: NodeId,
        patch: PropertyPatch,
    },
    AddNode {
        node: Box<SceneNode>,
        parent: NodeId,
        index: Option<usize>,
    },
    /// Removes the node; remaining children are deleted first.
    DeleteNode {
        node: NodeId,
    },
    /// Same-parent moves are performed as a reorder.
    ChangeParent {
        node: NodeId,
        parent: NodeId,
        index: Option<usize>,
    },
    UpdateVariable {
        variable: VariableId,
        value: Option<PropValue>,
    },
    RunFunction(FunctionAction),
}

impl Action {
    /// Move `node` to `index` among its current siblings.
    ///
    /// The inverse is another reorder back to wherever the node sits when
    /// this runs.
    pub fn reorder(node: NodeId, index: usize) -> Action {
        let mut func = FunctionAction::new("reorder", move |graph: &mut SceneGraph| {
            let Some(idx) = graph.index_of(node) else {
                log::debug!("reorder: {node:?} no longer exists");
                return None;
            };
            let previous = graph.child_index(idx)?;
            graph.reorder(idx, index);
            Some(Action::reorder(node, previous))
        });
        func.moves = Some(node);
        Action::RunFunction(func)
    }

    /// Node whose parent or sibling position this action changes.
    pub fn moved_node(&self) -> Option<NodeId> {
        match self {
            Action::ChangeParent { node, .. } => Some(*node),
            Action::RunFunction(f) => f.moves,
            _ => None,
        }
    }

    /// Whether this is the sibling reorder produced by [`Action::reorder`].
    pub fn is_reorder(&self) -> bool {
        matches!(self, Action::RunFunction(f) if f.label == "reorder")
    }

    /// Containers whose child list (or child sizes) this action would change,
    /// evaluated against the graph before the action runs.
    pub fn touched_parents(&self, graph: &SceneGraph) -> SmallVec<[NodeId; 2]> {
        let mut out = SmallVec::new();
        match self {
            Action::UpdateProperties { node, patch } => {
                let resizes = patch.keys().any(|k| {
                    matches!(k, PropKey::Width | PropKey::Height | PropKey::Visible)
                });
                if resizes && let Some(parent) = graph.parent_id(*node) {
                    out.push(parent);
                }
                if patch.contains_key(PropKey::Layout) {
                    out.push(*node);
                }
            }
            Action::AddNode { parent, .. } => out.push(*parent),
            Action::DeleteNode { node } => out.extend(graph.parent_id(*node)),
            Action::ChangeParent { node, parent, .. } => {
                out.extend(graph.parent_id(*node));
                if !out.contains(parent) {
                    out.push(*parent);
                }
            }
            Action::UpdateVariable { .. } => {}
            Action::RunFunction(f) => {
                if let Some(node) = f.moves {
                    out.extend(graph.parent_id(node));
                }
            }
        }
        out
    }

    /// Apply to `graph`. With `rollback`, append the live inverse.
    /// Targets that no longer exist make the action a no-op.
    pub fn perform(self, graph: &mut SceneGraph, rollback: Option<&mut Vec<Action>>) {
        let mut scratch = Vec::new();
        let acc = match rollback {
            Some(acc) => acc,
            None => &mut scratch,
        };

        match self {
            Action::UpdateProperties { node, patch } => {
                let Some(idx) = graph.index_of(node) else {
                    log::debug!("update skipped: {node:?} does not exist");
                    return;
                };
                if let Some(previous) = graph.apply_patch(idx, &patch) {
                    acc.push(Action::UpdateProperties {
                        node,
                        patch: previous,
                    });
                }
            }

            Action::AddNode {
                node,
                parent,
                index,
            } => {
                let id = node.id;
                if graph.contains(id) {
                    log::debug!("add skipped: {id:?} already exists");
                    return;
                }
                let Some(parent_idx) = graph.index_of(parent) else {
                    log::debug!("add skipped: parent {parent:?} of {id:?} does not exist");
                    return;
                };
                graph.add_node(parent_idx, node.detached_copy(), index);
                acc.push(Action::DeleteNode { node: id });
            }

            Action::DeleteNode { node } => {
                let Some(idx) = graph.index_of(node) else {
                    log::debug!("delete skipped: {node:?} does not exist");
                    return;
                };
                if idx == graph.root {
                    log::debug!("delete skipped: the root cannot be removed");
                    return;
                }
                // Last child first so that re-insertion indices stay valid
                let children: Vec<NodeId> = graph
                    .children(idx)
                    .iter()
                    .filter_map(|&c| graph.id_of(c))
                    .collect();
                for child in children.into_iter().rev() {
                    Action::DeleteNode { node: child }.perform(graph, Some(&mut *acc));
                }

                let parent = graph.parent(idx).and_then(|p| graph.id_of(p));
                let index = graph.child_index(idx);
                if let (Some(parent), Some(removed)) = (parent, graph.remove_node(idx)) {
                    acc.push(Action::AddNode {
                        node: Box::new(removed.detached_copy()),
                        parent,
                        index,
                    });
                }
            }

            Action::ChangeParent {
                node,
                parent,
                index,
            } => {
                let (Some(idx), Some(new_parent)) = (graph.index_of(node), graph.index_of(parent))
                else {
                    log::debug!("reparent skipped: {node:?} or {parent:?} does not exist");
                    return;
                };
                let Some(old_parent) = graph.parent(idx) else {
                    log::debug!("reparent skipped: {node:?} has no parent");
                    return;
                };
                let Some(old_index) = graph.child_index(idx) else {
                    return;
                };

                if old_parent == new_parent {
                    graph.reorder(idx, index.unwrap_or(usize::MAX));
                    acc.push(Action::reorder(node, old_index));
                } else if graph.reparent(idx, new_parent, index) {
                    let Some(old_parent_id) = graph.id_of(old_parent) else {
                        return;
                    };
                    acc.push(Action::ChangeParent {
                        node,
                        parent: old_parent_id,
                        index: Some(old_index),
                    });
                } else {
                    log::debug!("reparent refused: {parent:?} is {node:?} or one of its descendants");
                }
            }

            Action::UpdateVariable { variable, value } => {
                let previous = graph.set_variable(variable, value);
                acc.push(Action::UpdateVariable {
                    variable,
                    value: previous,
                });
            }

            Action::RunFunction(f) => {
                if let Some(inverse) = (f.func)(graph) {
                    acc.push(inverse);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_core::NodeKind;

    fn rect(name: &str) -> SceneNode {
        SceneNode::new(NodeId::intern(name), NodeKind::Rectangle)
    }

    fn child_ids(graph: &SceneGraph, parent: NodeId) -> Vec<NodeId> {
        let idx = graph.index_of(parent).unwrap();
        graph.children(idx).iter().filter_map(|&c| graph.id_of(c)).collect()
    }

    #[test]
    fn update_inverse_restores_previous_values() {
        let mut graph = SceneGraph::new();
        graph.add_node(graph.root, rect("act_a").with(PropKey::X, 5.0), None);
        let mut rollback = Vec::new();

        Action::UpdateProperties {
            node: NodeId::intern("act_a"),
            patch: PropertyPatch::new().set(PropKey::X, 50.0).set(PropKey::Y, 1.0),
        }
        .perform(&mut graph, Some(&mut rollback));

        assert_eq!(rollback.len(), 1);
        rollback.pop().unwrap().perform(&mut graph, None);
        let props = &graph.get_by_id(NodeId::intern("act_a")).unwrap().props;
        assert_eq!(props.number(PropKey::X), Some(5.0));
        assert_eq!(props.get(PropKey::Y), None);
    }

    #[test]
    fn delete_subtree_inverse_rebuilds_it_in_order() {
        let mut graph = SceneGraph::new();
        let frame = graph.add_node(
            graph.root,
            SceneNode::new(NodeId::intern("act_frame"), NodeKind::Frame),
            None,
        );
        graph.add_node(frame, rect("act_c0"), None);
        graph.add_node(frame, rect("act_c1"), None);

        let mut rollback = Vec::new();
        Action::DeleteNode {
            node: NodeId::intern("act_frame"),
        }
        .perform(&mut graph, Some(&mut rollback));
        assert_eq!(graph.node_count(), 1);
        assert_eq!(rollback.len(), 3);

        for inverse in rollback.into_iter().rev() {
            inverse.perform(&mut graph, None);
        }
        assert_eq!(
            child_ids(&graph, NodeId::intern("act_frame")),
            vec![NodeId::intern("act_c0"), NodeId::intern("act_c1")]
        );
    }

    #[test]
    fn same_parent_change_is_a_reorder() {
        let mut graph = SceneGraph::new();
        graph.add_node(graph.root, rect("act_r0"), None);
        graph.add_node(graph.root, rect("act_r1"), None);
        let mut rollback = Vec::new();

        Action::ChangeParent {
            node: NodeId::intern("act_r1"),
            parent: graph.root_id(),
            index: Some(0),
        }
        .perform(&mut graph, Some(&mut rollback));

        assert!(rollback[0].is_reorder());
        assert_eq!(
            child_ids(&graph, graph.root_id()),
            vec![NodeId::intern("act_r1"), NodeId::intern("act_r0")]
        );
        rollback.pop().unwrap().perform(&mut graph, None);
        assert_eq!(
            child_ids(&graph, graph.root_id()),
            vec![NodeId::intern("act_r0"), NodeId::intern("act_r1")]
        );
    }

    #[test]
    fn missing_target_is_a_noop() {
        let mut graph = SceneGraph::new();
        let mut rollback = Vec::new();
        Action::UpdateProperties {
            node: NodeId::intern("act_ghost"),
            patch: PropertyPatch::new().set(PropKey::X, 1.0),
        }
        .perform(&mut graph, Some(&mut rollback));
        Action::DeleteNode {
            node: NodeId::intern("act_ghost"),
        }
        .perform(&mut graph, Some(&mut rollback));
        Action::reorder(NodeId::intern("act_ghost"), 0).perform(&mut graph, Some(&mut rollback));
        assert!(rollback.is_empty());
    }

    #[test]
    fn variable_inverse_restores_absence() {
        let mut graph = SceneGraph::new();
        let var = VariableId::intern("act_var");
        let mut rollback = Vec::new();
        Action::UpdateVariable {
            variable: var,
            value: Some(PropValue::Number(4.0)),
        }
        .perform(&mut graph, Some(&mut rollback));
        assert_eq!(graph.variable(var), Some(&PropValue::Number(4.0)));

        rollback.pop().unwrap().perform(&mut graph, None);
        assert_eq!(graph.variable(var), None);
    }
}
