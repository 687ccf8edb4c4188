//! Undo/redo stacks with lazily computed inverses.
//!
//! A change record is the list of inverse actions captured when a batch was
//! committed. Undo performs it back to front and collects a *fresh* list of
//! inverses from the live graph, which becomes the redo record (and vice
//! versa). Nothing is cached between runs, so out-of-band edits made in the
//! meantime are respected.

use crate::action::Action;
use vellum_core::SceneGraph;

/// One undoable step.
pub type ChangeRecord = Vec<Action>;

#[derive(Debug)]
pub struct History {
    undo_stack: Vec<ChangeRecord>,
    redo_stack: Vec<ChangeRecord>,
    /// Maximum undo depth.
    max_depth: usize,
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record a new step. Empty records are ignored; otherwise the redo
    /// stack is cleared and the oldest entries are trimmed.
    pub fn push_undo(&mut self, record: ChangeRecord) -> bool {
        if record.is_empty() {
            return false;
        }
        self.undo_stack.push(record);
        if self.undo_stack.len() > self.max_depth {
            let excess = self.undo_stack.len() - self.max_depth;
            self.undo_stack.drain(..excess);
        }
        // Clear redo stack on new action
        self.redo_stack.clear();
        true
    }

    /// Undo the newest step. Returns `false` when there was nothing to undo.
    pub fn undo(&mut self, graph: &mut SceneGraph) -> bool {
        let Some(record) = self.undo_stack.pop() else {
            return false;
        };
        let inverse = perform_record(graph, record);
        if !inverse.is_empty() {
            self.redo_stack.push(inverse);
        }
        true
    }

    /// Redo the newest undone step. Returns `false` when there was nothing to redo.
    pub fn redo(&mut self, graph: &mut SceneGraph) -> bool {
        let Some(record) = self.redo_stack.pop() else {
            return false;
        };
        let inverse = perform_record(graph, record);
        if !inverse.is_empty() {
            self.undo_stack.push(inverse);
        }
        true
    }

    /// Drop both stacks without performing anything.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn peek_undo(&self) -> Option<&[Action]> {
        self.undo_stack.last().map(Vec::as_slice)
    }

    pub fn peek_redo(&self) -> Option<&[Action]> {
        self.redo_stack.last().map(Vec::as_slice)
    }
}

/// Perform `record` back to front, returning the live inverses.
fn perform_record(graph: &mut SceneGraph, record: ChangeRecord) -> ChangeRecord {
    let mut inverse = Vec::with_capacity(record.len());
    for action in record.into_iter().rev() {
        action.perform(graph, Some(&mut inverse));
    }
    inverse
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_core::{NodeId, NodeKind, PropKey, PropertyPatch, SceneNode};

    fn graph_with(name: &str) -> SceneGraph {
        let mut graph = SceneGraph::new();
        graph.add_node(
            graph.root,
            SceneNode::new(NodeId::intern(name), NodeKind::Rectangle).with(PropKey::X, 0.0),
            None,
        );
        graph
    }

    fn set_x(node: &str, x: f32) -> Action {
        Action::UpdateProperties {
            node: NodeId::intern(node),
            patch: PropertyPatch::new().set(PropKey::X, x),
        }
    }

    fn x_of(graph: &SceneGraph, node: &str) -> Option<f32> {
        graph.get_by_id(NodeId::intern(node))?.props.number(PropKey::X)
    }

    /// Apply `action` like a commit would and return its record.
    fn commit(graph: &mut SceneGraph, action: Action) -> ChangeRecord {
        let mut record = Vec::new();
        action.perform(graph, Some(&mut record));
        record
    }

    #[test]
    fn empty_record_is_ignored() {
        let mut history = History::new(10);
        assert!(!history.push_undo(Vec::new()));
        assert!(!history.can_undo());
    }

    #[test]
    fn undo_then_redo() {
        let mut graph = graph_with("h_a");
        let mut history = History::new(10);
        let record = commit(&mut graph, set_x("h_a", 10.0));
        history.push_undo(record);

        assert!(history.undo(&mut graph));
        assert_eq!(x_of(&graph, "h_a"), Some(0.0));
        assert!(history.can_redo());

        assert!(history.redo(&mut graph));
        assert_eq!(x_of(&graph, "h_a"), Some(10.0));
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn new_push_clears_redo() {
        let mut graph = graph_with("h_b");
        let mut history = History::new(10);
        let record = commit(&mut graph, set_x("h_b", 1.0));
        history.push_undo(record);
        history.undo(&mut graph);
        assert_eq!(history.redo_len(), 1);

        let record = commit(&mut graph, set_x("h_b", 2.0));
        history.push_undo(record);
        assert_eq!(history.redo_len(), 0);
    }

    #[test]
    fn depth_is_bounded() {
        let mut graph = graph_with("h_c");
        let mut history = History::new(3);
        for i in 1..=5 {
            let record = commit(&mut graph, set_x("h_c", i as f32));
            history.push_undo(record);
        }
        assert_eq!(history.undo_len(), 3);
        while history.undo(&mut graph) {}
        // The two oldest steps were trimmed
        assert_eq!(x_of(&graph, "h_c"), Some(2.0));
    }

    #[test]
    fn undo_on_empty_stack_is_noop() {
        let mut graph = SceneGraph::new();
        let mut history = History::new(5);
        assert!(!history.undo(&mut graph));
        assert!(!history.redo(&mut graph));
    }

    #[test]
    fn clear_drops_both_stacks() {
        let mut graph = graph_with("h_d");
        let mut history = History::new(5);
        let record = commit(&mut graph, set_x("h_d", 3.0));
        history.push_undo(record);
        history.clear();
        assert!(!history.can_undo());
        assert_eq!(x_of(&graph, "h_d"), Some(3.0));
    }
}
