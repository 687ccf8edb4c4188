//! Selection management with multi-select support.
//!
//! - Click: replace the selection
//! - Shift+click: toggle the clicked node
//! - Marquee with Shift: add to the selection

use vellum_core::{NodeId, SceneGraph};

/// How a selection request combines with the current selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SelectionMode {
    #[default]
    Replace,
    Add,
    Remove,
    Toggle,
}

/// Selected nodes, in selection order.
#[derive(Clone, Debug, Default)]
pub struct SelectionManager {
    selected: Vec<NodeId>,
    /// Whether selection has changed since last checked
    changed: bool,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.selected
    }

    /// Most recently selected node.
    pub fn primary(&self) -> Option<NodeId> {
        self.selected.last().copied()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.selected.contains(&id)
    }

    /// Check and clear the change flag.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    pub fn select(&mut self, id: NodeId, mode: SelectionMode) {
        self.select_many([id], mode);
    }

    pub fn select_many(&mut self, ids: impl IntoIterator<Item = NodeId>, mode: SelectionMode) {
        let before = self.selected.clone();
        if mode == SelectionMode::Replace {
            self.selected.clear();
        }
        for id in ids {
            let present = self.selected.contains(&id);
            match mode {
                SelectionMode::Replace | SelectionMode::Add => {
                    if !present {
                        self.selected.push(id);
                    }
                }
                SelectionMode::Remove => self.selected.retain(|&s| s != id),
                SelectionMode::Toggle => {
                    if present {
                        self.selected.retain(|&s| s != id);
                    } else {
                        self.selected.push(id);
                    }
                }
            }
        }
        self.changed |= before != self.selected;
    }

    pub fn clear(&mut self) {
        if !self.selected.is_empty() {
            self.selected.clear();
            self.changed = true;
        }
    }

    /// Drop ids that no longer exist (after undo/redo or deletion).
    pub fn retain_existing(&mut self, graph: &SceneGraph) {
        let before = self.selected.len();
        self.selected.retain(|&id| graph.contains(id));
        self.changed |= before != self.selected.len();
    }
}
