//! Layout-change smoothing.
//!
//! When a commit moves nodes inside an auto-layout container, the document
//! gives each of them a visual offset equal to how far it jumped, so it
//! keeps rendering where it was. The animator then decays those offsets
//! exponentially until they settle at exactly zero.

use std::collections::HashSet;
use vellum_core::{NodeIndex, SceneGraph};

#[derive(Debug)]
pub struct LayoutAnimator {
    active: HashSet<NodeIndex>,
    /// Exponential decay rate, per second.
    decay_rate: f32,
    /// Offsets within this distance on both axes snap to zero.
    settle_epsilon: f32,
}

impl LayoutAnimator {
    pub fn new(decay_rate: f32, settle_epsilon: f32) -> Self {
        Self {
            active: HashSet::new(),
            decay_rate,
            settle_epsilon,
        }
    }

    /// Start decaying the current visual offset of `idx`.
    pub fn register(&mut self, idx: NodeIndex) {
        self.active.insert(idx);
    }

    /// Stop animating `ids`, leaving their offsets as they are.
    pub fn stop(&mut self, ids: impl IntoIterator<Item = NodeIndex>) {
        for idx in ids {
            self.active.remove(&idx);
        }
    }

    pub fn is_animating(&self, idx: NodeIndex) -> bool {
        self.active.contains(&idx)
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Advance by `dt` seconds. Returns `true` while anything is still moving.
    pub fn tick(&mut self, graph: &mut SceneGraph, dt: f32) -> bool {
        if self.active.is_empty() {
            return false;
        }
        let factor = (-self.decay_rate * dt.max(0.0)).exp();
        let eps = self.settle_epsilon;

        self.active.retain(|&idx| {
            if graph.node(idx).is_none() {
                return false;
            }
            let (x, y) = graph.visual_offset(idx);
            let (x, y) = (x * factor, y * factor);
            if x.abs() <= eps && y.abs() <= eps {
                graph.set_visual_offset(idx, (0.0, 0.0));
                false
            } else {
                graph.set_visual_offset(idx, (x, y));
                true
            }
        });
        !self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_core::{NodeId, NodeKind, SceneNode};

    #[test]
    fn offsets_decay_and_settle_at_zero() {
        let mut graph = SceneGraph::new();
        let idx = graph.add_node(
            graph.root,
            SceneNode::new(NodeId::intern("anim_a"), NodeKind::Rectangle),
            None,
        );
        graph.set_visual_offset(idx, (-110.0, 40.0));

        let mut animator = LayoutAnimator::new(18.0, 0.05);
        animator.register(idx);

        assert!(animator.tick(&mut graph, 1.0 / 60.0));
        let (x, y) = graph.visual_offset(idx);
        assert!(x > -110.0 && x < 0.0, "x should shrink toward zero, got {x}");
        assert!(y < 40.0 && y > 0.0, "y should shrink toward zero, got {y}");

        let mut frames = 0;
        while animator.tick(&mut graph, 1.0 / 60.0) {
            frames += 1;
            assert!(frames < 1000, "animation never settled");
        }
        assert_eq!(graph.visual_offset(idx), (0.0, 0.0));
        assert!(animator.is_idle());
    }

    #[test]
    fn stop_leaves_offset_untouched() {
        let mut graph = SceneGraph::new();
        let idx = graph.add_node(
            graph.root,
            SceneNode::new(NodeId::intern("anim_b"), NodeKind::Rectangle),
            None,
        );
        graph.set_visual_offset(idx, (5.0, 0.0));
        let mut animator = LayoutAnimator::new(18.0, 0.05);
        animator.register(idx);
        animator.stop([idx]);
        assert!(!animator.tick(&mut graph, 0.1));
        assert_eq!(graph.visual_offset(idx), (5.0, 0.0));
    }
}
