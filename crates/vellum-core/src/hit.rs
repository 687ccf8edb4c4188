//! Hit testing: point → node lookup.
//!
//! Reverse-walks the tree (front-to-back) to find which node is at a given
//! canvas position. Positions include accumulated visual offsets so that
//! what is hit matches what is drawn mid-animation.

use crate::id::NodeId;
use crate::layout::LayoutMap;
use crate::model::{NodeKind, ResolvedBounds, SceneGraph};
use crate::props::PropKey;
use petgraph::graph::NodeIndex;

/// On-screen bounds of `idx`: layout bounds shifted by its own and its
/// ancestors' visual offsets.
pub fn visual_bounds(graph: &SceneGraph, layout: &LayoutMap, idx: NodeIndex) -> Option<ResolvedBounds> {
    let b = layout.get(idx)?;
    let (mut dx, mut dy) = graph.visual_offset(idx);
    for ancestor in graph.ancestors(idx) {
        let (ax, ay) = graph.visual_offset(ancestor);
        dx += ax;
        dy += ay;
    }
    Some(b.translate(dx, dy))
}

/// Find the topmost node at position (px, py), skipping `exclude` and
/// their subtrees. Returns `None` if no node is hit (background).
pub fn hit_test(
    graph: &SceneGraph,
    layout: &LayoutMap,
    px: f32,
    py: f32,
    exclude: &[NodeId],
) -> Option<NodeId> {
    hit_test_node(graph, graph.root, layout, (0.0, 0.0), px, py, exclude)
}

fn is_visible(graph: &SceneGraph, idx: NodeIndex) -> bool {
    graph
        .node(idx)
        .and_then(|n| n.resolved.get(PropKey::Visible))
        .and_then(|v| v.as_bool())
        .unwrap_or(true)
}

fn hit_test_node(
    graph: &SceneGraph,
    idx: NodeIndex,
    layout: &LayoutMap,
    inherited: (f32, f32),
    px: f32,
    py: f32,
    exclude: &[NodeId],
) -> Option<NodeId> {
    let node = graph.node(idx)?;
    if exclude.contains(&node.id) || !is_visible(graph, idx) {
        return None;
    }
    let offset = (
        inherited.0 + node.visual_offset.0,
        inherited.1 + node.visual_offset.1,
    );

    // Check children in reverse (topmost first)
    for &child in graph.children(idx).iter().rev() {
        if let Some(hit) = hit_test_node(graph, child, layout, offset, px, py, exclude) {
            return Some(hit);
        }
    }

    if node.kind == NodeKind::Root {
        return None;
    }

    if let Some(b) = layout.get(idx)
        && b.translate(offset.0, offset.1).contains(px, py)
    {
        return Some(node.id);
    }

    None
}

/// Direct children of `container` whose bounds intersect `rect`.
/// Used for marquee (box) selection.
pub fn hit_test_rect(
    graph: &SceneGraph,
    layout: &LayoutMap,
    container: NodeIndex,
    rect: &ResolvedBounds,
) -> Vec<NodeId> {
    graph
        .children(container)
        .iter()
        .filter(|&&child| is_visible(graph, child))
        .filter_map(|&child| {
            let b = visual_bounds(graph, layout, child)?;
            b.intersects(rect).then(|| graph.id_of(child)).flatten()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutEngine, StackLayout, Viewport};
    use crate::model::SceneNode;
    use crate::resolve::resolve_properties;

    fn scene() -> (SceneGraph, LayoutMap) {
        let mut sg = SceneGraph::new();
        sg.add_node(
            sg.root,
            SceneNode::new(NodeId::intern("hit_a"), NodeKind::Rectangle)
                .with(PropKey::X, 10.0)
                .with(PropKey::Y, 10.0),
            None,
        );
        sg.add_node(
            sg.root,
            SceneNode::new(NodeId::intern("hit_b"), NodeKind::Rectangle)
                .with(PropKey::X, 60.0)
                .with(PropKey::Y, 60.0),
            None,
        );
        resolve_properties(&mut sg);
        let layout = StackLayout.recompute(&sg, Viewport::default());
        (sg, layout)
    }

    #[test]
    fn topmost_wins() {
        let (sg, layout) = scene();
        assert_eq!(hit_test(&sg, &layout, 80.0, 80.0, &[]), Some(NodeId::intern("hit_b")));
        assert_eq!(hit_test(&sg, &layout, 20.0, 20.0, &[]), Some(NodeId::intern("hit_a")));
        assert_eq!(hit_test(&sg, &layout, 700.0, 500.0, &[]), None);
    }

    #[test]
    fn exclusion_reveals_node_below() {
        let (sg, layout) = scene();
        let hit = hit_test(&sg, &layout, 80.0, 80.0, &[NodeId::intern("hit_b")]);
        assert_eq!(hit, Some(NodeId::intern("hit_a")));
    }

    #[test]
    fn visual_offset_moves_hit_area() {
        let (mut sg, layout) = scene();
        let b = sg.index_of(NodeId::intern("hit_b")).unwrap();
        sg.set_visual_offset(b, (200.0, 0.0));
        assert_eq!(hit_test(&sg, &layout, 280.0, 80.0, &[]), Some(NodeId::intern("hit_b")));
        assert_eq!(hit_test(&sg, &layout, 150.0, 150.0, &[]), None);
    }

    #[test]
    fn rect_selects_direct_children() {
        let (sg, layout) = scene();
        let hits = hit_test_rect(&sg, &layout, sg.root, &ResolvedBounds::new(0.0, 0.0, 50.0, 50.0));
        assert_eq!(hits, vec![NodeId::intern("hit_a")]);
    }
}
