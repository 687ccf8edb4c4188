//! Integration tests: tree structure edits and instance locking.

use pretty_assertions::assert_eq;
use vellum_core::*;

fn id(name: &str) -> NodeId {
    NodeId::intern(name)
}

fn frame(name: &str) -> SceneNode {
    SceneNode::new(id(name), NodeKind::Frame)
}

fn ids(sg: &SceneGraph, parent: NodeIndex) -> Vec<NodeId> {
    sg.children(parent).iter().filter_map(|&c| sg.id_of(c)).collect()
}

#[test]
fn insert_at_index_is_clamped() {
    let mut sg = SceneGraph::new();
    sg.add_node(sg.root, frame("ts_a"), None);
    sg.add_node(sg.root, frame("ts_b"), Some(99));
    sg.add_node(sg.root, frame("ts_c"), Some(1));
    assert_eq!(ids(&sg, sg.root), vec![id("ts_a"), id("ts_c"), id("ts_b")]);
}

#[test]
fn reparent_moves_subtree() {
    let mut sg = SceneGraph::new();
    let left = sg.add_node(sg.root, frame("ts_left"), None);
    let right = sg.add_node(sg.root, frame("ts_right"), None);
    let item = sg.add_node(left, frame("ts_item"), None);
    sg.add_node(item, SceneNode::new(id("ts_leaf"), NodeKind::Rectangle), None);

    assert!(sg.reparent(item, right, None));
    assert_eq!(sg.parent_id(id("ts_item")), Some(id("ts_right")));
    assert!(sg.is_ancestor_of(id("ts_right"), id("ts_leaf")));
    assert!(ids(&sg, left).is_empty());
}

#[test]
fn reparent_into_own_descendant_is_refused() {
    let mut sg = SceneGraph::new();
    let outer = sg.add_node(sg.root, frame("ts_outer"), None);
    let mid = sg.add_node(outer, frame("ts_mid"), None);
    let inner = sg.add_node(mid, frame("ts_inner"), None);

    assert!(!sg.reparent(outer, inner, None));
    assert_eq!(sg.ancestors(inner).as_slice(), &[mid, outer, sg.root]);
}

#[test]
fn descendants_are_listed_deepest_first() {
    let mut sg = SceneGraph::new();
    let top = sg.add_node(sg.root, frame("ts_top"), None);
    let mid = sg.add_node(top, frame("ts_dmid"), None);
    let leaf = sg.add_node(mid, frame("ts_dleaf"), None);
    let side = sg.add_node(top, frame("ts_dside"), None);
    assert_eq!(sg.descendants_post_order(top), vec![leaf, mid, side]);
}

#[test]
fn locked_instance_children_are_reported() {
    let mut sg = SceneGraph::new();
    sg.add_node(sg.root, frame("ts_proto"), None);
    let inst = sg.add_node(sg.root, frame("ts_inst").instance_of(id("ts_proto")), None);
    let label = sg.add_node(inst, SceneNode::new(id("ts_label"), NodeKind::Text), None);

    assert!(sg.is_locked_child(label));
    assert!(!sg.is_locked_child(inst));

    sg.apply_patch(inst, &PropertyPatch::new().set(PropKey::ChildrenOverridden, true));
    assert!(!sg.is_locked_child(label));
}

#[test]
fn property_patch_round_trips_through_previous_values() {
    let mut sg = SceneGraph::new();
    let node = sg.add_node(
        sg.root,
        SceneNode::new(id("ts_patch"), NodeKind::Rectangle).with(PropKey::Width, 10.0),
        None,
    );
    let before = sg.node(node).unwrap().props.clone();
    let previous = sg
        .apply_patch(node, &PropertyPatch::new().set(PropKey::Width, 30.0).set(PropKey::Name, "box"))
        .unwrap();
    sg.apply_patch(node, &previous);
    assert_eq!(sg.node(node).unwrap().props, before);
}

#[test]
fn visual_offset_does_not_dirty_resolution() {
    let mut sg = SceneGraph::new();
    let node = sg.add_node(sg.root, frame("ts_offset"), None);
    resolve_properties(&mut sg);
    sg.set_visual_offset(node, (3.0, 4.0));
    assert!(!sg.needs_resolve());
    assert_eq!(sg.visual_offset(node), (3.0, 4.0));
}
