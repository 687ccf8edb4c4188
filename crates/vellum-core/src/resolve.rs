//! Property resolution pass.
//!
//! A node's resolved view is built in layers, later layers winning:
//! kind defaults, then the prototype's resolved values (for instances),
//! then the node's own authored overrides. Variable bindings are
//! substituted last. Structural flags (`ChildrenOverridden`, `Slot`) are
//! never inherited from a prototype.

use crate::id::NodeId;
use crate::model::{NodeKind, SceneGraph};
use crate::props::{Color, LayoutMode, Paint, PropKey, PropValue, PropertyMap};
use std::collections::{HashMap, HashSet};

/// Upper bound on variable → variable indirection.
const MAX_VARIABLE_DEPTH: usize = 8;

/// Built-in values for a node kind.
pub fn kind_defaults(kind: NodeKind) -> PropertyMap {
    let (width, height) = match kind {
        NodeKind::Text => (120.0, 24.0),
        NodeKind::StickyNote => (200.0, 200.0),
        NodeKind::Icon => (24.0, 24.0),
        NodeKind::Root => (0.0, 0.0),
        _ => (100.0, 100.0),
    };

    let mut props = PropertyMap::new()
        .with(PropKey::X, 0.0)
        .with(PropKey::Y, 0.0)
        .with(PropKey::Width, width)
        .with(PropKey::Height, height)
        .with(PropKey::Rotation, 0.0)
        .with(PropKey::Opacity, 1.0)
        .with(PropKey::Visible, true);

    match kind {
        NodeKind::Text => {
            props.set(PropKey::Text, PropValue::Text(String::new()));
            props.set(PropKey::FontSize, PropValue::Number(16.0));
        }
        NodeKind::StickyNote => {
            props.set(PropKey::Text, PropValue::Text(String::new()));
            props.set(PropKey::FontSize, PropValue::Number(14.0));
            props.set(
                PropKey::Fill,
                PropValue::Paint(Paint::Solid(Color::rgba(1.0, 0.92, 0.55, 1.0))),
            );
        }
        NodeKind::Frame | NodeKind::Group | NodeKind::Root => {
            props.set(PropKey::Layout, PropValue::Layout(LayoutMode::Free));
        }
        _ => {}
    }

    if kind.has_corner_radius() {
        props.set(PropKey::CornerRadius, PropValue::Number(0.0));
    }
    props
}

/// Recompute the resolved view of every node and clear the dirty flag.
pub fn resolve_properties(graph: &mut SceneGraph) {
    let mut cache: HashMap<NodeId, PropertyMap> = HashMap::new();
    let indices: Vec<_> = graph.node_indices().collect();

    for &idx in &indices {
        let Some(id) = graph.id_of(idx) else { continue };
        let mut visiting = HashSet::new();
        let layered = layered_props(graph, id, &mut cache, &mut visiting);
        let kind = graph.node(idx).map_or(NodeKind::Rectangle, |n| n.kind);
        let resolved = substitute_variables(graph, kind, layered);
        graph.set_resolved(idx, resolved);
    }
    graph.mark_resolved();
}

/// Resolve only when something changed since the last pass.
pub fn ensure_resolved(graph: &mut SceneGraph) {
    if graph.needs_resolve() {
        resolve_properties(graph);
    }
}

fn layered_props(
    graph: &SceneGraph,
    id: NodeId,
    cache: &mut HashMap<NodeId, PropertyMap>,
    visiting: &mut HashSet<NodeId>,
) -> PropertyMap {
    if let Some(done) = cache.get(&id) {
        return done.clone();
    }
    let Some(node) = graph.get_by_id(id) else {
        return PropertyMap::new();
    };

    let mut props = kind_defaults(node.kind);

    if let Some(proto) = node.prototype {
        if !visiting.insert(id) {
            log::warn!("prototype cycle through {id:?}; ignoring inherited values");
        } else if graph.contains(proto) {
            let inherited = layered_props(graph, proto, cache, visiting);
            for (key, value) in inherited.iter() {
                if matches!(key, PropKey::ChildrenOverridden | PropKey::Slot) {
                    continue;
                }
                props.set(key, value.clone());
            }
        } else {
            log::debug!("prototype {proto:?} of {id:?} is missing");
        }
    }

    props.merge(&node.props);
    cache.insert(id, props.clone());
    props
}

fn substitute_variables(graph: &SceneGraph, kind: NodeKind, mut props: PropertyMap) -> PropertyMap {
    let bound: Vec<_> = props
        .iter()
        .filter_map(|(k, v)| match v {
            PropValue::Variable(var) => Some((k, *var)),
            _ => None,
        })
        .collect();

    for (key, var) in bound {
        let mut current = graph.variable(var);
        let mut depth = 0;
        while let Some(PropValue::Variable(next)) = current {
            depth += 1;
            if depth > MAX_VARIABLE_DEPTH {
                log::warn!("variable chain from {var:?} too deep");
                current = None;
                break;
            }
            current = graph.variable(*next);
        }
        match current {
            Some(value) => {
                props.set(key, value.clone());
            }
            None => {
                log::debug!("unbound variable {var:?} on {key:?}");
                match kind_defaults(kind).get(key) {
                    Some(fallback) => props.set(key, fallback.clone()),
                    None => props.remove(key),
                };
            }
        }
    }
    props
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::VariableId;
    use crate::model::SceneNode;

    #[test]
    fn defaults_fill_unset_keys() {
        let mut sg = SceneGraph::new();
        let idx = sg.add_node(
            sg.root,
            SceneNode::new(NodeId::intern("res_rect"), NodeKind::Rectangle).with(PropKey::X, 7.0),
            None,
        );
        resolve_properties(&mut sg);

        let resolved = sg.resolved(idx).unwrap();
        assert_eq!(resolved.number(PropKey::X), Some(7.0));
        assert_eq!(resolved.number(PropKey::Width), Some(100.0));
        assert_eq!(resolved.number(PropKey::Opacity), Some(1.0));
        assert!(resolved.flag(PropKey::Visible));
    }

    #[test]
    fn instance_inherits_but_overrides_win() {
        let mut sg = SceneGraph::new();
        let proto = NodeId::intern("res_proto");
        sg.add_node(
            sg.root,
            SceneNode::new(proto, NodeKind::Frame)
                .with(PropKey::Width, 300.0)
                .with(PropKey::Height, 50.0)
                .with(PropKey::ChildrenOverridden, true),
            None,
        );
        let inst = sg.add_node(
            sg.root,
            SceneNode::new(NodeId::intern("res_inst"), NodeKind::Frame)
                .instance_of(proto)
                .with(PropKey::Height, 80.0),
            None,
        );
        resolve_properties(&mut sg);

        let resolved = sg.resolved(inst).unwrap();
        assert_eq!(resolved.number(PropKey::Width), Some(300.0));
        assert_eq!(resolved.number(PropKey::Height), Some(80.0));
        assert!(!resolved.flag(PropKey::ChildrenOverridden));
    }

    #[test]
    fn prototype_cycle_does_not_recurse_forever() {
        let mut sg = SceneGraph::new();
        let a = NodeId::intern("cyc_a");
        let b = NodeId::intern("cyc_b");
        sg.add_node(sg.root, SceneNode::new(a, NodeKind::Frame).instance_of(b), None);
        let bi = sg.add_node(
            sg.root,
            SceneNode::new(b, NodeKind::Frame).instance_of(a).with(PropKey::Width, 40.0),
            None,
        );
        resolve_properties(&mut sg);
        assert_eq!(sg.resolved(bi).unwrap().number(PropKey::Width), Some(40.0));
    }

    #[test]
    fn variables_are_substituted() {
        let mut sg = SceneGraph::new();
        let var = VariableId::intern("res_spacing");
        let idx = sg.add_node(
            sg.root,
            SceneNode::new(NodeId::intern("res_bound"), NodeKind::Rectangle).with(PropKey::Width, var),
            None,
        );
        sg.set_variable(var, Some(PropValue::Number(64.0)));
        resolve_properties(&mut sg);
        assert_eq!(sg.resolved(idx).unwrap().number(PropKey::Width), Some(64.0));

        // Unbound falls back to the kind default.
        sg.set_variable(var, None);
        resolve_properties(&mut sg);
        assert_eq!(sg.resolved(idx).unwrap().number(PropKey::Width), Some(100.0));
    }
}
