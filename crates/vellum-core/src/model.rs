//! Core scene-tree data model.
//!
//! The document is a tree stored in a `StableDiGraph`: nodes are visual
//! elements, edges go parent → child. Child order is kept explicitly per
//! parent because it is significant (z-order, auto-layout order).
//!
//! Nodes carry *authored* properties (`props`) and a *resolved* view
//! (`resolved`) computed by [`crate::resolve::resolve_properties`] from the
//! kind defaults, the prototype chain, the authored overrides and variable
//! bindings. Any structural or property mutation marks the graph as needing
//! resolution; reading resolved values before the pass runs is a bug.

use crate::id::{NodeId, VariableId};
use crate::props::{PropKey, PropValue, PropertyMap, PropertyPatch};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

// ─── Nodes ───────────────────────────────────────────────────────────────

/// Closed set of node types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Top-level viewport node. Exactly one per document.
    Root,
    /// Visible container with explicit size; may use auto-layout.
    Frame,
    /// Container sized to its children.
    Group,
    Rectangle,
    Ellipse,
    Text,
    StickyNote,
    Icon,
    Image,
    Path,
}

impl NodeKind {
    /// Whether nodes of this kind may own children.
    pub fn is_container(self) -> bool {
        matches!(self, NodeKind::Root | NodeKind::Frame | NodeKind::Group)
    }

    /// Whether the node carries editable text content.
    pub fn has_text(self) -> bool {
        matches!(self, NodeKind::Text | NodeKind::StickyNote)
    }

    /// Whether the node supports a corner radius.
    pub fn has_corner_radius(self) -> bool {
        matches!(self, NodeKind::Rectangle | NodeKind::Frame | NodeKind::StickyNote | NodeKind::Image)
    }

    /// Prefix used for generated ids.
    pub fn id_prefix(self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Frame => "frame",
            NodeKind::Group => "group",
            NodeKind::Rectangle => "rect",
            NodeKind::Ellipse => "ellipse",
            NodeKind::Text => "text",
            NodeKind::StickyNote => "sticky",
            NodeKind::Icon => "icon",
            NodeKind::Image => "image",
            NodeKind::Path => "path",
        }
    }
}

/// A single node in the scene tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneNode {
    pub id: NodeId,

    pub kind: NodeKind,

    /// Directly authored values (overrides when the node is an instance).
    pub props: PropertyMap,

    /// Component this node instantiates, if any.
    pub prototype: Option<NodeId>,

    /// Resolved view. Rebuilt by the resolution pass.
    #[serde(skip)]
    pub resolved: PropertyMap,

    /// Transient render-only displacement used to smooth layout jumps and
    /// drags inside auto-layout containers. Never persisted.
    #[serde(skip)]
    pub visual_offset: (f32, f32),
}

impl SceneNode {
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            props: PropertyMap::new(),
            prototype: None,
            resolved: PropertyMap::new(),
            visual_offset: (0.0, 0.0),
        }
    }

    /// Builder-style authored property.
    pub fn with(mut self, key: PropKey, value: impl Into<PropValue>) -> Self {
        self.props.set(key, value.into());
        self
    }

    /// Builder-style prototype link.
    pub fn instance_of(mut self, prototype: NodeId) -> Self {
        self.prototype = Some(prototype);
        self
    }

    pub fn is_instance(&self) -> bool {
        self.prototype.is_some()
    }

    /// An instance whose child structure may not be edited without an override.
    pub fn is_structure_locked(&self) -> bool {
        self.is_instance()
            && !self.props.flag(PropKey::ChildrenOverridden)
            && !self.props.flag(PropKey::Slot)
    }

    /// Copy suitable for re-insertion: transient state cleared.
    pub fn detached_copy(&self) -> SceneNode {
        SceneNode {
            resolved: PropertyMap::new(),
            visual_offset: (0.0, 0.0),
            ..self.clone()
        }
    }
}

// ─── Scene Graph ─────────────────────────────────────────────────────────

/// The complete document tree plus its variable store.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    graph: StableDiGraph<SceneNode, ()>,

    /// The root (viewport) node index.
    pub root: NodeIndex,

    /// Index from NodeId → NodeIndex for fast lookup.
    id_index: HashMap<NodeId, NodeIndex>,

    /// Explicit child order per parent.
    child_order: HashMap<NodeIndex, Vec<NodeIndex>>,

    variables: HashMap<VariableId, PropValue>,

    needs_resolve: bool,
}

impl SceneGraph {
    /// Create a new empty scene graph with a root node.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root_id = NodeId::intern("root");
        let root = graph.add_node(SceneNode::new(root_id, NodeKind::Root));

        let mut id_index = HashMap::new();
        id_index.insert(root_id, root);

        Self {
            graph,
            root,
            id_index,
            child_order: HashMap::new(),
            variables: HashMap::new(),
            needs_resolve: true,
        }
    }

    pub fn root_id(&self) -> NodeId {
        self.graph[self.root].id
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    // ─── Lookup ──────────────────────────────────────────────────────────

    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.id_index.contains_key(&id)
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&SceneNode> {
        self.graph.node_weight(idx)
    }

    pub fn get_by_id(&self, id: NodeId) -> Option<&SceneNode> {
        self.index_of(id).and_then(|idx| self.graph.node_weight(idx))
    }

    pub fn id_of(&self, idx: NodeIndex) -> Option<NodeId> {
        self.node(idx).map(|n| n.id)
    }

    /// All node indices, root included, in storage order.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    pub fn parent_id(&self, id: NodeId) -> Option<NodeId> {
        let idx = self.index_of(id)?;
        self.parent(idx).and_then(|p| self.id_of(p))
    }

    /// Children in document order (back to front).
    pub fn children(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.child_order.get(&idx).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Position of `idx` among its siblings.
    pub fn child_index(&self, idx: NodeIndex) -> Option<usize> {
        let parent = self.parent(idx)?;
        self.children(parent).iter().position(|&c| c == idx)
    }

    /// Ancestors from the direct parent up to the root.
    pub fn ancestors(&self, idx: NodeIndex) -> SmallVec<[NodeIndex; 8]> {
        let mut out = SmallVec::new();
        let mut current = idx;
        while let Some(p) = self.parent(current) {
            out.push(p);
            current = p;
        }
        out
    }

    /// Descendants in post-order (deepest first, `idx` itself excluded).
    pub fn descendants_post_order(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        for &child in self.children(idx) {
            out.extend(self.descendants_post_order(child));
            out.push(child);
        }
        out
    }

    /// Check if `ancestor_id` is a parent/grandparent/etc. of `descendant_id`.
    pub fn is_ancestor_of(&self, ancestor_id: NodeId, descendant_id: NodeId) -> bool {
        let (Some(ancestor), Some(descendant)) =
            (self.index_of(ancestor_id), self.index_of(descendant_id))
        else {
            return false;
        };
        self.ancestors(descendant).contains(&ancestor)
    }

    /// A child of a structure-locked instance.
    pub fn is_locked_child(&self, idx: NodeIndex) -> bool {
        self.parent(idx)
            .and_then(|p| self.node(p))
            .is_some_and(SceneNode::is_structure_locked)
    }

    // ─── Structure ───────────────────────────────────────────────────────

    /// Insert `node` under `parent` at `index` (clamped; `None` appends).
    pub fn add_node(&mut self, parent: NodeIndex, node: SceneNode, index: Option<usize>) -> NodeIndex {
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        self.id_index.insert(id, idx);
        let order = self.child_order.entry(parent).or_default();
        let at = index.unwrap_or(order.len()).min(order.len());
        order.insert(at, idx);
        self.needs_resolve = true;
        idx
    }

    /// Remove a node and, deepest first, all of its descendants.
    /// Returns the removed node itself. The root cannot be removed.
    pub fn remove_node(&mut self, idx: NodeIndex) -> Option<SceneNode> {
        if idx == self.root {
            return None;
        }
        for child in self.descendants_post_order(idx) {
            self.detach_and_drop(child);
        }
        self.detach_and_drop(idx)
    }

    fn detach_and_drop(&mut self, idx: NodeIndex) -> Option<SceneNode> {
        if let Some(parent) = self.parent(idx)
            && let Some(order) = self.child_order.get_mut(&parent)
        {
            order.retain(|&c| c != idx);
        }
        self.child_order.remove(&idx);
        let removed = self.graph.remove_node(idx);
        if let Some(node) = &removed {
            self.id_index.remove(&node.id);
        }
        self.needs_resolve = true;
        removed
    }

    /// Move `child` under `new_parent` at `index` (clamped, `None` appends).
    ///
    /// Refuses edits that would create a cycle or move the root.
    pub fn reparent(&mut self, child: NodeIndex, new_parent: NodeIndex, index: Option<usize>) -> bool {
        if child == self.root || child == new_parent || self.ancestors(new_parent).contains(&child) {
            return false;
        }
        if self.node(child).is_none() || self.node(new_parent).is_none() {
            return false;
        }
        if let Some(old_parent) = self.parent(child) {
            if let Some(edge) = self.graph.find_edge(old_parent, child) {
                self.graph.remove_edge(edge);
            }
            if let Some(order) = self.child_order.get_mut(&old_parent) {
                order.retain(|&c| c != child);
            }
        }
        self.graph.add_edge(new_parent, child, ());
        let order = self.child_order.entry(new_parent).or_default();
        let at = index.unwrap_or(order.len()).min(order.len());
        order.insert(at, child);
        self.needs_resolve = true;
        true
    }

    /// Move `child` to `index` among its current siblings.
    pub fn reorder(&mut self, child: NodeIndex, index: usize) -> bool {
        let Some(parent) = self.parent(child) else {
            return false;
        };
        let Some(order) = self.child_order.get_mut(&parent) else {
            return false;
        };
        let Some(from) = order.iter().position(|&c| c == child) else {
            return false;
        };
        order.remove(from);
        let at = index.min(order.len());
        order.insert(at, child);
        self.needs_resolve = true;
        from != at
    }

    // ─── Properties ──────────────────────────────────────────────────────

    /// Apply a patch to a node's authored properties, returning previous values.
    pub fn apply_patch(&mut self, idx: NodeIndex, patch: &PropertyPatch) -> Option<PropertyPatch> {
        let node = self.graph.node_weight_mut(idx)?;
        let previous = node.props.apply(patch);
        self.needs_resolve = true;
        Some(previous)
    }

    pub fn variable(&self, id: VariableId) -> Option<&PropValue> {
        self.variables.get(&id)
    }

    /// Set (or with `None` remove) a variable, returning the previous value.
    pub fn set_variable(&mut self, id: VariableId, value: Option<PropValue>) -> Option<PropValue> {
        self.needs_resolve = true;
        match value {
            Some(v) => self.variables.insert(id, v),
            None => self.variables.remove(&id),
        }
    }

    /// Resolved view of a node. Must not be called before resolution.
    pub fn resolved(&self, idx: NodeIndex) -> Option<&PropertyMap> {
        debug_assert!(
            !self.needs_resolve,
            "resolved properties read before the resolution pass"
        );
        self.node(idx).map(|n| &n.resolved)
    }

    /// Resolved numeric property, `0.0` when absent.
    pub fn resolved_number(&self, idx: NodeIndex, key: PropKey) -> f32 {
        self.resolved(idx).and_then(|p| p.number(key)).unwrap_or(0.0)
    }

    pub fn needs_resolve(&self) -> bool {
        self.needs_resolve
    }

    pub(crate) fn set_resolved(&mut self, idx: NodeIndex, resolved: PropertyMap) {
        if let Some(node) = self.graph.node_weight_mut(idx) {
            node.resolved = resolved;
        }
    }

    pub(crate) fn mark_resolved(&mut self) {
        self.needs_resolve = false;
    }

    // ─── Transient state ─────────────────────────────────────────────────

    /// Set the render-only offset. Does not invalidate resolution.
    pub fn set_visual_offset(&mut self, idx: NodeIndex, offset: (f32, f32)) {
        if let Some(node) = self.graph.node_weight_mut(idx) {
            node.visual_offset = offset;
        }
    }

    pub fn visual_offset(&self, idx: NodeIndex) -> (f32, f32) {
        self.node(idx).map(|n| n.visual_offset).unwrap_or((0.0, 0.0))
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Resolved positions (output of layout) ───────────────────────────────

/// Absolute axis-aligned bounding box after layout.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResolvedBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ResolvedBounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Normalized rectangle spanning two corner points.
    pub fn from_corners(a: (f32, f32), b: (f32, f32)) -> Self {
        Self {
            x: a.0.min(b.0),
            y: a.1.min(b.1),
            width: (b.0 - a.0).abs(),
            height: (b.1 - a.1).abs(),
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// AABB overlap test.
    pub fn intersects(&self, other: &ResolvedBounds) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &ResolvedBounds) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(name: &str) -> SceneNode {
        SceneNode::new(NodeId::intern(name), NodeKind::Rectangle)
    }

    #[test]
    fn children_keep_insertion_order() {
        let mut sg = SceneGraph::new();
        let a = sg.add_node(sg.root, rect("m_a"), None);
        let b = sg.add_node(sg.root, rect("m_b"), None);
        let c = sg.add_node(sg.root, rect("m_c"), Some(0));
        assert_eq!(sg.children(sg.root), &[c, a, b]);
        assert_eq!(sg.child_index(b), Some(2));
    }

    #[test]
    fn reparent_refuses_cycles() {
        let mut sg = SceneGraph::new();
        let outer = sg.add_node(sg.root, SceneNode::new(NodeId::intern("m_outer"), NodeKind::Frame), None);
        let inner = sg.add_node(outer, SceneNode::new(NodeId::intern("m_inner"), NodeKind::Frame), None);

        assert!(!sg.reparent(outer, inner, None));
        assert!(!sg.reparent(outer, outer, None));
        assert!(!sg.reparent(sg.root, outer, None));
        assert_eq!(sg.parent(inner), Some(outer));

        assert!(sg.reparent(inner, sg.root, Some(0)));
        assert_eq!(sg.children(sg.root), &[inner, outer]);
        assert!(sg.children(outer).is_empty());
    }

    #[test]
    fn remove_node_takes_descendants() {
        let mut sg = SceneGraph::new();
        let frame = sg.add_node(sg.root, SceneNode::new(NodeId::intern("m_frame"), NodeKind::Frame), None);
        sg.add_node(frame, rect("m_child"), None);
        assert_eq!(sg.node_count(), 3);

        let removed = sg.remove_node(frame).unwrap();
        assert_eq!(removed.id, NodeId::intern("m_frame"));
        assert_eq!(sg.node_count(), 1);
        assert!(!sg.contains(NodeId::intern("m_child")));
        assert!(sg.children(sg.root).is_empty());
        assert!(sg.remove_node(sg.root).is_none());
    }

    #[test]
    fn reorder_within_parent() {
        let mut sg = SceneGraph::new();
        let a = sg.add_node(sg.root, rect("r_a"), None);
        let b = sg.add_node(sg.root, rect("r_b"), None);
        assert!(sg.reorder(b, 0));
        assert_eq!(sg.children(sg.root), &[b, a]);
        assert!(!sg.reorder(b, 0));
    }

    #[test]
    fn is_ancestor_of_walks_up() {
        let mut sg = SceneGraph::new();
        let group = sg.add_node(sg.root, SceneNode::new(NodeId::intern("grp"), NodeKind::Group), None);
        sg.add_node(group, rect("r1"), None);
        sg.add_node(sg.root, rect("other"), None);

        assert!(sg.is_ancestor_of(NodeId::intern("grp"), NodeId::intern("r1")));
        assert!(sg.is_ancestor_of(NodeId::intern("root"), NodeId::intern("r1")));
        assert!(!sg.is_ancestor_of(NodeId::intern("r1"), NodeId::intern("grp")));
        assert!(!sg.is_ancestor_of(NodeId::intern("grp"), NodeId::intern("grp")));
        assert!(!sg.is_ancestor_of(NodeId::intern("other"), NodeId::intern("r1")));
    }

    #[test]
    fn structure_lock_respects_overrides_and_slots() {
        let proto = NodeId::intern("lock_proto");
        let locked = SceneNode::new(NodeId::intern("lock_a"), NodeKind::Frame).instance_of(proto);
        assert!(locked.is_structure_locked());

        let overridden = locked.clone().with(PropKey::ChildrenOverridden, true);
        assert!(!overridden.is_structure_locked());

        let slot = locked.with(PropKey::Slot, true);
        assert!(!slot.is_structure_locked());
    }

    #[test]
    fn bounds_union_and_corners() {
        let a = ResolvedBounds::new(0.0, 0.0, 10.0, 10.0);
        let b = ResolvedBounds::new(20.0, 5.0, 10.0, 10.0);
        assert_eq!(a.union(&b), ResolvedBounds::new(0.0, 0.0, 30.0, 15.0));
        assert_eq!(
            ResolvedBounds::from_corners((10.0, 10.0), (0.0, 4.0)),
            ResolvedBounds::new(0.0, 4.0, 10.0, 6.0)
        );
        assert!(!a.intersects(&b));
    }
}
