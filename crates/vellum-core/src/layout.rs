//! Layout: resolved properties → absolute bounds.
//!
//! The editor talks to layout through the [`LayoutEngine`] trait so a real
//! auto-layout solver can be plugged in. [`StackLayout`] is the built-in
//! engine: free positioning plus Column/Row/Grid stacks, with groups
//! auto-sized to their children.

use crate::model::{NodeKind, ResolvedBounds, SceneGraph};
use crate::props::{LayoutMode, PropKey, PropValue};
use petgraph::graph::NodeIndex;
use std::collections::HashMap;

/// The canvas (viewport) dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

// ─── Layout output ───────────────────────────────────────────────────────

/// Absolute bounds of every node, plus the content origin of every
/// container (the point its free children's `X`/`Y` are relative to).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutMap {
    bounds: HashMap<NodeIndex, ResolvedBounds>,
    origins: HashMap<NodeIndex, (f32, f32)>,
}

impl LayoutMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, idx: NodeIndex) -> Option<ResolvedBounds> {
        self.bounds.get(&idx).copied()
    }

    pub fn insert(&mut self, idx: NodeIndex, bounds: ResolvedBounds) {
        self.bounds.insert(idx, bounds);
    }

    /// Content origin of `idx`; falls back to its bounds' top-left corner.
    pub fn origin(&self, idx: NodeIndex) -> (f32, f32) {
        self.origins
            .get(&idx)
            .copied()
            .or_else(|| self.get(idx).map(|b| (b.x, b.y)))
            .unwrap_or((0.0, 0.0))
    }

    pub fn set_origin(&mut self, idx: NodeIndex, origin: (f32, f32)) {
        self.origins.insert(idx, origin);
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, ResolvedBounds)> + '_ {
        self.bounds.iter().map(|(k, v)| (*k, *v))
    }
}

// ─── Engine trait ────────────────────────────────────────────────────────

/// Pluggable layout solver.
pub trait LayoutEngine {
    /// Compute absolute bounds for every node. Requires resolved properties.
    fn recompute(&mut self, graph: &SceneGraph, viewport: Viewport) -> LayoutMap;

    /// Whether `idx` arranges its children itself.
    fn has_layout(&self, graph: &SceneGraph, idx: NodeIndex) -> bool {
        layout_mode(graph, idx).is_auto()
    }

    /// Index in `container`'s full child list at which a node dropped at
    /// `point` would land. Nodes in `exclude` are ignored for geometry but
    /// still counted in the returned index.
    fn find_insertion_index(
        &self,
        graph: &SceneGraph,
        bounds: &LayoutMap,
        container: NodeIndex,
        point: (f32, f32),
        exclude: &[NodeIndex],
    ) -> usize;
}

/// Resolved layout mode of a node (`Free` for non-containers).
pub fn layout_mode(graph: &SceneGraph, idx: NodeIndex) -> LayoutMode {
    let Some(node) = graph.node(idx) else {
        return LayoutMode::Free;
    };
    if !node.kind.is_container() {
        return LayoutMode::Free;
    }
    node.resolved
        .get(PropKey::Layout)
        .and_then(PropValue::as_layout)
        .unwrap_or_default()
}

// ─── Stack layout ────────────────────────────────────────────────────────

/// Built-in free/stack/grid solver.
#[derive(Debug, Default, Clone, Copy)]
pub struct StackLayout;

impl LayoutEngine for StackLayout {
    fn recompute(&mut self, graph: &SceneGraph, viewport: Viewport) -> LayoutMap {
        let mut map = LayoutMap::new();

        // Root fills the viewport
        map.insert(
            graph.root,
            ResolvedBounds::new(0.0, 0.0, viewport.width, viewport.height),
        );
        map.set_origin(graph.root, (0.0, 0.0));

        layout_children(graph, graph.root, &mut map);
        map
    }

    fn find_insertion_index(
        &self,
        graph: &SceneGraph,
        bounds: &LayoutMap,
        container: NodeIndex,
        point: (f32, f32),
        exclude: &[NodeIndex],
    ) -> usize {
        let children = graph.children(container);
        let mode = layout_mode(graph, container);
        let (px, py) = point;

        for (i, &child) in children.iter().enumerate() {
            if exclude.contains(&child) {
                continue;
            }
            let Some(b) = bounds.get(child) else { continue };
            let (cx, cy) = b.center();
            let before = match mode {
                LayoutMode::Row { .. } => px < cx,
                LayoutMode::Column { .. } => py < cy,
                LayoutMode::Grid { .. } => py < b.y || (py <= b.bottom() && px < cx),
                LayoutMode::Free => false,
            };
            if before {
                return i;
            }
        }
        children.len()
    }
}

fn size_of(graph: &SceneGraph, idx: NodeIndex) -> (f32, f32) {
    let Some(node) = graph.node(idx) else {
        return (0.0, 0.0);
    };
    let w = node.resolved.number(PropKey::Width).unwrap_or(0.0).max(0.0);
    let h = node.resolved.number(PropKey::Height).unwrap_or(0.0).max(0.0);
    (w, h)
}

fn local_position(graph: &SceneGraph, idx: NodeIndex) -> (f32, f32) {
    graph.node(idx).map_or((0.0, 0.0), |n| {
        (
            n.resolved.number(PropKey::X).unwrap_or(0.0),
            n.resolved.number(PropKey::Y).unwrap_or(0.0),
        )
    })
}

fn layout_children(graph: &SceneGraph, parent_idx: NodeIndex, map: &mut LayoutMap) {
    let children = graph.children(parent_idx);
    if children.is_empty() {
        return;
    }
    let Some(parent_bounds) = map.get(parent_idx) else {
        return;
    };
    let (ox, oy) = map.origin(parent_idx);

    match layout_mode(graph, parent_idx) {
        LayoutMode::Column { gap, pad } => {
            let mut y = parent_bounds.y + pad;
            for &child in children {
                let (w, h) = size_of(graph, child);
                map.insert(child, ResolvedBounds::new(parent_bounds.x + pad, y, w, h));
                y += h + gap;
            }
        }
        LayoutMode::Row { gap, pad } => {
            let mut x = parent_bounds.x + pad;
            for &child in children {
                let (w, h) = size_of(graph, child);
                map.insert(child, ResolvedBounds::new(x, parent_bounds.y + pad, w, h));
                x += w + gap;
            }
        }
        LayoutMode::Grid { cols, gap, pad } => {
            let cols = cols.max(1);
            let mut x = parent_bounds.x + pad;
            let mut y = parent_bounds.y + pad;
            let mut col = 0u32;
            let mut row_height = 0.0f32;

            for &child in children {
                let (w, h) = size_of(graph, child);
                map.insert(child, ResolvedBounds::new(x, y, w, h));

                row_height = row_height.max(h);
                col += 1;
                if col >= cols {
                    col = 0;
                    x = parent_bounds.x + pad;
                    y += row_height + gap;
                    row_height = 0.0;
                } else {
                    x += w + gap;
                }
            }
        }
        LayoutMode::Free => {
            for &child in children {
                let (w, h) = size_of(graph, child);
                let (lx, ly) = local_position(graph, child);
                map.insert(child, ResolvedBounds::new(ox + lx, oy + ly, w, h));
            }
        }
    }

    for &child in children {
        if let Some(b) = map.get(child) {
            map.set_origin(child, (b.x, b.y));
        }
        layout_children(graph, child, map);
    }

    // Auto-size groups to the union bounding box of their children
    let is_group = graph
        .node(parent_idx)
        .is_some_and(|n| n.kind == NodeKind::Group);
    if is_group {
        let union = children
            .iter()
            .filter_map(|&c| map.get(c))
            .reduce(|acc, b| acc.union(&b));
        if let Some(union) = union {
            map.insert(parent_idx, union);
        }
    }
}
