//! Alignment snapping for moved bounds.
//!
//! The editor asks a [`Snapper`] how far to nudge a candidate rectangle so
//! its edges or centre line up with other nodes. The default
//! [`GuideSnapper`] collects edges and centres of every other visible node
//! as snap targets and keeps the guides it matched for overlay rendering.

use vellum_core::{LayoutMap, NodeId, NodeKind, PropKey, ResolvedBounds, SceneGraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideAxis {
    /// A vertical line at some x.
    Vertical,
    /// A horizontal line at some y.
    Horizontal,
}

/// An alignment line to draw while snapped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapGuide {
    pub axis: GuideAxis,
    pub position: f32,
    /// Extent along the line.
    pub from: f32,
    pub to: f32,
}

pub trait Snapper {
    /// Offset `(dx, dy)` to add to `bounds`. Nodes in `exclude` (and their
    /// subtrees) are never snap targets. With `enabled == false` the result
    /// is `(0, 0)` and no guides are kept.
    fn snap_bounds(
        &mut self,
        graph: &SceneGraph,
        layout: &LayoutMap,
        bounds: ResolvedBounds,
        exclude: &[NodeId],
        enabled: bool,
    ) -> (f32, f32);

    /// Forget guides from the previous gesture.
    fn reset(&mut self);

    fn guides(&self) -> &[SnapGuide];
}

#[derive(Debug, Clone)]
pub struct GuideSnapper {
    threshold: f32,
    guides: Vec<SnapGuide>,
}

impl GuideSnapper {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            guides: Vec::new(),
        }
    }
}

/// Snap targets collected from the rest of the document.
fn collect_targets(graph: &SceneGraph, layout: &LayoutMap, exclude: &[NodeId]) -> Vec<ResolvedBounds> {
    graph
        .node_indices()
        .filter(|&idx| {
            let Some(node) = graph.node(idx) else {
                return false;
            };
            if node.kind == NodeKind::Root || exclude.contains(&node.id) {
                return false;
            }
            if !node.resolved.get(PropKey::Visible).and_then(|v| v.as_bool()).unwrap_or(true) {
                return false;
            }
            !graph
                .ancestors(idx)
                .iter()
                .any(|&a| graph.id_of(a).is_some_and(|id| exclude.contains(&id)))
        })
        .filter_map(|idx| layout.get(idx))
        .collect()
}

/// Best `(delta, target line)` moving any of `lines` onto any of `targets`.
fn best_match(lines: [f32; 3], targets: &[f32], threshold: f32) -> Option<(f32, f32)> {
    let mut best: Option<(f32, f32)> = None;
    for &line in &lines {
        for &target in targets {
            let delta = target - line;
            if delta.abs() <= threshold && best.is_none_or(|(d, _)| delta.abs() < d.abs()) {
                best = Some((delta, target));
            }
        }
    }
    best
}

impl Snapper for GuideSnapper {
    fn snap_bounds(
        &mut self,
        graph: &SceneGraph,
        layout: &LayoutMap,
        bounds: ResolvedBounds,
        exclude: &[NodeId],
        enabled: bool,
    ) -> (f32, f32) {
        self.guides.clear();
        if !enabled {
            return (0.0, 0.0);
        }

        let targets = collect_targets(graph, layout, exclude);
        let xs: Vec<f32> = targets
            .iter()
            .flat_map(|t| [t.x, t.x + t.width / 2.0, t.right()])
            .collect();
        let ys: Vec<f32> = targets
            .iter()
            .flat_map(|t| [t.y, t.y + t.height / 2.0, t.bottom()])
            .collect();

        let (cx, cy) = bounds.center();
        let snap_x = best_match([bounds.x, cx, bounds.right()], &xs, self.threshold);
        let snap_y = best_match([bounds.y, cy, bounds.bottom()], &ys, self.threshold);

        let dx = snap_x.map_or(0.0, |(d, _)| d);
        let dy = snap_y.map_or(0.0, |(d, _)| d);
        let snapped = bounds.translate(dx, dy);

        if let Some((_, x)) = snap_x {
            let (from, to) = targets
                .iter()
                .filter(|t| [t.x, t.x + t.width / 2.0, t.right()].contains(&x))
                .fold((snapped.y, snapped.bottom()), |(a, b), t| (a.min(t.y), b.max(t.bottom())));
            self.guides.push(SnapGuide {
                axis: GuideAxis::Vertical,
                position: x,
                from,
                to,
            });
        }
        if let Some((_, y)) = snap_y {
            let (from, to) = targets
                .iter()
                .filter(|t| [t.y, t.y + t.height / 2.0, t.bottom()].contains(&y))
                .fold((snapped.x, snapped.right()), |(a, b), t| (a.min(t.x), b.max(t.right())));
            self.guides.push(SnapGuide {
                axis: GuideAxis::Horizontal,
                position: y,
                from,
                to,
            });
        }

        log::trace!("snap {bounds:?} by ({dx}, {dy})");
        (dx, dy)
    }

    fn reset(&mut self) {
        self.guides.clear();
    }

    fn guides(&self) -> &[SnapGuide] {
        &self.guides
    }
}
