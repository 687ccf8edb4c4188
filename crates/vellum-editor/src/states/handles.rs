//! Selection handles: hit testing and drawing.

use crate::document::Document;
use crate::session::{Cursor, Session};
use crate::surface::{OverlayStyle, OverlaySurface};
use vellum_core::{NodeId, PropKey, ResolvedBounds};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::TopLeft,
        ResizeHandle::Top,
        ResizeHandle::TopRight,
        ResizeHandle::Right,
        ResizeHandle::BottomRight,
        ResizeHandle::Bottom,
        ResizeHandle::BottomLeft,
        ResizeHandle::Left,
    ];

    pub const CORNERS: [ResizeHandle; 4] = [
        ResizeHandle::TopLeft,
        ResizeHandle::TopRight,
        ResizeHandle::BottomRight,
        ResizeHandle::BottomLeft,
    ];

    /// Which edges the handle drags: `-1` the left/top edge, `1` the
    /// right/bottom edge, `0` neither.
    pub fn signs(self) -> (f32, f32) {
        match self {
            ResizeHandle::TopLeft => (-1.0, -1.0),
            ResizeHandle::Top => (0.0, -1.0),
            ResizeHandle::TopRight => (1.0, -1.0),
            ResizeHandle::Right => (1.0, 0.0),
            ResizeHandle::BottomRight => (1.0, 1.0),
            ResizeHandle::Bottom => (0.0, 1.0),
            ResizeHandle::BottomLeft => (-1.0, 1.0),
            ResizeHandle::Left => (-1.0, 0.0),
        }
    }

    pub fn position(self, b: &ResolvedBounds) -> (f32, f32) {
        let (sx, sy) = self.signs();
        let (cx, cy) = b.center();
        (cx + sx * b.width / 2.0, cy + sy * b.height / 2.0)
    }

    pub fn cursor(self) -> Cursor {
        match self {
            ResizeHandle::TopLeft | ResizeHandle::BottomRight => Cursor::ResizeNwse,
            ResizeHandle::TopRight | ResizeHandle::BottomLeft => Cursor::ResizeNesw,
            ResizeHandle::Top | ResizeHandle::Bottom => Cursor::ResizeNs,
            ResizeHandle::Left | ResizeHandle::Right => Cursor::ResizeEw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    Resize(ResizeHandle),
    /// Rotation zone just outside the given corner.
    Rotate(ResizeHandle),
    CornerRadius,
}

impl HandleKind {
    pub fn cursor(self) -> Cursor {
        match self {
            HandleKind::Resize(h) => h.cursor(),
            HandleKind::Rotate(_) => Cursor::Rotate,
            HandleKind::CornerRadius => Cursor::Pointer,
        }
    }
}

/// Union of the on-screen bounds of `ids`.
pub fn selection_bounds(doc: &Document, ids: &[NodeId]) -> Option<ResolvedBounds> {
    ids.iter()
        .filter_map(|&id| doc.visual_bounds(id))
        .reduce(|a, b| a.union(&b))
}

/// Centre of the corner-radius handle, when the selection has one.
pub fn corner_radius_handle(doc: &Document, session: &Session) -> Option<(f32, f32)> {
    let [id] = session.selection.ids() else {
        return None;
    };
    let idx = doc.graph().index_of(*id)?;
    let node = doc.graph().node(idx)?;
    if !node.kind.has_corner_radius() {
        return None;
    }
    let b = doc.visual_bounds(*id)?;
    let radius = doc.graph().resolved_number(idx, PropKey::CornerRadius);
    let inset = radius
        .max(session.world_len(session.config.handle_size) * 1.5)
        .min(b.width.min(b.height) / 2.0);
    Some((b.x + inset, b.y + inset))
}

/// Handle under `(px, py)`. Resize handles win over the corner-radius
/// handle, which wins over the rotation zones.
pub fn hit_handle(doc: &Document, session: &Session, px: f32, py: f32) -> Option<HandleKind> {
    let bounds = selection_bounds(doc, session.selection.ids())?;
    let reach = session.world_len(session.config.handle_size);
    let near = |(hx, hy): (f32, f32), r: f32| (px - hx).abs() <= r && (py - hy).abs() <= r;

    if let Some(handle) = ResizeHandle::ALL
        .into_iter()
        .find(|h| near(h.position(&bounds), reach))
    {
        return Some(HandleKind::Resize(handle));
    }

    if let Some(at) = corner_radius_handle(doc, session)
        && near(at, reach)
    {
        return Some(HandleKind::CornerRadius);
    }

    if bounds.contains(px, py) {
        return None;
    }
    let zone = session.world_len(session.config.rotation_handle_distance);
    ResizeHandle::CORNERS
        .into_iter()
        .find(|h| {
            let (cx, cy) = h.position(&bounds);
            let (sx, sy) = h.signs();
            // Only the quadrant facing away from the box
            (px - cx) * sx >= 0.0 && (py - cy) * sy >= 0.0 && near((cx, cy), zone)
        })
        .map(HandleKind::Rotate)
}

/// Selection outline plus resize and corner-radius handles.
pub fn render_handles(doc: &Document, session: &Session, surface: &mut dyn OverlaySurface) {
    super::render_selection(doc, session, surface);
    let Some(bounds) = selection_bounds(doc, session.selection.ids()) else {
        return;
    };
    if session.selection.len() > 1 {
        surface.rect(bounds, OverlayStyle::Selection);
    }
    for handle in ResizeHandle::ALL {
        surface.handle(handle.position(&bounds), OverlayStyle::Handle);
    }
    if let Some(at) = corner_radius_handle(doc, session) {
        surface.handle(at, OverlayStyle::Handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::SelectionMode;
    use vellum_core::{NodeKind, SceneGraph, SceneNode, Viewport};

    fn setup() -> (Document, Session) {
        let mut graph = SceneGraph::new();
        graph.add_node(
            graph.root,
            SceneNode::new(NodeId::intern("hnd_a"), NodeKind::Rectangle)
                .with(PropKey::X, 100.0)
                .with(PropKey::Y, 100.0),
            None,
        );
        let doc = Document::new(graph, Viewport::default());
        let mut session = Session::default();
        session.selection.select(NodeId::intern("hnd_a"), SelectionMode::Replace);
        (doc, session)
    }

    #[test]
    fn corners_edges_and_rotation_zones() {
        let (doc, session) = setup();
        assert_eq!(
            hit_handle(&doc, &session, 101.0, 99.0),
            Some(HandleKind::Resize(ResizeHandle::TopLeft))
        );
        assert_eq!(
            hit_handle(&doc, &session, 200.0, 150.0),
            Some(HandleKind::Resize(ResizeHandle::Right))
        );
        assert_eq!(
            hit_handle(&doc, &session, 215.0, 215.0),
            Some(HandleKind::Rotate(ResizeHandle::BottomRight))
        );
        assert_eq!(hit_handle(&doc, &session, 150.0, 150.0), None);
    }

    #[test]
    fn corner_radius_handle_is_inset() {
        let (doc, session) = setup();
        // 1.5 × handle size from the top-left corner
        assert_eq!(corner_radius_handle(&doc, &session), Some((112.0, 112.0)));
        assert_eq!(hit_handle(&doc, &session, 112.0, 112.0), Some(HandleKind::CornerRadius));
    }
}
