//! MarqueeSelecting: rubber-band selection of top-level nodes.

use super::{Cx, InteractionState, StateKind, Transition, render_selection};
use crate::document::Document;
use crate::input::PointerEvent;
use crate::selection::SelectionMode;
use crate::session::Session;
use crate::surface::{OverlayStyle, OverlaySurface};
use vellum_core::{NodeId, ResolvedBounds, hit_test_rect};

pub struct MarqueeSelecting {
    start: (f32, f32),
    /// Selection kept underneath the marquee (Shift-drag).
    base: Vec<NodeId>,
    rect: Option<ResolvedBounds>,
}

impl MarqueeSelecting {
    pub fn new(start: (f32, f32), base: Vec<NodeId>) -> Self {
        Self {
            start,
            base,
            rect: None,
        }
    }
}

impl InteractionState for MarqueeSelecting {
    fn kind(&self) -> StateKind {
        StateKind::MarqueeSelecting
    }

    fn on_pointer_move(&mut self, cx: &mut Cx, ev: &PointerEvent) -> Transition {
        let rect = ResolvedBounds::from_corners(self.start, ev.world());
        let graph = cx.doc.graph();
        let hits = hit_test_rect(graph, cx.doc.layout(), graph.root, &rect);

        let mut selected = self.base.clone();
        selected.extend(hits.into_iter().filter(|id| !self.base.contains(id)));
        cx.session.selection.select_many(selected, SelectionMode::Replace);

        self.rect = Some(rect);
        cx.session.request_frame();
        Transition::Stay
    }

    fn on_pointer_up(&mut self, _cx: &mut Cx, _ev: &PointerEvent) -> Transition {
        Transition::idle()
    }

    fn render(&self, doc: &Document, session: &Session, surface: &mut dyn OverlaySurface) {
        render_selection(doc, session, surface);
        if let Some(rect) = self.rect {
            surface.rect(rect, OverlayStyle::Marquee);
        }
    }
}
