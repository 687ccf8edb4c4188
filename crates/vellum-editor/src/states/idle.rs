//! Idle: hit testing, click/drag discrimination, selection.

use super::handles::{self, HandleKind};
use super::{
    CornerRadiusAdjusting, Cx, Drawing, EditingText, InteractionState, MarqueeSelecting, Moving,
    Resizing, Rotating, StateKind, TextTool, Transition,
};
use crate::commands;
use crate::document::Document;
use crate::input::{KeyEvent, PointerButton, PointerEvent};
use crate::selection::SelectionMode;
use crate::session::Session;
use crate::surface::{OverlayStyle, OverlaySurface};
use crate::tools::ToolKind;
use vellum_core::{NodeId, SceneGraph};

/// A primary press that has not yet become a drag.
#[derive(Debug, Clone)]
struct Press {
    world: (f32, f32),
    screen: (f32, f32),
    /// Node that was hit, after mapping out of locked instances.
    target: Option<NodeId>,
    /// Collapse a multi-selection to this node if the press ends as a click.
    collapse_to: Option<NodeId>,
    additive: bool,
}

#[derive(Debug, Default)]
pub struct Idle {
    press: Option<Press>,
}

impl Idle {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Clicks inside a locked instance select the instance itself.
pub fn selectable_target(graph: &SceneGraph, id: NodeId) -> NodeId {
    let Some(mut idx) = graph.index_of(id) else {
        return id;
    };
    while graph.is_locked_child(idx) {
        match graph.parent(idx) {
            Some(parent) => idx = parent,
            None => break,
        }
    }
    graph.id_of(idx).unwrap_or(id)
}

impl InteractionState for Idle {
    fn kind(&self) -> StateKind {
        StateKind::Idle
    }

    fn on_enter(&mut self, cx: &mut Cx) -> Transition {
        let tool = cx.session.tool();
        if tool == ToolKind::Text {
            return Transition::to(TextTool::new());
        }
        cx.session.set_cursor(tool.cursor());
        Transition::Stay
    }

    fn on_exit(&mut self, cx: &mut Cx) {
        cx.session.hovered = None;
    }

    fn on_pointer_down(&mut self, cx: &mut Cx, ev: &PointerEvent) -> Transition {
        if ev.button != PointerButton::Primary {
            return Transition::Stay;
        }
        let (x, y) = ev.world();
        let tool = cx.session.tool();

        if let Some(kind) = tool.shape_kind() {
            return Transition::to(Drawing::new(kind, (x, y)));
        }
        if tool == ToolKind::Text {
            return Transition::to(TextTool::new());
        }

        if let Some(handle) = handles::hit_handle(cx.doc, cx.session, x, y) {
            return match handle {
                HandleKind::Resize(h) => Transition::to(Resizing::new(h, (x, y))),
                HandleKind::Rotate(_) => Transition::to(Rotating::new((x, y))),
                HandleKind::CornerRadius => Transition::to(CornerRadiusAdjusting::new()),
            };
        }

        let additive = ev.modifiers.shift;
        let hit = cx
            .doc
            .hit_test(x, y, &[])
            .map(|id| selectable_target(cx.doc.graph(), id));

        let mut collapse_to = None;
        match hit {
            Some(id) => {
                if ev.click_count >= 2
                    && cx.doc.graph().get_by_id(id).is_some_and(|n| n.kind.has_text())
                {
                    cx.session.selection.select(id, SelectionMode::Replace);
                    return Transition::to(EditingText::existing(id));
                }
                if additive {
                    cx.session.selection.select(id, SelectionMode::Toggle);
                } else if !cx.session.selection.contains(id) {
                    cx.session.selection.select(id, SelectionMode::Replace);
                } else if cx.session.selection.len() > 1 {
                    collapse_to = Some(id);
                }
            }
            None if !additive => cx.session.selection.clear(),
            None => {}
        }

        self.press = Some(Press {
            world: (x, y),
            screen: ev.screen(),
            target: hit.filter(|&id| cx.session.selection.contains(id)),
            collapse_to,
            additive,
        });
        cx.session.request_frame();
        Transition::Stay
    }

    fn on_pointer_move(&mut self, cx: &mut Cx, ev: &PointerEvent) -> Transition {
        let Some(press) = &self.press else {
            update_hover(cx, ev);
            return Transition::Stay;
        };

        let (sx, sy) = ev.screen();
        let dragged = (sx - press.screen.0).hypot(sy - press.screen.1);
        if dragged <= cx.session.config.drag_threshold {
            return Transition::Stay;
        }

        let press = self.press.take();
        match press {
            Some(Press {
                world,
                target: Some(_),
                ..
            }) => Transition::to(Moving::new(world)),
            Some(Press {
                world,
                target: None,
                additive,
                ..
            }) => {
                let base = if additive {
                    cx.session.selection.ids().to_vec()
                } else {
                    Vec::new()
                };
                Transition::to(MarqueeSelecting::new(world, base))
            }
            None => Transition::Stay,
        }
    }

    fn on_pointer_up(&mut self, cx: &mut Cx, _ev: &PointerEvent) -> Transition {
        if let Some(Press {
            collapse_to: Some(id),
            ..
        }) = self.press.take()
        {
            cx.session.selection.select(id, SelectionMode::Replace);
            cx.session.request_frame();
        }
        Transition::Stay
    }

    fn on_key_down(&mut self, cx: &mut Cx, ev: &KeyEvent) -> Transition {
        let Some(action) = cx.session.shortcuts.resolve(&ev.key, ev.modifiers) else {
            return Transition::Stay;
        };
        log::trace!("idle shortcut {action:?}");
        commands::run_shortcut(cx.doc, cx.session, action);
        cx.session.request_frame();
        Transition::Stay
    }

    fn on_tool_change(&mut self, cx: &mut Cx, _prev: ToolKind, next: ToolKind) -> Transition {
        self.press = None;
        if next == ToolKind::Text {
            return Transition::to(TextTool::new());
        }
        cx.session.set_cursor(next.cursor());
        Transition::Stay
    }

    fn on_cancel(&mut self, _cx: &mut Cx) -> Transition {
        self.press = None;
        Transition::Stay
    }

    fn render(&self, doc: &Document, session: &Session, surface: &mut dyn OverlaySurface) {
        if let Some(id) = session.hovered
            && !session.selection.contains(id)
            && let Some(bounds) = doc.visual_bounds(id)
        {
            surface.rect(bounds, OverlayStyle::Hover);
        }
        handles::render_handles(doc, session, surface);
    }
}

/// Hover highlight and handle cursors. Skipped while an overlay owns the pointer.
fn update_hover(cx: &mut Cx, ev: &PointerEvent) {
    if !cx.session.is_interactive() {
        return;
    }
    let (x, y) = ev.world();
    let tool = cx.session.tool();
    let handle = if tool == ToolKind::Select {
        handles::hit_handle(cx.doc, cx.session, x, y)
    } else {
        None
    };
    let hovered = cx
        .doc
        .hit_test(x, y, &[])
        .map(|id| selectable_target(cx.doc.graph(), id));
    if hovered != cx.session.hovered {
        cx.session.hovered = hovered;
        cx.session.request_frame();
    }
    cx.session
        .set_cursor(handle.map_or_else(|| tool.cursor(), HandleKind::cursor));
}
