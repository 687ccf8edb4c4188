//! Interaction state machine.
//!
//! Exactly one [`InteractionState`] is active at a time. Each input event
//! is routed to it and may return a [`Transition`]; the machine runs the
//! old state's `on_exit`, then the new state's `on_enter` (which may itself
//! bounce straight back, e.g. a rotate with nothing selected), then
//! requests a redraw.
//!
//! | State                 | Entered from              | Exits to              |
//! |-----------------------|---------------------------|-----------------------|
//! | Idle                  | initial                   | every other state     |
//! | Moving                | Idle (drag threshold)     | Idle                  |
//! | Resizing / Rotating / CornerRadiusAdjusting | Idle (handle) | Idle      |
//! | Drawing               | Idle (shape tool)         | Idle / EditingText    |
//! | MarqueeSelecting      | Idle (drag on empty)      | Idle                  |
//! | TextTool              | Idle (text tool)          | EditingText / Idle    |
//! | EditingText           | TextTool / double-click   | Idle                  |
//! | GradientPointEditing  | fill editor               | Idle                  |

pub mod corner_radius;
pub mod drawing;
pub mod editing_text;
pub mod gradient;
pub mod handles;
pub mod idle;
pub mod marquee;
pub mod moving;
pub mod resizing;
pub mod rotating;
pub mod text_tool;

use crate::document::Document;
use crate::input::{KeyEvent, PointerEvent};
use crate::session::Session;
use crate::surface::{OverlayStyle, OverlaySurface};
use crate::tools::ToolKind;

pub use corner_radius::CornerRadiusAdjusting;
pub use drawing::Drawing;
pub use editing_text::EditingText;
pub use gradient::GradientPointEditing;
pub use idle::Idle;
pub use marquee::MarqueeSelecting;
pub use moving::Moving;
pub use resizing::Resizing;
pub use rotating::Rotating;
pub use text_tool::TextTool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Idle,
    Moving,
    Drawing,
    Resizing,
    Rotating,
    CornerRadiusAdjusting,
    MarqueeSelecting,
    TextTool,
    EditingText,
    GradientPointEditing,
}

/// Everything a state may touch while handling one event.
pub struct Cx<'a> {
    pub doc: &'a mut Document,
    pub session: &'a mut Session,
}

/// Result of handling an event.
pub enum Transition {
    Stay,
    To(Box<dyn InteractionState>),
}

impl Transition {
    pub fn idle() -> Self {
        Transition::To(Box::new(Idle::new()))
    }

    pub fn to(state: impl InteractionState + 'static) -> Self {
        Transition::To(Box::new(state))
    }
}

pub trait InteractionState {
    fn kind(&self) -> StateKind;

    /// Called once when the state becomes active. May redirect at once.
    fn on_enter(&mut self, _cx: &mut Cx) -> Transition {
        Transition::Stay
    }

    /// Called once when the state is replaced. Must undo any session-wide
    /// changes the state made (cursor, snap guides).
    fn on_exit(&mut self, _cx: &mut Cx) {}

    fn on_pointer_down(&mut self, _cx: &mut Cx, _ev: &PointerEvent) -> Transition {
        Transition::Stay
    }

    fn on_pointer_move(&mut self, _cx: &mut Cx, _ev: &PointerEvent) -> Transition {
        Transition::Stay
    }

    fn on_pointer_up(&mut self, _cx: &mut Cx, _ev: &PointerEvent) -> Transition {
        Transition::Stay
    }

    fn on_key_down(&mut self, _cx: &mut Cx, _ev: &KeyEvent) -> Transition {
        Transition::Stay
    }

    fn on_key_up(&mut self, _cx: &mut Cx, _ev: &KeyEvent) -> Transition {
        Transition::Stay
    }

    fn on_tool_change(&mut self, _cx: &mut Cx, _prev: ToolKind, _next: ToolKind) -> Transition {
        Transition::Stay
    }

    /// Escape or window blur. Gesture states restore their snapshot in
    /// `on_exit`, so the default just returns to idle.
    fn on_cancel(&mut self, _cx: &mut Cx) -> Transition {
        Transition::idle()
    }

    fn render(&self, doc: &Document, session: &Session, surface: &mut dyn OverlaySurface) {
        render_selection(doc, session, surface);
    }
}

/// Outline every selected node.
pub fn render_selection(doc: &Document, session: &Session, surface: &mut dyn OverlaySurface) {
    for &id in session.selection.ids() {
        if let Some(bounds) = doc.visual_bounds(id) {
            surface.rect(bounds, OverlayStyle::Selection);
        }
    }
}

// ─── Machine ─────────────────────────────────────────────────────────────

/// Upper bound on `on_enter` redirects followed for one transition.
const MAX_CHAINED_TRANSITIONS: usize = 8;

pub struct StateMachine {
    current: Box<dyn InteractionState>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            current: Box::new(Idle::new()),
        }
    }

    pub fn kind(&self) -> StateKind {
        self.current.kind()
    }

    pub fn current(&self) -> &dyn InteractionState {
        self.current.as_ref()
    }

    /// Enter the initial state.
    pub fn start(&mut self, cx: &mut Cx) {
        let next = self.current.on_enter(cx);
        self.apply(cx, next);
    }

    /// Switch to `state`. No-op when a state of the same kind is active.
    pub fn transition_to(&mut self, cx: &mut Cx, state: Box<dyn InteractionState>) {
        self.apply(cx, Transition::To(state));
    }

    pub fn apply(&mut self, cx: &mut Cx, transition: Transition) {
        let mut next = transition;
        for _ in 0..MAX_CHAINED_TRANSITIONS {
            let Transition::To(state) = next else {
                return;
            };
            if state.kind() == self.current.kind() {
                log::trace!("transition to active state {:?} ignored", state.kind());
                return;
            }
            self.current.on_exit(cx);
            log::debug!("state {:?} -> {:?}", self.current.kind(), state.kind());
            self.current = state;
            next = self.current.on_enter(cx);
            cx.session.request_frame();
        }
        log::warn!(
            "state transitions did not settle after {MAX_CHAINED_TRANSITIONS} redirects, staying in {:?}",
            self.current.kind()
        );
    }

    pub fn pointer_down(&mut self, cx: &mut Cx, ev: &PointerEvent) {
        let t = self.current.on_pointer_down(cx, ev);
        self.apply(cx, t);
    }

    pub fn pointer_move(&mut self, cx: &mut Cx, ev: &PointerEvent) {
        let before = self.current.kind();
        let t = self.current.on_pointer_move(cx, ev);
        self.apply(cx, t);
        // A drag that started on this move also receives it
        if before == StateKind::Idle && self.current.kind() != StateKind::Idle {
            let t = self.current.on_pointer_move(cx, ev);
            self.apply(cx, t);
        }
    }

    pub fn pointer_up(&mut self, cx: &mut Cx, ev: &PointerEvent) {
        let t = self.current.on_pointer_up(cx, ev);
        self.apply(cx, t);
    }

    pub fn key_down(&mut self, cx: &mut Cx, ev: &KeyEvent) {
        let t = self.current.on_key_down(cx, ev);
        self.apply(cx, t);
    }

    pub fn key_up(&mut self, cx: &mut Cx, ev: &KeyEvent) {
        let t = self.current.on_key_up(cx, ev);
        self.apply(cx, t);
    }

    pub fn tool_changed(&mut self, cx: &mut Cx, prev: ToolKind, next: ToolKind) {
        let t = self.current.on_tool_change(cx, prev, next);
        self.apply(cx, t);
    }

    pub fn cancel(&mut self, cx: &mut Cx) {
        let t = self.current.on_cancel(cx);
        self.apply(cx, t);
    }

    pub fn render(&self, doc: &Document, session: &Session, surface: &mut dyn OverlaySurface) {
        self.current.render(doc, session, surface);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use vellum_core::{SceneGraph, Viewport};

    /// Records lifecycle calls and bounces according to `redirect`.
    struct Probe {
        kind: StateKind,
        log: Rc<RefCell<Vec<String>>>,
        redirect: Option<StateKind>,
    }

    impl InteractionState for Probe {
        fn kind(&self) -> StateKind {
            self.kind
        }

        fn on_enter(&mut self, _cx: &mut Cx) -> Transition {
            self.log.borrow_mut().push(format!("enter {:?}", self.kind));
            match self.redirect {
                Some(kind) => Transition::to(Probe {
                    kind,
                    log: self.log.clone(),
                    redirect: None,
                }),
                None => Transition::Stay,
            }
        }

        fn on_exit(&mut self, _cx: &mut Cx) {
            self.log.borrow_mut().push(format!("exit {:?}", self.kind));
        }
    }

    #[test]
    fn same_kind_transition_is_a_noop() {
        let mut doc = Document::new(SceneGraph::new(), Viewport::default());
        let mut session = Session::default();
        let mut cx = Cx {
            doc: &mut doc,
            session: &mut session,
        };
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut machine = StateMachine::new();

        machine.transition_to(
            &mut cx,
            Box::new(Probe {
                kind: StateKind::Moving,
                log: log.clone(),
                redirect: None,
            }),
        );
        machine.transition_to(
            &mut cx,
            Box::new(Probe {
                kind: StateKind::Moving,
                log: log.clone(),
                redirect: None,
            }),
        );
        assert_eq!(*log.borrow(), vec!["enter Moving".to_string()]);
    }

    #[test]
    fn on_enter_redirect_is_followed() {
        let mut doc = Document::new(SceneGraph::new(), Viewport::default());
        let mut session = Session::default();
        let mut cx = Cx {
            doc: &mut doc,
            session: &mut session,
        };
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut machine = StateMachine::new();

        machine.transition_to(
            &mut cx,
            Box::new(Probe {
                kind: StateKind::Rotating,
                log: log.clone(),
                redirect: Some(StateKind::Drawing),
            }),
        );
        assert_eq!(machine.kind(), StateKind::Drawing);
        assert_eq!(
            *log.borrow(),
            vec![
                "enter Rotating".to_string(),
                "exit Rotating".to_string(),
                "enter Drawing".to_string()
            ]
        );
    }
}
