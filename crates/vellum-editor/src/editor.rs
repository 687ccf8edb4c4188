//! The editor: document, session, state machine and hand overlay.
//!
//! Hosts feed raw input into [`Editor`]; it decides whether the hand
//! overlay or the active interaction state receives each event, handles the
//! global shortcuts, and exposes one redraw flag per frame.

use crate::config::EditorConfig;
use crate::document::Document;
use crate::input::{KeyEvent, PointerButton, PointerEvent};
use crate::overlay::HandOverlay;
use crate::session::Session;
use crate::shortcuts::ShortcutAction;
use crate::states::{Cx, GradientPointEditing, InteractionState, StateKind, StateMachine};
use crate::surface::OverlaySurface;
use crate::tools::ToolKind;
use vellum_core::{NodeId, SceneGraph, Viewport};

pub struct Editor {
    pub doc: Document,
    pub session: Session,
    machine: StateMachine,
    overlay: HandOverlay,
    space_held: bool,
    middle_down: bool,
}

impl Editor {
    pub fn new(graph: SceneGraph, viewport: Viewport, config: EditorConfig) -> Self {
        let doc = Document::new(graph, viewport)
            .with_history_depth(config.max_undo_depth)
            .with_animation(config.decay_rate, config.settle_epsilon);
        let mut editor = Self {
            doc,
            session: Session::new(config),
            machine: StateMachine::new(),
            overlay: HandOverlay::new(),
            space_held: false,
            middle_down: false,
        };
        let mut cx = Cx {
            doc: &mut editor.doc,
            session: &mut editor.session,
        };
        editor.machine.start(&mut cx);
        editor
    }

    pub fn state(&self) -> StateKind {
        self.machine.kind()
    }

    pub fn overlay_active(&self) -> bool {
        self.overlay.is_active()
    }

    /// Host → editor: switch to `state` (e.g. the fill editor opening
    /// gradient editing).
    pub fn transition_to(&mut self, state: Box<dyn InteractionState>) {
        let mut cx = Cx {
            doc: &mut self.doc,
            session: &mut self.session,
        };
        self.machine.transition_to(&mut cx, state);
    }

    pub fn edit_gradient(&mut self, node: NodeId) {
        self.transition_to(Box::new(GradientPointEditing::new(node)));
    }

    // ─── Pointer ─────────────────────────────────────────────────────────

    fn to_world(&self, ev: &PointerEvent) -> PointerEvent {
        let (x, y) = self.session.camera.screen_to_world(ev.screen_x, ev.screen_y);
        PointerEvent { x, y, ..*ev }
    }

    pub fn pointer_down(&mut self, ev: &PointerEvent) {
        let ev = self.to_world(ev);
        if ev.button == PointerButton::Middle {
            self.middle_down = true;
        }
        self.sync_overlay();
        if self.overlay.is_active() {
            self.overlay.handle_pointer_down(&mut self.session, &ev);
            return;
        }
        let mut cx = Cx {
            doc: &mut self.doc,
            session: &mut self.session,
        };
        self.machine.pointer_down(&mut cx, &ev);
    }

    pub fn pointer_move(&mut self, ev: &PointerEvent) {
        let ev = self.to_world(ev);
        if self.overlay.is_active() {
            self.overlay.handle_pointer_move(&mut self.session, &ev);
            return;
        }
        let mut cx = Cx {
            doc: &mut self.doc,
            session: &mut self.session,
        };
        self.machine.pointer_move(&mut cx, &ev);
    }

    pub fn pointer_up(&mut self, ev: &PointerEvent) {
        let ev = self.to_world(ev);
        if self.overlay.is_active() {
            // A press the overlay never saw belongs to the paused state
            let paused_press = !self.overlay.is_dragging() && ev.button == PointerButton::Primary;
            self.overlay.handle_pointer_up(&mut self.session, &ev);
            if paused_press {
                let mut cx = Cx {
                    doc: &mut self.doc,
                    session: &mut self.session,
                };
                self.machine.pointer_up(&mut cx, &ev);
            }
        } else {
            let mut cx = Cx {
                doc: &mut self.doc,
                session: &mut self.session,
            };
            self.machine.pointer_up(&mut cx, &ev);
        }
        if ev.button == PointerButton::Middle {
            self.middle_down = false;
        }
        self.sync_overlay();
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    pub fn key_down(&mut self, ev: &KeyEvent) {
        let editing_text = self.machine.kind() == StateKind::EditingText;
        if ev.is(" ") && !editing_text {
            self.space_held = true;
            self.sync_overlay();
            return;
        }

        let mut cx = Cx {
            doc: &mut self.doc,
            session: &mut self.session,
        };
        if editing_text {
            self.machine.key_down(&mut cx, ev);
            return;
        }
        if ev.is("Escape") && self.machine.kind() != StateKind::Idle {
            self.machine.cancel(&mut cx);
            return;
        }
        match cx.session.shortcuts.resolve(&ev.key, ev.modifiers) {
            Some(ShortcutAction::Tool(tool)) => self.set_tool(tool),
            Some(ShortcutAction::Undo) => {
                self.undo();
            }
            Some(ShortcutAction::Redo) => {
                self.redo();
            }
            _ => self.machine.key_down(&mut cx, ev),
        }
    }

    pub fn key_up(&mut self, ev: &KeyEvent) {
        if ev.is(" ") && self.space_held {
            self.space_held = false;
            self.sync_overlay();
            return;
        }
        let mut cx = Cx {
            doc: &mut self.doc,
            session: &mut self.session,
        };
        self.machine.key_up(&mut cx, ev);
    }

    /// Window lost focus: cancel the gesture and drop held keys.
    pub fn blur(&mut self) {
        self.space_held = false;
        self.middle_down = false;
        self.sync_overlay();
        let mut cx = Cx {
            doc: &mut self.doc,
            session: &mut self.session,
        };
        self.machine.cancel(&mut cx);
    }

    // ─── Tools & history ─────────────────────────────────────────────────

    pub fn set_tool(&mut self, tool: ToolKind) {
        let prev = self.session.tool();
        if prev == tool {
            return;
        }
        self.session.set_tool(tool);
        let mut cx = Cx {
            doc: &mut self.doc,
            session: &mut self.session,
        };
        self.machine.tool_changed(&mut cx, prev, tool);
        self.sync_overlay();
    }

    /// Undo one step. Only accepted while idle.
    pub fn undo(&mut self) -> bool {
        self.step_history(Document::undo)
    }

    /// Redo one step. Only accepted while idle.
    pub fn redo(&mut self) -> bool {
        self.step_history(Document::redo)
    }

    fn step_history(&mut self, step: fn(&mut Document) -> bool) -> bool {
        if self.machine.kind() != StateKind::Idle {
            log::debug!("history step ignored during {:?}", self.machine.kind());
            return false;
        }
        let done = step(&mut self.doc);
        if done {
            self.session.selection.retain_existing(self.doc.graph());
        }
        done
    }

    // ─── Frames ──────────────────────────────────────────────────────────

    /// Advance layout animations by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.doc.tick_animations(dt)
    }

    /// Whether anything asked for a redraw since the last call.
    pub fn take_redraw(&mut self) -> bool {
        let doc = self.doc.take_frame_request();
        let session = self.session.take_frame_request();
        let selection = self.session.selection.take_changed();
        doc || session || selection
    }

    pub fn render(&self, surface: &mut dyn OverlaySurface) {
        if self.overlay.is_active() {
            return;
        }
        self.machine.render(&self.doc, &self.session, surface);
    }

    /// Activate or exit the hand overlay to match tool and held inputs.
    /// Never touches the active state.
    fn sync_overlay(&mut self) {
        let editing_text = self.machine.kind() == StateKind::EditingText;
        let wanted = self.session.tool() == ToolKind::Hand
            || (self.space_held && !editing_text)
            || self.middle_down;
        match (wanted, self.overlay.is_active()) {
            (true, false) => {
                log::debug!("hand overlay on");
                self.overlay.activate(&mut self.session);
            }
            (false, true) if !self.overlay.is_dragging() => {
                log::debug!("hand overlay off");
                self.overlay.exit(&mut self.session);
            }
            _ => {}
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(SceneGraph::new(), Viewport::default(), EditorConfig::default())
    }
}
