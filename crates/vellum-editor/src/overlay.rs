//! Hand (pan) overlay mode.
//!
//! Sits above the state machine: while active it receives pointer events
//! instead of the current state and pans the camera. Activating or exiting
//! never runs the state's enter/exit hooks, so a gesture underneath is
//! simply paused.

use crate::input::PointerEvent;
use crate::session::{Cursor, Session};

#[derive(Debug, Default)]
pub struct HandOverlay {
    /// Cursor and interactivity to restore on exit; `Some` while active.
    saved: Option<(Cursor, bool)>,
    /// Last screen position while dragging.
    drag_from: Option<(f32, f32)>,
}

impl HandOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.saved.is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_from.is_some()
    }

    pub fn activate(&mut self, session: &mut Session) {
        if self.saved.is_some() {
            return;
        }
        self.saved = Some((session.cursor(), session.is_interactive()));
        session.set_interactive(false);
        session.set_cursor(Cursor::Grab);
        session.request_frame();
        log::debug!("hand overlay on");
    }

    pub fn exit(&mut self, session: &mut Session) {
        let Some((cursor, interactive)) = self.saved.take() else {
            return;
        };
        self.drag_from = None;
        session.set_cursor(cursor);
        session.set_interactive(interactive);
        session.request_frame();
        log::debug!("hand overlay off");
    }

    pub fn handle_pointer_down(&mut self, session: &mut Session, ev: &PointerEvent) {
        self.drag_from = Some(ev.screen());
        session.set_cursor(Cursor::Grabbing);
    }

    pub fn handle_pointer_move(&mut self, session: &mut Session, ev: &PointerEvent) {
        let Some((fx, fy)) = self.drag_from else {
            return;
        };
        let (sx, sy) = ev.screen();
        session.camera.pan_by(sx - fx, sy - fy);
        self.drag_from = Some((sx, sy));
        session.request_frame();
    }

    pub fn handle_pointer_up(&mut self, session: &mut Session, _ev: &PointerEvent) {
        if self.drag_from.take().is_some() {
            session.set_cursor(Cursor::Grab);
        }
    }
}
