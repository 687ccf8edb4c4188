//! Host-agnostic input events.

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Self::NONE
        }
    }

    /// Platform command key: ⌘ on macOS, Ctrl elsewhere.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PointerButton {
    #[default]
    Primary,
    Middle,
    Secondary,
}

/// A pointer event. The host fills in screen coordinates; the editor
/// derives world coordinates from the camera before dispatching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub screen_x: f32,
    pub screen_y: f32,
    /// World (canvas) coordinates.
    pub x: f32,
    pub y: f32,
    pub button: PointerButton,
    pub modifiers: Modifiers,
    /// 1 for a single click, 2 for a double click, ...
    pub click_count: u8,
}

impl PointerEvent {
    pub fn new(screen_x: f32, screen_y: f32) -> Self {
        Self {
            screen_x,
            screen_y,
            x: screen_x,
            y: screen_y,
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
            click_count: 1,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    pub fn with_clicks(mut self, click_count: u8) -> Self {
        self.click_count = click_count;
        self
    }

    pub fn world(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    pub fn screen(&self) -> (f32, f32) {
        (self.screen_x, self.screen_y)
    }
}

/// A key event. `key` follows `KeyboardEvent.key` (`"z"`, `"Escape"`, `" "`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn is(&self, key: &str) -> bool {
        self.key == key
    }
}
