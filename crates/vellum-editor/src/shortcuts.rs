//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. `meta` (⌘) and
//! `ctrl` are treated alike so one table serves every platform.
//!
//! - Shift with an arrow key nudges by the large step
//! - Space is not listed here: holding it is handled by the hand overlay

use crate::input::Modifiers;
use crate::tools::ToolKind;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShortcutAction {
    // ── Tool switching ──
    Tool(ToolKind),

    // ── Edit ──
    Undo,
    Redo,
    Delete,
    Duplicate,
    SelectAll,
    Deselect,
    /// Move the selection by whole steps; `large` when Shift is held.
    Nudge { dx: f32, dy: f32, large: bool },

    // ── Z-order ──
    SendBackward,
    BringForward,
    SendToBack,
    BringToFront,
}

/// Resolves key events into shortcut actions.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(&self, key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let cmd = modifiers.command();
        let shift = modifiers.shift;

        if let Some((dx, dy)) = arrow(key) {
            if cmd {
                return None;
            }
            return Some(ShortcutAction::Nudge { dx, dy, large: shift });
        }

        // ── Modifier combos first (most specific) ──
        if cmd && shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                "[" | "{" => Some(ShortcutAction::SendToBack),
                "]" | "}" => Some(ShortcutAction::BringToFront),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "a" | "A" => Some(ShortcutAction::SelectAll),
                "d" | "D" => Some(ShortcutAction::Duplicate),
                "[" => Some(ShortcutAction::SendBackward),
                "]" => Some(ShortcutAction::BringForward),
                _ => None,
            };
        }

        if shift || modifiers.alt {
            return None;
        }

        // ── Single keys (no modifiers) ──
        match key {
            "v" | "V" => Some(ShortcutAction::Tool(ToolKind::Select)),
            "h" | "H" => Some(ShortcutAction::Tool(ToolKind::Hand)),
            "r" | "R" => Some(ShortcutAction::Tool(ToolKind::Rectangle)),
            "o" | "O" => Some(ShortcutAction::Tool(ToolKind::Ellipse)),
            "f" | "F" => Some(ShortcutAction::Tool(ToolKind::Frame)),
            "s" | "S" => Some(ShortcutAction::Tool(ToolKind::StickyNote)),
            "t" | "T" => Some(ShortcutAction::Tool(ToolKind::Text)),
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Deselect),
            _ => None,
        }
    }
}

fn arrow(key: &str) -> Option<(f32, f32)> {
    match key {
        "ArrowLeft" => Some((-1.0, 0.0)),
        "ArrowRight" => Some((1.0, 0.0)),
        "ArrowUp" => Some((0.0, -1.0)),
        "ArrowDown" => Some((0.0, 1.0)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd() -> Modifiers {
        Modifiers {
            meta: true,
            ..Modifiers::NONE
        }
    }

    #[test]
    fn resolve_tool_shortcuts() {
        let map = ShortcutMap;
        assert_eq!(
            map.resolve("v", Modifiers::NONE),
            Some(ShortcutAction::Tool(ToolKind::Select))
        );
        assert_eq!(
            map.resolve("r", Modifiers::NONE),
            Some(ShortcutAction::Tool(ToolKind::Rectangle))
        );
        assert_eq!(
            map.resolve("h", Modifiers::NONE),
            Some(ShortcutAction::Tool(ToolKind::Hand))
        );
        assert_eq!(
            map.resolve("t", Modifiers::NONE),
            Some(ShortcutAction::Tool(ToolKind::Text))
        );
    }

    #[test]
    fn resolve_undo_redo() {
        let map = ShortcutMap;
        // Cmd+Z → Undo
        assert_eq!(map.resolve("z", cmd()), Some(ShortcutAction::Undo));
        // Ctrl+Z → Undo
        assert_eq!(map.resolve("z", Modifiers::ctrl()), Some(ShortcutAction::Undo));
        // Cmd+Shift+Z → Redo
        let cmd_shift = Modifiers {
            shift: true,
            ..cmd()
        };
        assert_eq!(map.resolve("z", cmd_shift), Some(ShortcutAction::Redo));
        // Cmd+Y → Redo
        assert_eq!(map.resolve("y", cmd()), Some(ShortcutAction::Redo));
    }

    #[test]
    fn resolve_nudge_steps() {
        let map = ShortcutMap;
        assert_eq!(
            map.resolve("ArrowLeft", Modifiers::NONE),
            Some(ShortcutAction::Nudge {
                dx: -1.0,
                dy: 0.0,
                large: false
            })
        );
        assert_eq!(
            map.resolve("ArrowDown", Modifiers::shift()),
            Some(ShortcutAction::Nudge {
                dx: 0.0,
                dy: 1.0,
                large: true
            })
        );
    }

    #[test]
    fn resolve_z_order() {
        let map = ShortcutMap;
        assert_eq!(map.resolve("[", cmd()), Some(ShortcutAction::SendBackward));
        assert_eq!(map.resolve("]", cmd()), Some(ShortcutAction::BringForward));
        let cmd_shift = Modifiers {
            shift: true,
            ..cmd()
        };
        assert_eq!(map.resolve("]", cmd_shift), Some(ShortcutAction::BringToFront));
    }

    #[test]
    fn unbound_keys_resolve_to_none() {
        let map = ShortcutMap;
        assert_eq!(map.resolve("q", Modifiers::NONE), None);
        assert_eq!(map.resolve("v", Modifiers::shift()), None);
    }
}
