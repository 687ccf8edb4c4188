//! Tool palette.
//!
//! The active tool decides what a press on the canvas starts:
//!
//! | Tool | Press on canvas |
//! |------|-----------------|
//! | Select | select / move / resize / rotate / marquee |
//! | Hand | pan (handled by the overlay, not the state machine) |
//! | Rectangle, Ellipse, Frame, StickyNote | draw a shape |
//! | Text | place a text node and start editing it |

use crate::session::Cursor;
use vellum_core::NodeKind;

/// The active tool determines how input events are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToolKind {
    #[default]
    Select,
    Hand,
    Rectangle,
    Ellipse,
    Frame,
    StickyNote,
    Text,
}

impl ToolKind {
    /// Node kind drawn by a drag with this tool, if it is a drawing tool.
    pub fn shape_kind(self) -> Option<NodeKind> {
        match self {
            ToolKind::Rectangle => Some(NodeKind::Rectangle),
            ToolKind::Ellipse => Some(NodeKind::Ellipse),
            ToolKind::Frame => Some(NodeKind::Frame),
            ToolKind::StickyNote => Some(NodeKind::StickyNote),
            ToolKind::Select | ToolKind::Hand | ToolKind::Text => None,
        }
    }

    /// Resting cursor while the tool is active.
    pub fn cursor(self) -> Cursor {
        match self {
            ToolKind::Select => Cursor::Default,
            ToolKind::Hand => Cursor::Grab,
            ToolKind::Text => Cursor::Text,
            ToolKind::Rectangle | ToolKind::Ellipse | ToolKind::Frame | ToolKind::StickyNote => {
                Cursor::Crosshair
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_shape_tools_draw() {
        assert_eq!(ToolKind::Rectangle.shape_kind(), Some(NodeKind::Rectangle));
        assert_eq!(ToolKind::StickyNote.shape_kind(), Some(NodeKind::StickyNote));
        assert_eq!(ToolKind::Text.shape_kind(), None);
        assert_eq!(ToolKind::Hand.shape_kind(), None);
    }
}
