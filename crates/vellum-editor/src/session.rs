//! Per-editor interaction context.
//!
//! Everything the interaction states need besides the document itself:
//! configuration, selection, camera, snapping, the text-input host, the
//! active tool and the cursor. States receive it as part of
//! [`Cx`](crate::states::Cx).

use crate::camera::Camera;
use crate::config::EditorConfig;
use crate::selection::SelectionManager;
use crate::shortcuts::ShortcutMap;
use crate::snapping::{GuideSnapper, Snapper};
use crate::tools::ToolKind;
use std::cell::RefCell;
use std::rc::Rc;
use vellum_core::NodeId;

/// Cursor the host should show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
    Move,
    Crosshair,
    Text,
    Grab,
    Grabbing,
    ResizeNs,
    ResizeEw,
    ResizeNwse,
    ResizeNesw,
    Rotate,
}

// ─── Text input host ─────────────────────────────────────────────────────

/// Host-side rich text editor used while a text node is being edited.
pub trait TextEditorHost {
    /// Start editing `node`, seeded with `text`.
    fn begin(&mut self, node: NodeId, text: &str);

    /// Stop editing and hand back the final text, or `None` if nothing was
    /// being edited.
    fn end(&mut self) -> Option<String>;

    fn is_active(&self) -> bool;
}

#[derive(Debug, Default)]
struct TextBuffer {
    node: Option<NodeId>,
    text: String,
}

/// In-memory host. Clones share one buffer, so a caller can keep a handle
/// and type into it while the editor owns the boxed copy.
#[derive(Debug, Clone, Default)]
pub struct BufferedTextHost {
    buffer: Rc<RefCell<TextBuffer>>,
}

impl BufferedTextHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, text: &str) {
        self.buffer.borrow_mut().text.push_str(text);
    }

    pub fn replace(&self, text: &str) {
        self.buffer.borrow_mut().text = text.to_string();
    }

    pub fn text(&self) -> String {
        self.buffer.borrow().text.clone()
    }

    pub fn editing(&self) -> Option<NodeId> {
        self.buffer.borrow().node
    }
}

impl TextEditorHost for BufferedTextHost {
    fn begin(&mut self, node: NodeId, text: &str) {
        let mut buffer = self.buffer.borrow_mut();
        buffer.node = Some(node);
        buffer.text = text.to_string();
    }

    fn end(&mut self) -> Option<String> {
        let mut buffer = self.buffer.borrow_mut();
        buffer.node.take()?;
        Some(std::mem::take(&mut buffer.text))
    }

    fn is_active(&self) -> bool {
        self.buffer.borrow().node.is_some()
    }
}

// ─── Session ─────────────────────────────────────────────────────────────

pub struct Session {
    pub config: EditorConfig,
    pub selection: SelectionManager,
    pub camera: Camera,
    pub snapper: Box<dyn Snapper>,
    pub text_host: Box<dyn TextEditorHost>,
    pub shortcuts: ShortcutMap,
    /// Node under the pointer while idle.
    pub hovered: Option<NodeId>,
    tool: ToolKind,
    cursor: Cursor,
    /// Cleared while an overlay mode owns the pointer.
    interactive: bool,
    frame_requests: u32,
}

impl Session {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            selection: SelectionManager::new(),
            camera: Camera::new(config.min_zoom, config.max_zoom),
            snapper: Box::new(GuideSnapper::new(config.snap_threshold)),
            text_host: Box::new(BufferedTextHost::new()),
            shortcuts: ShortcutMap,
            hovered: None,
            tool: ToolKind::Select,
            cursor: Cursor::Default,
            interactive: true,
            frame_requests: 0,
            config,
        }
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    /// Switch tool without notifying the active state.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if self.tool != tool {
            log::debug!("tool {:?} -> {tool:?}", self.tool);
            self.tool = tool;
            self.request_frame();
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    /// Convert a screen-pixel length (handle size, thresholds) to world units.
    pub fn world_len(&self, screen_px: f32) -> f32 {
        self.camera.screen_len(screen_px)
    }

    pub fn request_frame(&mut self) {
        self.frame_requests = self.frame_requests.saturating_add(1);
    }

    /// Whether a redraw was requested since last asked.
    pub fn take_frame_request(&mut self) -> bool {
        std::mem::take(&mut self.frame_requests) > 0
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}
