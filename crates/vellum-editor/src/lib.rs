//! Editing engine for the Vellum canvas: mutation batches, lazy-inverse
//! undo/redo, layout-change animation and the interaction state machine.

pub mod action;
pub mod animation;
pub mod batch;
pub mod camera;
pub mod commands;
pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod history;
pub mod input;
pub mod overlay;
pub mod selection;
pub mod session;
pub mod shortcuts;
pub mod snapping;
pub mod states;
pub mod surface;
pub mod tools;

pub use action::{Action, FunctionAction};
pub use batch::MutationBatch;
pub use config::EditorConfig;
pub use document::{CommitOptions, Document, DocumentEvent};
pub use editor::Editor;
pub use error::ConfigError;
pub use history::{ChangeRecord, History};
pub use input::{KeyEvent, Modifiers, PointerButton, PointerEvent};
pub use states::{InteractionState, StateKind, StateMachine};
pub use tools::ToolKind;
