//! Editor tuning knobs.
//!
//! Every field has a sensible default, so a host only needs to supply the
//! values it wants to change:
//!
//! ```
//! use vellum_editor::config::EditorConfig;
//!
//! let config = EditorConfig::from_json(r#"{ "snapping": false }"#).unwrap();
//! assert!(!config.snapping);
//! assert_eq!(config.drag_threshold, 3.0);
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

// ─── Config ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Screen pixels the pointer must travel before a press becomes a drag.
    pub drag_threshold: f32,

    /// Side of a resize handle, in screen pixels.
    pub handle_size: f32,

    /// How far outside a corner the rotate zone reaches, in screen pixels.
    pub rotation_handle_distance: f32,

    /// Snap distance, in world units.
    pub snap_threshold: f32,

    /// Guide snapping while moving. Holding Ctrl disables it per gesture.
    pub snapping: bool,

    /// Oldest undo steps beyond this are dropped.
    pub max_undo_depth: usize,

    /// Exponential decay rate of layout-change offsets, per second.
    pub decay_rate: f32,

    /// Offsets below this (on both axes) snap to zero.
    pub settle_epsilon: f32,

    pub nudge_small: f32,
    pub nudge_large: f32,

    /// Size of a shape created by a click without dragging.
    pub default_shape_size: f32,

    /// Rotation increment with Shift held, in degrees.
    pub rotation_snap_degrees: f32,

    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 3.0,
            handle_size: 8.0,
            rotation_handle_distance: 24.0,
            snap_threshold: 6.0,
            snapping: true,
            max_undo_depth: 200,
            decay_rate: 18.0,
            settle_epsilon: 0.05,
            nudge_small: 1.0,
            nudge_large: 10.0,
            default_shape_size: 100.0,
            rotation_snap_degrees: 15.0,
            min_zoom: 0.05,
            max_zoom: 64.0,
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON config and validate it.
    ///
    /// # Errors
    /// Malformed JSON or out-of-range values.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a positive number, got {value}"),
                })
            }
        }

        if !(self.drag_threshold.is_finite() && self.drag_threshold >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "drag_threshold",
                reason: format!("must not be negative, got {}", self.drag_threshold),
            });
        }
        positive("handle_size", self.handle_size)?;
        positive("rotation_handle_distance", self.rotation_handle_distance)?;
        positive("snap_threshold", self.snap_threshold)?;
        positive("decay_rate", self.decay_rate)?;
        positive("settle_epsilon", self.settle_epsilon)?;
        positive("default_shape_size", self.default_shape_size)?;
        positive("rotation_snap_degrees", self.rotation_snap_degrees)?;
        positive("min_zoom", self.min_zoom)?;
        if self.max_undo_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "max_undo_depth",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_zoom < self.min_zoom {
            return Err(ConfigError::Invalid {
                field: "max_zoom",
                reason: format!("{} is below min_zoom {}", self.max_zoom, self.min_zoom),
            });
        }
        Ok(())
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
