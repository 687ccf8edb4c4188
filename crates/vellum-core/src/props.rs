//! Node property bag: keys, values, paints and partial patches.
//!
//! Every editable attribute of a node lives in a `PropertyMap` keyed by a
//! closed `PropKey` set. Edits travel as `PropertyPatch` values, where a
//! `None` entry removes the authored value so the node falls back to its
//! prototype or kind default.

use crate::id::VariableId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ─── Colors & Paint ──────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// A gradient stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub offset: f32, // 0.0 .. 1.0
    pub color: Color,
}

/// A control point of a mesh gradient, in node-normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshPoint {
    pub x: f32,
    pub y: f32,
    pub color: Color,
}

/// A `columns × rows` grid of colored control points spanning the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshGradient {
    pub columns: u16,
    pub rows: u16,
    pub points: Vec<MeshPoint>,
}

impl MeshGradient {
    /// Evenly spaced grid, every point painted `color`.
    pub fn uniform(columns: u16, rows: u16, color: Color) -> Self {
        let mut points = Vec::with_capacity(columns as usize * rows as usize);
        for row in 0..rows {
            for col in 0..columns {
                points.push(MeshPoint {
                    x: col as f32 / (columns.max(2) - 1) as f32,
                    y: row as f32 / (rows.max(2) - 1) as f32,
                    color,
                });
            }
        }
        Self {
            columns,
            rows,
            points,
        }
    }
}

/// Fill paint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Paint {
    Solid(Color),
    LinearGradient {
        angle: f32, // degrees
        stops: Vec<GradientStop>,
    },
    Mesh(MeshGradient),
}

// ─── Layout mode ─────────────────────────────────────────────────────────

/// How a container arranges its children.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum LayoutMode {
    /// Free / absolute positioning of children.
    #[default]
    Free,
    /// Column (vertical stack).
    Column { gap: f32, pad: f32 },
    /// Row (horizontal stack).
    Row { gap: f32, pad: f32 },
    /// Grid layout.
    Grid { cols: u32, gap: f32, pad: f32 },
}

impl LayoutMode {
    /// Whether the layout engine owns child positions.
    pub fn is_auto(&self) -> bool {
        !matches!(self, LayoutMode::Free)
    }
}

// ─── Keys & values ───────────────────────────────────────────────────────

/// Every property a node can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PropKey {
    /// Parent-relative x of the top-left corner.
    X,
    /// Parent-relative y of the top-left corner.
    Y,
    Width,
    Height,
    /// Degrees, clockwise, about the node centre.
    Rotation,
    CornerRadius,
    Opacity,
    Fill,
    Text,
    FontSize,
    Layout,
    Visible,
    Name,
    /// Instance override: children may be restructured.
    ChildrenOverridden,
    /// Container inside an instance that accepts foreign children.
    Slot,
}

/// A property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropValue {
    Number(f32),
    Bool(bool),
    Text(String),
    Paint(Paint),
    Layout(LayoutMode),
    /// Bound to a document variable; substituted during resolution.
    Variable(VariableId),
}

impl PropValue {
    pub fn as_number(&self) -> Option<f32> {
        match self {
            PropValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_paint(&self) -> Option<&Paint> {
        match self {
            PropValue::Paint(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_layout(&self) -> Option<LayoutMode> {
        match self {
            PropValue::Layout(l) => Some(*l),
            _ => None,
        }
    }
}

impl From<f32> for PropValue {
    fn from(n: f32) -> Self {
        PropValue::Number(n)
    }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        PropValue::Bool(b)
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        PropValue::Text(s.to_string())
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        PropValue::Text(s)
    }
}

impl From<Paint> for PropValue {
    fn from(p: Paint) -> Self {
        PropValue::Paint(p)
    }
}

impl From<LayoutMode> for PropValue {
    fn from(l: LayoutMode) -> Self {
        PropValue::Layout(l)
    }
}

impl From<VariableId> for PropValue {
    fn from(v: VariableId) -> Self {
        PropValue::Variable(v)
    }
}

// ─── Property map ────────────────────────────────────────────────────────

/// Complete set of values on a node (authored or resolved).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyMap(BTreeMap<PropKey, PropValue>);

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: PropKey, value: impl Into<PropValue>) -> Self {
        self.0.insert(key, value.into());
        self
    }

    pub fn get(&self, key: PropKey) -> Option<&PropValue> {
        self.0.get(&key)
    }

    pub fn set(&mut self, key: PropKey, value: PropValue) -> Option<PropValue> {
        self.0.insert(key, value)
    }

    pub fn remove(&mut self, key: PropKey) -> Option<PropValue> {
        self.0.remove(&key)
    }

    pub fn number(&self, key: PropKey) -> Option<f32> {
        self.get(key).and_then(PropValue::as_number)
    }

    pub fn flag(&self, key: PropKey) -> bool {
        self.get(key).and_then(PropValue::as_bool).unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PropKey, &PropValue)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overwrite entries from `other`.
    pub fn merge(&mut self, other: &PropertyMap) {
        for (k, v) in other.iter() {
            self.0.insert(k, v.clone());
        }
    }

    /// Apply a patch, returning the previous value of every patched key.
    pub fn apply(&mut self, patch: &PropertyPatch) -> PropertyPatch {
        let mut previous = PropertyPatch::new();
        for (key, value) in patch.iter() {
            let old = match value {
                Some(v) => self.0.insert(key, v.clone()),
                None => self.0.remove(&key),
            };
            previous.0.insert(key, old);
        }
        previous
    }

    /// Current values of `keys` as a patch (`None` where unset).
    pub fn capture(&self, keys: impl IntoIterator<Item = PropKey>) -> PropertyPatch {
        let mut patch = PropertyPatch::new();
        for key in keys {
            patch.0.insert(key, self.0.get(&key).cloned());
        }
        patch
    }
}

// ─── Patch ───────────────────────────────────────────────────────────────

/// Partial property edit. `None` clears the authored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyPatch(BTreeMap<PropKey, Option<PropValue>>);

impl PropertyPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style set.
    pub fn set(mut self, key: PropKey, value: impl Into<PropValue>) -> Self {
        self.0.insert(key, Some(value.into()));
        self
    }

    /// Builder-style clear.
    pub fn clear(mut self, key: PropKey) -> Self {
        self.0.insert(key, None);
        self
    }

    pub fn insert(&mut self, key: PropKey, value: Option<PropValue>) {
        self.0.insert(key, value);
    }

    pub fn get(&self, key: PropKey) -> Option<&Option<PropValue>> {
        self.0.get(&key)
    }

    pub fn contains_key(&self, key: PropKey) -> bool {
        self.0.contains_key(&key)
    }

    pub fn remove(&mut self, key: PropKey) -> Option<Option<PropValue>> {
        self.0.remove(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = PropKey> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PropKey, Option<&PropValue>)> {
        self.0.iter().map(|(k, v)| (*k, v.as_ref()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Drop entries for which `keep` returns false.
    pub fn retain(&mut self, mut keep: impl FnMut(PropKey, Option<&PropValue>) -> bool) {
        self.0.retain(|k, v| keep(*k, v.as_ref()));
    }

    /// Fill in entries from `other` that this patch does not mention yet.
    pub fn absorb_missing(&mut self, other: PropertyPatch) {
        for (k, v) in other.0 {
            self.0.entry(k).or_insert(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_returns_previous_values() {
        let mut props = PropertyMap::new().with(PropKey::X, 10.0);
        let patch = PropertyPatch::new()
            .set(PropKey::X, 20.0)
            .set(PropKey::Y, 5.0);

        let previous = props.apply(&patch);

        assert_eq!(props.number(PropKey::X), Some(20.0));
        assert_eq!(props.number(PropKey::Y), Some(5.0));
        assert_eq!(previous.get(PropKey::X), Some(&Some(PropValue::Number(10.0))));
        assert_eq!(previous.get(PropKey::Y), Some(&None));

        // Applying the previous values restores the map exactly.
        props.apply(&previous);
        assert_eq!(props, PropertyMap::new().with(PropKey::X, 10.0));
    }

    #[test]
    fn capture_records_unset_keys() {
        let props = PropertyMap::new().with(PropKey::Width, 40.0);
        let snap = props.capture([PropKey::Width, PropKey::Height]);
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.get(PropKey::Height), Some(&None));
    }

    #[test]
    fn absorb_missing_keeps_existing_entries() {
        let mut a = PropertyPatch::new().set(PropKey::X, 1.0);
        a.absorb_missing(PropertyPatch::new().set(PropKey::X, 9.0).set(PropKey::Y, 2.0));
        assert_eq!(a.get(PropKey::X), Some(&Some(PropValue::Number(1.0))));
        assert_eq!(a.get(PropKey::Y), Some(&Some(PropValue::Number(2.0))));
    }

    #[test]
    fn uniform_mesh_spans_unit_square() {
        let mesh = MeshGradient::uniform(3, 2, Color::WHITE);
        assert_eq!(mesh.points.len(), 6);
        assert_eq!((mesh.points[0].x, mesh.points[0].y), (0.0, 0.0));
        assert_eq!((mesh.points[5].x, mesh.points[5].y), (1.0, 1.0));
        assert_eq!(mesh.points[1].x, 0.5);
    }
}
