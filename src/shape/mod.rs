use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;


/// Primitive kind of a shape
///
/// Serialized as `"rectangle"` / `"circle"`, the labels the models are prompted with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    #[default]
    #[serde(rename = "rectangle")]
    Rectangle,
    #[serde(rename = "circle", alias = "ellipse")]
    Ellipse,
}

impl ShapeKind {
    /// Read a kind label leniently; anything unrecognised is a rectangle
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "circle" | "ellipse" | "oval" => ShapeKind::Ellipse,
            _ => ShapeKind::Rectangle,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Ellipse => "circle",
        }
    }
}

/// A positioned, colored, z-ordered primitive on an integer grid
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Unique within the owning entity
    pub id: String,

    #[serde(rename = "type", default)]
    pub kind: ShapeKind,

    /// Top-left corner in grid cells
    pub x: i32,
    pub y: i32,

    /// May extend past the grid edge; never clamped
    pub width: u32,
    pub height: u32,

    /// Hex color, e.g. "#FF0000"
    pub color: String,

    /// Lower values draw first
    #[serde(default)]
    pub z_index: i32,

    /// Set only on shapes produced by a compositing transform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

impl Shape {
    pub fn rectangle(
        id: impl Into<String>,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        color: impl Into<String>,
        z_index: i32,
    ) -> Self {
        Self {
            id: id.into(),
            kind: ShapeKind::Rectangle,
            x,
            y,
            width,
            height,
            color: color.into(),
            z_index,
            scale: None,
        }
    }

    pub fn ellipse(
        id: impl Into<String>,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        color: impl Into<String>,
        z_index: i32,
    ) -> Self {
        Self {
            kind: ShapeKind::Ellipse,
            ..Self::rectangle(id, x, y, width, height, color, z_index)
        }
    }

    /// Exclusive right edge
    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// Force the kind to rectangle when ellipses are disabled
    pub fn enforce_kind(mut self, allow_ellipses: bool) -> Self {
        if !allow_ellipses {
            self.kind = ShapeKind::Rectangle;
        }
        self
    }
}

/// Apply the rectangles-only constraint to every shape in a list
pub fn enforce_kinds(shapes: Vec<Shape>, allow_ellipses: bool) -> Vec<Shape> {
    shapes
        .into_iter()
        .map(|shape| shape.enforce_kind(allow_ellipses))
        .collect()
}

/// Reserve `base` in `taken`, suffixing `_2`, `_3`, ... when it is already used
pub fn unique_id(base: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(base.clone()) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", base, n);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Rescale shapes authored on one grid onto another grid
pub fn rescale(shapes: &[Shape], from_grid: u32, to_grid: u32) -> Vec<Shape> {
    if from_grid == 0 {
        return shapes.to_vec();
    }
    let factor = to_grid as f64 / from_grid as f64;
    shapes
        .iter()
        .map(|shape| Shape {
            x: round_half_up(shape.x as f64 * factor),
            y: round_half_up(shape.y as f64 * factor),
            width: round_half_up(shape.width as f64 * factor).max(0) as u32,
            height: round_half_up(shape.height as f64 * factor).max(0) as u32,
            ..shape.clone()
        })
        .collect()
}

/// Round to the nearest integer, halves toward positive infinity
///
/// Non-finite input maps to 0.
pub fn round_half_up(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    let rounded = (value + 0.5).floor();
    rounded.clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

/// Shape as returned by a model, before normalization
///
/// Every field is optional and numbers may be fractional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawShape {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, alias = "zIndex")]
    pub z_index: Option<f64>,
}

impl RawShape {
    /// Id as a string, if the model supplied a usable one
    pub fn id_string(&self) -> Option<String> {
        match &self.id {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Convert to a grid-aligned shape
    ///
    /// `fallback_id` is used when the model omitted the id. Missing numbers
    /// become 0, a missing color becomes black, negative sizes clamp to 0.
    pub fn normalize(self, fallback_id: impl FnOnce() -> String) -> Shape {
        let id = self.id_string().unwrap_or_else(fallback_id);
        let kind = self
            .kind
            .as_deref()
            .map(ShapeKind::from_label)
            .unwrap_or_default();
        let color = self
            .color
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "#000000".to_string());

        Shape {
            id,
            kind,
            x: round_half_up(self.x.unwrap_or(0.0)),
            y: round_half_up(self.y.unwrap_or(0.0)),
            width: round_half_up(self.width.unwrap_or(0.0)).max(0) as u32,
            height: round_half_up(self.height.unwrap_or(0.0)).max(0) as u32,
            color,
            z_index: round_half_up(self.z_index.unwrap_or(0.0)),
            scale: None,
        }
    }
}
