//! Equip geometry: place an item's shapes onto a character.
//!
//! A [`Transform`] scales, rotates and moves the item as one group around the
//! center of its bounding box, then stamps every shape with one z-index.

use crate::error::ParseError;
use crate::shape::{round_half_up, unique_id, Shape};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

mod equip;
mod propose;


pub use equip::{equip, open_slot, unequip};
pub use propose::{
    check_compatibility, equip_candidates, propose_transform, Candidate, Compatibility,
};

/// Where the item's center lands on the character grid
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anchor {
    AbsoluteCenter { x: f64, y: f64 },
    /// Fractions of the grid size, measured from the grid center
    OffsetFromCenter { dx: f64, dy: f64 },
}

impl Anchor {
    /// Absolute center on a grid of `grid_size`
    pub fn resolve(&self, grid_size: u32) -> (f64, f64) {
        match *self {
            Anchor::AbsoluteCenter { x, y } => (x, y),
            Anchor::OffsetFromCenter { dx, dy } => {
                let grid = grid_size as f64;
                (grid / 2.0 + dx * grid, grid / 2.0 + dy * grid)
            }
        }
    }
}

/// Placement of an item group on a character
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub scale: f64,
    pub anchor: Anchor,
    pub rotation_degrees: f64,
    /// Applied to every shape of the item
    pub z_index: i32,
}

/// Axis-aligned bounds of a shape list
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// `None` for an empty list
    pub fn of(shapes: &[Shape]) -> Option<Self> {
        let first = shapes.first()?;
        let init = BoundingBox {
            min_x: first.x as f64,
            min_y: first.y as f64,
            max_x: first.right() as f64,
            max_y: first.bottom() as f64,
        };
        Some(shapes.iter().skip(1).fold(init, |b, s| BoundingBox {
            min_x: b.min_x.min(s.x as f64),
            min_y: b.min_y.min(s.y as f64),
            max_x: b.max_x.max(s.right() as f64),
            max_y: b.max_y.max(s.bottom() as f64),
        }))
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Transform item shapes authored on `item_grid` onto `character_grid`.
///
/// Each shape's top-left corner is taken relative to the item's bounding-box
/// center, rotated, scaled by `scale * character_grid / item_grid` and placed
/// around the anchor. Coordinates and sizes are rounded half up. Ids and
/// colors are kept; `scale` and the transform's z-index are stamped on.
pub fn apply_transform(
    shapes: &[Shape],
    transform: &Transform,
    character_grid: u32,
    item_grid: u32,
) -> Vec<Shape> {
    let Some(bounds) = BoundingBox::of(shapes) else {
        return Vec::new();
    };
    if item_grid == 0 {
        return Vec::new();
    }

    let (item_cx, item_cy) = bounds.center();
    let (center_x, center_y) = transform.anchor.resolve(character_grid);
    let factor = transform.scale * (character_grid as f64 / item_grid as f64);
    let (sin, cos) = transform.rotation_degrees.to_radians().sin_cos();

    shapes
        .iter()
        .map(|shape| {
            let rel_x = shape.x as f64 - item_cx;
            let rel_y = shape.y as f64 - item_cy;
            let rot_x = rel_x * cos - rel_y * sin;
            let rot_y = rel_x * sin + rel_y * cos;

            Shape {
                x: round_half_up(center_x + rot_x * factor),
                y: round_half_up(center_y + rot_y * factor),
                width: round_half_up(shape.width as f64 * factor).max(0) as u32,
                height: round_half_up(shape.height as f64 * factor).max(0) as u32,
                z_index: transform.z_index,
                scale: Some(transform.scale),
                ..shape.clone()
            }
        })
        .collect()
}

/// Append placed item shapes to a character's shape list.
///
/// Item ids become `<slot>_<id>`, suffixed where the character already uses
/// them, so ids stay unique after repeated equips.
pub fn merge_placed(character_shapes: &[Shape], placed: Vec<Shape>, slot_id: &str) -> Vec<Shape> {
    let mut taken: HashSet<String> = character_shapes.iter().map(|s| s.id.clone()).collect();
    let mut merged = character_shapes.to_vec();
    merged.extend(placed.into_iter().map(|mut shape| {
        shape.id = unique_id(format!("{}_{}", slot_id, shape.id), &mut taken);
        shape
    }));
    merged
}

/// Transform as returned by the model, in either anchor form
#[derive(Debug, Default, Deserialize)]
pub struct RawTransform {
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(default, alias = "centerX")]
    pub center_x: Option<f64>,
    #[serde(default, alias = "centerY")]
    pub center_y: Option<f64>,
    #[serde(default, alias = "xOffset")]
    pub x_offset: Option<f64>,
    #[serde(default, alias = "yOffset")]
    pub y_offset: Option<f64>,
    #[serde(default)]
    pub rotation: Option<f64>,
    #[serde(default, alias = "zIndex")]
    pub z_index: Option<f64>,
}

impl RawTransform {
    /// Absolute center wins when both forms are present; neither is an error
    pub fn normalize(self) -> Result<Transform, ParseError> {
        let scale = self
            .scale
            .filter(|s| s.is_finite() && *s > 0.0)
            .ok_or_else(|| ParseError::Schema("transform scale must be a positive number".to_string()))?;

        let anchor = match (self.center_x, self.center_y, self.x_offset, self.y_offset) {
            (Some(x), Some(y), _, _) => Anchor::AbsoluteCenter { x, y },
            (_, _, Some(dx), Some(dy)) => Anchor::OffsetFromCenter { dx, dy },
            _ => {
                return Err(ParseError::Schema(
                    "transform needs centerX/centerY or xOffset/yOffset".to_string(),
                ))
            }
        };

        Ok(Transform {
            scale,
            anchor,
            rotation_degrees: self.rotation.filter(|r| r.is_finite()).unwrap_or(0.0),
            z_index: round_half_up(self.z_index.unwrap_or(0.0)),
        })
    }
}

/// `{"transform": {...}}`
#[derive(Debug, Default, Deserialize)]
pub struct RawTransformResponse {
    #[serde(default)]
    pub transform: RawTransform,
}
