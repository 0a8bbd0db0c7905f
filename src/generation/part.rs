use super::plan::PartSpec;
use crate::gateway::{Field, OutputSchema};
use crate::shape::{unique_id, RawShape, Shape};
use serde::Deserialize;
use std::collections::HashSet;

/// `{"shapes": [...]}` as returned by the model
#[derive(Debug, Default, Deserialize)]
pub struct RawShapeList {
    #[serde(default)]
    pub shapes: Vec<RawShape>,
}

/// Schema for one shape; the `type` enum follows the ellipse flag
pub(crate) fn shape_schema(grid_size: u32, enable_ellipses: bool) -> OutputSchema {
    let last = grid_size.saturating_sub(1);
    let kinds: &[&str] = if enable_ellipses {
        &["rectangle", "circle"]
    } else {
        &["rectangle"]
    };
    let mut fields = vec![
        Field::new("id", OutputSchema::string()).describe("Unique identifier for this shape"),
        Field::new("type", OutputSchema::string_enum(kinds)).describe("Shape type"),
    ];
    fields.extend([
        Field::new("x", OutputSchema::number()).describe(format!("Top-left X coordinate (0 to {})", last)),
        Field::new("y", OutputSchema::number()).describe(format!("Top-left Y coordinate (0 to {})", last)),
        Field::new("width", OutputSchema::number()).describe("Width of the shape"),
        Field::new("height", OutputSchema::number()).describe("Height of the shape"),
        Field::new("color", OutputSchema::string()).describe("Hex color code (e.g., \"#FF0000\")"),
        Field::new("z_index", OutputSchema::number()).describe("Layer order (0 = bottom layer)"),
    ]);
    OutputSchema::object(fields)
}

pub(crate) fn shape_list_schema(grid_size: u32, enable_ellipses: bool) -> OutputSchema {
    OutputSchema::object(vec![Field::new(
        "shapes",
        OutputSchema::array(shape_schema(grid_size, enable_ellipses)),
    )])
}

/// Normalize a part's raw shapes and namespace their ids with the part id.
///
/// Ids become `<part>_<shape>`; shapes without an id get `shape_<n>`. Ids
/// already used by `existing` are suffixed so every id stays unique.
pub fn namespace_shapes(
    part: &PartSpec,
    raw: Vec<RawShape>,
    existing: &[Shape],
    enable_ellipses: bool,
) -> Vec<Shape> {
    let mut taken: HashSet<String> = existing.iter().map(|s| s.id.clone()).collect();
    raw.into_iter()
        .enumerate()
        .map(|(i, raw)| {
            let mut shape = raw
                .normalize(|| format!("shape_{}", i + 1))
                .enforce_kind(enable_ellipses);
            shape.id = unique_id(format!("{}_{}", part.id, shape.id), &mut taken);
            shape
        })
        .collect()
}
