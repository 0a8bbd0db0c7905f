use super::part::shape_schema;
use crate::gateway::{Field, OutputSchema};
use crate::shape::{unique_id, RawShape, Shape};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Finalizer edit over a complete shape list
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeDiff {
    pub add: Vec<Shape>,
    /// Replacements, matched by id
    pub modify: Vec<Shape>,
    pub remove: Vec<String>,
}

impl ShapeDiff {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.modify.is_empty() && self.remove.is_empty()
    }
}

/// Diff as returned by the model
#[derive(Debug, Default, Deserialize)]
pub struct RawShapeDiff {
    #[serde(default)]
    pub add: Vec<RawShape>,
    #[serde(default)]
    pub modify: Vec<RawShape>,
    #[serde(default)]
    pub remove: Vec<Value>,
}

impl RawShapeDiff {
    /// Normalize every entry; modify entries without an id are dropped
    pub fn normalize(self) -> ShapeDiff {
        let add = self
            .add
            .into_iter()
            .enumerate()
            .map(|(i, raw)| raw.normalize(|| format!("final_{}", i + 1)))
            .collect();
        let modify = self
            .modify
            .into_iter()
            .filter(|raw| raw.id_string().is_some())
            .map(|raw| raw.normalize(String::new))
            .collect();
        let remove = self
            .remove
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect();
        ShapeDiff { add, modify, remove }
    }
}

/// Apply a diff in the order remove, modify, add.
///
/// Modified shapes replace their match wholesale; modifications of unknown
/// ids are ignored. Added shapes whose id is already present get a suffix.
/// The rectangles-only constraint is applied to modified and added shapes.
pub fn apply_diff(shapes: &[Shape], diff: &ShapeDiff, enable_ellipses: bool) -> Vec<Shape> {
    let removed: HashSet<&str> = diff.remove.iter().map(String::as_str).collect();
    let mut result: Vec<Shape> = shapes
        .iter()
        .filter(|shape| !removed.contains(shape.id.as_str()))
        .cloned()
        .collect();

    for modified in &diff.modify {
        if let Some(slot) = result.iter_mut().find(|shape| shape.id == modified.id) {
            *slot = modified.clone().enforce_kind(enable_ellipses);
        }
    }

    let mut taken: HashSet<String> = result.iter().map(|s| s.id.clone()).collect();
    for added in &diff.add {
        let mut shape = added.clone().enforce_kind(enable_ellipses);
        shape.id = unique_id(shape.id, &mut taken);
        result.push(shape);
    }

    result
}

pub(crate) fn diff_schema(grid_size: u32, enable_ellipses: bool) -> OutputSchema {
    OutputSchema::object(vec![
        Field::new("add", OutputSchema::array(shape_schema(grid_size, enable_ellipses)))
            .describe("New shapes to add"),
        Field::new("modify", OutputSchema::array(shape_schema(grid_size, enable_ellipses)))
            .describe("Existing shapes with their updated properties"),
        Field::new("remove", OutputSchema::array(OutputSchema::string()))
            .describe("Ids of shapes to remove"),
    ])
}
