//! Characters and items: identified, named shape collections with metadata.

use crate::shape::{self, Shape};
use uuid::Uuid;

mod character;
mod item;

#[cfg(test)]
mod tests;

pub use character::{Character, CharacterMetadata, EquipmentSlot, Version};
pub use item::{Item, ItemMetadata, ItemReference};

/// Grid size entities are authored on unless configured otherwise
pub const DEFAULT_GRID_SIZE: u32 = 128;

pub(crate) fn default_grid_size() -> u32 {
    DEFAULT_GRID_SIZE
}

/// Fresh process-unique entity identifier
pub fn new_entity_id() -> String {
    Uuid::new_v4().to_string()
}

/// Common view over characters and items, used by rendering and storage
pub trait Entity {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn grid_size(&self) -> u32;

    fn shapes(&self) -> &[Shape];

    /// Name for display, with a placeholder when unnamed
    fn display_name(&self) -> &str {
        if self.name().trim().is_empty() {
            "Unnamed"
        } else {
            self.name()
        }
    }

    /// Shapes rescaled onto another grid size
    fn scale_shapes(&self, target_grid_size: u32) -> Vec<Shape> {
        shape::rescale(self.shapes(), self.grid_size(), target_grid_size)
    }
}
