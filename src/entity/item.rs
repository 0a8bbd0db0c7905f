use super::{default_grid_size, new_entity_id, Entity, DEFAULT_GRID_SIZE};
use crate::shape::Shape;
use crate::stats::{Abilities, Rarity};
use serde::{Deserialize, Serialize};

/// Recorded when an item is saved
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMetadata {
    #[serde(default)]
    pub stats: Abilities,
    /// Weapon, Armor, Accessory, ...
    #[serde(rename = "type", default)]
    pub item_type: String,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub generation_prompt: String,
}

/// A generated equippable item
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub shapes: Vec<Shape>,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_grid_size")]
    pub grid_size: u32,
    #[serde(default)]
    pub metadata: Option<ItemMetadata>,
    #[serde(default)]
    pub generation_prompt: String,
}

impl Item {
    pub fn new(shapes: Vec<Shape>, grid_size: u32, generation_prompt: impl Into<String>) -> Self {
        Self {
            id: new_entity_id(),
            shapes,
            name: String::new(),
            grid_size,
            metadata: None,
            generation_prompt: generation_prompt.into(),
        }
    }

    /// Rebuild an item from the copy stored in an equipment slot
    pub fn from_reference(reference: ItemReference) -> Self {
        let generation_prompt = reference
            .metadata
            .as_ref()
            .map(|m| m.generation_prompt.clone())
            .unwrap_or_default();
        Self {
            id: reference.id,
            shapes: reference.shapes,
            name: reference.name,
            grid_size: reference.grid_size,
            metadata: reference.metadata,
            generation_prompt,
        }
    }

    pub fn item_type(&self) -> &str {
        self.metadata
            .as_ref()
            .map(|m| m.item_type.as_str())
            .unwrap_or("Unknown")
    }
}

impl Default for Item {
    fn default() -> Self {
        Self::new(Vec::new(), DEFAULT_GRID_SIZE, "")
    }
}

impl Entity for Item {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn grid_size(&self) -> u32 {
        self.grid_size
    }

    fn shapes(&self) -> &[Shape] {
        &self.shapes
    }
}

/// Copy of an equipped item, kept in the character's slot
///
/// Carries the item's own shapes so unequipping can restore it to the pool
/// even after the pool entry was removed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemReference {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub metadata: Option<ItemMetadata>,
    #[serde(default = "default_grid_size")]
    pub grid_size: u32,
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

impl From<&Item> for ItemReference {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            metadata: item.metadata.clone(),
            grid_size: item.grid_size,
            shapes: item.shapes.clone(),
        }
    }
}
