use super::{default_grid_size, new_entity_id, Entity, ItemReference, DEFAULT_GRID_SIZE};
use crate::shape::Shape;
use crate::stats::Abilities;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of a character's shape list
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub shapes: Vec<Shape>,
    pub timestamp: DateTime<Utc>,
}

impl Version {
    pub fn now(shapes: Vec<Shape>) -> Self {
        Self {
            shapes,
            timestamp: Utc::now(),
        }
    }
}

/// Body region an item can be equipped to
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EquipmentSlot {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// At most one item per slot
    #[serde(default)]
    pub equipment: Option<ItemReference>,
}

impl EquipmentSlot {
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            equipment: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.equipment.is_none()
    }
}

/// Recorded when a character is saved
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterMetadata {
    #[serde(default)]
    pub stats: Abilities,
    #[serde(default)]
    pub equipment_slots: Vec<EquipmentSlot>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub generation_prompt: String,
}

/// A generated character with version history
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: String,
    #[serde(default)]
    pub shapes: Vec<Shape>,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_grid_size")]
    pub grid_size: u32,
    #[serde(default)]
    pub metadata: Option<CharacterMetadata>,
    #[serde(default)]
    pub generation_prompt: String,
    /// Variation of the concept this character was generated from
    #[serde(default)]
    pub variation_prompt: String,
    #[serde(default)]
    pub image_versions: Vec<Version>,
    #[serde(default)]
    pub current_version: usize,
    /// Parent ids when produced by combining characters
    #[serde(default)]
    pub parents: Option<Vec<String>>,
    #[serde(default)]
    pub interaction_type: Option<String>,
}

impl Character {
    pub fn new(shapes: Vec<Shape>, grid_size: u32, generation_prompt: impl Into<String>) -> Self {
        Self {
            id: new_entity_id(),
            shapes,
            name: String::new(),
            grid_size,
            metadata: None,
            generation_prompt: generation_prompt.into(),
            variation_prompt: String::new(),
            image_versions: Vec::new(),
            current_version: 0,
            parents: None,
            interaction_type: None,
        }
    }

    pub fn with_variation(mut self, variation_prompt: impl Into<String>) -> Self {
        self.variation_prompt = variation_prompt.into();
        self
    }

    /// Append a version and make it current
    pub fn add_version(&mut self, shapes: Vec<Shape>) {
        self.image_versions.push(Version::now(shapes.clone()));
        self.current_version = self.image_versions.len() - 1;
        self.shapes = shapes;
    }

    /// Make an earlier version current without dropping later ones.
    ///
    /// Out-of-range indexes leave the character unchanged and return false.
    pub fn revert_to_version(&mut self, index: usize) -> bool {
        match self.image_versions.get(index) {
            Some(version) => {
                self.shapes = version.shapes.clone();
                self.current_version = index;
                true
            }
            None => false,
        }
    }

    /// Record the current shapes as version 0 if no history exists yet
    pub fn ensure_base_version(&mut self) {
        if self.image_versions.is_empty() {
            self.add_version(self.shapes.clone());
        }
    }

    pub fn version_count(&self) -> usize {
        self.image_versions.len()
    }

    pub fn slots(&self) -> &[EquipmentSlot] {
        self.metadata
            .as_ref()
            .map(|m| m.equipment_slots.as_slice())
            .unwrap_or(&[])
    }

    pub fn slot(&self, slot_id: &str) -> Option<&EquipmentSlot> {
        self.slots().iter().find(|slot| slot.id == slot_id)
    }

    pub fn slot_mut(&mut self, slot_id: &str) -> Option<&mut EquipmentSlot> {
        self.metadata
            .as_mut()?
            .equipment_slots
            .iter_mut()
            .find(|slot| slot.id == slot_id)
    }
}

impl Default for Character {
    fn default() -> Self {
        Self::new(Vec::new(), DEFAULT_GRID_SIZE, "")
    }
}

impl Entity for Character {
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
