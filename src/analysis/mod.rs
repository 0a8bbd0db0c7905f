//! Save-time analysis: stats, equipment slots and a description for a
//! freshly named character or item.
//!
//! The gateway proposes values; the rolled stats always win. Character stats
//! are capped by their rolls and item stats and rarity are taken as rolled.

use crate::entity::{Character, CharacterMetadata, EquipmentSlot, Item, ItemMetadata};
use crate::error::GatewayError;
use crate::gateway::{ContentPart, Field, Gateway, GenerationRequest, OutputSchema, UserContent};
use crate::render::png_attachment;
use crate::shape::round_half_up;
use crate::stats::{Abilities, ItemRoll, ABILITY_NAMES};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

#[cfg(test)]
mod tests;

const CHARACTER_PROMPT: &str = "You are an expert character analyst. From a pixel art image of a character, its name and a random roll (0 to 100) per stat, you decide the character's equipment slots, its stats and its personality.

Equipment slots are the basic, fundamental parts of the character's form, named with simple generic terms for the body part or region and never for what might be equipped there: Head rather than \"Crown of Power\", Core rather than \"Heart of Magic\". For example a tree has Roots, Trunk, Branches and Crown; a robot has Head, Core, Arms and Base; a ghost has Center, Shell and Wisps.

The name may hint at the character's nature, role, personality or origin.

Each stat must not exceed its roll. Let appearance and name shape the stats within those limits: an owl with a low wisdom roll may simply be young and inexperienced.";

const ITEM_PROMPT: &str = "Analyze the provided item image and create a compelling magical item interpretation. The item's rarity and stat modifiers are predetermined.

Give the item's type (for example Weapon, Armor, Accessory or Artifact) and a description of its appearance, properties and history.

Let the rarity set the tone of the description:
- Mundane: ordinary and practical, no magic
- Common: minor enchantments or quirks
- Rare: notable magic and some history
- Legendary: powerful magic and major historical importance
- Mythical: world-shaping power

The name may hint at the item's origin, creator or purpose. Explain why it carries its stat modifiers.";

fn stats_schema(limits: &Abilities, label: &str) -> OutputSchema {
    OutputSchema::object(
        ABILITY_NAMES
            .iter()
            .zip(limits.values())
            .map(|(name, value)| {
                Field::new(*name, OutputSchema::number()).describe(format!("{}: {}", label, value))
            })
            .collect(),
    )
}

/// Stats as returned by the model; numbers may be fractional or missing
#[derive(Debug, Default, Deserialize)]
pub struct RawAbilities {
    #[serde(default)]
    strength: Option<f64>,
    #[serde(default)]
    dexterity: Option<f64>,
    #[serde(default)]
    constitution: Option<f64>,
    #[serde(default)]
    intelligence: Option<f64>,
    #[serde(default)]
    wisdom: Option<f64>,
    #[serde(default)]
    charisma: Option<f64>,
}

impl RawAbilities {
    fn rounded(&self) -> Abilities {
        let value = |v: Option<f64>| round_half_up(v.unwrap_or(0.0));
        Abilities {
            strength: value(self.strength),
            dexterity: value(self.dexterity),
            constitution: value(self.constitution),
            intelligence: value(self.intelligence),
            wisdom: value(self.wisdom),
            charisma: value(self.charisma),
        }
    }

    /// Each value clamped to `0..=roll`
    pub fn bounded_by(&self, rolls: &Abilities) -> Abilities {
        self.rounded()
            .zip_with(rolls, |value, roll| value.clamp(0, roll.max(0)))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RawSlot {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl RawSlot {
    fn normalize(self) -> Option<EquipmentSlot> {
        let name = self.name.unwrap_or_default().trim().to_string();
        let id = match self.id {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_lowercase(),
            Some(Value::Number(n)) => format!("slot_{}", n),
            _ if !name.is_empty() => name.to_lowercase().replace(char::is_whitespace, "_"),
            _ => return None,
        };
        let name = if name.is_empty() { id.clone() } else { name };
        Some(EquipmentSlot::new(id, name, self.description.unwrap_or_default()))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RawCharacterAnalysis {
    #[serde(default)]
    pub stats: RawAbilities,
    #[serde(default, alias = "equipmentSlots")]
    pub equipment_slots: Vec<RawSlot>,
    #[serde(default)]
    pub description: String,
}

impl RawCharacterAnalysis {
    /// Metadata with stats capped by `rolls`, empty slots and no duplicate
    /// slot ids
    pub fn into_metadata(self, rolls: &Abilities, generation_prompt: &str) -> CharacterMetadata {
        let mut slots: Vec<EquipmentSlot> = Vec::new();
        for raw in self.equipment_slots {
            if let Some(slot) = raw.normalize() {
                if !slots.iter().any(|s| s.id == slot.id) {
                    slots.push(slot);
                }
            }
        }

        CharacterMetadata {
            stats: self.stats.bounded_by(rolls),
            equipment_slots: slots,
            description: self.description.trim().to_string(),
            generation_prompt: generation_prompt.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RawItemAnalysis {
    #[serde(default, rename = "type")]
    pub item_type: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl RawItemAnalysis {
    /// Metadata carrying the rolled stats and rarity verbatim
    pub fn into_metadata(self, roll: &ItemRoll, generation_prompt: &str) -> ItemMetadata {
        let item_type = self
            .item_type
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());

        ItemMetadata {
            stats: roll.stats,
            item_type,
            rarity: roll.rarity,
            description: self.description.trim().to_string(),
            generation_prompt: generation_prompt.to_string(),
        }
    }
}

pub(crate) fn character_request(
    model: &str,
    character: &Character,
    rolls: &Abilities,
    image: ContentPart,
) -> GenerationRequest {
    let text = format!(
        "Please analyze this character named \"{}\". This character was generated based on the concept: {}. Random rolls are:\n{}",
        character.name,
        character.generation_prompt,
        rolls.describe()
    );
    let schema = OutputSchema::object(vec![
        Field::new("stats", stats_schema(rolls, "Maximum value"))
            .describe("Character statistics, each at most its roll"),
        Field::new(
            "equipmentSlots",
            OutputSchema::array(OutputSchema::object(vec![
                Field::new("id", OutputSchema::string())
                    .describe("Simple identifier for this slot (e.g., \"head\", \"core\", \"base\")"),
                Field::new("name", OutputSchema::string())
                    .describe("Simple display name for the slot (e.g., \"Head\", \"Core\", \"Base\")"),
                Field::new("description", OutputSchema::string())
                    .describe("Where this part is on the character"),
            ])),
        ),
        Field::new("description", OutputSchema::string())
            .describe("2-3 sentences on the character's personality"),
    ]);

    GenerationRequest::new(
        "character_analysis",
        CHARACTER_PROMPT,
        UserContent::Parts(vec![ContentPart::Text(text), image]),
        model,
    )
    .with_temperature(0.2)
    .with_schema(schema)
}

pub(crate) fn item_request(
    model: &str,
    item: &Item,
    roll: &ItemRoll,
    image: ContentPart,
) -> GenerationRequest {
    let text = format!(
        "Please analyze this item named \"{}\". This item was generated based on the concept: {}. Generated stats are:\n{}\nRarity: {}",
        item.name,
        item.generation_prompt,
        roll.stats.describe(),
        roll.rarity
    );
    let schema = OutputSchema::object(vec![
        Field::new("stats", stats_schema(&roll.stats, "Must be exactly"))
            .describe("Item stat modifiers, matching the provided modifiers exactly"),
        Field::new("type", OutputSchema::string())
            .describe("The type of item (e.g., Weapon, Armor, Accessory, Artifact)"),
        Field::new("rarity", OutputSchema::string()).describe(format!("Must be exactly: {}", roll.rarity)),
        Field::new("description", OutputSchema::string())
            .describe("2-3 sentences on the item's appearance, properties and history"),
    ]);

    GenerationRequest::new(
        "item_analysis",
        ITEM_PROMPT,
        UserContent::Parts(vec![ContentPart::Text(text), image]),
        model,
    )
    .with_temperature(0.7)
    .with_schema(schema)
}

/// Analyze a named character against its stat rolls
pub async fn analyze_character(
    gateway: &dyn Gateway,
    model: &str,
    character: &Character,
    rolls: &Abilities,
) -> Result<CharacterMetadata, GatewayError> {
    let request = character_request(model, character, rolls, png_attachment(character)?);
    let (raw, usage) = gateway
        .generate(request)
        .await?
        .decode::<RawCharacterAnalysis>()?;
    let metadata = raw.into_metadata(rolls, &character.generation_prompt);

    info!(
        character = %character.id,
        slots = metadata.equipment_slots.len(),
        grade = %metadata.stats.grade(),
        tokens = usage.total(),
        "Character analyzed"
    );
    Ok(metadata)
}

/// Analyze a named item against its rolled rarity and modifiers
pub async fn analyze_item(
    gateway: &dyn Gateway,
    model: &str,
    item: &Item,
    roll: &ItemRoll,
) -> Result<ItemMetadata, GatewayError> {
    let request = item_request(model, item, roll, png_attachment(item)?);
    let (raw, usage) = gateway.generate(request).await?.decode::<RawItemAnalysis>()?;
    let metadata = raw.into_metadata(roll, &item.generation_prompt);

    info!(
        item = %item.id,
        rarity = %metadata.rarity,
        item_type = %metadata.item_type,
        tokens = usage.total(),
        "Item analyzed"
    );
    Ok(metadata)
}

/// Name a character, analyze it and record version 0, ready to persist
pub async fn finish_character(
    gateway: &dyn Gateway,
    model: &str,
    mut character: Character,
    name: &str,
    rolls: &Abilities,
) -> Result<Character, GatewayError> {
    character.name = name.trim().to_string();
    character.metadata = Some(analyze_character(gateway, model, &character, rolls).await?);
    character.ensure_base_version();
    Ok(character)
}

/// Name an item and analyze it, ready to persist
pub async fn finish_item(
    gateway: &dyn Gateway,
    model: &str,
    mut item: Item,
    name: &str,
    roll: &ItemRoll,
) -> Result<Item, GatewayError> {
    item.name = name.trim().to_string();
    item.metadata = Some(analyze_item(gateway, model, &item, roll).await?);
    Ok(item)
}
