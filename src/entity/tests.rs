use super::*;
use crate::stats::{Abilities, Rarity};
use serde_json::json;

fn knight() -> Character {
    let mut character = Character::new(
        vec![
            Shape::rectangle("body_torso", 40, 50, 48, 60, "#8899AA", 10),
            Shape::ellipse("eyes_left", 50, 30, 6, 6, "#000000", 90),
        ],
        128,
        "a brave knight",
    )
    .with_variation("a brave knight with a red plume");
    character.name = "Sir Pixel".to_string();
    character.metadata = Some(CharacterMetadata {
        stats: Abilities::from_fn(|| 42),
        equipment_slots: vec![EquipmentSlot::new("head", "Head", "Top of the helmet")],
        description: "Stalwart.".to_string(),
        generation_prompt: "a brave knight".to_string(),
    });
    character
}

#[test]
fn test_new_entities_get_distinct_ids() {
    let a = Character::default();
    let b = Character::default();
    assert_ne!(a.id, b.id);
    assert_eq!(a.grid_size, DEFAULT_GRID_SIZE);
    assert_eq!(a.display_name(), "Unnamed");
}

#[test]
fn test_add_version_advances_pointer() {
    let mut character = knight();
    character.ensure_base_version();
    assert_eq!(character.version_count(), 1);

    let mut shapes = character.shapes.clone();
    shapes.push(Shape::rectangle("helmet", 50, 10, 20, 10, "#CCCCCC", 80));
    character.add_version(shapes);

    assert_eq!(character.version_count(), 2);
    assert_eq!(character.current_version, 1);
    assert_eq!(character.shapes.len(), 3);
}

#[test]
fn test_revert_keeps_later_versions() {
    let mut character = knight();
    character.ensure_base_version();
    character.add_version(vec![]);

    assert!(character.revert_to_version(0));
    assert_eq!(character.current_version, 0);
    assert_eq!(character.shapes.len(), 2);
    assert_eq!(character.version_count(), 2);

    assert!(!character.revert_to_version(5));
    assert_eq!(character.current_version, 0);
}

#[test]
fn test_ensure_base_version_is_idempotent() {
    let mut character = knight();
    character.ensure_base_version();
    character.ensure_base_version();
    assert_eq!(character.version_count(), 1);
    assert_eq!(character.image_versions[0].shapes, character.shapes);
}

#[test]
fn test_character_round_trip_preserves_everything() {
    let mut character = knight();
    character.ensure_base_version();
    character.parents = Some(vec!["p1".to_string(), "p2".to_string()]);
    character.interaction_type = Some("fusion".to_string());

    let text = serde_json::to_string(&character).unwrap();
    let back: Character = serde_json::from_str(&text).unwrap();
    assert_eq!(back, character);
}

#[test]
fn test_character_serializes_camel_case_fields() {
    let value = serde_json::to_value(knight()).unwrap();
    assert!(value.get("gridSize").is_some());
    assert!(value.get("imageVersions").is_some());
    assert!(value.get("currentVersion").is_some());
    assert!(value["metadata"].get("equipmentSlots").is_some());
}

#[test]
fn test_character_loads_with_missing_optional_fields() {
    let character: Character = serde_json::from_value(json!({
        "id": "c-1",
        "shapes": [{"id": "a", "type": "rectangle", "x": 0, "y": 0, "width": 4, "height": 4, "color": "#FFFFFF"}]
    }))
    .unwrap();

    assert_eq!(character.grid_size, 128);
    assert!(character.image_versions.is_empty());
    assert_eq!(character.current_version, 0);
    assert!(character.parents.is_none());
    assert!(character.slots().is_empty());
}

#[test]
fn test_slot_lookup() {
    let mut character = knight();
    assert!(character.slot("head").unwrap().is_empty());
    assert!(character.slot("feet").is_none());

    character.slot_mut("head").unwrap().description = "changed".to_string();
    assert_eq!(character.slot("head").unwrap().description, "changed");

    let mut unsaved = Character::default();
    assert!(unsaved.slot_mut("head").is_none());
}

#[test]
fn test_item_reference_restores_item() {
    let mut item = Item::new(
        vec![Shape::rectangle("blade", 60, 10, 8, 100, "#DDDDDD", 0)],
        64,
        "a glowing sword",
    );
    item.name = "Dawnbreaker".to_string();
    item.metadata = Some(ItemMetadata {
        stats: Abilities::from_fn(|| 12),
        item_type: "Weapon".to_string(),
        rarity: Rarity::Legendary,
        description: "Bright.".to_string(),
        generation_prompt: "a glowing sword".to_string(),
    });

    let reference = ItemReference::from(&item);
    let restored = Item::from_reference(reference);
    assert_eq!(restored, item);
    assert_eq!(restored.item_type(), "Weapon");
}

#[test]
fn test_item_metadata_uses_type_key() {
    let metadata = ItemMetadata {
        stats: Abilities::default(),
        item_type: "Armor".to_string(),
        rarity: Rarity::Mundane,
        description: String::new(),
        generation_prompt: String::new(),
    };
    let value = serde_json::to_value(&metadata).unwrap();
    assert_eq!(value["type"], json!("Armor"));
    assert_eq!(value["rarity"], json!("Mundane"));
}

#[test]
fn test_scale_shapes_to_display_grid() {
    let character = knight();
    let scaled = character.scale_shapes(256);
    assert_eq!((scaled[0].x, scaled[0].width), (80, 96));
}
