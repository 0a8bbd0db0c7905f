use super::*;
use crate::gateway::scripted::ScriptedGateway;
use crate::shape::Shape;
use crate::stats::Rarity;
use serde_json::json;

fn rolls() -> Abilities {
    Abilities {
        strength: 12,
        dexterity: 40,
        constitution: 5,
        intelligence: 77,
        wisdom: 30,
        charisma: 1,
    }
}

fn draft() -> Character {
    Character::new(
        vec![Shape::rectangle("body_main", 32, 32, 64, 64, "#44AA44", 0)],
        128,
        "a mossy owl",
    )
}

#[test]
fn test_character_stats_are_capped_by_rolls() {
    let raw: RawCharacterAnalysis = serde_json::from_value(json!({
        "stats": {"strength": 50, "dexterity": 39.6, "constitution": -3, "intelligence": 77, "wisdom": 12},
        "equipmentSlots": [],
        "description": " Wise beyond its years. "
    }))
    .unwrap();

    let metadata = raw.into_metadata(&rolls(), "a mossy owl");

    assert_eq!(
        metadata.stats,
        Abilities {
            strength: 12,
            dexterity: 40,
            constitution: 0,
            intelligence: 77,
            wisdom: 12,
            charisma: 0,
        }
    );
    assert_eq!(metadata.description, "Wise beyond its years.");
    assert_eq!(metadata.generation_prompt, "a mossy owl");
}

#[test]
fn test_slots_start_empty_and_are_deduplicated() {
    let raw: RawCharacterAnalysis = serde_json::from_value(json!({
        "equipmentSlots": [
            {"id": "head", "name": "Head", "description": "Feathered crown", "equipment": {"id": "x"}},
            {"name": "Left Wing"},
            {"id": "HEAD", "name": "Head again"},
            {"description": "nameless"}
        ]
    }))
    .unwrap();

    let metadata = raw.into_metadata(&rolls(), "");
    let ids: Vec<&str> = metadata.equipment_slots.iter().map(|s| s.id.as_str()).collect();

    assert_eq!(ids, vec!["head", "left_wing"]);
    assert!(metadata.equipment_slots.iter().all(|s| s.equipment.is_none()));
    assert_eq!(metadata.equipment_slots[1].name, "Left Wing");
}

#[test]
fn test_item_analysis_keeps_rolled_values() {
    let roll = ItemRoll {
        rarity: Rarity::Rare,
        stats: Abilities::from_fn(|| 7),
    };
    let raw: RawItemAnalysis = serde_json::from_value(json!({
        "stats": {"strength": 99},
        "type": "Weapon",
        "rarity": "Mythical",
        "description": "Hums faintly."
    }))
    .unwrap();

    let metadata = raw.into_metadata(&roll, "a humming blade");

    assert_eq!(metadata.stats, roll.stats);
    assert_eq!(metadata.rarity, Rarity::Rare);
    assert_eq!(metadata.item_type, "Weapon");
    assert_eq!(metadata.generation_prompt, "a humming blade");

    let blank: RawItemAnalysis = serde_json::from_value(json!({})).unwrap();
    assert_eq!(blank.into_metadata(&roll, "").item_type, "Unknown");
}

#[tokio::test]
async fn test_finish_character_sends_image_and_rolls() {
    let gateway = ScriptedGateway::queue(vec![Ok(json!({
        "stats": {"strength": 10, "dexterity": 10, "constitution": 5, "intelligence": 70, "wisdom": 30, "charisma": 1},
        "equipmentSlots": [{"id": "head", "name": "Head", "description": "Top"}],
        "description": "A bookish owl."
    }))]);

    let character = finish_character(&gateway, "gpt-4o-mini", draft(), " Hoot ", &rolls())
        .await
        .unwrap();

    assert_eq!(character.name, "Hoot");
    assert_eq!(character.version_count(), 1);
    assert_eq!(character.slots().len(), 1);
    assert_eq!(character.metadata.as_ref().unwrap().stats.intelligence, 70);

    let request = &gateway.requests()[0];
    assert_eq!(request.step, "character_analysis");
    assert_eq!(request.temperature, 0.2);
    assert_eq!(request.user_content.image_count(), 1);
    let text = request.user_content.text();
    assert!(text.starts_with("Please analyze this character named \"Hoot\""));
    assert!(text.contains("Strength: 12\nDexterity: 40"));
    assert!(request.full_system_prompt().contains("Maximum value: 77"));
}

#[tokio::test]
async fn test_finish_item_reports_gateway_failure() {
    let gateway = ScriptedGateway::queue(vec![Err(GatewayError::Status {
        status: 429,
        body: "slow down".to_string(),
    })]);
    let item = Item::new(vec![Shape::rectangle("blade", 60, 10, 8, 100, "#CCCCCC", 1)], 128, "a sword");
    let roll = ItemRoll {
        rarity: Rarity::Mundane,
        stats: Abilities::default(),
    };

    let result = finish_item(&gateway, "gpt-4o-mini", item, "Plain Sword", &roll).await;

    assert!(matches!(result, Err(GatewayError::Status { status: 429, .. })));
    assert!(gateway.requests()[0]
        .user_content
        .text()
        .ends_with("Rarity: Mundane"));
}
