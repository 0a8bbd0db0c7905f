// Save, equip and unequip through the public API with a canned gateway
// and an in-memory library.

use async_trait::async_trait;
use pixelsmith::analysis::finish_character;
use pixelsmith::compositor::{check_compatibility, equip, equip_candidates, unequip};
use pixelsmith::entity::{Character, Item};
use pixelsmith::error::{EquipError, GatewayError};
use pixelsmith::gateway::{Gateway, GatewayResponse, GenerationRequest, Usage};
use pixelsmith::shape::Shape;
use pixelsmith::stats::Abilities;
use pixelsmith::storage::{Library, MemoryStore};
use serde_json::{json, Value};
use std::sync::Mutex;

// ── Canned gateway ────────────────────────────────────────────────────────────

/// Answers each step with a fixed payload and records the steps it saw
struct CannedGateway {
    seen: Mutex<Vec<&'static str>>,
}

impl CannedGateway {
    fn new() -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
        }
    }

    fn steps(&self) -> Vec<&'static str> {
        self.seen.lock().unwrap().clone()
    }

    fn answer(step: &str) -> Result<Value, GatewayError> {
        match step {
            "character_analysis" => Ok(json!({
                "stats": {
                    "strength": 95, "dexterity": 12.4, "constitution": 40,
                    "intelligence": -5, "wisdom": 30, "charisma": 50
                },
                "equipmentSlots": [
                    {"id": "Head", "name": "Head", "description": "Flat stone crown"},
                    {"name": "Right Hand", "description": "Boulder fist"}
                ],
                "description": "A slow, steady golem."
            })),
            "compatibility" => Ok(json!({"compatible": true, "reason": "Crowns go on heads"})),
            "transform" => Ok(json!({
                "transform": {"scale": 0.2, "centerX": 64, "centerY": 30, "rotation": 0, "zIndex": 80}
            })),
            other => Err(GatewayError::Transport(format!("unexpected step {}", other))),
        }
    }
}

#[async_trait]
impl Gateway for CannedGateway {
    async fn generate(&self, request: GenerationRequest) -> Result<GatewayResponse, GatewayError> {
        self.seen.lock().unwrap().push(request.step);
        Ok(GatewayResponse {
            data: Self::answer(request.step)?,
            usage: Usage::default(),
        })
    }
}

fn golem() -> Character {
    Character::new(
        vec![Shape::rectangle("body_main", 0, 0, 128, 128, "#336699", 0)],
        128,
        "a sturdy golem",
    )
}

fn crown() -> Item {
    let mut item = Item::new(
        vec![Shape::rectangle("band", 40, 40, 48, 48, "#FFD700", 3)],
        128,
        "a golden crown",
    );
    item.name = "Crown".to_string();
    item
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_save_equip_unequip_round_trip() {
    let gateway = CannedGateway::new();
    let library = Library::new(MemoryStore::new());
    let rolls = Abilities::from_fn(|| 60);

    let character = finish_character(&gateway, "gpt-4o-mini", golem(), "  Golem ", &rolls)
        .await
        .unwrap();
    assert_eq!(character.name, "Golem");
    let metadata = character.metadata.as_ref().unwrap();
    assert_eq!(metadata.stats.strength, 60);
    assert_eq!(metadata.stats.dexterity, 12);
    assert_eq!(metadata.stats.intelligence, 0);
    let slot_ids: Vec<&str> = metadata.equipment_slots.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(slot_ids, vec!["head", "right_hand"]);

    let item = crown();
    library.upsert_character(character.clone()).unwrap();
    library.upsert_item(item.clone()).unwrap();

    // Equip
    let mut saved = library.find_character(&character.id).unwrap();
    let verdict = check_compatibility(&gateway, "gpt-4o-mini", &saved, "head", &item)
        .await
        .unwrap();
    assert!(verdict.compatible);

    let candidates = equip_candidates(&gateway, "gpt-4o-mini", &saved, "head", &item, 3)
        .await
        .unwrap();
    assert_eq!(candidates.len(), 3);
    let chosen = candidates.into_iter().next().unwrap();
    assert_eq!(chosen.shapes.len(), 2);
    assert_eq!((chosen.shapes[1].x, chosen.shapes[1].y), (59, 25));

    equip(&mut saved, "head", &item, chosen.shapes).unwrap();
    library.commit_equip(saved, &item.id).unwrap();

    let equipped = library.find_character(&character.id).unwrap();
    assert!(library.items().is_empty());
    assert_eq!(equipped.shapes.len(), 2);
    assert_eq!(equipped.version_count(), 2);
    assert_eq!(equipped.slot("head").unwrap().equipment.as_ref().unwrap().name, "Crown");

    // A second equip into the same slot is refused
    let mut again = equipped.clone();
    let err = equip(&mut again, "head", &item, Vec::new()).unwrap_err();
    assert!(matches!(err, EquipError::SlotOccupied { .. }));

    // Unequip
    let mut unequipping = equipped;
    let restored = unequip(&mut unequipping, "head").unwrap();
    library.commit_unequip(unequipping, restored).unwrap();

    let reverted = library.find_character(&character.id).unwrap();
    assert_eq!(reverted.shapes, character.shapes);
    assert_eq!(reverted.current_version, 0);
    assert!(reverted.slot("head").unwrap().equipment.is_none());

    let pool = library.items();
    assert_eq!(pool.len(), 1);
    assert_eq!(pool[0].id, item.id);
    assert_eq!(pool[0].shapes, item.shapes);

    assert_eq!(
        gateway.steps(),
        vec!["character_analysis", "compatibility", "transform", "transform", "transform"]
    );
}

#[tokio::test]
async fn test_candidates_refuse_unknown_slot_without_calling_gateway() {
    let gateway = CannedGateway::new();
    let rolls = Abilities::from_fn(|| 60);
    let character = finish_character(&gateway, "gpt-4o-mini", golem(), "Golem", &rolls)
        .await
        .unwrap();

    let err = equip_candidates(&gateway, "gpt-4o-mini", &character, "tail", &crown(), 2)
        .await
        .unwrap_err();

    assert_eq!(err, EquipError::UnknownSlot("tail".to_string()));
    assert_eq!(gateway.steps(), vec!["character_analysis"]);
}
