use super::equip::open_slot;
use super::{apply_transform, merge_placed, RawTransformResponse, Transform};
use crate::entity::{Character, Item};
use crate::error::{EquipError, GatewayError};
use crate::gateway::{ContentPart, Field, Gateway, GenerationRequest, OutputSchema, UserContent};
use crate::render::png_attachment;
use crate::shape::Shape;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const COMPATIBILITY_PROMPT: &str = "You are deciding whether an item can be equipped to a specific slot on a character.

You will be given the character's name, the slot id, and the item's name and type.

Consider the slot's location and purpose, the item's type and intended use, and the character's design and form. For example a helmet fits a head slot, a sword fits a weapon slot and a chest plate fits a core slot. An unusual item can go in any slot it could plausibly be worn on.

Do not be strict: judge whether equipping is possible, not whether it is sensible. Give a brief reason either way.";

fn transform_prompt(grid_size: u32) -> String {
    format!(
        "You are an expert at combining character and item designs. Choose the transformation that places an item on a character.

You will be given the character's name, the slot the item goes in, the shape data of both, and images of both.

Choose:
1. Scale: how much to shrink the item (0.1 to 0.3, where 1.0 is the original size)
2. Center X and Center Y: where the item's center goes, in absolute character grid coordinates (0 to {grid})
3. Rotation in degrees (0 to 360) to match the character's pose
4. Z-index for the whole item group (-100 behind the character to 100 in front)

Position by slot: head items sit high and in front, core items around the torso mixed with the character, base items low and behind, left and right items at the sides and usually in front.

Keep the item's proportions and make sure it stays clearly visible and recognizable.",
        grid = grid_size
    )
}

/// Answer to a compatibility check
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Compatibility {
    #[serde(default)]
    pub compatible: bool,
    #[serde(default)]
    pub reason: String,
}

/// One proposed equip result
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Candidate {
    pub transform: Transform,
    /// Character shapes followed by the transformed item shapes, ids
    /// prefixed with the slot
    pub shapes: Vec<Shape>,
}

/// Ask whether `item` can go in `slot_id`
pub async fn check_compatibility(
    gateway: &dyn Gateway,
    model: &str,
    character: &Character,
    slot_id: &str,
    item: &Item,
) -> Result<Compatibility, GatewayError> {
    let text = format!(
        "Character: {}\nSlot: {}\nItem: {}\nItem Type: {}",
        character.name,
        slot_id,
        item.name,
        item.item_type()
    );
    let schema = OutputSchema::object(vec![
        Field::new("compatible", OutputSchema::boolean())
            .describe("Whether the item can be equipped in this slot"),
        Field::new("reason", OutputSchema::string()).describe("Brief explanation"),
    ]);
    let request = GenerationRequest::new(
        "compatibility",
        COMPATIBILITY_PROMPT,
        UserContent::Parts(vec![ContentPart::Text(text)]),
        model,
    )
    .with_temperature(0.0)
    .with_schema(schema);

    let (answer, _usage) = gateway.generate(request).await?.decode::<Compatibility>()?;
    Ok(answer)
}

fn transform_request(
    model: &str,
    character: &Character,
    slot_id: &str,
    item: &Item,
    images: &[ContentPart],
) -> GenerationRequest {
    let to_json = |shapes: &[Shape]| serde_json::to_string(shapes).unwrap_or_else(|_| "[]".to_string());
    let text = format!(
        "Character: {}\nSlot: {}\nCharacter Grid Size: {}\nItem Grid Size: {}\nCharacter Shapes: {}\nItem Shapes: {}",
        character.name,
        slot_id,
        character.grid_size,
        item.grid_size,
        to_json(&character.shapes),
        to_json(&item.shapes),
    );
    let mut parts = vec![ContentPart::Text(text)];
    parts.extend(images.iter().cloned());

    let schema = OutputSchema::object(vec![Field::new(
        "transform",
        OutputSchema::object(vec![
            Field::new("scale", OutputSchema::number()).describe("Scale factor (0.1 to 0.3)"),
            Field::new("centerX", OutputSchema::number())
                .describe(format!("X coordinate of item center (0 to {})", character.grid_size)),
            Field::new("centerY", OutputSchema::number())
                .describe(format!("Y coordinate of item center (0 to {})", character.grid_size)),
            Field::new("rotation", OutputSchema::number()).describe("Rotation in degrees (0 to 360)"),
            Field::new("zIndex", OutputSchema::number())
                .describe("Layer order for the entire item group (-100 to 100)"),
        ]),
    )]);

    GenerationRequest::new(
        "transform",
        transform_prompt(character.grid_size),
        UserContent::Parts(parts),
        model,
    )
    .with_temperature(0.3)
    .with_schema(schema)
}

async fn request_transform(
    gateway: &dyn Gateway,
    request: GenerationRequest,
) -> Result<Transform, GatewayError> {
    let (raw, _usage) = gateway.generate(request).await?.decode::<RawTransformResponse>()?;
    Ok(raw.transform.normalize()?)
}

/// Ask for one placement of `item` on `character`, with both rendered as
/// image attachments
pub async fn propose_transform(
    gateway: &dyn Gateway,
    model: &str,
    character: &Character,
    slot_id: &str,
    item: &Item,
) -> Result<Transform, GatewayError> {
    let images = [png_attachment(character)?, png_attachment(item)?];
    request_transform(gateway, transform_request(model, character, slot_id, item, &images)).await
}

/// Request `count` placements concurrently and build a candidate from each.
///
/// Failed proposals are dropped; if none succeed the result is
/// [`EquipError::NoCandidates`]. The slot must exist and be empty.
pub async fn equip_candidates(
    gateway: &dyn Gateway,
    model: &str,
    character: &Character,
    slot_id: &str,
    item: &Item,
    count: usize,
) -> Result<Vec<Candidate>, EquipError> {
    open_slot(character, slot_id)?;
    let images = [png_attachment(character)?, png_attachment(item)?];

    let proposals = (0..count).map(|_| {
        request_transform(gateway, transform_request(model, character, slot_id, item, &images))
    });

    let candidates: Vec<Candidate> = join_all(proposals)
        .await
        .into_iter()
        .filter_map(|result| match result {
            Ok(transform) => {
                let placed =
                    apply_transform(&item.shapes, &transform, character.grid_size, item.grid_size);
                let shapes = merge_placed(&character.shapes, placed, slot_id);
                Some(Candidate { transform, shapes })
            }
            Err(e) => {
                warn!(error = %e, "Transform proposal failed");
                None
            }
        })
        .collect();

    info!(
        character = %character.id,
        item = %item.id,
        slot = slot_id,
        candidates = candidates.len(),
        requested = count,
        "Equip candidates ready"
    );

    if candidates.is_empty() {
        return Err(EquipError::NoCandidates);
    }
    Ok(candidates)
}
