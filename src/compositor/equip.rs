use crate::entity::{Character, EquipmentSlot, Item, ItemReference};
use crate::error::EquipError;
use crate::shape::Shape;
use tracing::info;

fn find_slot<'a>(character: &'a Character, slot_id: &str) -> Result<&'a EquipmentSlot, EquipError> {
    if character.slots().is_empty() {
        return Err(EquipError::NoSlots);
    }
    character
        .slot(slot_id)
        .ok_or_else(|| EquipError::UnknownSlot(slot_id.to_string()))
}

/// The slot, if it exists and holds nothing
pub fn open_slot<'a>(character: &'a Character, slot_id: &str) -> Result<&'a EquipmentSlot, EquipError> {
    let slot = find_slot(character, slot_id)?;
    match &slot.equipment {
        Some(item) => Err(EquipError::SlotOccupied {
            slot: slot_id.to_string(),
            item: item.name.clone(),
        }),
        None => Ok(slot),
    }
}

/// Record `combined` as a new version and put `item` in the slot.
///
/// `combined` is the character's shapes plus the transformed item shapes,
/// usually a chosen [`Candidate`](super::Candidate). A character without
/// history first records its current shapes as version 0.
pub fn equip(
    character: &mut Character,
    slot_id: &str,
    item: &Item,
    combined: Vec<Shape>,
) -> Result<(), EquipError> {
    open_slot(character, slot_id)?;

    character.ensure_base_version();
    character.add_version(combined);
    if let Some(slot) = character.slot_mut(slot_id) {
        slot.equipment = Some(ItemReference::from(item));
    }

    info!(
        character = %character.id,
        slot = slot_id,
        item = %item.id,
        version = character.current_version,
        "Item equipped"
    );
    Ok(())
}

/// Step back one version and empty the slot, returning the item.
///
/// Reverts to the version before the current one rather than undoing the
/// item's transform, so edits made after the equip are dropped too. Later
/// versions stay in the history.
pub fn unequip(character: &mut Character, slot_id: &str) -> Result<Item, EquipError> {
    let slot = find_slot(character, slot_id)?;
    if slot.equipment.is_none() {
        return Err(EquipError::SlotEmpty(slot_id.to_string()));
    }
    let previous = character
        .current_version
        .checked_sub(1)
        .ok_or(EquipError::NoPreviousVersion)?;
    if !character.revert_to_version(previous) {
        return Err(EquipError::NoPreviousVersion);
    }

    let reference = character
        .slot_mut(slot_id)
        .and_then(|slot| slot.equipment.take())
        .ok_or_else(|| EquipError::SlotEmpty(slot_id.to_string()))?;

    info!(
        character = %character.id,
        slot = slot_id,
        item = %reference.id,
        version = character.current_version,
        "Item unequipped"
    );
    Ok(Item::from_reference(reference))
}
