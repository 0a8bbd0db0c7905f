use super::StoragePort;
use crate::entity::{Character, Entity, Item};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

pub const CHARACTERS_KEY: &str = "saved_characters";
pub const ITEMS_KEY: &str = "saved_items";
/// Generated characters not yet named and analyzed
pub const CHARACTER_DRAFTS_KEY: &str = "draft_characters";
/// Generated items not yet named and analyzed
pub const ITEM_DRAFTS_KEY: &str = "draft_items";

/// Saved characters and items on top of a [`StoragePort`]
///
/// Every mutation reads the whole collection, changes it and writes it back.
pub struct Library<S> {
    store: S,
}

impl<S: StoragePort> Library<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read a collection; missing or unreadable collections come back empty
    fn load<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let contents = match self.store.read(key) {
            Ok(Some(contents)) => contents,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key, error = %e, "Failed to read collection, treating as empty");
                return Vec::new();
            }
        };
        if contents.trim().is_empty() {
            return Vec::new();
        }

        match serde_json::from_str(&contents) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(key, error = %e, "Corrupt collection, treating as empty");
                Vec::new()
            }
        }
    }

    fn save<T: Serialize>(&self, key: &str, entries: &[T]) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)
            .with_context(|| format!("Failed to serialize collection {}", key))?;
        self.store
            .write(key, &json)
            .with_context(|| format!("Failed to write collection {}", key))
    }

    fn upsert<T: Entity + Serialize + DeserializeOwned>(&self, key: &str, entity: T) -> Result<()> {
        let mut entries: Vec<T> = self.load(key);
        match entries.iter_mut().find(|e| e.id() == entity.id()) {
            Some(existing) => *existing = entity,
            None => entries.push(entity),
        }
        self.save(key, &entries)
    }

    fn remove<T: Entity + Serialize + DeserializeOwned>(&self, key: &str, id: &str) -> Result<Option<T>> {
        let mut entries: Vec<T> = self.load(key);
        let Some(position) = entries.iter().position(|e| e.id() == id) else {
            return Ok(None);
        };
        let removed = entries.remove(position);
        self.save(key, &entries)?;
        Ok(Some(removed))
    }

    fn find<T: Entity + DeserializeOwned>(&self, key: &str, id: &str) -> Option<T> {
        self.load::<T>(key).into_iter().find(|e| e.id() == id)
    }

    /// Saved characters, each with at least its base version recorded
    pub fn characters(&self) -> Vec<Character> {
        let mut characters: Vec<Character> = self.load(CHARACTERS_KEY);
        for character in &mut characters {
            character.ensure_base_version();
        }
        characters
    }

    pub fn save_characters(&self, characters: &[Character]) -> Result<()> {
        self.save(CHARACTERS_KEY, characters)
    }

    pub fn find_character(&self, id: &str) -> Option<Character> {
        self.find::<Character>(CHARACTERS_KEY, id).map(|mut character| {
            character.ensure_base_version();
            character
        })
    }

    pub fn upsert_character(&self, character: Character) -> Result<()> {
        self.upsert(CHARACTERS_KEY, character)
    }

    pub fn delete_character(&self, id: &str) -> Result<Option<Character>> {
        self.remove(CHARACTERS_KEY, id)
    }

    pub fn items(&self) -> Vec<Item> {
        self.load(ITEMS_KEY)
    }

    pub fn save_items(&self, items: &[Item]) -> Result<()> {
        self.save(ITEMS_KEY, items)
    }

    pub fn find_item(&self, id: &str) -> Option<Item> {
        self.find(ITEMS_KEY, id)
    }

    pub fn upsert_item(&self, item: Item) -> Result<()> {
        self.upsert(ITEMS_KEY, item)
    }

    pub fn delete_item(&self, id: &str) -> Result<Option<Item>> {
        self.remove(ITEMS_KEY, id)
    }

    pub fn character_drafts(&self) -> Vec<Character> {
        self.load(CHARACTER_DRAFTS_KEY)
    }

    /// Replace the character drafts with a new batch
    pub fn replace_character_drafts(&self, drafts: &[Character]) -> Result<()> {
        self.save(CHARACTER_DRAFTS_KEY, drafts)
    }

    pub fn take_character_draft(&self, id: &str) -> Result<Option<Character>> {
        self.remove(CHARACTER_DRAFTS_KEY, id)
    }

    pub fn item_drafts(&self) -> Vec<Item> {
        self.load(ITEM_DRAFTS_KEY)
    }

    /// Replace the item drafts with a new batch
    pub fn replace_item_drafts(&self, drafts: &[Item]) -> Result<()> {
        self.save(ITEM_DRAFTS_KEY, drafts)
    }

    pub fn take_item_draft(&self, id: &str) -> Result<Option<Item>> {
        self.remove(ITEM_DRAFTS_KEY, id)
    }

    /// Persist an equipped character and take the item out of the pool
    pub fn commit_equip(&self, character: Character, item_id: &str) -> Result<()> {
        let character_id = character.id.clone();
        self.upsert_character(character)?;
        let removed = self.delete_item(item_id)?;
        info!(
            character = %character_id,
            item = item_id,
            was_in_pool = removed.is_some(),
            "Equip committed"
        );
        Ok(())
    }

    /// Persist an unequipped character and return the item to the pool.
    ///
    /// A pool entry with the same id is kept as is.
    pub fn commit_unequip(&self, character: Character, item: Item) -> Result<()> {
        let character_id = character.id.clone();
        self.upsert_character(character)?;

        let mut items = self.items();
        let restored = !items.iter().any(|i| i.id == item.id);
        if restored {
            items.push(item);
            self.save_items(&items)?;
        }
        info!(character = %character_id, restored, "Unequip committed");
        Ok(())
    }
}
