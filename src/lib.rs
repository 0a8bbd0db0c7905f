// Shape primitives and validation
pub mod shape;

// Ability scores, rarity and dice rolls
pub mod stats;

// Characters, items and version history
pub mod entity;

// Error types shared across pipelines
pub mod error;

// Structured LLM gateway
pub mod gateway;

// Character, item and variation generation pipelines
pub mod generation;

// Stat and slot analysis
pub mod analysis;

// Item transforms and equip/unequip
pub mod compositor;

// Raster rendering and PNG encoding
pub mod render;

// Saved-entity persistence
pub mod storage;

// TOML configuration and environment overrides
pub mod config;
