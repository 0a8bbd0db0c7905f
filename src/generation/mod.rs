//! Character and item generation.
//!
//! A character is built by a plan step, one part step per planned part and a
//! finalize step, each a single gateway call. [`CharacterGenerator`] holds the
//! state between steps; [`pipeline`] drives it and fans out across entities.

use crate::config::PixelsmithConfig;
use crate::gateway::{DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_MODEL};
use serde::Serialize;
use tokio::sync::broadcast;

mod finalize;
mod items;
mod part;
mod pipeline;
mod plan;
mod prompts;
mod session;
mod variations;


pub use finalize::{apply_diff, RawShapeDiff, ShapeDiff};
pub use items::{generate_item, generate_items};
pub use part::{namespace_shapes, RawShapeList};
pub use pipeline::{generate_character, generate_characters, BatchReport};
pub use plan::{GenerationPlan, PartSpec, RawPlan, ZIndexRange, MIN_PLAN_PARTS};
pub use session::{CharacterGenerator, FinalizeOutcome, GenerationState, PartOutcome};
pub use variations::{generate_variations, normalize_variations};

/// Parameters shared by every step of a generation run
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationSettings {
    pub grid_size: u32,
    /// When false every shape is forced to a rectangle
    pub enable_ellipses: bool,
    pub model: String,
    pub max_output_tokens: u32,
    pub finalize_max_output_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            grid_size: crate::entity::DEFAULT_GRID_SIZE,
            enable_ellipses: false,
            model: DEFAULT_MODEL.to_string(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            finalize_max_output_tokens: 4000,
        }
    }
}

impl From<&PixelsmithConfig> for GenerationSettings {
    fn from(config: &PixelsmithConfig) -> Self {
        Self {
            grid_size: config.generation.grid_size,
            enable_ellipses: config.generation.enable_ellipses,
            model: config.generation.model.clone(),
            max_output_tokens: config.gateway.max_output_tokens,
            finalize_max_output_tokens: config.gateway.finalize_max_output_tokens,
        }
    }
}

/// Progress of one pipeline, for incremental display
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    Planned {
        pipeline: usize,
        parts: Vec<String>,
        design_notes: String,
    },
    PartGenerated {
        pipeline: usize,
        part: String,
        /// Parts generated so far
        cursor: usize,
        total: usize,
        shape_count: usize,
    },
    Finalized {
        pipeline: usize,
        character_id: String,
        shape_count: usize,
    },
    Failed {
        pipeline: usize,
        error: String,
    },
}

/// Broadcast channel for progress events
///
/// Sending never fails the pipeline; events with no subscriber are dropped.
#[derive(Clone, Debug)]
pub struct GenerationEvents {
    tx: broadcast::Sender<ProgressEvent>,
}

impl GenerationEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.tx.subscribe()
    }

    pub(crate) fn publish(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for GenerationEvents {
    fn default() -> Self {
        Self::new(256)
    }
}
