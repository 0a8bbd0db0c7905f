use super::finalize::{apply_diff, diff_schema, RawShapeDiff, ShapeDiff};
use super::part::{namespace_shapes, shape_list_schema, RawShapeList};
use super::plan::{plan_schema, GenerationPlan, PartSpec, RawPlan};
use super::prompts;
use super::GenerationSettings;
use crate::entity::Character;
use crate::error::{GatewayError, PipelineError, Stage};
use crate::gateway::{Gateway, GatewayResponse, GenerationRequest, Usage};
use crate::shape::Shape;
use tracing::{debug, info};

/// Where a [`CharacterGenerator`] is in its plan
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationState {
    Idle,
    Planned,
    /// Next part to generate; earlier parts are done
    Generating(usize),
    Complete,
    Finalized,
}

/// Result of one part step
#[derive(Clone, Debug, PartialEq)]
pub struct PartOutcome {
    pub part: PartSpec,
    /// Shapes added by this step, already namespaced
    pub shapes: Vec<Shape>,
    pub is_complete: bool,
    pub usage: Usage,
}

/// Result of the finalize step
#[derive(Clone, Debug, PartialEq)]
pub struct FinalizeOutcome {
    pub diff: ShapeDiff,
    pub usage: Usage,
}

/// Step-by-step generator for a single character.
///
/// Each step is split into a pure request builder and a pure response
/// applier; the async methods only add the gateway call in between. Steps
/// must run in order: plan, every part, finalize.
#[derive(Clone, Debug)]
pub struct CharacterGenerator {
    settings: GenerationSettings,
    concept: String,
    variation: Option<String>,
    plan: Option<GenerationPlan>,
    cursor: usize,
    character: Option<Character>,
    finalized: bool,
    usage: Usage,
}

impl CharacterGenerator {
    pub fn new(settings: GenerationSettings, concept: impl Into<String>) -> Self {
        Self {
            settings,
            concept: concept.into(),
            variation: None,
            plan: None,
            cursor: 0,
            character: None,
            finalized: false,
            usage: Usage::default(),
        }
    }

    /// Generate from a variation of the concept instead of the concept itself
    pub fn with_variation(mut self, variation: impl Into<String>) -> Self {
        self.variation = Some(variation.into());
        self
    }

    /// Description the model is asked to draw
    pub fn prompt(&self) -> &str {
        self.variation.as_deref().unwrap_or(&self.concept)
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn state(&self) -> GenerationState {
        let Some(plan) = &self.plan else {
            return GenerationState::Idle;
        };
        if self.finalized {
            GenerationState::Finalized
        } else if self.cursor >= plan.parts.len() {
            GenerationState::Complete
        } else if self.cursor == 0 {
            GenerationState::Planned
        } else {
            GenerationState::Generating(self.cursor)
        }
    }

    pub fn current_plan(&self) -> Option<&GenerationPlan> {
        self.plan.as_ref()
    }

    /// Parts generated so far
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Character built so far; absent until the first part is generated
    pub fn character(&self) -> Option<&Character> {
        self.character.as_ref()
    }

    pub fn into_character(self) -> Option<Character> {
        self.character
    }

    /// Usage summed over every applied step
    pub fn usage(&self) -> Usage {
        self.usage
    }

    pub fn plan_request(&self) -> GenerationRequest {
        GenerationRequest::new(
            "plan",
            prompts::PLANNER,
            format!("Plan the parts for this character: {}", self.prompt()),
            self.settings.model.clone(),
        )
        .with_temperature(0.7)
        .with_max_output_tokens(self.settings.max_output_tokens)
        .with_schema(plan_schema())
    }

    /// Store a plan answer, discarding any earlier progress
    pub fn apply_plan(&mut self, response: GatewayResponse) -> Result<&GenerationPlan, PipelineError> {
        let (raw, usage) = response
            .decode::<RawPlan>()
            .map_err(|e| gateway_failure(Stage::Planning, e.into()))?;
        self.usage += usage;
        let plan = raw.normalize()?;

        info!(
            parts = plan.parts.len(),
            prompt = %self.prompt(),
            "Character plan ready"
        );

        self.cursor = 0;
        self.character = None;
        self.finalized = false;
        Ok(self.plan.insert(plan))
    }

    fn next_part(&self) -> Result<&PartSpec, PipelineError> {
        let plan = self.plan.as_ref().ok_or(PipelineError::NotPlanned)?;
        plan.parts.get(self.cursor).ok_or(PipelineError::PlanExhausted)
    }

    fn part_stage(&self, part: &PartSpec) -> Stage {
        Stage::Part {
            index: self.cursor,
            name: part.name.clone(),
        }
    }

    pub fn part_request(&self) -> Result<GenerationRequest, PipelineError> {
        let part = self.next_part()?;
        let plan = self.plan.as_ref().ok_or(PipelineError::NotPlanned)?;
        let grid_size = self.settings.grid_size;
        let enable_ellipses = self.settings.enable_ellipses;

        let existing = match &self.character {
            Some(character) if !character.shapes.is_empty() => format!(
                "Existing shapes:\n{}",
                serde_json::to_string_pretty(&character.shapes).unwrap_or_else(|_| "[]".to_string())
            ),
            _ => "No existing shapes yet.".to_string(),
        };

        Ok(GenerationRequest::new(
            "part",
            prompts::part_system(self.prompt(), plan, part, grid_size, enable_ellipses),
            format!("Generating part: {}\n\n{}", part.name, existing),
            self.settings.model.clone(),
        )
        .with_temperature(0.7)
        .with_max_output_tokens(self.settings.max_output_tokens)
        .with_schema(shape_list_schema(grid_size, enable_ellipses)))
    }

    /// Append a part answer to the character and advance the cursor
    pub fn apply_part(&mut self, response: GatewayResponse) -> Result<PartOutcome, PipelineError> {
        let part = self.next_part()?.clone();
        let (raw, usage) = response
            .decode::<RawShapeList>()
            .map_err(|e| gateway_failure(self.part_stage(&part), e.into()))?;
        self.usage += usage;

        let grid_size = self.settings.grid_size;
        let concept = self.concept.clone();
        let variation = self.variation.clone();
        let character = self.character.get_or_insert_with(|| {
            let character = Character::new(Vec::new(), grid_size, concept);
            match variation {
                Some(v) => character.with_variation(v),
                None => character,
            }
        });

        let shapes = namespace_shapes(&part, raw.shapes, &character.shapes, self.settings.enable_ellipses);
        character.shapes.extend(shapes.iter().cloned());
        self.cursor += 1;

        let total = self.plan.as_ref().map(|p| p.parts.len()).unwrap_or(0);
        let is_complete = self.cursor >= total;
        debug!(
            part = %part.id,
            added = shapes.len(),
            cursor = self.cursor,
            total,
            "Part generated"
        );

        Ok(PartOutcome {
            part,
            shapes,
            is_complete,
            usage,
        })
    }

    fn ready_to_finalize(&self) -> Result<&Character, PipelineError> {
        let plan = self.plan.as_ref().ok_or(PipelineError::NotPlanned)?;
        let remaining = plan.parts.len().saturating_sub(self.cursor);
        if remaining > 0 {
            return Err(PipelineError::Incomplete { remaining });
        }
        self.character
            .as_ref()
            .ok_or(PipelineError::Incomplete { remaining: plan.parts.len() })
    }

    pub fn finalize_request(&self) -> Result<GenerationRequest, PipelineError> {
        let character = self.ready_to_finalize()?;
        let shapes = serde_json::to_string_pretty(&character.shapes).unwrap_or_else(|_| "[]".to_string());

        Ok(GenerationRequest::new(
            "finalize",
            prompts::finalize_system(self.settings.enable_ellipses),
            format!(
                "Original concept: {}\n\nCurrent character shapes:\n{}",
                self.prompt(),
                shapes
            ),
            self.settings.model.clone(),
        )
        .with_temperature(0.8)
        .with_max_output_tokens(self.settings.finalize_max_output_tokens)
        .with_schema(diff_schema(self.settings.grid_size, self.settings.enable_ellipses)))
    }

    /// Apply a finalizer diff; a diff that fails to decode changes nothing
    pub fn apply_finalize(&mut self, response: GatewayResponse) -> Result<FinalizeOutcome, PipelineError> {
        self.ready_to_finalize()?;
        let (raw, usage) = response
            .decode::<RawShapeDiff>()
            .map_err(|e| gateway_failure(Stage::Finalizing, e.into()))?;
        let diff = raw.normalize();

        let enable_ellipses = self.settings.enable_ellipses;
        let character = self
            .character
            .as_mut()
            .ok_or(PipelineError::Incomplete { remaining: 0 })?;
        character.shapes = apply_diff(&character.shapes, &diff, enable_ellipses);
        self.usage += usage;
        self.finalized = true;

        info!(
            character = %character.id,
            added = diff.add.len(),
            modified = diff.modify.len(),
            removed = diff.remove.len(),
            shapes = character.shapes.len(),
            "Character finalized"
        );

        Ok(FinalizeOutcome { diff, usage })
    }

    pub async fn plan(&mut self, gateway: &dyn Gateway) -> Result<&GenerationPlan, PipelineError> {
        let response = gateway
            .generate(self.plan_request())
            .await
            .map_err(|e| gateway_failure(Stage::Planning, e))?;
        self.apply_plan(response)
    }

    pub async fn generate_next_part(&mut self, gateway: &dyn Gateway) -> Result<PartOutcome, PipelineError> {
        let request = self.part_request()?;
        let stage = self.part_stage(self.next_part()?);
        let response = gateway
            .generate(request)
            .await
            .map_err(|e| gateway_failure(stage, e))?;
        self.apply_part(response)
    }

    pub async fn finalize(&mut self, gateway: &dyn Gateway) -> Result<FinalizeOutcome, PipelineError> {
        let request = self.finalize_request()?;
        let response = gateway
            .generate(request)
            .await
            .map_err(|e| gateway_failure(Stage::Finalizing, e))?;
        self.apply_finalize(response)
    }
}

fn gateway_failure(stage: Stage, source: GatewayError) -> PipelineError {
    PipelineError::Gateway { stage, source }
}
