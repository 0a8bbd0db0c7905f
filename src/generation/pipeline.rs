use super::session::CharacterGenerator;
use super::variations::generate_variations;
use super::{GenerationEvents, GenerationSettings, ProgressEvent};
use crate::entity::Character;
use crate::error::PipelineError;
use crate::gateway::Gateway;
use futures::future::join_all;
use tracing::{error, info};

/// Outcome of a fan-out, one slot per requested entity
#[derive(Clone, Debug, PartialEq)]
pub struct BatchReport<T> {
    /// `None` where that entity's generation failed
    pub results: Vec<Option<T>>,
}

impl<T> BatchReport<T> {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_some()).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn into_successes(self) -> Vec<T> {
        self.results.into_iter().flatten().collect()
    }
}

impl<T, E> FromIterator<Result<T, E>> for BatchReport<T> {
    fn from_iter<I: IntoIterator<Item = Result<T, E>>>(iter: I) -> Self {
        Self {
            results: iter.into_iter().map(Result::ok).collect(),
        }
    }
}

/// Run plan, every part and finalize for one character.
///
/// Steps run strictly in order and nothing is retried; the first failure
/// aborts this character only.
pub async fn generate_character(
    gateway: &dyn Gateway,
    settings: &GenerationSettings,
    concept: &str,
    variation: Option<&str>,
    pipeline: usize,
    events: &GenerationEvents,
) -> Result<Character, PipelineError> {
    let mut generator = CharacterGenerator::new(settings.clone(), concept);
    if let Some(variation) = variation {
        generator = generator.with_variation(variation);
    }

    match run(&mut generator, gateway, pipeline, events).await {
        Ok(()) => generator.into_character().ok_or(PipelineError::Incomplete { remaining: 0 }),
        Err(e) => {
            events.publish(ProgressEvent::Failed {
                pipeline,
                error: e.to_string(),
            });
            Err(e)
        }
    }
}

async fn run(
    generator: &mut CharacterGenerator,
    gateway: &dyn Gateway,
    pipeline: usize,
    events: &GenerationEvents,
) -> Result<(), PipelineError> {
    let plan = generator.plan(gateway).await?;
    let total = plan.parts.len();
    events.publish(ProgressEvent::Planned {
        pipeline,
        parts: plan.parts.iter().map(|p| p.name.clone()).collect(),
        design_notes: plan.design_notes.clone(),
    });

    loop {
        let outcome = generator.generate_next_part(gateway).await?;
        let shape_count = generator.character().map(|c| c.shapes.len()).unwrap_or(0);
        events.publish(ProgressEvent::PartGenerated {
            pipeline,
            part: outcome.part.name,
            cursor: generator.cursor(),
            total,
            shape_count,
        });
        if outcome.is_complete {
            break;
        }
    }

    generator.finalize(gateway).await?;
    if let Some(character) = generator.character() {
        events.publish(ProgressEvent::Finalized {
            pipeline,
            character_id: character.id.clone(),
            shape_count: character.shapes.len(),
        });
    }
    Ok(())
}

/// Generate `count` characters concurrently, each from its own variation
/// of `concept`.
///
/// A failed pipeline leaves `None` in its slot and never affects the others.
pub async fn generate_characters(
    gateway: &dyn Gateway,
    settings: &GenerationSettings,
    concept: &str,
    count: usize,
    variation_count: usize,
    events: &GenerationEvents,
) -> BatchReport<Character> {
    let variations = generate_variations(gateway, settings, concept, variation_count.max(count)).await;

    let pipelines = variations.iter().take(count).enumerate().map(|(index, variation)| async move {
        let result =
            generate_character(gateway, settings, concept, Some(variation.as_str()), index, events).await;
        if let Err(e) = &result {
            error!(pipeline = index, error = %e, "Character generation failed");
        }
        result
    });

    let report: BatchReport<Character> = join_all(pipelines).await.into_iter().collect();
    info!(
        succeeded = report.succeeded(),
        total = report.total(),
        "Character batch finished"
    );
    report
}
