use super::prompts;
use super::GenerationSettings;
use crate::gateway::{Field, Gateway, GenerationRequest, OutputSchema};
use serde_json::Value;
use tracing::warn;

/// Map any accepted variations answer onto exactly `count` prompts.
///
/// Accepts a bare array or `{"variations": [...]}`; non-string and blank
/// entries are skipped. Missing entries are filled with `concept`.
pub fn normalize_variations(value: &Value, concept: &str, count: usize) -> Vec<String> {
    let entries = match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => map.get("variations").and_then(Value::as_array),
        _ => None,
    };

    let mut variations: Vec<String> = entries
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if variations.len() < count {
        warn!(
            received = variations.len(),
            requested = count,
            "Fewer prompt variations than requested, filling with the original prompt"
        );
    }
    variations.truncate(count);
    variations.resize(count, concept.to_string());
    variations
}

fn variations_schema() -> OutputSchema {
    OutputSchema::object(vec![Field::new(
        "variations",
        OutputSchema::array(OutputSchema::string()),
    )
    .describe("Subtle variations of the original description")])
}

/// Ask for `count` subtle variations of `concept`.
///
/// Never fails: a gateway error yields `concept` repeated `count` times.
pub async fn generate_variations(
    gateway: &dyn Gateway,
    settings: &GenerationSettings,
    concept: &str,
    count: usize,
) -> Vec<String> {
    let request = GenerationRequest::new(
        "variations",
        prompts::VARIATIONS,
        prompts::variations_user(concept, count),
        settings.model.clone(),
    )
    .with_temperature(0.3)
    .with_max_output_tokens(settings.max_output_tokens)
    .with_schema(variations_schema());

    match gateway.generate(request).await {
        Ok(response) => normalize_variations(&response.data, concept, count),
        Err(e) => {
            warn!(error = %e, "Prompt variation request failed, using the original prompt");
            vec![concept.to_string(); count]
        }
    }
}
