use super::part::{shape_list_schema, RawShapeList};
use super::pipeline::BatchReport;
use super::prompts;
use super::GenerationSettings;
use crate::entity::Item;
use crate::error::GatewayError;
use crate::gateway::{Gateway, GenerationRequest};
use crate::shape::{enforce_kinds, unique_id};
use futures::future::join_all;
use std::collections::HashSet;
use tracing::{error, info};

/// Generate one rectangle-only item in a single gateway call
pub async fn generate_item(
    gateway: &dyn Gateway,
    settings: &GenerationSettings,
    concept: &str,
) -> Result<Item, GatewayError> {
    let grid_size = settings.grid_size;
    let request = GenerationRequest::new(
        "item",
        prompts::item_system(grid_size),
        prompts::item_user(concept),
        settings.model.clone(),
    )
    .with_temperature(0.7)
    .with_max_output_tokens(settings.max_output_tokens)
    .with_schema(shape_list_schema(grid_size, false));

    let (raw, _usage) = gateway.generate(request).await?.decode::<RawShapeList>()?;
    let mut taken = HashSet::new();
    let shapes = raw
        .shapes
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            let mut shape = raw.normalize(|| format!("shape_{}", i + 1));
            shape.id = unique_id(shape.id, &mut taken);
            shape
        })
        .collect();

    Ok(Item::new(enforce_kinds(shapes, false), grid_size, concept))
}

/// Generate `count` items concurrently; failures leave `None` in their slot
pub async fn generate_items(
    gateway: &dyn Gateway,
    settings: &GenerationSettings,
    concept: &str,
    count: usize,
) -> BatchReport<Item> {
    let attempts = (0..count).map(|index| async move {
        let result = generate_item(gateway, settings, concept).await;
        if let Err(e) = &result {
            error!(item = index, error = %e, "Item generation failed");
        }
        result
    });

    let report: BatchReport<Item> = join_all(attempts).await.into_iter().collect();
    info!(
        succeeded = report.succeeded(),
        total = report.total(),
        "Item batch finished"
    );
    report
}
