use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pixelsmith::analysis::{finish_character, finish_item};
use pixelsmith::compositor::{check_compatibility, equip, equip_candidates, unequip};
use pixelsmith::config::{credentials_from_env, load_config, PixelsmithConfig};
use pixelsmith::entity::{Character, Entity, Item};
use pixelsmith::gateway::HttpGateway;
use pixelsmith::generation::{
    generate_characters, generate_items, GenerationEvents, GenerationSettings, ProgressEvent,
};
use pixelsmith::render::{parse_hex_color, render_entity, save_png};
use pixelsmith::stats::{roll_character_stats, roll_item};
use pixelsmith::storage::{FileStore, Library};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

const DEFAULT_CONFIG_FILE: &str = "pixelsmith.toml";

#[derive(Parser)]
#[command(name = "pixelsmith", version, about = "LLM-driven pixel-art characters and items")]
struct Cli {
    /// TOML config file (defaults to ./pixelsmith.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a batch of character drafts from one concept
    Characters {
        concept: String,
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },
    /// Generate a batch of item drafts from one concept
    Items {
        concept: String,
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },
    /// Name, analyze and save a character draft
    SaveCharacter { draft_id: String, name: String },
    /// Name, analyze and save an item draft
    SaveItem { draft_id: String, name: String },
    /// List saved entities and pending drafts
    List,
    /// Render a saved entity or draft to PNG
    Render {
        id: String,
        output: PathBuf,
        /// Output size in pixels (defaults to the configured portrait size)
        #[arg(long)]
        size: Option<u32>,
    },
    /// Place a saved item in a character's slot
    Equip {
        character_id: String,
        slot: String,
        item_id: String,
        /// Index of the candidate to keep
        #[arg(long, default_value = "0")]
        choice: usize,
        /// Skip the compatibility check
        #[arg(long)]
        force: bool,
    },
    /// Empty a slot and return its item to the saved items
    Unequip { character_id: String, slot: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pixelsmith=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = read_config(cli.config.as_deref())?;

    info!(
        model = %config.generation.model,
        grid_size = config.generation.grid_size,
        storage = %config.storage.directory.display(),
        "Configuration loaded"
    );

    let library = Library::new(FileStore::new(&config.storage.directory, config.storage.compress));

    match cli.command {
        Command::Characters { concept, count } => {
            let count = count.unwrap_or(config.generation.characters_per_batch);
            let gateway = build_gateway(&config)?;
            generate_character_drafts(&gateway, &config, &library, &concept, count).await
        }
        Command::Items { concept, count } => {
            let count = count.unwrap_or(config.generation.items_per_batch);
            let gateway = build_gateway(&config)?;
            let settings = GenerationSettings::from(&config);
            let report = generate_items(&gateway, &settings, &concept, count).await;
            println!("{}/{} items generated", report.succeeded(), report.total());

            let drafts = report.into_successes();
            library
                .replace_item_drafts(&drafts)
                .context("Failed to store item drafts")?;
            for item in &drafts {
                println!("  draft {}  {} shapes", item.id, item.shapes.len());
            }
            Ok(())
        }
        Command::SaveCharacter { draft_id, name } => {
            let gateway = build_gateway(&config)?;
            let Some(draft) = library.character_drafts().into_iter().find(|c| c.id == draft_id) else {
                bail!("No character draft with id {}", draft_id);
            };
            let rolls = roll_character_stats(&mut rand::thread_rng());
            let character = finish_character(&gateway, &config.generation.model, draft, &name, &rolls)
                .await
                .context("Character analysis failed")?;

            library.upsert_character(character.clone())?;
            library.take_character_draft(&draft_id)?;
            print_character(&character);
            Ok(())
        }
        Command::SaveItem { draft_id, name } => {
            let gateway = build_gateway(&config)?;
            let Some(draft) = library.item_drafts().into_iter().find(|i| i.id == draft_id) else {
                bail!("No item draft with id {}", draft_id);
            };
            let roll = roll_item(&mut rand::thread_rng());
            let item = finish_item(&gateway, &config.generation.model, draft, &name, &roll)
                .await
                .context("Item analysis failed")?;

            library.upsert_item(item.clone())?;
            library.take_item_draft(&draft_id)?;
            print_item(&item);
            Ok(())
        }
        Command::List => {
            println!("Characters:");
            for character in library.characters() {
                print_character(&character);
            }
            println!("Items:");
            for item in library.items() {
                print_item(&item);
            }
            let character_drafts = library.character_drafts();
            let item_drafts = library.item_drafts();
            if !character_drafts.is_empty() || !item_drafts.is_empty() {
                println!("Drafts:");
                for draft in &character_drafts {
                    println!("  character {}  {}", draft.id, draft.variation_prompt);
                }
                for draft in &item_drafts {
                    println!("  item {}  {}", draft.id, draft.generation_prompt);
                }
            }
            Ok(())
        }
        Command::Render { id, output, size } => {
            let size = size.unwrap_or(config.render.portrait_size);
            let background = match config.render.background.as_deref() {
                Some(hex) => Some(
                    parse_hex_color(hex).with_context(|| format!("Invalid background color {}", hex))?,
                ),
                None => None,
            };

            let image = if let Some(character) = find_any_character(&library, &id) {
                render_entity(&character, size, background)
            } else if let Some(item) = find_any_item(&library, &id) {
                render_entity(&item, size, background)
            } else {
                bail!("No character or item with id {}", id);
            };
            save_png(&image, &output)?;
            println!("Wrote {}", output.display());
            Ok(())
        }
        Command::Equip {
            character_id,
            slot,
            item_id,
            choice,
            force,
        } => {
            let gateway = build_gateway(&config)?;
            let model = &config.generation.model;
            let mut character = library
                .find_character(&character_id)
                .with_context(|| format!("No saved character with id {}", character_id))?;
            let item = library
                .find_item(&item_id)
                .with_context(|| format!("No saved item with id {}", item_id))?;

            if !force {
                let verdict = check_compatibility(&gateway, model, &character, &slot, &item)
                    .await
                    .context("Compatibility check failed")?;
                if !verdict.compatible {
                    bail!("{} cannot go in slot {}: {}", item.name, slot, verdict.reason);
                }
                println!("Compatible: {}", verdict.reason);
            }

            let candidates = equip_candidates(
                &gateway,
                model,
                &character,
                &slot,
                &item,
                config.generation.equip_candidates,
            )
            .await?;
            for (index, candidate) in candidates.iter().enumerate() {
                println!(
                    "  [{}] scale {:.2}  rotation {:.0}  z {}",
                    index,
                    candidate.transform.scale,
                    candidate.transform.rotation_degrees,
                    candidate.transform.z_index
                );
            }
            let Some(chosen) = candidates.into_iter().nth(choice) else {
                bail!("Candidate {} does not exist", choice);
            };

            equip(&mut character, &slot, &item, chosen.shapes)?;
            library.commit_equip(character, &item.id)?;
            println!("Equipped {} in slot {}", item.name, slot);
            Ok(())
        }
        Command::Unequip { character_id, slot } => {
            let mut character = library
                .find_character(&character_id)
                .with_context(|| format!("No saved character with id {}", character_id))?;
            let item = unequip(&mut character, &slot)?;
            let item_name = item.name.clone();
            library.commit_unequip(character, item)?;
            println!("Unequipped {} from slot {}", item_name, slot);
            Ok(())
        }
    }
}

fn read_config(path: Option<&Path>) -> Result<PixelsmithConfig> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => load_config(Path::new(DEFAULT_CONFIG_FILE))?,
        None => PixelsmithConfig::default(),
    };
    config.apply_env_overrides();
    Ok(config)
}

fn build_gateway(config: &PixelsmithConfig) -> Result<HttpGateway> {
    let credentials = credentials_from_env();
    if credentials.is_empty() {
        warn!("No API keys found in the environment; every request will fail");
    }
    HttpGateway::new(
        config.gateway.endpoints(),
        credentials,
        config.gateway.request_timeout(),
    )
}

async fn generate_character_drafts(
    gateway: &HttpGateway,
    config: &PixelsmithConfig,
    library: &Library<FileStore>,
    concept: &str,
    count: usize,
) -> Result<()> {
    let settings = GenerationSettings::from(config);
    let events = GenerationEvents::default();
    let mut progress = events.subscribe();

    let printer = tokio::spawn(async move {
        loop {
            match progress.recv().await {
                Ok(event) => print_progress(&event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Progress display fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let report = generate_characters(
        gateway,
        &settings,
        concept,
        count,
        config.generation.variation_count,
        &events,
    )
    .await;
    drop(events);
    if let Err(e) = printer.await {
        warn!(error = %e, "Progress display task failed");
    }

    println!("{}/{} characters generated", report.succeeded(), report.total());
    let drafts = report.into_successes();
    library
        .replace_character_drafts(&drafts)
        .context("Failed to store character drafts")?;
    for draft in &drafts {
        println!(
            "  draft {}  {} shapes  {}",
            draft.id,
            draft.shapes.len(),
            draft.variation_prompt
        );
    }
    Ok(())
}

fn print_progress(event: &ProgressEvent) {
    match event {
        ProgressEvent::Planned { pipeline, parts, .. } => {
            println!("[{}] planned {} parts: {}", pipeline, parts.len(), parts.join(", "));
        }
        ProgressEvent::PartGenerated {
            pipeline,
            part,
            cursor,
            total,
            shape_count,
        } => {
            println!("[{}] {}/{} {} ({} shapes)", pipeline, cursor, total, part, shape_count);
        }
        ProgressEvent::Finalized {
            pipeline,
            shape_count,
            ..
        } => {
            println!("[{}] finalized with {} shapes", pipeline, shape_count);
        }
        ProgressEvent::Failed { pipeline, error } => {
            println!("[{}] failed: {}", pipeline, error);
        }
    }
}

fn find_any_character(library: &Library<FileStore>, id: &str) -> Option<Character> {
    library
        .find_character(id)
        .or_else(|| library.character_drafts().into_iter().find(|c| c.id == id))
}

fn find_any_item(library: &Library<FileStore>, id: &str) -> Option<Item> {
    library
        .find_item(id)
        .or_else(|| library.item_drafts().into_iter().find(|i| i.id == id))
}

fn print_character(character: &Character) {
    let (grade, slots) = match &character.metadata {
        Some(metadata) => (
            format!("grade {}", metadata.stats.grade()),
            metadata
                .equipment_slots
                .iter()
                .map(|slot| match &slot.equipment {
                    Some(item) => format!("{}={}", slot.id, item.name),
                    None => slot.id.clone(),
                })
                .collect::<Vec<_>>()
                .join(", "),
        ),
        None => (String::from("unanalyzed"), String::new()),
    };
    println!(
        "  {}  {}  v{}/{}  {}  [{}]",
        character.id,
        character.name,
        character.current_version,
        character.version_count(),
        grade,
        slots
    );
}

fn print_item(item: &Item) {
    let rarity = item
        .metadata
        .as_ref()
        .map(|m| m.rarity.as_str())
        .unwrap_or("unanalyzed");
    println!(
        "  {}  {}  {}  {}  {} shapes",
        item.id,
        item.name,
        item.item_type(),
        rarity,
        item.shapes().len()
    );
}
