pub mod env;
pub use env::{credentials_from, credentials_from_env};

use crate::gateway::{GatewayEndpoints, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_MODEL, GROQ_CHAT_URL, OPENAI_CHAT_URL};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete Pixelsmith configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PixelsmithConfig {
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

/// Generation pipeline settings
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_grid_size")]
    pub grid_size: u32,
    /// When false every generated shape is forced to a rectangle
    #[serde(default)]
    pub enable_ellipses: bool,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_characters_per_batch")]
    pub characters_per_batch: usize,
    #[serde(default = "default_items_per_batch")]
    pub items_per_batch: usize,
    #[serde(default = "default_variation_count")]
    pub variation_count: usize,
    /// Concurrent transform proposals per equip
    #[serde(default = "default_equip_candidates")]
    pub equip_candidates: usize,
}

fn default_grid_size() -> u32 {
    crate::entity::DEFAULT_GRID_SIZE
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_characters_per_batch() -> usize {
    6
}

fn default_items_per_batch() -> usize {
    10
}

fn default_variation_count() -> usize {
    10
}

fn default_equip_candidates() -> usize {
    10
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            grid_size: default_grid_size(),
            enable_ellipses: false,
            model: default_model(),
            characters_per_batch: default_characters_per_batch(),
            items_per_batch: default_items_per_batch(),
            variation_count: default_variation_count(),
            equip_candidates: default_equip_candidates(),
        }
    }
}

/// Model endpoint settings (keys come from the environment)
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_groq_base_url")]
    pub groq_base_url: String,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_finalize_max_output_tokens")]
    pub finalize_max_output_tokens: u32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_openai_base_url() -> String {
    OPENAI_CHAT_URL.to_string()
}

fn default_groq_base_url() -> String {
    GROQ_CHAT_URL.to_string()
}

fn default_max_output_tokens() -> u32 {
    DEFAULT_MAX_OUTPUT_TOKENS
}

fn default_finalize_max_output_tokens() -> u32 {
    4000
}

fn default_request_timeout() -> u64 {
    300
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            openai_base_url: default_openai_base_url(),
            groq_base_url: default_groq_base_url(),
            max_output_tokens: default_max_output_tokens(),
            finalize_max_output_tokens: default_finalize_max_output_tokens(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl GatewayConfig {
    pub fn endpoints(&self) -> GatewayEndpoints {
        GatewayEndpoints {
            openai: self.openai_base_url.clone(),
            groq: self.groq_base_url.clone(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Saved collection settings
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_directory")]
    pub directory: PathBuf,
    /// Gzip collection files
    #[serde(default)]
    pub compress: bool,
}

fn default_storage_directory() -> PathBuf {
    PathBuf::from("./pixelsmith-data")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: default_storage_directory(),
            compress: false,
        }
    }
}

/// PNG export settings
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_portrait_size")]
    pub portrait_size: u32,
    /// Hex fill behind the shapes; transparent when unset
    #[serde(default)]
    pub background: Option<String>,
}

fn default_portrait_size() -> u32 {
    256
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            portrait_size: default_portrait_size(),
            background: None,
        }
    }
}

impl PixelsmithConfig {
    /// Apply `PIXELSMITH_*` overrides from a variable lookup.
    ///
    /// Unparseable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(model) = lookup("PIXELSMITH_MODEL") {
            if !model.trim().is_empty() {
                self.generation.model = model.trim().to_string();
            }
        }
        if let Some(v) = lookup("PIXELSMITH_GRID_SIZE") {
            if let Ok(n) = v.trim().parse::<u32>() {
                if n > 0 {
                    self.generation.grid_size = n;
                }
            }
        }
        if let Some(v) = lookup("PIXELSMITH_ENABLE_ELLIPSES") {
            if let Ok(b) = v.trim().parse::<bool>() {
                self.generation.enable_ellipses = b;
            }
        }
        if let Some(v) = lookup("PIXELSMITH_STORAGE_DIR") {
            if !v.trim().is_empty() {
                self.storage.directory = PathBuf::from(v.trim());
            }
        }
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &Path) -> Result<PixelsmithConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: PixelsmithConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = PixelsmithConfig::default();
        assert_eq!(config.generation.grid_size, 128);
        assert!(!config.generation.enable_ellipses);
        assert_eq!(config.generation.model, "gpt-4o-mini");
        assert_eq!(config.generation.characters_per_batch, 6);
        assert_eq!(config.gateway.max_output_tokens, 2000);
        assert_eq!(config.gateway.finalize_max_output_tokens, 4000);
        assert_eq!(config.storage.directory, PathBuf::from("./pixelsmith-data"));
        assert_eq!(config.render.portrait_size, 256);
    }

    #[test]
    fn test_config_deserialization() {
        let toml = r##"
            [generation]
            grid_size = 64
            enable_ellipses = true
            model = "llama-3.3-70b-versatile"
            characters_per_batch = 2

            [gateway]
            openai_base_url = "http://localhost:9000/v1/chat/completions"
            request_timeout_seconds = 30

            [storage]
            directory = "/tmp/pixels"
            compress = true

            [render]
            portrait_size = 512
            background = "#202020"
        "##;

        let config: PixelsmithConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.generation.grid_size, 64);
        assert!(config.generation.enable_ellipses);
        assert_eq!(config.generation.characters_per_batch, 2);
        assert_eq!(config.generation.items_per_batch, 10);
        assert_eq!(
            config.gateway.endpoints().openai,
            "http://localhost:9000/v1/chat/completions"
        );
        assert_eq!(config.gateway.endpoints().groq, GROQ_CHAT_URL);
        assert_eq!(config.gateway.request_timeout(), Duration::from_secs(30));
        assert!(config.storage.compress);
        assert_eq!(config.render.background.as_deref(), Some("#202020"));
    }

    #[test]
    fn test_partial_config() {
        let toml = r#"
            [render]
            portrait_size = 128
        "#;

        let config: PixelsmithConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.render.portrait_size, 128);
        assert_eq!(config.generation.equip_candidates, 10); // Default
        assert_eq!(config.gateway.request_timeout_seconds, 300); // Default
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PIXELSMITH_MODEL", "gpt-4o"),
            ("PIXELSMITH_GRID_SIZE", "not-a-number"),
            ("PIXELSMITH_ENABLE_ELLIPSES", "true"),
        ]
        .into_iter()
        .collect();

        let mut config = PixelsmithConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.generation.model, "gpt-4o");
        assert_eq!(config.generation.grid_size, 128);
        assert!(config.generation.enable_ellipses);
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixelsmith.toml");
        std::fs::write(&path, "[generation]\nvariation_count = 4\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.generation.variation_count, 4);

        let missing = load_config(&dir.path().join("missing.toml"));
        assert!(missing.is_err());
    }
}
