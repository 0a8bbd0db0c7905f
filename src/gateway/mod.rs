//! Structured-output LLM gateway.
//!
//! Every generation step talks to a model through the [`Gateway`] trait: a
//! request carries the system prompt, user content, sampling parameters and
//! the JSON shape the answer must follow; the response is the parsed JSON
//! plus token usage.

use crate::error::{GatewayError, ParseError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::AddAssign;

mod http;
mod parse;
mod route;
mod schema;

#[cfg(test)]
pub(crate) mod scripted;

pub use http::{GatewayEndpoints, HttpGateway, GROQ_CHAT_URL, OPENAI_CHAT_URL};
pub use parse::parse_json_response;
pub use route::{route_model, Credentials, ModelRoute, Provider};
pub use schema::{format_instructions, Field, OutputSchema};

/// Model used when nothing else is configured
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default completion budget per call
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2000;

/// One part of a multi-part user message
#[derive(Clone, Debug, PartialEq)]
pub enum ContentPart {
    Text(String),
    /// Base64-encoded PNG
    ImagePng(String),
}

/// User message content
#[derive(Clone, Debug, PartialEq)]
pub enum UserContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl UserContent {
    /// Concatenated text of all text parts (for logging and matching)
    pub fn text(&self) -> String {
        match self {
            UserContent::Text(text) => text.clone(),
            UserContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text(t) => Some(t.as_str()),
                    ContentPart::ImagePng(_) => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Number of image attachments
    pub fn image_count(&self) -> usize {
        match self {
            UserContent::Text(_) => 0,
            UserContent::Parts(parts) => parts
                .iter()
                .filter(|p| matches!(p, ContentPart::ImagePng(_)))
                .count(),
        }
    }
}

impl From<String> for UserContent {
    fn from(text: String) -> Self {
        UserContent::Text(text)
    }
}

impl From<&str> for UserContent {
    fn from(text: &str) -> Self {
        UserContent::Text(text.to_string())
    }
}

/// A structured generation request
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
    /// Short tag naming the pipeline step, used in logs
    pub step: &'static str,
    pub system_prompt: String,
    pub user_content: UserContent,
    pub temperature: f64,
    pub model_id: String,
    pub max_output_tokens: u32,
    pub output_schema: Option<OutputSchema>,
}

impl GenerationRequest {
    pub fn new(
        step: &'static str,
        system_prompt: impl Into<String>,
        user_content: impl Into<UserContent>,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            step,
            system_prompt: system_prompt.into(),
            user_content: user_content.into(),
            temperature: 0.7,
            model_id: model_id.into(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            output_schema: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn with_schema(mut self, schema: OutputSchema) -> Self {
        self.output_schema = Some(schema);
        self
    }

    /// System prompt with the schema's format instructions appended
    pub fn full_system_prompt(&self) -> String {
        match &self.output_schema {
            Some(schema) => format!("{}\n\n{}", self.system_prompt, format_instructions(schema)),
            None => self.system_prompt.clone(),
        }
    }
}

/// Token usage reported by the provider
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

impl AddAssign for Usage {
    fn add_assign(&mut self, other: Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

/// Parsed gateway answer
#[derive(Clone, Debug, PartialEq)]
pub struct GatewayResponse {
    pub data: Value,
    pub usage: Usage,
}

impl GatewayResponse {
    /// Deserialize the payload into a typed raw result
    pub fn decode<T: DeserializeOwned>(self) -> Result<(T, Usage), ParseError> {
        let decoded = serde_json::from_value(self.data)
            .map_err(|e| ParseError::Schema(e.to_string()))?;
        Ok((decoded, self.usage))
    }
}

/// Boundary to a structured-output model endpoint
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Send one request and return the parsed JSON answer.
    ///
    /// Called exactly once per pipeline step; implementations must not retry.
    async fn generate(&self, request: GenerationRequest) -> Result<GatewayResponse, GatewayError>;
}
