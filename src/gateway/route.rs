use std::fmt;

/// Model provider behind an endpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Groq,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAi => write!(f, "openai"),
            Provider::Groq => write!(f, "groq"),
        }
    }
}

/// Where a model id is sent and under which name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelRoute {
    pub provider: Provider,
    /// Model name as the provider expects it
    pub model_name: String,
}

/// Route a model id to its provider.
///
/// Ids starting with `llama` go to Groq; Llama 4 ids are namespaced as
/// `meta-llama/<id>`. Everything else goes to OpenAI unchanged.
pub fn route_model(model_id: &str) -> ModelRoute {
    if model_id.starts_with("llama") {
        let model_name = if model_id.contains("llama-4") {
            format!("meta-llama/{}", model_id)
        } else {
            model_id.to_string()
        };
        return ModelRoute {
            provider: Provider::Groq,
            model_name,
        };
    }

    ModelRoute {
        provider: Provider::OpenAi,
        model_name: model_id.to_string(),
    }
}

/// API keys per provider
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// OpenAI key, also the fallback for every other provider
    pub primary: Option<String>,
    pub groq: Option<String>,
}

impl Credentials {
    pub fn new(primary: Option<String>, groq: Option<String>) -> Self {
        Self {
            primary: non_empty(primary),
            groq: non_empty(groq),
        }
    }

    /// Key to use for a provider; Groq falls back to the primary key
    pub fn for_provider(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::OpenAi => self.primary.as_deref(),
            Provider::Groq => self.groq.as_deref().or(self.primary.as_deref()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.groq.is_none()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("primary", &self.primary.as_ref().map(|_| "<redacted>"))
            .field("groq", &self.groq.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
