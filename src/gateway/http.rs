use super::{
    parse_json_response, route_model, ContentPart, Credentials, Gateway, GatewayResponse,
    GenerationRequest, Provider, Usage, UserContent,
};
use crate::error::GatewayError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const GROQ_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Chat-completions URLs per provider
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayEndpoints {
    pub openai: String,
    pub groq: String,
}

impl Default for GatewayEndpoints {
    fn default() -> Self {
        Self {
            openai: OPENAI_CHAT_URL.to_string(),
            groq: GROQ_CHAT_URL.to_string(),
        }
    }
}

impl GatewayEndpoints {
    fn url(&self, provider: Provider) -> &str {
        match provider {
            Provider::OpenAi => &self.openai,
            Provider::Groq => &self.groq,
        }
    }
}

/// Gateway speaking the OpenAI chat-completions protocol
///
/// Groq exposes the same protocol, so one client serves both providers.
pub struct HttpGateway {
    http_client: Client,
    endpoints: GatewayEndpoints,
    credentials: Credentials,
}

impl HttpGateway {
    pub fn new(
        endpoints: GatewayEndpoints,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("pixelsmith/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            endpoints,
            credentials,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

fn user_content_json(content: &UserContent) -> Value {
    match content {
        UserContent::Text(text) => json!([{ "type": "text", "text": text }]),
        UserContent::Parts(parts) => Value::Array(
            parts
                .iter()
                .map(|part| match part {
                    ContentPart::Text(text) => json!({ "type": "text", "text": text }),
                    ContentPart::ImagePng(data) => json!({
                        "type": "image_url",
                        "image_url": { "url": format!("data:image/png;base64,{}", data) }
                    }),
                })
                .collect(),
        ),
    }
}

/// Request body for a chat-completions call
pub(crate) fn request_body(request: &GenerationRequest, model_name: &str) -> Value {
    json!({
        "model": model_name,
        "messages": [
            { "role": "system", "content": request.full_system_prompt() },
            { "role": "user", "content": user_content_json(&request.user_content) }
        ],
        "temperature": request.temperature,
        "max_tokens": request.max_output_tokens,
    })
}

async fn check_response_status(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn generate(&self, request: GenerationRequest) -> Result<GatewayResponse, GatewayError> {
        let route = route_model(&request.model_id);
        let api_key = self
            .credentials
            .for_provider(route.provider)
            .ok_or_else(|| GatewayError::MissingCredential(route.provider.to_string()))?;
        let url = self.endpoints.url(route.provider);

        debug!(
            step = request.step,
            provider = %route.provider,
            model = %route.model_name,
            images = request.user_content.image_count(),
            "Sending generation request"
        );
        let started = Instant::now();

        let response = self
            .http_client
            .post(url)
            .bearer_auth(api_key)
            .json(&request_body(&request, &route.model_name))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let response = match check_response_status(response).await {
            Ok(response) => response,
            Err(e) => {
                warn!(step = request.step, model = %route.model_name, error = %e, "Generation request rejected");
                return Err(e);
            }
        };

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(format!("invalid completion body: {}", e)))?;

        let usage = completion
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        let data = parse_json_response(&content).map_err(|e| {
            warn!(step = request.step, error = %e, "Model output was not valid JSON");
            GatewayError::Parse(e)
        })?;

        info!(
            step = request.step,
            model = %route.model_name,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Generation request complete"
        );

        Ok(GatewayResponse { data, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use mockito::{Matcher, Server};

    fn gateway_for(server: &Server, credentials: Credentials) -> HttpGateway {
        let endpoints = GatewayEndpoints {
            openai: format!("{}/openai/chat/completions", server.url()),
            groq: format!("{}/groq/chat/completions", server.url()),
        };
        HttpGateway::new(endpoints, credentials, Duration::from_secs(5)).unwrap()
    }

    fn completion(content: &str) -> String {
        json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }],
            "usage": { "prompt_tokens": 120, "completion_tokens": 30 }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_generate_parses_fenced_content() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/openai/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4o-mini",
                "temperature": 0.5,
                "max_tokens": 2000
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion("```json\n{\"name\": \"Knight\"}\n```"))
            .create_async()
            .await;

        let gateway = gateway_for(&server, Credentials::new(Some("sk-test".to_string()), None));
        let request = GenerationRequest::new("plan", "system", "make a knight", "gpt-4o-mini")
            .with_temperature(0.5);
        let response = gateway.generate(request).await.unwrap();

        assert_eq!(response.data, json!({"name": "Knight"}));
        assert_eq!(response.usage.input_tokens, 120);
        assert_eq!(response.usage.output_tokens, 30);
    }

    #[tokio::test]
    async fn test_llama_routes_to_groq_with_fallback_key() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/groq/chat/completions")
            .match_header("authorization", "Bearer sk-primary")
            .match_body(Matcher::PartialJson(json!({
                "model": "meta-llama/llama-4-scout-17b-16e-instruct"
            })))
            .with_status(200)
            .with_body(completion("{\"ok\": true}"))
            .create_async()
            .await;

        let gateway = gateway_for(&server, Credentials::new(Some("sk-primary".to_string()), None));
        let request = GenerationRequest::new(
            "part",
            "system",
            "draw",
            "llama-4-scout-17b-16e-instruct",
        );
        let response = gateway.generate(request).await.unwrap();
        assert_eq!(response.data, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_non_success_status_is_reported() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/openai/chat/completions")
            .with_status(429)
            .with_body("slow down")
            .create_async()
            .await;

        let gateway = gateway_for(&server, Credentials::new(Some("sk-test".to_string()), None));
        let request = GenerationRequest::new("plan", "system", "x", "gpt-4o-mini");
        let err = gateway.generate(request).await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::Status {
                status: 429,
                body: "slow down".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_unparseable_content_is_a_parse_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/openai/chat/completions")
            .with_status(200)
            .with_body(completion("I cannot help with that."))
            .create_async()
            .await;

        let gateway = gateway_for(&server, Credentials::new(Some("sk-test".to_string()), None));
        let request = GenerationRequest::new("plan", "system", "x", "gpt-4o-mini");
        let err = gateway.generate(request).await.unwrap_err();
        assert_eq!(err, GatewayError::Parse(ParseError::NoJson));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_sending() {
        let server = Server::new_async().await;
        let gateway = gateway_for(&server, Credentials::default());
        let request = GenerationRequest::new("plan", "system", "x", "gpt-4o-mini");
        let err = gateway.generate(request).await.unwrap_err();
        assert_eq!(err, GatewayError::MissingCredential("openai".to_string()));
    }

    #[test]
    fn test_request_body_attaches_images_as_data_urls() {
        let request = GenerationRequest::new(
            "transform",
            "system",
            UserContent::Parts(vec![
                ContentPart::Text("look".to_string()),
                ContentPart::ImagePng("iVBOR".to_string()),
            ]),
            "gpt-4o-mini",
        );
        let body = request_body(&request, "gpt-4o-mini");
        let user = &body["messages"][1]["content"];
        assert_eq!(user[0]["type"], json!("text"));
        assert_eq!(user[1]["image_url"]["url"], json!("data:image/png;base64,iVBOR"));
    }
}
