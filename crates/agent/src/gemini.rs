//! Gemini `generateContent` client.
//!
//! Requests JSON-only output and passes the compiled schema as
//! `responseSchema`, so the service constrains its answer to the proposal
//! shape. The answer is still validated downstream.

use async_trait::async_trait;
use proposta_core::config::{LlmConfig, DEFAULT_LLM_BASE_URL};
use proposta_core::errors::GenerationError;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::llm::{GenerationClient, GenerationRequest};

#[derive(Clone, Debug)]
pub struct GeminiConfig {
    api_key: Option<SecretString>,
    pub base_url: String,
}

impl GeminiConfig {
    pub fn new(api_key: Option<SecretString>) -> Self {
        Self { api_key, base_url: DEFAULT_LLM_BASE_URL.to_string() }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(|key| key.expose_secret()).filter(|key| !key.trim().is_empty())
    }
}

impl From<&LlmConfig> for GeminiConfig {
    fn from(config: &LlmConfig) -> Self {
        Self::new(config.api_key.clone()).with_base_url(config.base_url.clone())
    }
}

pub struct GeminiClient {
    config: GeminiConfig,
    http: Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self { config, http: Client::new() }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }

    async fn read_failure(response: Response) -> GenerationError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .ok()
            .and_then(|envelope| envelope.error)
            .and_then(|error| error.message)
            .unwrap_or(body);

        GenerationError::Service { status: Some(status.as_u16()), message }
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    fn ensure_configured(&self) -> Result<(), GenerationError> {
        match self.config.api_key() {
            Some(_) => Ok(()),
            None => Err(GenerationError::Configuration(
                "llm.api_key is not set (PROPOSTA_LLM_API_KEY or GEMINI_API_KEY)".to_string(),
            )),
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.ensure_configured()?;
        let api_key = self.config.api_key().unwrap_or_default();

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: &request.prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: request.response_mime_type,
                response_schema: &request.schema,
            },
        };

        debug!(
            event_name = "proposal.llm.request",
            model = %request.model,
            prompt_chars = request.prompt.chars().count(),
            "sending generateContent request"
        );

        let response = self
            .http
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    GenerationError::service(format!("request timed out: {error}"))
                } else if error.is_connect() {
                    GenerationError::service(format!("connection failed: {error}"))
                } else {
                    GenerationError::service(error.to_string())
                }
            })?;

        if !response.status().is_success() {
            let failure = Self::read_failure(response).await;
            warn!(
                event_name = "proposal.llm.rejected",
                model = %request.model,
                error = %failure,
                "generation service returned a non-success status"
            );
            return Err(failure);
        }

        let payload: GenerateContentResponse = response.json().await.map_err(|error| {
            GenerationError::service(format!("malformed generateContent envelope: {error}"))
        })?;

        let text = payload.text();
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        debug!(
            event_name = "proposal.llm.response",
            model = %request.model,
            payload_chars = text.chars().count(),
            "received generateContent payload"
        );
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
    response_schema: &'a Value,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, all text parts concatenated.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content.parts.iter().filter_map(|part| part.text.as_deref()).collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}
