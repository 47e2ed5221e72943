use async_trait::async_trait;
use proposta_core::errors::GenerationError;
use proposta_core::prompt::CompiledPrompt;
use serde_json::Value;

pub const JSON_MIME_TYPE: &str = "application/json";

#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub response_mime_type: &'static str,
    pub schema: Value,
}

impl GenerationRequest {
    pub fn structured(model: impl Into<String>, compiled: &CompiledPrompt) -> Self {
        Self {
            model: model.into(),
            prompt: compiled.instructions.clone(),
            response_mime_type: JSON_MIME_TYPE,
            schema: compiled.schema_descriptor.clone(),
        }
    }
}

#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Fails with `GenerationError::Configuration` when the client cannot make
    /// a call at all. Checked before any request is built.
    fn ensure_configured(&self) -> Result<(), GenerationError> {
        Ok(())
    }

    /// One outbound call, no retries. Returns the raw text payload.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}
