use std::sync::Arc;

use proposta_core::errors::GenerationError;
use proposta_core::pricing::proposal_total;
use proposta_core::prompt::compile_prompt;
use proposta_core::response::parse_with_schema;
use proposta_core::session::{GenerationGate, GenerationState};
use proposta_core::{ProposalInput, ProposalOutput};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::llm::{GenerationClient, GenerationRequest};

/// Orchestrates one proposal generation per call, at most one at a time.
pub struct ProposalGenerator {
    client: Arc<dyn GenerationClient>,
    model: String,
    gate: GenerationGate,
}

impl ProposalGenerator {
    pub fn new(client: Arc<dyn GenerationClient>, model: impl Into<String>) -> Self {
        Self { client, model: model.into(), gate: GenerationGate::default() }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn state(&self) -> GenerationState {
        self.gate.state()
    }

    pub fn is_configured(&self) -> bool {
        self.client.ensure_configured().is_ok()
    }

    pub async fn generate(&self, input: &ProposalInput) -> Result<ProposalOutput, GenerationError> {
        let correlation_id = Uuid::new_v4().to_string();
        self.generate_with_correlation(input, &correlation_id).await
    }

    pub async fn generate_with_correlation(
        &self,
        input: &ProposalInput,
        correlation_id: &str,
    ) -> Result<ProposalOutput, GenerationError> {
        // Missing credentials win over a busy gate.
        if let Err(failure) = self.client.ensure_configured() {
            error!(
                event_name = "proposal.generation.failed",
                correlation_id,
                error_kind = failure.kind(),
                error = %failure,
                "proposal generation failed"
            );
            return Err(failure);
        }

        let _ticket = match self.gate.try_begin() {
            Ok(ticket) => ticket,
            Err(rejection) => {
                warn!(
                    event_name = "proposal.generation.rejected",
                    correlation_id,
                    error_kind = rejection.kind(),
                    "generation request rejected while another is in flight"
                );
                return Err(rejection);
            }
        };

        let result = self.run(input, correlation_id).await;
        match &result {
            Ok(output) => info!(
                event_name = "proposal.generation.completed",
                correlation_id,
                title = %output.title,
                methodology_steps = output.methodology.len(),
                terms = output.terms_and_conditions.len(),
                "proposal content generated"
            ),
            Err(failure) => error!(
                event_name = "proposal.generation.failed",
                correlation_id,
                error_kind = failure.kind(),
                error = %failure,
                "proposal generation failed"
            ),
        }
        result
    }

    async fn run(
        &self,
        input: &ProposalInput,
        correlation_id: &str,
    ) -> Result<ProposalOutput, GenerationError> {
        input.validate()?;

        for warning in input.preflight_warnings() {
            warn!(
                event_name = "proposal.generation.preflight_warning",
                correlation_id,
                warning = ?warning,
                "{}",
                warning.message()
            );
        }

        let total = proposal_total(&input.items);
        info!(
            event_name = "proposal.generation.started",
            correlation_id,
            model = %self.model,
            line_items = input.items.len(),
            total = %total,
            tone = input.tone.as_str(),
            "generating proposal content"
        );

        let compiled = compile_prompt(input);
        let request = GenerationRequest::structured(self.model.clone(), &compiled);
        let raw = self.client.generate(&request).await?;

        Ok(parse_with_schema(&raw, &compiled.schema)?)
    }
}
