//! JSON API consumed by the proposal form.
//!
//! - `POST /api/v1/proposals/generate`: generate proposal content
//! - `POST /api/v1/proposals/document`: render the printable document (HTML)
//! - `GET  /api/v1/proposals/state`: current generation state

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use proposta_agent::ProposalGenerator;
use proposta_core::errors::{GenerationError, InterfaceError};
use proposta_core::{proposal_total, GenerationState, PreflightWarning};
use proposta_core::{ProposalInput, ProposalOutput};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::render::ProposalRenderer;

#[derive(Clone)]
pub struct ApiState {
    generator: Arc<ProposalGenerator>,
    renderer: Arc<ProposalRenderer>,
    timeout: Option<Duration>,
}

impl ApiState {
    pub fn new(
        generator: Arc<ProposalGenerator>,
        renderer: Arc<ProposalRenderer>,
        timeout: Option<Duration>,
    ) -> Self {
        Self { generator, renderer, timeout }
    }
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct WarningView {
    pub code: PreflightWarning,
    pub message: &'static str,
}

impl From<PreflightWarning> for WarningView {
    fn from(warning: PreflightWarning) -> Self {
        Self { code: warning, message: warning.message() }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub proposal: ProposalOutput,
    pub total: Decimal,
    pub warnings: Vec<WarningView>,
}

#[derive(Debug, Deserialize)]
pub struct DocumentRequest {
    pub input: ProposalInput,
    pub proposal: ProposalOutput,
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub state: GenerationState,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: &'static str,
    pub correlation_id: String,
}

/// Caller-facing failure. Carries only the category and a generic message;
/// the underlying detail is logged where it happens.
#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::Conflict { .. } => StatusCode::CONFLICT,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::BAD_GATEWAY,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn rejected_payload(rejection: JsonRejection, correlation_id: &str) -> Self {
        warn!(
            event_name = "api.request.rejected",
            correlation_id,
            error = %rejection.body_text(),
            "request body could not be decoded"
        );
        Self(InterfaceError::BadRequest {
            kind: "invalid_payload",
            message: rejection.body_text(),
            correlation_id: correlation_id.to_string(),
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            kind: self.0.kind(),
            message: self.0.user_message(),
            correlation_id: self.0.correlation_id().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/proposals/generate", post(generate_proposal))
        .route("/api/v1/proposals/document", post(render_document))
        .route("/api/v1/proposals/state", get(proposal_state))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn generate_proposal(
    State(state): State<ApiState>,
    payload: Result<Json<ProposalInput>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let Json(input) =
        payload.map_err(|rejection| ApiError::rejected_payload(rejection, &correlation_id))?;

    let attempt = state.generator.generate_with_correlation(&input, &correlation_id);
    let outcome = match state.timeout {
        Some(limit) => match tokio::time::timeout(limit, attempt).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    event_name = "api.generate.timed_out",
                    correlation_id = %correlation_id,
                    timeout_secs = limit.as_secs(),
                    "generation service did not answer in time"
                );
                Err(GenerationError::service(format!(
                    "no response within {} seconds",
                    limit.as_secs()
                )))
            }
        },
        None => attempt.await,
    };

    let proposal =
        outcome.map_err(|failure| ApiError(failure.into_interface(correlation_id.clone())))?;

    Ok(Json(GenerateResponse {
        proposal,
        total: proposal_total(&input.items),
        warnings: input.preflight_warnings().into_iter().map(WarningView::from).collect(),
    }))
}

pub async fn render_document(
    State(state): State<ApiState>,
    payload: Result<Json<DocumentRequest>, JsonRejection>,
) -> Result<Html<String>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let Json(request) =
        payload.map_err(|rejection| ApiError::rejected_payload(rejection, &correlation_id))?;

    request.input.validate().map_err(|violation| {
        ApiError(GenerationError::from(violation).into_interface(correlation_id.clone()))
    })?;

    let html = state
        .renderer
        .render(&request.input, &request.proposal, Local::now().date_naive())
        .map_err(|failure| {
            error!(
                event_name = "api.document.render_failed",
                correlation_id = %correlation_id,
                error = %failure,
                "proposal document rendering failed"
            );
            ApiError(InterfaceError::Internal {
                kind: "render",
                message: failure.to_string(),
                correlation_id: correlation_id.clone(),
            })
        })?;

    info!(
        event_name = "api.document.rendered",
        correlation_id = %correlation_id,
        line_items = request.input.items.len(),
        bytes = html.len(),
        "proposal document rendered"
    );
    Ok(Html(html))
}

pub async fn proposal_state(State(state): State<ApiState>) -> Json<StateResponse> {
    Json(StateResponse { state: state.generator.state() })
}
