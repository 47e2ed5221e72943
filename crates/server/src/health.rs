use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use proposta_agent::ProposalGenerator;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    generator: Arc<ProposalGenerator>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub generation: HealthCheck,
    pub checked_at: String,
}

pub fn router(generator: Arc<ProposalGenerator>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { generator })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let generation = generation_check(&state.generator);
    let ready = generation.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "proposta-server runtime initialized".to_string(),
        },
        generation,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn generation_check(generator: &ProposalGenerator) -> HealthCheck {
    if generator.is_configured() {
        HealthCheck {
            status: "ready",
            detail: format!("api key configured for model `{}`", generator.model()),
        }
    } else {
        HealthCheck {
            status: "degraded",
            detail: "api key missing; set PROPOSTA_LLM_API_KEY or GEMINI_API_KEY".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use proposta_agent::{GeminiClient, GeminiConfig, ProposalGenerator};

    use crate::health::{health, HealthState};

    fn state(api_key: Option<&str>) -> State<HealthState> {
        let config = GeminiConfig::new(api_key.map(|key| key.to_string().into()));
        let client = GeminiClient::new(config);
        State(HealthState {
            generator: Arc::new(ProposalGenerator::new(Arc::new(client), "gemini-2.5-flash")),
        })
    }

    #[tokio::test]
    async fn health_returns_ready_when_api_key_is_configured() {
        let (status, Json(payload)) = health(state(Some("test-key"))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.generation.status, "ready");
        assert!(payload.generation.detail.contains("gemini-2.5-flash"));
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_without_api_key() {
        let (status, Json(payload)) = health(state(None)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.generation.status, "degraded");
        assert!(!payload.generation.detail.contains("test-key"));
        assert_eq!(payload.service.status, "ready");
    }
}
