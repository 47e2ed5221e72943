use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use proposta_agent::{GeminiClient, GeminiConfig, ProposalGenerator};
use proposta_core::config::{AppConfig, ConfigError};
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{self, ApiState};
use crate::health;
use crate::render::{ProposalRenderer, RenderError};

pub struct Application {
    pub config: AppConfig,
    pub generator: Arc<ProposalGenerator>,
    pub renderer: Arc<ProposalRenderer>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        model = %config.llm.model,
        "starting application bootstrap"
    );

    if !config.llm.has_api_key() {
        warn!(
            event_name = "system.bootstrap.api_key_missing",
            correlation_id = "bootstrap",
            "no generation api key configured; generation requests will fail until one is set"
        );
    }

    let client = GeminiClient::new(GeminiConfig::from(&config.llm));
    let generator = Arc::new(ProposalGenerator::new(Arc::new(client), config.llm.model.clone()));
    let renderer = Arc::new(ProposalRenderer::from_config(&config.render)?);

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        "application components initialized"
    );

    Ok(Application { config, generator, renderer })
}

impl Application {
    pub fn router(&self) -> Router {
        let timeout = self.config.llm.timeout_secs.map(Duration::from_secs);
        api::router(ApiState::new(self.generator.clone(), self.renderer.clone(), timeout))
            .merge(health::router(self.generator.clone()))
    }
}
