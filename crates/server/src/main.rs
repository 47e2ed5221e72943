mod api;
mod bootstrap;
mod health;
mod render;

use anyhow::Result;
use proposta_core::config::{AppConfig, LoadOptions};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins when it parses; otherwise the configured level applies.
fn log_filter(env_directive: Option<String>, level: &str) -> EnvFilter {
    env_directive
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .or_else(|| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn init_logging(config: &AppConfig) {
    use proposta_core::config::LogFormat::*;

    let filter = log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok(), &config.logging.level);
    let builder = tracing_subscriber::fmt().with_target(false).with_env_filter(filter);

    match config.logging.format {
        Compact => builder.compact().init(),
        Pretty => builder.pretty().init(),
        Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Logging reads its level and format from the same config the app uses.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        model = %app.config.llm.model,
        api_key_configured = app.config.llm.has_api_key(),
        "proposta-server listening"
    );

    axum::serve(listener, app.router()).with_graceful_shutdown(wait_for_shutdown()).await?;

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "proposta-server stopping"
    );

    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            event_name = "system.server.signal_error",
            correlation_id = "shutdown",
            error = %error,
            "failed to listen for shutdown signal"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::log_filter;

    #[test]
    fn configured_level_applies_without_rust_log() {
        assert_eq!(log_filter(None, "debug").to_string(), "debug");
    }

    #[test]
    fn rust_log_directive_overrides_configured_level() {
        let filter = log_filter(Some("proposta_agent=trace".to_string()), "warn");
        assert_eq!(filter.to_string(), "proposta_agent=trace");
    }
}
