mod config;
mod llm;
mod routes;
mod services;
mod state;
mod view;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Missing .env is fine; real env vars still apply.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::AppConfig::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
    })?;

    let llm = llm::LlmClient::from_config(config.llm.clone())?;
    tracing::info!(model = llm.model(), variant = config.variant.as_str(), "completion client ready");

    let state = state::AppState::new(Arc::new(llm), &config)?;

    // Spawn background idle-session sweeper.
    let _sweeper =
        services::session::spawn_session_sweeper(state.sessions.clone(), Duration::from_secs(config.session_idle_secs));

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    tracing::info!(port = config.port, "docai listening");
    axum::serve(listener, app).await?;
    Ok(())
}
