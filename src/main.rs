use anyhow::Context;
use article_forge::config::Config;
use article_forge::routes::{AppState, router};
use article_forge::services::controller::GenerationController;
use article_forge::services::llm::LLMClient;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let llm_client = LLMClient::new(&config.provider)?;
    tracing::info!(
        api_url = llm_client.api_url(),
        model = %config.provider.model,
        "provider configured"
    );
    if config.provider.timeout.is_none() {
        tracing::debug!("no provider timeout set, a stalled provider keeps the form busy");
    }

    let app_state = AppState {
        controller: Arc::new(GenerationController::new(Arc::new(llm_client))),
    };
    let app = router(app_state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
