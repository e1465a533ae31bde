use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use threadrelay_agent::provider::Model;
use threadrelay_agent::{MentionPipeline, OpenAiClient};
use threadrelay_slack::SlackClient;

mod app;
mod http;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "threadrelay_gateway=info,tower_http=debug".into()),
        )
        .init();

    // load config: explicit THREADRELAY_CONFIG path > ~/.threadrelay/threadrelay.toml
    let config_path = std::env::var("THREADRELAY_CONFIG").ok();
    let config = threadrelay_core::config::RelayConfig::load(config_path.as_deref())?;

    // A missing credential is a startup failure, never an empty live secret.
    config.validate()?;

    let model: Model = config.agent.model.parse()?;

    // Shared, immutable-after-construction service handles. Each holds one
    // pooled reqwest client reused across invocations.
    let slack = Arc::new(SlackClient::new(config.slack.bot_token.clone(), None));
    let completions = Arc::new(OpenAiClient::new(
        config.openai.api_key.clone(),
        Some(config.openai.base_url.clone()),
    ));
    let pipeline = MentionPipeline::new(slack, completions, model, config.agent.persona.clone());

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;

    let state = Arc::new(app::AppState::new(config, pipeline));
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!(model = %model, "ThreadRelay gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
