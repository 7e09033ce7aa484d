mod config;
mod errors;
mod interview;
mod llm_client;
mod routes;
mod screening;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::interview::controller::TurnController;
use crate::interview::stages::{InterviewSettings, Pipeline};
use crate::interview::store::{InMemorySessionStore, RedisSessionStore, SessionStore};
use crate::llm_client::{LlmClient, TextGenerator};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting interview API v{}", env!("CARGO_PKG_VERSION"));

    // Session store: Redis when configured, in-process otherwise
    let store: Arc<dyn SessionStore> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            Arc::new(RedisSessionStore::connect(&client, config.session_ttl_secs).await?)
        }
        None => {
            info!("REDIS_URL not set, sessions are kept in memory");
            Arc::new(InMemorySessionStore::new())
        }
    };

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm_timeout)?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let generator: Arc<dyn TextGenerator> = Arc::new(llm);

    let pipeline = Pipeline::standard(
        generator.clone(),
        InterviewSettings {
            max_turns: config.interview_max_turns,
            generation_timeout: config.llm_timeout,
        },
    );
    info!(
        "Interview pipeline ready (max_turns={}, timeout={:?})",
        config.interview_max_turns, config.llm_timeout
    );
    let controller = TurnController::new(pipeline, store, config.interview_greeting.clone());

    // Build app state
    let state = AppState {
        controller: Arc::new(controller),
        generator,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
