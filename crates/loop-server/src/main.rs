//! Loop Server - backend for loop route generation and editing

use anyhow::Result;
use axum::routing::get;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loop_server::api;
use loop_server::config::Config;
use loop_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("loop_server=debug".parse()?)
            .add_directive("loop_core=info".parse()?))
        .init();

    tracing::info!("Starting Loop Server...");

    let config = Config::from_env();
    let port = config.server_port;
    tracing::info!(
        profile = %config.ors_profile,
        model = %config.ollama_model,
        "Routing via {}",
        config.ors_base_url
    );
    let state = Arc::new(AppState::from_config(config)?);

    // Build the app
    let app = api::routes()
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Run server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
