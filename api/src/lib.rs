//! HTTP surface of the QA bot: chat, direct teaching, knowledge listing, health.

use std::{env, sync::Arc, time::Duration};

mod core;
mod error_handler;
mod middleware_layer;
mod routes;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::signal;
use tracing::{info, warn};

pub use crate::core::app_state::AppState;
pub use crate::error_handler::{AppError, AppResult};

use crate::{
    middleware_layer::json_extractor::json_error_mapper,
    routes::{
        chat::chat_route::get_response, health_route::health, knowledge_route::knowledge,
        teach::teach_route::teach_bot,
    },
};

const DEFAULT_API_ADDRESS: &str = "127.0.0.1:8080";

/// Builds the application router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/get_response", post(get_response))
        .route("/teach_bot", post(teach_bot))
        .route("/knowledge", get(knowledge))
        .route("/health", get(health))
        .layer(middleware::from_fn(json_error_mapper))
        .with_state(state)
}

/// Loads state from the environment, binds `API_ADDRESS` and serves until Ctrl+C.
pub async fn start() -> Result<(), AppError> {
    let host_url = env::var("API_ADDRESS")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_ADDRESS.to_string());

    let state = Arc::new(AppState::from_env()?);
    let sweeper = tokio::spawn(sweep_sessions(state.clone()));
    let app = router(state);

    // Bind to address
    let listener = tokio::net::TcpListener::bind(&host_url)
        .await
        .map_err(AppError::Bind)?;
    info!(address = %host_url, "api: listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    sweeper.abort();
    info!("api: stopped");
    Ok(())
}

/// Periodically drops sessions idle for longer than `state.session_ttl`.
async fn sweep_sessions(state: Arc<AppState>) {
    let ttl = state.session_ttl;
    let mut tick = tokio::time::interval((ttl / 4).max(Duration::from_secs(1)));
    loop {
        tick.tick().await;
        let evicted = state.engine.sessions().evict_idle(ttl).await;
        if evicted > 0 {
            info!(evicted, "api: idle sessions evicted");
        }
    }
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        warn!(error = %err, "api: failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
