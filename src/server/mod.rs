//! Backend HTTP surface.
//!
//! ## Endpoints
//! - `GET /read` - proxy the device's current reading
//! - `GET /set_baseline?value=N`, `GET /get_baseline` - process-lifetime baseline
//! - `GET /log?value=&label=` - append one labelled row
//! - `POST /log` - buffer a reading for the next window summary
//! - `GET /logs` - the window summary CSV

pub mod error;
pub mod handlers;
pub mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    http::Method,
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::settings::ServerSettings;

pub use error::ApiError;
pub use state::ServerState;

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "server";

use crate::log_info;

pub fn router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST]);

    Router::new()
        .route("/read", get(handlers::read_device))
        .route("/set_baseline", get(handlers::set_baseline))
        .route("/get_baseline", get(handlers::get_baseline))
        .route("/log", get(handlers::log_label).post(handlers::log_sample))
        .route("/logs", get(handlers::get_logs))
        .layer(cors)
        .with_state(state)
}

/// Bind, serve until Ctrl-C, then write out whatever is still buffered.
pub async fn serve(settings: &ServerSettings) -> Result<()> {
    let state = Arc::new(ServerState::new(settings));
    let app = router(state.clone());

    let listener = tokio::net::TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;
    log_info!(
        "listening on http://{} (device {}, flush every {}s)",
        listener.local_addr()?,
        settings.device_url,
        settings.flush_interval_secs
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if state.flush_pending().await.is_some() {
        log_info!("flushed pending window on shutdown");
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for Ctrl-C: {err}");
    }
}
