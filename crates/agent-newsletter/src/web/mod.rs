//! Web form for running research
//!
//! - `GET /` shows the form
//! - `POST /research` runs the pipeline and shows the newsletter
//! - `GET /health` reports liveness as JSON

mod handlers;
mod state;
mod templates;

pub use handlers::{HealthResponse, ResearchForm};
pub use state::{AppState, PipelineFactory};
pub use templates::Pages;

use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/research", post(handlers::research))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the form on `addr` until the process stops
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Newsletter web form listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
