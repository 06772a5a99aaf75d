use axum::{
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod error;
pub mod handlers;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

pub async fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/health", get(handlers::health))
        .route("/rag/vector/build", post(handlers::build_vector))
        .route("/rag/vector/query", post(handlers::query_vector))
        .route("/rag/graph/build", post(handlers::build_graph))
        .route("/rag/graph/query", post(handlers::query_graph))
        .route("/rag/graph/:id", delete(handlers::erase_graph))
        .route("/agent/news-analysis", post(handlers::news_analysis))
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Binds `addr` and serves the API until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> nr_core::Result<()> {
    let app = create_app(state).await;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("🌐 API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

pub mod prelude {
    pub use nr_core::{Error, Result};
    pub use crate::{create_app, serve, ApiError, AppState};
}
