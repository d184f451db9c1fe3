//! Motor del tablero de cargas
//!
//! Cliente del backend del marketplace, ciclo de vida de las pujas con
//! reconciliación del estado de los camiones, y un gateway HTTP en axum.

pub mod api;
pub mod clients;
pub mod config;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use clients::{LoadBoardBackend, MemoryBackend, RestBackendClient};
use config::{BackendMode, EnvironmentConfig};
use state::AppState;
use utils::errors::AppResult;

const MAX_CONCURRENT_REQUESTS: usize = 512;

/// Backend según `BACKEND_MODE`; en modo memoria se cargan datos de demostración
pub async fn build_backend(config: &EnvironmentConfig) -> AppResult<Arc<dyn LoadBoardBackend>> {
    match config.backend_mode {
        BackendMode::Rest => {
            let client = RestBackendClient::new(config.backend_base_url.clone(), config.request_timeout)?;
            tracing::info!("🌐 Backend REST en {}", client.base_url());
            Ok(Arc::new(client))
        }
        BackendMode::Memory => {
            tracing::warn!("🧪 Backend en memoria con datos de demostración");
            let backend: MemoryBackend = clients::fixtures::demo_backend().await;
            Ok(Arc::new(backend))
        }
    }
}

/// Router completo del gateway con sus capas
pub fn build_app(state: AppState) -> Router {
    let cors = middleware::cors_layer(&state.config.cors_origins);

    api::create_api_router(state.clone())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(GlobalConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
                .layer(cors),
        )
        .with_state(state)
}
