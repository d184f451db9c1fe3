//! API endpoints
//!
//! Todas las rutas bajo `/api` exigen un token bearer válido.

pub mod bids;
pub mod board;
pub mod client;
pub mod statuses;
pub mod trucker;
pub mod trucks;

use axum::{middleware::from_fn_with_state, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::{middleware::auth_middleware, state::AppState};

/// Crear el router principal de la API
pub fn create_api_router(state: AppState) -> Router<AppState> {
    let api = Router::new()
        .nest("/statuses", statuses::create_statuses_router())
        .nest("/trucker", trucker::create_trucker_router())
        .nest("/client", client::create_client_router())
        .nest("/bids", bids::create_bids_router())
        .nest("/trucks", trucks::create_trucks_router())
        .nest("/board", board::create_board_router())
        .layer(from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "loadboard",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
