//! Arranque y parada del refresco periódico del tablero

use axum::{
    extract::State,
    routing::post,
    Extension, Json, Router,
};
use std::time::Duration;

use crate::{
    dto::{ApiResponse, PollingResponse, StartPollingBody},
    models::{AccountType, Session},
    services::{BoardPoller, SharedBoard},
    state::AppState,
    utils::errors::{AppError, AppResult},
};

pub fn create_board_router() -> Router<AppState> {
    Router::new().route("/poll", post(start_polling).delete(stop_polling))
}

pub async fn start_polling(
    Extension(session): Extension<Session>,
    State(state): State<AppState>,
    body: Option<Json<StartPollingBody>>,
) -> AppResult<Json<ApiResponse<PollingResponse>>> {
    let board = match session.account_type {
        AccountType::Trucker => SharedBoard::Trucker(state.trucker_board(&session.account_id).await),
        AccountType::Client => SharedBoard::Client(state.client_board(&session.account_id).await),
        other => {
            return Err(AppError::Validation(format!(
                "{:?} accounts have no board to refresh",
                other
            )))
        }
    };

    let period = body
        .and_then(|Json(body)| body.interval_secs)
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(state.config.poll_interval);

    let poller = BoardPoller::spawn(state.backend.clone(), session.clone(), board, period);
    state.replace_poller(&session.account_id, poller).await;

    Ok(Json(ApiResponse::ok(PollingResponse {
        account_id: session.account_id,
        running: true,
        interval_secs: period.as_secs(),
    })))
}

pub async fn stop_polling(
    Extension(session): Extension<Session>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<PollingResponse>>> {
    if !state.stop_poller(&session.account_id).await {
        return Err(AppError::NotFound("No board polling is running for this account".to_string()));
    }
    Ok(Json(ApiResponse::ok(PollingResponse {
        account_id: session.account_id,
        running: false,
        interval_secs: 0,
    })))
}
