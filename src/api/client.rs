//! Endpoints del cliente: tablero de pujas, aceptación y publicación de
//! solicitudes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};

use crate::{
    dto::ApiResponse,
    models::{AccountType, LoadRequest, NewLoadRequest, Session},
    services::{board_poller::refresh_client_board, AcceptanceOutcome, ClientBoard},
    state::AppState,
    utils::errors::AppResult,
};

pub fn create_client_router() -> Router<AppState> {
    Router::new()
        .route("/bids", get(client_board))
        .route("/bids/:id/accept", post(accept_bid))
        .route("/requests", post(create_load_request))
}

pub async fn client_board(
    Extension(session): Extension<Session>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ClientBoard>>> {
    session.require(AccountType::Client)?;
    let board = state.client_board(&session.account_id).await;
    refresh_client_board(state.backend.as_ref(), &session, &board).await?;

    let snapshot = board.read().await.clone();
    Ok(Json(ApiResponse::ok(snapshot)))
}

pub async fn accept_bid(
    Extension(session): Extension<Session>,
    State(state): State<AppState>,
    Path(bid_id): Path<String>,
) -> AppResult<Json<ApiResponse<AcceptanceOutcome>>> {
    let _guard = state.in_flight.try_acquire(format!("bid:{}", bid_id))?;

    let board = state.client_board(&session.account_id).await;
    let mut board = board.write().await;
    let outcome = state.acceptance.accept(&session, &bid_id, &mut board).await?;

    Ok(Json(ApiResponse::ok(outcome).with_message("Bid accepted")))
}

pub async fn create_load_request(
    Extension(session): Extension<Session>,
    State(state): State<AppState>,
    Json(new_request): Json<NewLoadRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<LoadRequest>>)> {
    let request = state.load_requests.submit(&session, &new_request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(request))))
}
