//! Endpoints del transportista: solicitudes pendientes, asignación, rechazo
//! y listado de sus pujas.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};

use crate::{
    dto::{ApiResponse, AssignTrucksBody, DeclineBody, StatusQuery},
    models::{AccountType, Bid, LoadRequest, Session},
    services::{board_poller::refresh_trucker_board, AssignmentOutcome, AssignmentRequest},
    state::AppState,
    utils::errors::AppResult,
};

pub fn create_trucker_router() -> Router<AppState> {
    Router::new()
        .route("/requests", get(list_pending_requests))
        .route("/requests/:id/assign", post(assign_trucks))
        .route("/requests/:id/decline", post(decline_request))
        .route("/bids", get(list_bids))
}

/// Solicitudes pendientes, sin las rechazadas por esta cuenta
pub async fn list_pending_requests(
    Extension(session): Extension<Session>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<LoadRequest>>>> {
    session.require(AccountType::Trucker)?;
    let board = state.trucker_board(&session.account_id).await;
    refresh_trucker_board(state.backend.as_ref(), &session, &board).await?;

    let pending = board.read().await.pending_requests.clone();
    Ok(Json(ApiResponse::ok(pending)))
}

pub async fn assign_trucks(
    Extension(session): Extension<Session>,
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    Json(body): Json<AssignTrucksBody>,
) -> AppResult<(StatusCode, Json<ApiResponse<AssignmentOutcome>>)> {
    session.require(AccountType::Trucker)?;
    let _guard = state.in_flight.try_acquire(format!("request:{}:{}", session.account_id, request_id))?;

    let board = state.trucker_board(&session.account_id).await;
    let cached = board.read().await.pending_request(&request_id).cloned();
    let request = match cached {
        Some(request) => request,
        None => state.backend.load_request(&session, &request_id).await?,
    };

    let assignment = AssignmentRequest::from(body);
    let outcome = state.negotiation.assign(&session, &request, &assignment).await?;
    board.write().await.add_bids(outcome.created.iter().cloned());

    let message = if outcome.is_complete() {
        format!("{} bid(s) submitted", outcome.created.len())
    } else {
        format!(
            "{} bid(s) submitted, {} failed",
            outcome.created.len(),
            outcome.failed.len()
        )
    };
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(outcome).with_message(message))))
}

pub async fn decline_request(
    Extension(session): Extension<Session>,
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    body: Option<Json<DeclineBody>>,
) -> AppResult<Json<ApiResponse<bool>>> {
    let reason = body.and_then(|Json(body)| body.reason);

    let board = state.trucker_board(&session.account_id).await;
    let mut board = board.write().await;
    let declined = state
        .negotiation
        .decline(&session, &mut board, &request_id, reason.as_deref())
        .await?;

    let message = if declined { "Request declined" } else { "Request was already declined" };
    Ok(Json(ApiResponse::ok(declined).with_message(message)))
}

pub async fn list_bids(
    Extension(session): Extension<Session>,
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> AppResult<Json<ApiResponse<Vec<Bid>>>> {
    session.require(AccountType::Trucker)?;
    let status = query.parse()?;
    let bids = state.backend.trucker_bids(&session, status).await?;

    if status.is_none() {
        let board = state.trucker_board(&session.account_id).await;
        board.write().await.replace_bids(bids.clone());
    }
    Ok(Json(ApiResponse::ok(bids)))
}
