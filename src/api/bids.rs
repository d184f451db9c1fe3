//! Avance de pujas por el ciclo de vida

use axum::{
    extract::{Path, State},
    routing::post,
    Extension, Json, Router,
};

use crate::{
    dto::{AdvanceResponse, ApiResponse},
    models::{AccountType, Session},
    services::TransitionOutcome,
    state::AppState,
    utils::errors::{AppError, AppResult},
};

pub fn create_bids_router() -> Router<AppState> {
    Router::new()
        .route("/:id/advance", post(advance_bid))
        .route("/:id/resume", post(resume_bid))
}

pub async fn advance_bid(
    Extension(session): Extension<Session>,
    State(state): State<AppState>,
    Path(bid_id): Path<String>,
) -> AppResult<Json<ApiResponse<AdvanceResponse>>> {
    let _guard = state.in_flight.try_acquire(format!("bid:{}", bid_id))?;

    if state.partial_transition(&bid_id).await.is_some() {
        return Err(AppError::Conflict(format!(
            "Bid '{}' has a partially applied transition; resume it first",
            bid_id
        )));
    }

    let mut bid = state.backend.bid(&session, &bid_id).await?;
    let transition = state.lifecycle.advance(&session, &mut bid).await?;

    if let Some(outcome) = &transition {
        state.record_transition(outcome).await;
    }
    match session.account_type {
        AccountType::Trucker => {
            let board = state.trucker_board(&session.account_id).await;
            board.write().await.upsert_bid(&bid);
        }
        AccountType::Client => {
            let board = state.client_board(&session.account_id).await;
            board.write().await.upsert_bid(&bid);
        }
        _ => {}
    }

    let message = match &transition {
        None => format!("Bid is already '{}'", bid.status),
        Some(outcome) if outcome.compensated => format!("Transition reverted to '{}'", outcome.current),
        Some(outcome) if outcome.compensation_error.is_some() => format!(
            "Bid moved to '{}' with pending steps and could not be reverted; resume it",
            outcome.current
        ),
        Some(outcome) if outcome.is_partial() => format!("Bid moved to '{}' with pending steps", outcome.current),
        Some(outcome) => format!("Bid moved to '{}'", outcome.current),
    };
    Ok(Json(ApiResponse::ok(AdvanceResponse { bid, transition }).with_message(message)))
}

/// Reintenta los pasos pendientes de una transición parcial
pub async fn resume_bid(
    Extension(session): Extension<Session>,
    State(state): State<AppState>,
    Path(bid_id): Path<String>,
) -> AppResult<Json<ApiResponse<TransitionOutcome>>> {
    let _guard = state.in_flight.try_acquire(format!("bid:{}", bid_id))?;

    let partial = state
        .partial_transition(&bid_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("No partially applied transition for bid '{}'", bid_id)))?;

    let bid = state.backend.bid(&session, &bid_id).await?;
    let outcome = state.lifecycle.resume(&session, &bid, &partial).await?;
    state.record_transition(&outcome).await;

    Ok(Json(ApiResponse::ok(outcome)))
}
