//! Handlers de la flota

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};

use crate::{
    dto::ApiResponse,
    models::{NewTruck, Session, Truck},
    state::AppState,
    utils::errors::AppResult,
};

pub fn create_trucks_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_trucks).post(add_truck))
        .route("/:id", delete(delete_truck))
}

pub async fn list_trucks(
    Extension(session): Extension<Session>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Truck>>>> {
    let trucks = state.fleet.list_trucks(&session).await?;
    Ok(Json(ApiResponse::ok(trucks)))
}

pub async fn add_truck(
    Extension(session): Extension<Session>,
    State(state): State<AppState>,
    Json(new_truck): Json<NewTruck>,
) -> AppResult<(StatusCode, Json<ApiResponse<Truck>>)> {
    let truck = state.fleet.add_truck(&session, &new_truck).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(truck))))
}

pub async fn delete_truck(
    Extension(session): Extension<Session>,
    State(state): State<AppState>,
    Path(truck_id): Path<String>,
) -> AppResult<Json<ApiResponse<String>>> {
    let _guard = state.in_flight.try_acquire(format!("truck:{}", truck_id))?;
    state.fleet.delete_truck(&session, &truck_id).await?;
    Ok(Json(ApiResponse::ok(truck_id).with_message("Truck removed")))
}
