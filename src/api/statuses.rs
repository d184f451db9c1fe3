use axum::{extract::Path, routing::get, Json, Router};

use crate::{
    dto::{ApiResponse, StatusInfoResponse},
    state::AppState,
};

pub fn create_statuses_router() -> Router<AppState> {
    Router::new().route("/:status", get(status_info))
}

/// Etiqueta, color, siguiente estado y progreso de un estado
pub async fn status_info(Path(status): Path<String>) -> Json<ApiResponse<StatusInfoResponse>> {
    Json(ApiResponse::ok(StatusInfoResponse::from_raw(&status)))
}
