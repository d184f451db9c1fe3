//! Middleware de autenticación JWT
//!
//! Verifica el token bearer y deja la `Session` de la cuenta en las
//! extensiones de la request. Sin token válido se responde 401 antes de
//! tocar el backend.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{
    models::Session,
    state::AppState,
    utils::{
        errors::AppError,
        jwt::{extract_token_from_header, verify_token},
    },
};

/// Middleware de autenticación JWT
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthenticated("Token de autorización requerido".to_string()))?;

    let token = extract_token_from_header(auth_header)?;
    let claims = verify_token(token, &state.config.jwt_secret)?;

    let session = Session::new(token, claims.sub, claims.account_type);
    tracing::debug!("🔐 Sesión {:?}", session);
    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}
