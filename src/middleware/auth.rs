//! Middleware de autenticación JWT
//!
//! Extrae el bearer token, lo verifica con el `AuthService` e inyecta el
//! administrador autenticado en las extensions de la request.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{state::AppState, utils::errors::AppError};

/// Middleware de autenticación JWT
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)
        .ok_or_else(|| AppError::Unauthorized("Authorization token required".to_string()))?;

    let admin = state
        .auth
        .verify_token(token)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

    request.extensions_mut().insert(admin);

    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
