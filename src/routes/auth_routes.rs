use axum::{
    extract::State,
    middleware,
    routing::post,
    Extension, Json, Router,
};
use validator::Validate;

use crate::dto::auth_dto::{ChangePasswordRequest, LoginRequest, LoginResponse};
use crate::dto::ApiResponse;
use crate::middleware::require_auth;
use crate::models::auth::AuthenticatedAdmin;
use crate::routes::extract::AppJson;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Configura las rutas de autenticación (`/login` es pública)
pub fn create_auth_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/change-password", post(change_password))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
        .route("/login", post(login))
}

async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    request.validate()?;
    let response = state.auth.login(&request.username, &request.password).await?;
    Ok(Json(response))
}

async fn change_password(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthenticatedAdmin>,
    AppJson(request): AppJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    request.validate()?;
    state
        .auth
        .change_password(&request.current_password, &request.new_password)
        .await?;
    tracing::info!("🔑 {} cambió la contraseña", admin.username);
    Ok(Json(ApiResponse::message("Password updated")))
}
