use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::entretien_dto::{EntretienSummary, NotesRequest, RecordServiceRequest, UpsertEntretienRequest};
use crate::dto::ApiResponse;
use crate::models::entretien::Entretien;
use crate::routes::extract::{AppJson, AppPath};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_entretien_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_summaries).post(upsert_entretien))
        .route("/:car_id", get(get_entretien).delete(delete_entretien))
        .route("/:car_id/service", put(record_service))
        .route("/:car_id/notes", put(set_notes))
}

async fn list_summaries(State(state): State<AppState>) -> Result<Json<Vec<EntretienSummary>>, AppError> {
    Ok(Json(state.entretiens().summaries(Utc::now()).await?))
}

async fn upsert_entretien(
    State(state): State<AppState>,
    AppJson(request): AppJson<UpsertEntretienRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Entretien>>), AppError> {
    let entretien = state.entretiens().upsert(request, Utc::now()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(entretien, "Maintenance record saved")),
    ))
}

async fn get_entretien(
    State(state): State<AppState>,
    AppPath(car_id): AppPath<Uuid>,
) -> Result<Json<Entretien>, AppError> {
    Ok(Json(state.entretiens().get(car_id).await?))
}

async fn delete_entretien(
    State(state): State<AppState>,
    AppPath(car_id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.entretiens().delete(car_id).await?;
    Ok(Json(ApiResponse::message("Maintenance record deleted")))
}

async fn record_service(
    State(state): State<AppState>,
    AppPath(car_id): AppPath<Uuid>,
    AppJson(request): AppJson<RecordServiceRequest>,
) -> Result<Json<ApiResponse<Entretien>>, AppError> {
    let entretien = state.entretiens().record_service(car_id, request, Utc::now()).await?;
    Ok(Json(ApiResponse::success(entretien)))
}

async fn set_notes(
    State(state): State<AppState>,
    AppPath(car_id): AppPath<Uuid>,
    AppJson(request): AppJson<NotesRequest>,
) -> Result<Json<ApiResponse<Entretien>>, AppError> {
    request.validate()?;
    let entretien = state
        .entretiens()
        .set_notes(car_id, request.autre_entretien, Utc::now())
        .await?;
    Ok(Json(ApiResponse::success(entretien)))
}
