use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::contract_dto::{
    AddPhotosRequest, ContractListQuery, ContractPhotoRequest, CreateContractRequest, PhotosResponse,
    RefreshResponse, RemovePhotoQuery, ReturnRequest, StatusRequest,
};
use crate::dto::ApiResponse;
use crate::models::contract::Contract;
use crate::routes::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_contract_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_contracts).post(create_contract))
        .route("/refresh-statuses", post(refresh_statuses))
        .route("/:id", get(get_contract).delete(delete_contract))
        .route("/:id/return", post(record_return))
        .route("/:id/status", put(set_status))
        .route("/:id/photos", get(list_photos).post(add_photos).delete(remove_photo))
        .route("/:id/contract-photo", put(replace_contract_photo))
}

async fn list_contracts(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ContractListQuery>,
) -> Result<Response, AppError> {
    let service = state.contracts();

    if query.future {
        let upcoming = service.upcoming(Utc::now()).await?;
        return Ok(Json(upcoming).into_response());
    }

    match query.car_id {
        Some(car_id) => Ok(Json(service.list_for_car(car_id).await?).into_response()),
        None => Err(AppError::InvalidInput(
            "car_id or future=true is required".to_string(),
        )),
    }
}

async fn create_contract(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateContractRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Contract>>), AppError> {
    let contract = state.contracts().create_contract(request, Utc::now()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(contract, "Contract created")),
    ))
}

async fn refresh_statuses(State(state): State<AppState>) -> Result<Json<RefreshResponse>, AppError> {
    let updated = state.contracts().refresh_statuses(Utc::now()).await?;
    Ok(Json(RefreshResponse { updated }))
}

async fn get_contract(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Contract>, AppError> {
    Ok(Json(state.contracts().get(id).await?))
}

async fn delete_contract(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.contracts().delete(id).await?;
    Ok(Json(ApiResponse::message("Contract deleted")))
}

async fn record_return(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<ReturnRequest>,
) -> Result<Json<ApiResponse<Contract>>, AppError> {
    request.validate()?;
    let contract = state.contracts().record_return(id, request.return_mileage).await?;
    Ok(Json(ApiResponse::success_with_message(contract, "Return recorded")))
}

async fn set_status(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<StatusRequest>,
) -> Result<Json<ApiResponse<Contract>>, AppError> {
    let contract = state.contracts().set_status(id, &request.status).await?;
    Ok(Json(ApiResponse::success(contract)))
}

async fn list_photos(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<PhotosResponse>, AppError> {
    let contract = state.contracts().get(id).await?;
    Ok(Json(PhotosResponse {
        photos: contract.photos,
    }))
}

async fn add_photos(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<AddPhotosRequest>,
) -> Result<Json<PhotosResponse>, AppError> {
    request.validate()?;
    let contract = state.contracts().add_photos(id, &request.photos, Utc::now()).await?;
    Ok(Json(PhotosResponse {
        photos: contract.photos,
    }))
}

async fn remove_photo(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppQuery(query): AppQuery<RemovePhotoQuery>,
) -> Result<Json<PhotosResponse>, AppError> {
    let contract = state.contracts().remove_photo(id, &query.photo).await?;
    Ok(Json(PhotosResponse {
        photos: contract.photos,
    }))
}

async fn replace_contract_photo(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<ContractPhotoRequest>,
) -> Result<Json<ApiResponse<Contract>>, AppError> {
    request.validate()?;
    let contract = state.contracts().replace_contract_photo(id, &request.photo).await?;
    Ok(Json(ApiResponse::success_with_message(contract, "Contract photo replaced")))
}
