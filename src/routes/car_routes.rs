use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use uuid::Uuid;

use crate::dto::car_dto::{CarQuery, CreateCarRequest, ModelExistsResponse, UpdateCarRequest};
use crate::dto::ApiResponse;
use crate::models::car::{Car, CarView};
use crate::models::contract::Contract;
use crate::routes::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_car_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cars).post(create_car))
        .route("/:id", get(get_car).put(update_car).delete(delete_car))
        .route("/:id/active-contract", get(active_contract))
}

// `?model=` responde sólo si la serie ya existe (formulario de alta)
async fn list_cars(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CarQuery>,
) -> Result<Response, AppError> {
    let service = state.cars();

    if let Some(model) = query.model {
        let exists = service.model_exists(&model).await?;
        return Ok(Json(ModelExistsResponse { exists }).into_response());
    }

    let cars = service.list_cars(Utc::now()).await?;
    Ok(Json(cars).into_response())
}

async fn create_car(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateCarRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Car>>), AppError> {
    let car = state.cars().create_car(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(car, "Car created")),
    ))
}

async fn get_car(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<CarView>, AppError> {
    let car = state.cars().get_car(id, Utc::now()).await?;
    Ok(Json(car))
}

async fn update_car(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<UpdateCarRequest>,
) -> Result<Json<ApiResponse<Car>>, AppError> {
    let car = state.cars().update_car(id, request).await?;
    Ok(Json(ApiResponse::success_with_message(car, "Car updated")))
}

async fn delete_car(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.cars().delete_car(id).await?;
    Ok(Json(ApiResponse::message("Car and related records deleted")))
}

async fn active_contract(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Contract>, AppError> {
    let contract = state.contracts().active_contract(id, Utc::now()).await?;
    Ok(Json(contract))
}
