pub mod auth_routes;
pub mod car_routes;
pub mod contract_routes;
pub mod entretien_routes;
pub mod extract;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde_json::json;
use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};

use crate::middleware::{cors_layer, require_auth};
use crate::state::AppState;

/// Las fotos llegan en base64 dentro del JSON
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Router completo de la aplicación
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .nest("/api/cars", car_routes::create_car_router())
        .nest("/api/contracts", contract_routes::create_contract_router())
        .nest("/api/entretien", entretien_routes::create_entretien_router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health))
        .nest("/api/auth", auth_routes::create_auth_router(state.clone()))
        .merge(protected)
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
