#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use rental_backoffice::config::EnvironmentConfig;
use rental_backoffice::repositories::Repositories;
use rental_backoffice::services::{AuthService, JwtService, LocalPhotoStore, PhotoStore};
use rental_backoffice::{create_router, AppState};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "secret123";

/// Photo minúscula en base64 ("hello")
pub const PHOTO_DATA: &str = "aGVsbG8=";

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn json(&self) -> &Value {
        &self.body
    }
}

pub struct TestApp {
    router: Router,
    pub state: AppState,
    token: Option<String>,
    _uploads: tempfile::TempDir,
}

pub async fn create_test_app() -> TestApp {
    let uploads = tempfile::tempdir().unwrap();
    let config = EnvironmentConfig {
        upload_dir: uploads.path().to_path_buf(),
        ..EnvironmentConfig::default()
    };

    let hash = bcrypt::hash(ADMIN_PASSWORD, 4).unwrap();
    let auth = AuthService::new(
        ADMIN_USERNAME.to_string(),
        hash,
        None,
        JwtService::new(&config.jwt_secret, config.jwt_expiration_hours),
    )
    .with_hash_cost(4);

    let photos: Arc<dyn PhotoStore> = Arc::new(LocalPhotoStore::new(uploads.path()));
    let state = AppState::new(config, Repositories::in_memory(), photos, auth);

    TestApp {
        router: create_router(state.clone()),
        state,
        token: None,
        _uploads: uploads,
    }
}

/// App con el administrador ya autenticado
pub async fn create_authenticated_app() -> TestApp {
    let mut app = create_test_app().await;
    let response = app
        .post(
            "/api/auth/login",
            serde_json::json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }),
        )
        .await;
    assert_eq!(response.status_code(), StatusCode::OK, "login failed: {}", response.body);
    app.token = response.body["token"].as_str().map(str::to_string);
    app
}

impl TestApp {
    pub fn without_token(&self) -> Self {
        TestApp {
            router: self.router.clone(),
            state: self.state.clone(),
            token: None,
            _uploads: tempfile::tempdir().unwrap(),
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request(Method::DELETE, path, None).await
    }

    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = &self.token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }

    /// Crear un coche y devolver su id
    pub async fn create_car(&self, model: &str, mileage: i64) -> String {
        let response = self
            .post(
                "/api/cars",
                serde_json::json!({
                    "name": "Clio",
                    "model": model,
                    "year": 2021,
                    "mileage": mileage,
                }),
            )
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED, "{}", response.body);
        response.body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Crear un contrato con documento + una foto del vehículo
    pub async fn create_contract(&self, car_id: &str, start: &str, end: &str) -> TestResponse {
        self.post(
            "/api/contracts",
            serde_json::json!({
                "car_id": car_id,
                "customer_name": "Karim",
                "rental_start_date": start,
                "rental_end_date": end,
                "photos": [
                    { "file_name": "contrat.jpg", "content_type": "image/jpeg", "data": PHOTO_DATA },
                    { "file_name": "avant.jpg", "content_type": "image/jpeg", "data": PHOTO_DATA },
                ],
            }),
        )
        .await
    }
}
