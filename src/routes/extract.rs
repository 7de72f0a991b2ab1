//! Extractores con rechazo en el formato de error de la API
//!
//! Los extractores de axum responden con texto plano cuando el cuerpo, la
//! query o el path no se pueden leer; estos envoltorios lo convierten en
//! `AppError` para que el cliente reciba siempre el mismo JSON.

use axum::extract::FromRequest;
use axum::extract::FromRequestParts;

use crate::utils::errors::AppError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);
