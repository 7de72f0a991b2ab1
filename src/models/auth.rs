//! Modelos de autenticación
//!
//! Claims JWT del administrador y usuario autenticado inyectado en las requests.

use serde::{Deserialize, Serialize};

/// Claims del JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// Administrador autenticado que se inyecta en las extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedAdmin {
    pub username: String,
}
