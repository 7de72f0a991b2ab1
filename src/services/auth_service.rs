//! Autenticación del administrador
//!
//! Una única credencial (usuario + hash bcrypt). El hash puede venir de un
//! fichero JSON `{"password": "<hash>"}`, que además se reescribe al cambiar
//! la contraseña.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::RwLock;

use crate::config::EnvironmentConfig;
use crate::dto::auth_dto::LoginResponse;
use crate::models::auth::AuthenticatedAdmin;
use crate::services::jwt_service::JwtService;
use crate::utils::errors::{AppError, AppResult};

/// Contraseña por defecto en desarrollo cuando no se configura ninguna
const DEV_DEFAULT_PASSWORD: &str = "admin";

#[derive(Debug, Serialize, Deserialize)]
struct PasswordFile {
    password: String,
}

/// Servicio de autenticación
pub struct AuthService {
    username: String,
    password_hash: RwLock<String>,
    password_file: Option<PathBuf>,
    jwt: JwtService,
    hash_cost: u32,
}

impl AuthService {
    pub fn new(username: String, password_hash: String, password_file: Option<PathBuf>, jwt: JwtService) -> Self {
        Self {
            username,
            password_hash: RwLock::new(password_hash),
            password_file,
            jwt,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Coste bcrypt de los nuevos hashes (los tests usan uno bajo)
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Construir desde la configuración.
    ///
    /// Orden: fichero de contraseña, `ADMIN_PASSWORD_HASH`, `ADMIN_PASSWORD`
    /// (se hashea al arrancar) y, sólo en desarrollo, una contraseña por defecto.
    pub async fn from_config(config: &EnvironmentConfig) -> AppResult<Self> {
        let jwt = JwtService::new(&config.jwt_secret, config.jwt_expiration_hours);

        let from_file = match &config.admin_password_file {
            Some(path) => read_password_file(path).await?,
            None => None,
        };

        let password_hash = match (from_file, &config.admin_password_hash, &config.admin_password) {
            (Some(hash), _, _) => hash,
            (None, Some(hash), _) => hash.clone(),
            (None, None, Some(plain)) => hash_password(plain.clone(), bcrypt::DEFAULT_COST).await?,
            (None, None, None) if config.is_development() => {
                tracing::warn!("⚠️ Sin contraseña de administrador configurada, usando la de desarrollo");
                hash_password(DEV_DEFAULT_PASSWORD.to_string(), bcrypt::DEFAULT_COST).await?
            }
            (None, None, None) => {
                return Err(AppError::Internal(
                    "No admin password configured (ADMIN_PASSWORD_FILE, ADMIN_PASSWORD_HASH or ADMIN_PASSWORD)"
                        .to_string(),
                ))
            }
        };

        Ok(Self::new(
            config.admin_username.clone(),
            password_hash,
            config.admin_password_file.clone(),
            jwt,
        ))
    }

    pub async fn login(&self, username: &str, password: &str) -> AppResult<LoginResponse> {
        let hash = self.password_hash.read().await.clone();
        let matches = verify_password(password.to_string(), hash).await?;

        if username != self.username || !matches {
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }

        let (token, expires_at) = self.jwt.generate_access_token(&self.username)?;
        tracing::info!("🔑 Login del administrador {}", self.username);

        Ok(LoginResponse::bearer(token, expires_at, self.username.clone()))
    }

    pub async fn change_password(&self, current_password: &str, new_password: &str) -> AppResult<()> {
        let mut stored = self.password_hash.write().await;

        if !verify_password(current_password.to_string(), stored.clone()).await? {
            return Err(AppError::InvalidInput("Current password is incorrect".to_string()));
        }

        let new_hash = hash_password(new_password.to_string(), self.hash_cost).await?;

        if let Some(path) = &self.password_file {
            write_password_file(path, &new_hash).await?;
        }

        *stored = new_hash;
        tracing::info!("🔑 Contraseña del administrador actualizada");
        Ok(())
    }

    /// Verificar un bearer token y devolver el administrador
    pub fn verify_token(&self, token: &str) -> AppResult<AuthenticatedAdmin> {
        let claims = self.jwt.validate_token(token)?;
        if claims.sub != self.username {
            return Err(AppError::Unauthorized("Unknown token subject".to_string()));
        }
        Ok(AuthenticatedAdmin { username: claims.sub })
    }
}

async fn read_password_file(path: &PathBuf) -> AppResult<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => {
            let file: PasswordFile = serde_json::from_str(&content)
                .map_err(|e| AppError::Internal(format!("Invalid password file {}: {}", path.display(), e)))?;
            Ok(Some(file.password))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::Storage(format!("Cannot read {}: {}", path.display(), e))),
    }
}

async fn write_password_file(path: &PathBuf, hash: &str) -> AppResult<()> {
    let content = serde_json::to_string_pretty(&PasswordFile {
        password: hash.to_string(),
    })
    .map_err(|e| AppError::Internal(e.to_string()))?;

    tokio::fs::write(path, content)
        .await
        .map_err(|e| AppError::Storage(format!("Cannot write {}: {}", path.display(), e)))
}

// bcrypt es costoso: fuera del runtime async
async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Hash(e.to_string()))
}

async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Hash(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(password: &str, file: Option<PathBuf>) -> AuthService {
        let hash = bcrypt::hash(password, 4).unwrap();
        AuthService::new("admin".to_string(), hash, file, JwtService::new("test-secret", 1)).with_hash_cost(4)
    }

    #[tokio::test]
    async fn test_login_issues_verifiable_token() {
        let auth = service("secret123", None);
        let response = auth.login("admin", "secret123").await.unwrap();
        assert_eq!(response.token_type, "Bearer");

        let admin = auth.verify_token(&response.token).unwrap();
        assert_eq!(admin.username, "admin");
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let auth = service("secret123", None);
        assert!(matches!(auth.login("admin", "nope").await, Err(AppError::Unauthorized(_))));
        assert!(matches!(auth.login("root", "secret123").await, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_change_password_persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("password.json");
        let auth = service("old-password", Some(path.clone()));

        assert!(auth.change_password("wrong", "new-password").await.is_err());
        auth.change_password("old-password", "new-password").await.unwrap();

        assert!(auth.login("admin", "new-password").await.is_ok());
        assert!(auth.login("admin", "old-password").await.is_err());

        let stored = read_password_file(&path).await.unwrap().unwrap();
        assert!(bcrypt::verify("new-password", &stored).unwrap());
    }

    #[tokio::test]
    async fn test_from_config_prefers_password_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("password.json");
        write_password_file(&path, &bcrypt::hash("from-file", 4).unwrap()).await.unwrap();

        let config = EnvironmentConfig {
            admin_password_file: Some(path),
            admin_password_hash: Some(bcrypt::hash("from-env", 4).unwrap()),
            ..EnvironmentConfig::default()
        };
        let auth = AuthService::from_config(&config).await.unwrap();
        assert!(auth.login("admin", "from-file").await.is_ok());
    }
}
