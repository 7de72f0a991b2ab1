//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use super::database::DatabaseConfig;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    /// `None` => almacenamiento en memoria
    pub database: Option<DatabaseConfig>,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub cors_origins: Vec<String>,
    // Credencial única del administrador
    pub admin_username: String,
    pub admin_password_hash: Option<String>,
    pub admin_password: Option<String>,
    pub admin_password_file: Option<PathBuf>,
    pub upload_dir: PathBuf,
    pub status_sweep_interval_secs: Option<u64>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            database: None,
            jwt_secret: "dev-secret-change-in-production".to_string(),
            jwt_expiration_hours: 24,
            cors_origins: Vec::new(),
            admin_username: "admin".to_string(),
            admin_password_hash: None,
            admin_password: None,
            admin_password_file: None,
            upload_dir: PathBuf::from("uploads"),
            status_sweep_interval_secs: None,
        }
    }
}

impl EnvironmentConfig {
    /// Cargar la configuración desde las variables de entorno
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let database = match optional_var("DATABASE_URL") {
            Some(url) => Some(
                DatabaseConfig::new(url).with_max_connections(parse_var("DATABASE_MAX_CONNECTIONS", 10)?),
            ),
            None => None,
        };

        let environment = optional_var("ENVIRONMENT").unwrap_or(defaults.environment);
        let jwt_secret = match optional_var("JWT_SECRET") {
            Some(secret) => secret,
            None if environment == "production" => {
                anyhow::bail!("JWT_SECRET must be set in production")
            }
            None => defaults.jwt_secret,
        };

        Ok(Self {
            environment,
            port: parse_var("PORT", defaults.port)?,
            host: optional_var("HOST").unwrap_or(defaults.host),
            database,
            jwt_secret,
            jwt_expiration_hours: parse_var("JWT_EXPIRATION_HOURS", defaults.jwt_expiration_hours)?,
            cors_origins: optional_var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            admin_username: optional_var("ADMIN_USERNAME").unwrap_or(defaults.admin_username),
            admin_password_hash: optional_var("ADMIN_PASSWORD_HASH"),
            admin_password: optional_var("ADMIN_PASSWORD"),
            admin_password_file: optional_var("ADMIN_PASSWORD_FILE").map(PathBuf::from),
            upload_dir: optional_var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            status_sweep_interval_secs: match optional_var("STATUS_SWEEP_INTERVAL_SECS") {
                Some(raw) => Some(
                    raw.parse()
                        .with_context(|| format!("STATUS_SWEEP_INTERVAL_SECS inválido: {}", raw))?,
                ),
                None => None,
            },
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid value, got '{}'", key, raw)),
        None => Ok(default),
    }
}
