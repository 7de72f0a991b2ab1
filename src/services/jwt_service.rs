use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::models::auth::JwtClaims;
use crate::utils::errors::{AppError, AppResult};

/// Servicio JWT (HS256)
pub struct JwtService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_duration: Duration,
}

impl JwtService {
    pub fn new(secret: &str, expiration_hours: i64) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_duration: Duration::hours(expiration_hours),
        }
    }

    /// Genera un token de acceso; devuelve también su expiración
    pub fn generate_access_token(&self, username: &str) -> AppResult<(String, DateTime<Utc>)> {
        let now = Utc::now();
        let expires_at = now + self.token_duration;

        let claims = JwtClaims {
            sub: username.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AppError::Jwt(format!("Error generating access token: {}", e)))?;

        Ok((token, expires_at))
    }

    /// Valida y decodifica un token
    pub fn validate_token(&self, token: &str) -> AppResult<JwtClaims> {
        let validation = Validation::new(self.algorithm);

        decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Jwt(format!("Invalid token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_validate_token() {
        let jwt_service = JwtService::new("test-secret", 24);

        let (token, expires_at) = jwt_service.generate_access_token("admin").unwrap();
        assert!(!token.is_empty());
        assert!(expires_at > Utc::now());

        let claims = jwt_service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "admin");
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let issuer = JwtService::new("secret-a", 24);
        let verifier = JwtService::new("secret-b", 24);

        let (token, _) = issuer.generate_access_token("admin").unwrap();
        assert!(matches!(verifier.validate_token(&token), Err(AppError::Jwt(_))));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // Bien por debajo del margen de 60 s de jsonwebtoken
        let jwt_service = JwtService::new("test-secret", -2);
        let (token, _) = jwt_service.generate_access_token("admin").unwrap();
        assert!(jwt_service.validate_token(&token).is_err());
    }
}
