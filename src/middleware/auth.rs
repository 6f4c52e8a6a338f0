//! Resolución del caller vía JWT
//!
//! El guard de autorización: resuelve "quién llama" a partir del header
//! Authorization y lo entrega como `Caller { user_id, role }`. El
//! orquestador nunca ve credenciales, solo la identidad ya resuelta. Las
//! llamadas originadas por dispositivo no pasan por aquí: se identifican
//! por `device_id`.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::EnvironmentConfig;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::guard::{Caller, Role};

/// Claims del JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub role: String,
    pub exp: usize,
    pub iat: usize,
}

fn parse_role(role: &str) -> Result<Role, AppError> {
    match role {
        "customer" => Ok(Role::Customer),
        "administrator" => Ok(Role::Administrator),
        other => Err(AppError::Unauthorized(format!("Unknown role '{}'", other))),
    }
}

/// Decodificar y validar un token, devolviendo la identidad resuelta
pub fn resolve_caller(token: &str, jwt_secret: &str) -> Result<Caller, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

    let claims = token_data.claims;
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user id in token".to_string()))?;
    let role = parse_role(&claims.role)?;

    Ok(Caller::new(user_id, role))
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthorized("Authorization token required".to_string()))?;

        resolve_caller(token, &state.config.jwt_secret)
    }
}

/// Emitir un token firmado; lo usa el colaborador de cuentas y las
/// herramientas de operación
pub fn generate_token(
    user_id: Uuid,
    role: Role,
    config: &EnvironmentConfig,
) -> Result<String, AppError> {
    let now = chrono::Utc::now();
    let expires_at = now + chrono::Duration::seconds(config.jwt_expiration as i64);

    let claims = Claims {
        sub: user_id.to_string(),
        role: match role {
            Role::Customer => "customer".to_string(),
            Role::Administrator => "administrator".to_string(),
        },
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_ref()),
    )
    .map_err(|e| AppError::Internal(format!("Error generating JWT: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> EnvironmentConfig {
        EnvironmentConfig {
            environment: "test".into(),
            host: "127.0.0.1".into(),
            port: 0,
            jwt_secret: "test-secret".into(),
            jwt_expiration: 3600,
        }
    }

    #[test]
    fn test_round_trip_token() {
        let config = test_config();
        let user_id = Uuid::new_v4();
        let token = generate_token(user_id, Role::Customer, &config).unwrap();

        let caller = resolve_caller(&token, &config.jwt_secret).unwrap();
        assert_eq!(caller.user_id, user_id);
        assert_eq!(caller.role, Role::Customer);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let config = test_config();
        let token = generate_token(Uuid::new_v4(), Role::Administrator, &config).unwrap();
        assert!(resolve_caller(&token, "other-secret").is_err());
    }
}
