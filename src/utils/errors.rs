//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del motor de despacho,
//! su taxonomía estable hacia los clientes y su conversión a respuestas HTTP.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Errores internos de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Car not found")]
    CarNotFound,

    #[error("Trip not found")]
    TripNotFound,

    #[error("Service not found")]
    ServiceNotFound,

    #[error("Car unavailable")]
    CarUnavailable,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Taxonomía estable de fallos expuesta en el envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    Unauthorized,
    Conflict,
    Unavailable,
}

impl AppError {
    /// Clasificar el error dentro de la taxonomía pública
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::CarNotFound | AppError::TripNotFound | AppError::ServiceNotFound => {
                ErrorKind::NotFound
            }
            AppError::InvalidState(_) | AppError::Validation(_) => ErrorKind::InvalidState,
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::CarUnavailable | AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::Database(_) | AppError::Internal(_) => ErrorKind::Unavailable,
        }
    }

    /// Código estable para los clientes
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "UNAVAILABLE",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_) => "INVALID_AUTHORIZATION",
            AppError::CarNotFound => "CAR_NOT_FOUND",
            AppError::TripNotFound => "TRIP_NOT_FOUND",
            AppError::ServiceNotFound => "SERVICE_NOT_FOUND",
            AppError::CarUnavailable => "CAR_UNAVAILABLE",
            AppError::InvalidState(_) => "INVALID_STATE",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Internal(_) => "UNAVAILABLE",
        }
    }

    /// Mensaje visible para el cliente. Los fallos internos se enmascaran:
    /// el detalle queda solo en el log.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Database(_) | AppError::Internal(_) => {
                "The service is temporarily unavailable".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ErrorKind {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidState => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        if kind == ErrorKind::Unavailable {
            tracing::error!("unhandled fault: {}", self);
        }
        let body = json!({
            "success": false,
            "error": {
                "kind": kind,
                "code": self.code(),
                "message": self.public_message(),
            }
        });
        (kind.status_code(), Json(body)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de validación
pub fn validation_error(field: &'static str, message: &'static str) -> AppError {
    use validator::ValidationError;

    let mut error = ValidationError::new("custom");
    error.add_param("field".into(), &field);
    error.add_param("message".into(), &message);

    let mut errors = validator::ValidationErrors::new();
    errors.add(field, error);

    AppError::Validation(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_detail_is_masked() {
        let err = AppError::Internal("pool exhausted at shard 3".to_string());
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert!(!err.public_message().contains("shard"));
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(AppError::CarUnavailable.code(), "CAR_UNAVAILABLE");
        assert_eq!(AppError::CarNotFound.code(), "CAR_NOT_FOUND");
        assert_eq!(
            AppError::Unauthorized("x".into()).code(),
            "INVALID_AUTHORIZATION"
        );
    }
}
