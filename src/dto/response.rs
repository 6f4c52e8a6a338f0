//! Envelope uniforme de respuesta
//!
//! Toda operación pública del orquestador devuelve exactamente uno de
//! `Success(payload)` o `Failure(kind, code, message)`. Ningún fallo
//! interno escapa del límite de la operación: se loggea con contexto
//! completo y se enmascara como `Unavailable` hacia el cliente.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::utils::errors::{AppError, AppResult, ErrorKind};

#[derive(Debug, Clone, Serialize)]
pub struct ServiceFailure {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub enum ServiceResponse<T> {
    Success(T),
    Failure(ServiceFailure),
}

impl<T> ServiceResponse<T> {
    /// Límite de la operación: convierte el resultado interno en el
    /// envelope, loggeando los fallos de clase `Unavailable`
    pub fn from_result(operation: &'static str, result: AppResult<T>) -> Self {
        match result {
            Ok(payload) => ServiceResponse::Success(payload),
            Err(error) => {
                let kind = error.kind();
                if kind == ErrorKind::Unavailable {
                    tracing::error!(operation, error = %error, "internal fault masked to caller");
                } else {
                    tracing::debug!(operation, error = %error, "operation rejected");
                }
                ServiceResponse::Failure(ServiceFailure {
                    kind,
                    code: error.code(),
                    message: error.public_message(),
                })
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ServiceResponse::Success(_))
    }

    pub fn success(self) -> Option<T> {
        match self {
            ServiceResponse::Success(payload) => Some(payload),
            ServiceResponse::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ServiceFailure> {
        match self {
            ServiceResponse::Success(_) => None,
            ServiceResponse::Failure(failure) => Some(failure),
        }
    }
}

impl From<AppError> for ServiceFailure {
    fn from(error: AppError) -> Self {
        Self {
            kind: error.kind(),
            code: error.code(),
            message: error.public_message(),
        }
    }
}

impl<T: Serialize> IntoResponse for ServiceResponse<T> {
    fn into_response(self) -> Response {
        match self {
            ServiceResponse::Success(payload) => Json(json!({
                "success": true,
                "data": payload,
            }))
            .into_response(),
            ServiceResponse::Failure(failure) => (
                failure.kind.status_code(),
                Json(json!({
                    "success": false,
                    "error": failure,
                })),
            )
                .into_response(),
        }
    }
}
