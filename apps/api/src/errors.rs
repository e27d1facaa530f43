use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::library::StoreError;
use crate::llm_client::GatewayError;
use crate::recipes::extractor::ExtractError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Every variant renders as `{"success": false, "error": ..., "code": ...}`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Model service busy")]
    ServiceBusy,

    #[error("Invalid model credential")]
    InvalidCredential,

    #[error("Malformed model output")]
    MalformedOutput,

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl AppError {
    /// Translates a gateway failure. `fallback` is the user-facing message for
    /// failures that have no dedicated kind.
    pub fn from_gateway(err: GatewayError, fallback: &str) -> Self {
        match err {
            GatewayError::NotConfigured => {
                AppError::Configuration("Gemini API is not configured".to_string())
            }
            GatewayError::InvalidCredential(msg) => {
                tracing::error!("Gemini rejected the API key: {msg}");
                AppError::InvalidCredential
            }
            busy if busy.is_retryable() => {
                tracing::warn!("{busy}");
                AppError::ServiceBusy
            }
            other => {
                tracing::error!("Gemini call failed: {other}");
                AppError::Llm(fallback.to_string())
            }
        }
    }

    /// Translates a store failure. Detail is logged, never returned.
    pub fn from_store(err: StoreError, message: &str) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound("Recipe not found".to_string()),
            other => {
                tracing::error!("Store error: {other}");
                AppError::Persistence(message.to_string())
            }
        }
    }
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        tracing::error!("Could not extract recipe from model output: {err}");
        AppError::MalformedOutput
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::Validation(rejection.body_text())
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "NOT_CONFIGURED",
                    msg.clone(),
                )
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "METHOD_NOT_ALLOWED",
                "Method not allowed".to_string(),
            ),
            AppError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                "Request body is too large".to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::ServiceBusy => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_BUSY",
                "Gemini AI is currently busy. Please try again in a moment.".to_string(),
            ),
            AppError::InvalidCredential => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INVALID_CREDENTIAL",
                "Invalid Gemini API key. Please check your API key.".to_string(),
            ),
            AppError::MalformedOutput => (
                StatusCode::BAD_GATEWAY,
                "MALFORMED_OUTPUT",
                "Failed to parse AI response. Please try generating again.".to_string(),
            ),
            AppError::Llm(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "LLM_ERROR", msg.clone()),
            AppError::Persistence(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PERSISTENCE_ERROR",
                msg.clone(),
            ),
        };

        let body = Json(json!({
            "success": false,
            "error": message,
            "code": code
        }));

        (status, body).into_response()
    }
}
