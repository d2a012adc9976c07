//! Error types for the adapter service.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Non-2xx response from the upstream FHIR server. Reported, never
    /// retried.
    #[error("FHIR server error: {status} {body}")]
    Upstream { status: u16, body: String },

    #[error("Token acquisition failed: {0}")]
    Token(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid payment signature")]
    PaymentSignature,

    #[error("Payment gateway error: {0}")]
    Payment(String),

    #[error("Blob storage error: {0}")]
    Blob(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Error::Validation(errors.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Validation(_) | Error::PaymentSignature | Error::Payment(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Error::Token(_) | Error::Blob(_) | Error::Internal(_) => {
                tracing::error!(error = %self, "Internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Error::Http(_) | Error::Json(_) | Error::Other(_) => {
                tracing::error!(error = %self, "Internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "success": false,
            "message": self.to_string()
        }));

        (status, body).into_response()
    }
}
