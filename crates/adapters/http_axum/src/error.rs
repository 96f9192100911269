//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use garagedoor_domain::error::{AdapterError, ControllerError};

use crate::api::ErrorResponse;

/// Error returned by handlers and the API-key middleware.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or unknown API key.
    Unauthorized,
    /// The controller refused or failed the operation.
    Controller(ControllerError),
}

impl From<ControllerError> for ApiError {
    fn from(err: ControllerError) -> Self {
        Self::Controller(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Controller(ControllerError::NotRunning) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Controller(ControllerError::AlreadyRunning) => StatusCode::CONFLICT,
            Self::Controller(ControllerError::Adapter(AdapterError::Unsupported(_))) => {
                StatusCode::NOT_IMPLEMENTED
            }
            Self::Controller(ControllerError::Adapter(AdapterError::Io(_))) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Unauthorized => "Unauthorized".to_string(),
            Self::Controller(err @ ControllerError::Adapter(AdapterError::Io(_))) => {
                tracing::error!(error = %err, "door I/O error while serving request");
                err.to_string()
            }
            Self::Controller(err) => err.to_string(),
        };

        (status, Json(ErrorResponse::nok(message))).into_response()
    }
}
