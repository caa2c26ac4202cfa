//! HTTP-facing error type.
//!
//! Pipeline failures are logged with full detail here; clients only ever see
//! a validation message or a generic retry hint.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::core::PipelineError;

const RETRY_LATER_MESSAGE: &str = "Failed to generate audio. Please try again later.";
const BUSY_MESSAGE: &str = "Upstream providers are busy. Please try again later.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Pipeline(PipelineError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            AppError::Pipeline(
                PipelineError::ProviderRateLimited(_) | PipelineError::ProviderError(_),
            ) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the caller.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Pipeline(PipelineError::InvalidInput(msg)) => msg.clone(),
            AppError::Pipeline(
                PipelineError::ProviderRateLimited(_) | PipelineError::ProviderError(_),
            ) => BUSY_MESSAGE.to_string(),
            AppError::Pipeline(_) => RETRY_LATER_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_client_error() {
            warn!(error = %self, "Rejected request");
        } else {
            error!(error = %self, "Request failed");
        }

        (status, Json(json!({"error": self.public_message()}))).into_response()
    }
}
