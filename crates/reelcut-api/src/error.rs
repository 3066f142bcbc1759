//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use reelcut_models::ModelError;
use reelcut_provider::ProviderError;
use reelcut_render::RenderError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("{0}")]
    Render(#[from] RenderError),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Render(RenderError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            ApiError::Render(RenderError::VideoNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) | ApiError::Provider(_) | ApiError::Render(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Machine-readable code for pipeline failures.
    fn code(&self) -> Option<&'static str> {
        match self {
            ApiError::Provider(ProviderError::NotConfigured(_)) => Some("provider_not_configured"),
            ApiError::Provider(_) => Some("provider_error"),
            ApiError::Render(e) => Some(match e {
                RenderError::InvalidRequest(_) => "invalid_request",
                RenderError::VideoNotFound(_) => "video_not_found",
                RenderError::SourceUnavailable(_) => "source_unavailable",
                RenderError::NoSegmentsExtracted => "no_segments_extracted",
                RenderError::ConcatenationFailed(_) => "concatenation_failed",
                RenderError::NoRenditionsProduced { .. } => "no_renditions_produced",
                RenderError::Media(_) | RenderError::Io(_) => "render_failed",
            }),
            _ => None,
        }
    }
}

impl From<ModelError> for ApiError {
    fn from(e: ModelError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let detail = match &self {
            ApiError::Internal(_) | ApiError::Render(RenderError::Io(_)) => {
                if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                    "An internal error occurred".to_string()
                } else {
                    self.to_string()
                }
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            detail,
            code: self.code(),
        };

        (status, Json(body)).into_response()
    }
}
