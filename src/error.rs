use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

pub const MOVIE_NOT_FOUND: &str = "Movie not found";

/// Where a rejected parameter came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Query,
    Params,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub location: Location,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid request: {} field error(s)", .0.len())]
    Validation(Vec<FieldError>),
    #[error("{0}")]
    Config(String),
    #[error("{message}")]
    Upstream { status: u16, message: String },
    #[error("Movie not found")]
    NotFound,
}

impl AppError {
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        AppError::Upstream {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Deployment or upstream trouble rather than a bad request from the caller.
    pub fn is_server_fault(&self) -> bool {
        self.status().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Validation(errors) => json!({ "errors": errors }),
            other => json!({ "message": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
