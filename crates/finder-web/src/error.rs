use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use finder_common::search_api::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    #[error("config error: {0}")]
    Config(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = %self, "request failed");
        let status = match &self {
            AppError::Api(e) => e.status().unwrap_or(StatusCode::BAD_GATEWAY),
            AppError::Template(_) | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
