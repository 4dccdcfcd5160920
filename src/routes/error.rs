// Request errors and their HTTP mapping. Bodies are `{"detail": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::summary::{SummaryError, TimeRangeError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    InvalidTimeRange(#[from] TimeRangeError),
    #[error(transparent)]
    NoData(#[from] SummaryError),
    #[error("metrics collection failed: {0}")]
    Collection(anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidTimeRange(_) => StatusCode::BAD_REQUEST,
            ApiError::NoData(_) => StatusCode::NOT_FOUND,
            ApiError::Collection(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
    }
}
