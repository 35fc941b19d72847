//! HTTP mapping for [`Error`]. Every failure becomes
//! `{"status": "error", "msg": ...}` with a matching status code.

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

impl Error {
    /// Status code reported for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::StaffNotFound { .. } | Self::StaffBanned { .. } | Self::Unauthorized => {
                StatusCode::FORBIDDEN
            }
            Self::ProductNotFound { .. } | Self::ChainNotFound { .. } | Self::LogNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            Self::StaffIdTaken { .. } | Self::OptionInUse { .. } => StatusCode::CONFLICT,
            Self::Config { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::Url(_)
            | Self::FrameworkError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let msg = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
            self.to_string()
        };

        (status, Json(json!({ "status": "error", "msg": msg }))).into_response()
    }
}
