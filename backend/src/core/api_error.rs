use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::core::DbError;

pub const PERMISSION_DENIED: &str = "You don't have permission to access this page";

/// Errors returned by the data API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Tenant is already assigned to this property")]
    AlreadyAssigned,

    #[error("This property has tenants and payment history and cannot be deleted")]
    PropertyInUse,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Please sign in to continue")]
    Unauthenticated,

    #[error("You don't have permission to access this page")]
    Forbidden { redirect: String },

    #[error("Your account role is still being set up, please retry shortly")]
    RolePending,

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Upload error: {0}")]
    Upload(#[from] axum::extract::multipart::MultipartError),
}

impl ApiError {
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Maps a missing row to `NotFound(entity)`, keeping other database errors.
    #[must_use]
    pub fn not_found_or(entity: &'static str) -> impl FnOnce(DbError) -> Self {
        move |e| if e.is_not_found() { Self::NotFound(entity) } else { Self::Database(e) }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyAssigned | Self::PropertyInUse => StatusCode::CONFLICT,
            Self::InvalidInput(_) | Self::Upload(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::RolePending => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() && !matches!(self, Self::RolePending) {
            tracing::error!(
                error_type = %std::any::type_name::<Self>(),
                error_message = %self);
        } else {
            tracing::warn!(status = %status, error_message = %self, "request rejected");
        }

        // Internal details stay in the logs.
        let message = match &self {
            Self::Database(_) => "Something went wrong, please try again".to_string(),
            _ => self.to_string(),
        };

        let body = match &self {
            Self::Forbidden { redirect } => json!({
                "result": "error",
                "message": message,
                "redirect": redirect,
            }),
            Self::Unauthenticated => json!({
                "result": "error",
                "message": message,
                "redirect": "/auth",
            }),
            _ => json!({
                "result": "error",
                "message": message,
            }),
        };

        let mut response = (status, Json(body)).into_response();
        if matches!(self, Self::RolePending) {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        }
        response
    }
}
