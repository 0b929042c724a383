use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use shelf_sdk::LibraryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Library(#[from] LibraryError),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// HTTP status and stable machine-readable kind for a library error.
pub fn classify(err: &LibraryError) -> (StatusCode, &'static str) {
    match err {
        LibraryError::Validation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
        LibraryError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
        LibraryError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "unauthenticated"),
        LibraryError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
        LibraryError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
        LibraryError::AlreadyExists(_) => (StatusCode::CONFLICT, "already_exists"),
        LibraryError::UnsupportedMediaType(_) => {
            (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_media_type")
        }
        LibraryError::Storage(_) | LibraryError::Config(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "storage")
        }
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Library(e) => classify(e).0,
            Self::AuthFailed(_) => StatusCode::UNAUTHORIZED,
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            Self::Library(e) => ErrorBody {
                error: classify(e).1,
                message: e.user_message(),
            },
            Self::AuthFailed(reason) => ErrorBody {
                error: "unauthenticated",
                message: reason.clone(),
            },
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => ErrorBody {
                error: "internal",
                message: "Internal server error.".into(),
            },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_errors_map_to_statuses() {
        let cases = [
            (LibraryError::validation("title", "empty"), 422),
            (LibraryError::Forbidden("x".into()), 403),
            (LibraryError::Unauthenticated("x".into()), 401),
            (LibraryError::not_found("book", 1), 404),
            (LibraryError::Conflict("x".into()), 409),
            (LibraryError::AlreadyExists("x".into()), 409),
            (LibraryError::UnsupportedMediaType("bmp".into()), 415),
            (LibraryError::Storage("disk".into()), 500),
        ];
        for (err, status) in cases {
            assert_eq!(ServerError::from(err).status().as_u16(), status);
        }
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let body = ServerError::Internal("secret path /var/x".into()).body();
        assert_eq!(body.error, "internal");
        assert!(!body.message.contains("/var/x"));
    }
}
