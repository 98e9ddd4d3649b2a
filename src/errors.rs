use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts,
        multipart::{MultipartError, MultipartRejection},
        rejection::{FormRejection, JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use crate::services::{
    article_service::ArticleError, blog_service::BlogError, category_service::CategoryError,
    media_host::HostError, media_service::MediaError,
};
use serde_json::json;
use std::fmt;
use uuid::Uuid;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Shortcut for 409 Conflict
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, msg)
    }

    /// Log the underlying failure and hide it behind a generic 500.
    pub fn infrastructure(err: &dyn std::error::Error) -> Self {
        tracing::error!(error = %err, "request failed on infrastructure error");
        Self::internal("internal server error")
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::bad_request(rejection.body_text())
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        AppError::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::bad_request(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::bad_request(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::bad_request(err.body_text())
    }
}

impl From<BlogError> for AppError {
    fn from(err: BlogError) -> Self {
        match err {
            BlogError::NotFound(_) => AppError::not_found(err.to_string()),
            BlogError::MissingField(_) => AppError::bad_request(err.to_string()),
            BlogError::Sqlx(ref inner) => AppError::infrastructure(inner),
        }
    }
}

impl From<ArticleError> for AppError {
    fn from(err: ArticleError) -> Self {
        match err {
            ArticleError::NotFound(_)
            | ArticleError::SlugNotFound(_)
            | ArticleError::CategoryNotFound(_) => AppError::not_found(err.to_string()),
            ArticleError::UnknownCategory(_) | ArticleError::MissingField(_) => {
                AppError::bad_request(err.to_string())
            }
            ArticleError::DuplicateSlug(_) => AppError::conflict(err.to_string()),
            ArticleError::Sqlx(ref inner) => AppError::infrastructure(inner),
        }
    }
}

impl From<CategoryError> for AppError {
    fn from(err: CategoryError) -> Self {
        match err {
            CategoryError::NotFound(_) | CategoryError::SlugNotFound(_) => {
                AppError::not_found(err.to_string())
            }
            CategoryError::MissingField(_) => AppError::bad_request(err.to_string()),
            CategoryError::DuplicateSlug(_) => AppError::conflict(err.to_string()),
            CategoryError::Sqlx(ref inner) => AppError::infrastructure(inner),
        }
    }
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::NotFound(_) => AppError::not_found(err.to_string()),
            MediaError::NoImage | MediaError::TooManyFiles { .. } => {
                AppError::bad_request(err.to_string())
            }
            MediaError::Host(HostError::NotConfigured) => {
                AppError::new(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
            MediaError::Host(ref inner) => AppError::infrastructure(inner),
            MediaError::Sqlx(ref inner) => AppError::infrastructure(inner),
        }
    }
}

/// JSON body extractor whose rejections render as `AppError` (400).
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// URL-encoded form extractor whose rejections render as `AppError` (400).
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Form), rejection(AppError))]
pub struct ApiForm<T>(pub T);

/// Query-string extractor whose rejections render as `AppError` (400).
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Parse a path identifier, mapping malformed input to a client error.
pub fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::bad_request(format!("invalid id `{}`", raw)))
}
