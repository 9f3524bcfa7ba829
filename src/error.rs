//! Action-boundary errors and the uniform response envelope.

use crate::crypto::CryptoError;
use crate::domain::comments::CommentError;
use crate::domain::field_path::FieldPathError;
use crate::domain::registry::PathResolveError;
use crate::domain::status::StatusError;
use crate::domain::validation::ValidationErrors;
use crate::web::session::SessionError;
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    UserNotFound,
    EmailExists,
    Unauthorized,
    Forbidden,
    ResourceNotFound,
    Conflict,
    FormLocked,
    InvalidState,
    InvalidToken,
    InvalidInvitation,
    RateLimited,
    DatabaseConnectionError,
    InternalError,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("User not found")]
    UserNotFound,

    #[error("An account with this email already exists")]
    EmailExists,

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error(transparent)]
    Status(#[from] StatusError),

    #[error(transparent)]
    Comment(#[from] CommentError),

    #[error("{0}")]
    InvalidToken(&'static str),

    #[error("Invalid or expired invitation code")]
    InvalidInvitation,

    #[error("Too many requests. Please try again later.")]
    RateLimited,

    #[error("Database is unavailable")]
    DatabaseUnavailable(#[source] sqlx::Error),

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        AppError::Internal(err.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation(_) => ErrorCode::ValidationError,
            AppError::UserNotFound => ErrorCode::UserNotFound,
            AppError::EmailExists => ErrorCode::EmailExists,
            AppError::Unauthorized(_) => ErrorCode::Unauthorized,
            AppError::Forbidden(_) => ErrorCode::Forbidden,
            AppError::NotFound(_) => ErrorCode::ResourceNotFound,
            AppError::Conflict(_) => ErrorCode::Conflict,
            AppError::Status(err) => match err {
                StatusError::Locked => ErrorCode::FormLocked,
                StatusError::AlreadySubmitted { .. } => ErrorCode::Conflict,
                StatusError::NotFound => ErrorCode::ResourceNotFound,
                StatusError::NotDeletable(_) | StatusError::InvalidTransition { .. } => {
                    ErrorCode::InvalidState
                }
            },
            AppError::Comment(err) => match err {
                CommentError::EmptyContent
                | CommentError::TooLong
                | CommentError::InvalidParent
                | CommentError::EditRequestReply
                | CommentError::ReasonRequired => ErrorCode::ValidationError,
                CommentError::TypeNotAllowed
                | CommentError::NotOwner
                | CommentError::NotAuthor
                | CommentError::AdminOnly => ErrorCode::Forbidden,
                CommentError::EditRequestPending => ErrorCode::Conflict,
                CommentError::SubmissionNotLocked
                | CommentError::NotAnEditRequest
                | CommentError::AlreadyDecided
                | CommentError::HasReplies
                | CommentError::Immutable => ErrorCode::InvalidState,
            },
            AppError::InvalidToken(_) => ErrorCode::InvalidToken,
            AppError::InvalidInvitation => ErrorCode::InvalidInvitation,
            AppError::RateLimited => ErrorCode::RateLimited,
            AppError::DatabaseUnavailable(_) => ErrorCode::DatabaseConnectionError,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.code() {
            ErrorCode::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::UserNotFound | ErrorCode::ResourceNotFound => StatusCode::NOT_FOUND,
            ErrorCode::EmailExists | ErrorCode::Conflict | ErrorCode::InvalidState => {
                StatusCode::CONFLICT
            }
            ErrorCode::FormLocked => StatusCode::LOCKED,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::InvalidToken | ErrorCode::InvalidInvitation => StatusCode::BAD_REQUEST,
            ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::DatabaseConnectionError => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<PathResolveError> for AppError {
    fn from(err: PathResolveError) -> Self {
        AppError::Validation(ValidationErrors::single("fieldPath", err.to_string()))
    }
}

impl From<FieldPathError> for AppError {
    fn from(err: FieldPathError) -> Self {
        AppError::Validation(ValidationErrors::single("fieldPath", err.to_string()))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                AppError::DatabaseUnavailable(err)
            }
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                tracing::warn!("Unique constraint violated: {}", db);
                AppError::Conflict("This record already exists")
            }
            other => AppError::Internal(other.into()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(ValidationErrors::single("body", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(ValidationErrors::single("query", rejection.body_text()))
    }
}

impl From<CryptoError> for AppError {
    fn from(err: CryptoError) -> Self {
        AppError::internal(err)
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        tracing::warn!("Session verification failed: {}", err);
        AppError::Unauthorized("Please sign in again")
    }
}

/// `{ success, message, data?, error?, fieldErrors? }`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<BTreeMap<String, Vec<String>>>,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
            field_errors: None,
            status: StatusCode::OK,
        }
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::ok(message, data)
        }
    }
}

impl ApiResponse<()> {
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            error: None,
            field_errors: None,
            status: StatusCode::OK,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Internal(err) => tracing::error!("Internal error: {:#}", err),
            AppError::DatabaseUnavailable(err) => tracing::error!("Database unavailable: {}", err),
            _ => tracing::debug!("Request failed: {}", self),
        }

        let field_errors = match &self {
            AppError::Validation(errors) => Some(errors.by_field()),
            _ => None,
        };

        let body: ApiResponse<()> = ApiResponse {
            success: false,
            message: self.to_string(),
            data: None,
            error: Some(self.code()),
            field_errors,
            status,
        };
        (status, Json(body)).into_response()
    }
}
