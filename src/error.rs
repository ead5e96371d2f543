use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::MethodRouter,
    Json,
};
use tracing::error;

use crate::{response::Envelope, users::repo::StoreError};

/// Request-scoped failure. Every variant maps to one wire code and one status.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    MissingFields(&'static str),
    #[error("balance must be a non-negative number")]
    InvalidBalance,
    #[error("id must be an integer")]
    InvalidId,
    #[error("malformed request body: {0}")]
    InvalidBody(String),
    #[error("no fields to update")]
    NoFieldsToUpdate,
    #[error("wrong password")]
    InvalidPassword,
    #[error("session does not belong to this user")]
    SessionMismatch,
    #[error("{0}")]
    UserNotFound(&'static str),
    #[error("user with this phone number already exists")]
    UserExists,
    #[error("route not found")]
    RouteNotFound,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("password check failed: {0}")]
    PasswordCheck(String),
    #[error("database error: {0}")]
    Database(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingFields(_) => "MISSING_FIELDS",
            Self::InvalidBalance => "INVALID_BALANCE",
            Self::InvalidId => "INVALID_ID",
            Self::InvalidBody(_) => "INVALID_BODY",
            Self::NoFieldsToUpdate => "NO_FIELDS_TO_UPDATE",
            Self::InvalidPassword => "INVALID_PASSWORD",
            Self::SessionMismatch => "SESSION_MISMATCH",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::UserExists => "USER_EXISTS",
            Self::RouteNotFound => "NOT_FOUND",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::Hash(_) => "HASH_ERROR",
            Self::PasswordCheck(_) => "PASSWORD_CHECK_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingFields(_)
            | Self::InvalidBalance
            | Self::InvalidId
            | Self::InvalidBody(_)
            | Self::NoFieldsToUpdate
            | Self::InvalidPassword
            | Self::SessionMismatch => StatusCode::BAD_REQUEST,
            Self::UserNotFound(_) | Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::UserExists => StatusCode::CONFLICT,
            Self::Hash(_) | Self::PasswordCheck(_) | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicatePhone => Self::UserExists,
            StoreError::Database(e) => {
                error!(error = %e, "store failure");
                Self::Database(e.to_string())
            }
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        error!(error = %err, "blocking task failed");
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Envelope::failed(self.to_string(), self.code());
        (status, Json(body)).into_response()
    }
}

pub async fn route_not_found() -> AppError {
    AppError::RouteNotFound
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Answers methods the route does not serve with an enveloped 405.
pub fn allow_only<S>(route: MethodRouter<S>) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route.fallback(method_not_allowed)
}
