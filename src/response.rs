use axum::{http::StatusCode, Json};
use serde::Serialize;

use crate::error::AppError;

/// Uniform body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            error: None,
        }
    }
}

impl Envelope<()> {
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>, code: &'static str) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            error: Some(code),
        }
    }
}

pub type Reply<T> = (StatusCode, Json<Envelope<T>>);
pub type ApiResult<T> = Result<Reply<T>, AppError>;

pub fn ok<T: Serialize>(message: impl Into<String>, data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(Envelope::ok(message, data))))
}

pub fn created<T: Serialize>(message: impl Into<String>, data: T) -> ApiResult<T> {
    Ok((StatusCode::CREATED, Json(Envelope::ok(message, data))))
}

pub fn done(message: impl Into<String>) -> ApiResult<()> {
    Ok((StatusCode::OK, Json(Envelope::done(message))))
}
