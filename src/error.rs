use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{accounts::AccountError, activity::ActivityError, models::FieldErrors};

/// Error type returned by HTTP handlers; renders as a JSON body
/// `{ "error", "code" }`, plus `"fields"` for validation failures.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Activity(#[from] ActivityError),
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

fn internal(err: &dyn std::fmt::Display) -> (StatusCode, &'static str, String, Option<FieldErrors>) {
    tracing::error!(error = %err, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "an internal error occurred".into(), None)
}

fn validation(errors: &FieldErrors) -> (StatusCode, &'static str, String, Option<FieldErrors>) {
    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "validation failed".into(), Some(errors.clone()))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, fields) = match &self {
            AppError::Activity(err) => match err {
                ActivityError::NotFound(_) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string(), None)
                },
                ActivityError::InvalidRequest(msg) => {
                    (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg.to_string(), None)
                },
                ActivityError::Validation(errors) => validation(errors),
                ActivityError::Db(db) => internal(db),
            },
            AppError::Account(err) => match err {
                AccountError::Validation(errors) => validation(errors),
                AccountError::Conflict(msg) => {
                    (StatusCode::CONFLICT, "CONFLICT", msg.to_string(), None)
                },
                AccountError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.to_string(), None)
                },
                AccountError::Hash(msg) => internal(msg),
                AccountError::Db(db) => internal(db),
            },
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string(), None),
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.to_string(), None)
            },
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None),
            AppError::Database(db) => internal(db),
        };

        let mut body = json!({ "error": message, "code": code });
        if let Some(fields) = fields {
            body["fields"] = json!(fields);
        }
        (status, Json(body)).into_response()
    }
}
