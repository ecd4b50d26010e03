//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("unknown table: {0}")]
    UnknownTable(String),
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    /// Missing or blank id on an id-scoped operation. Kept distinct from
    /// `BadRequest` so callers can tell "no id" from "no table".
    #[error("missing required parameter: {0}")]
    MissingParam(&'static str),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("constraint violation: {0}")]
    Constraint(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::UnknownTable(_) => (StatusCode::NOT_FOUND, "unknown_table"),
            AppError::UnknownColumn(_) => (StatusCode::BAD_REQUEST, "unknown_column"),
            AppError::MissingParam(_) => (StatusCode::UNPROCESSABLE_ENTITY, "missing_parameter"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Constraint(_) => (StatusCode::CONFLICT, "constraint_violation"),
            AppError::Db(e) => {
                tracing::error!(error = %e, "store failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
            }
            AppError::Io(e) => {
                tracing::error!(error = %e, "io failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "io_error")
            }
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
