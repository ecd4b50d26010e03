//! Response helpers for the success/empty split: an empty metadata or
//! lookup result is 204, a valid distinct outcome rather than an error.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

/// 200 with the list body, or 204 when there is nothing to report.
pub fn list_or_no_content<T: Serialize>(data: Vec<T>) -> Response {
    if data.is_empty() {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (StatusCode::OK, Json(data)).into_response()
    }
}

/// 200 with the row, or 204 when the row is absent.
pub fn row_or_no_content(row: Option<Value>) -> Response {
    match row {
        Some(v) => (StatusCode::OK, Json(v)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
