//! Data handlers: fetch, insert, update, delete, next-id. Query-string
//! pairs become the column map for insert/update, in the order supplied.

use super::{ensure_table_present, resolve_table};
use crate::catalog::TableName;
use crate::error::AppError;
use crate::response::row_or_no_content;
use crate::service::{MutationSummary, TableService};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
pub struct GetParams {
    pub id: Option<String>,
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::MissingParam("id"));
    }
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id '{}'", raw)))
}

fn parse_id_list(raw: &str) -> Result<Vec<i64>, AppError> {
    if raw.trim().is_empty() {
        return Err(AppError::MissingParam("id"));
    }
    raw.split(',').map(parse_id).collect()
}

fn column_values(pairs: Vec<(String, String)>) -> Vec<(String, Value)> {
    pairs
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect()
}

/// GET one row when `?id=` is present, otherwise the whole table.
pub async fn fetch(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<GetParams>,
) -> Result<Response, AppError> {
    let table = resolve_table(&state, &table).await?;
    match params.id.as_deref().filter(|raw| !raw.trim().is_empty()) {
        Some(raw) => {
            let id = parse_id(raw)?;
            let row = TableService::fetch(&state.pool, &table, id).await?;
            Ok(row_or_no_content(row))
        }
        None => {
            let rows = TableService::list(&state.pool, &table).await?;
            Ok(Json(rows).into_response())
        }
    }
}

pub async fn add(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<MutationSummary>, AppError> {
    let table = resolve_table(&state, &table).await?;
    let columns = column_values(pairs);
    let summary = TableService::insert(&state.pool, &table, &columns).await?;
    Ok(Json(summary))
}

pub async fn update(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<MutationSummary>, AppError> {
    ensure_table_present(&table)?;
    let id = parse_id(&id)?;
    let table = TableName::resolve(&state.pool, &table).await?;
    let columns = column_values(pairs);
    let summary = TableService::update(&state.pool, &table, id, &columns).await?;
    Ok(Json(summary))
}

/// DELETE one id or a comma-separated list of ids.
pub async fn remove(
    State(state): State<AppState>,
    Path((table, ids)): Path<(String, String)>,
) -> Result<Json<MutationSummary>, AppError> {
    ensure_table_present(&table)?;
    let ids = parse_id_list(&ids)?;
    let table = TableName::resolve(&state.pool, &table).await?;
    let summary = TableService::delete(&state.pool, &table, &ids).await?;
    Ok(Json(summary))
}

pub async fn next_id(
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> Result<Json<Value>, AppError> {
    let table = resolve_table(&state, &table).await?;
    let id = TableService::next_id(&state.pool, &table).await?;
    Ok(Json(serde_json::json!({ "id": id })))
}
