//! Metadata handlers: table list, column info, unique columns, foreign
//! keys, and the usage counter.

use super::resolve_table;
use crate::catalog::Catalog;
use crate::error::AppError;
use crate::response::list_or_no_content;
use crate::state::AppState;
use crate::stats::UsageMap;
use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};

pub async fn list_tables(State(state): State<AppState>) -> Result<Response, AppError> {
    let tables = Catalog::list_tables(&state.pool).await?;
    Ok(list_or_no_content(tables))
}

pub async fn table_info(
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> Result<Response, AppError> {
    let table = resolve_table(&state, &table).await?;
    let columns = Catalog::column_info(&state.pool, &table).await?;
    Ok(list_or_no_content(columns))
}

pub async fn unique_columns(
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> Result<Response, AppError> {
    let table = resolve_table(&state, &table).await?;
    let uniques = Catalog::unique_columns(&state.pool, &table).await?;
    Ok(list_or_no_content(uniques))
}

pub async fn foreign_keys(
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> Result<Response, AppError> {
    let table = resolve_table(&state, &table).await?;
    let fks = Catalog::foreign_keys(&state.pool, &table).await?;
    Ok(list_or_no_content(fks))
}

pub async fn usage_stats(State(state): State<AppState>) -> Json<UsageMap> {
    Json(state.stats.snapshot())
}
