//! HTTP handlers for table data access and catalog metadata.

pub mod meta;
pub mod table;
pub use meta::*;
pub use table::*;

use crate::catalog::TableName;
use crate::error::AppError;
use crate::state::AppState;

/// A blank table segment is rejected before any store access.
fn ensure_table_present(raw: &str) -> Result<(), AppError> {
    if raw.trim().is_empty() {
        return Err(AppError::BadRequest("table name is required".into()));
    }
    Ok(())
}

pub(crate) async fn resolve_table(state: &AppState, raw: &str) -> Result<TableName, AppError> {
    ensure_table_present(raw)?;
    TableName::resolve(&state.pool, raw).await
}
