//! Table-access routes. Path parameters carry the table name (and id where
//! the operation is id-scoped); handlers resolve the table against the
//! catalog before anything touches statement text.

use crate::handlers::{
    add, fetch, foreign_keys, list_tables, next_id, remove, table_info, unique_columns, update,
    usage_stats,
};
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};

/// All table-access routes. Mount under the service's fixed base path.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/list", get(list_tables))
        .route("/stats", get(usage_stats))
        .route("/info/:table", get(table_info))
        .route("/getUniques/:table", get(unique_columns))
        .route("/foreignKeys/:table", get(foreign_keys))
        .route("/get/:table", get(fetch))
        .route("/add/:table", post(add))
        .route("/update/:table/:id", post(update))
        .route("/delete/:table/:id", delete(remove))
        .route("/nextId/:table", get(next_id))
        .with_state(state)
}
