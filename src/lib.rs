//! Schema-agnostic table access over SQLite: uniform list, fetch, insert,
//! update, delete, and next-id operations plus catalog introspection for
//! any table in the store, driven entirely by request parameters.

pub mod catalog;
pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod stats;
pub mod store;

pub use catalog::{Catalog, ColumnInfo, ForeignKeyInfo, TableName};
pub use error::AppError;
pub use routes::{api_routes, common_routes, common_routes_with_ready};
pub use service::{MutationSummary, TableService};
pub use state::AppState;
pub use stats::UsageStats;
pub use store::{connect, ensure_schema};
