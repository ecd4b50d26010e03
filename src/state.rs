//! Shared application state for all routes.

use crate::stats::UsageStats;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub stats: Arc<UsageStats>,
}
