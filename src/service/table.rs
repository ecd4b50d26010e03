//! Generic table operations against the store. Mutation columns are checked
//! against the live catalog before any statement is built; each operation is
//! exactly one statement, atomic only at the store level.

use crate::catalog::{Catalog, TableName};
use crate::error::AppError;
use crate::sql::{self, QueryBuf, SqliteBindValue};
use serde::Serialize;
use serde_json::Value;
use sqlx::sqlite::{SqliteQueryResult, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;

/// Outcome of an insert/update/delete: affected-row count, plus the newly
/// assigned identifier for inserts.
#[derive(Clone, Debug, Serialize)]
pub struct MutationSummary {
    pub changes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_insert_id: Option<i64>,
}

pub struct TableService;

impl TableService {
    /// Every row, store order.
    pub async fn list(pool: &SqlitePool, table: &TableName) -> Result<Vec<Value>, AppError> {
        let q = sql::select_all(table);
        Self::query_many(pool, &q).await
    }

    /// At most one row by id; absence is a valid empty outcome.
    pub async fn fetch(
        pool: &SqlitePool,
        table: &TableName,
        id: i64,
    ) -> Result<Option<Value>, AppError> {
        let q = sql::select_by_id(table, id);
        tracing::debug!(sql = %q.sql, "execute");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(SqliteBindValue::from_json(p));
        }
        let row = query.fetch_optional(pool).await.map_err(classify)?;
        Ok(row.map(|r| row_to_json(&r)))
    }

    /// Insert exactly the supplied columns, in supplied order.
    pub async fn insert(
        pool: &SqlitePool,
        table: &TableName,
        columns: &[(String, Value)],
    ) -> Result<MutationSummary, AppError> {
        if columns.is_empty() {
            return Err(AppError::BadRequest("no columns supplied".into()));
        }
        Self::check_columns(pool, table, columns).await?;
        let done = Self::execute(pool, &sql::insert(table, columns)).await?;
        Ok(MutationSummary {
            changes: done.rows_affected(),
            last_insert_id: Some(done.last_insert_rowid()),
        })
    }

    /// Update exactly the supplied columns on one row. Zero changed rows is
    /// a valid outcome (id not present), not a failure.
    pub async fn update(
        pool: &SqlitePool,
        table: &TableName,
        id: i64,
        columns: &[(String, Value)],
    ) -> Result<MutationSummary, AppError> {
        if columns.is_empty() {
            return Err(AppError::BadRequest("no columns supplied".into()));
        }
        Self::check_columns(pool, table, columns).await?;
        let done = Self::execute(pool, &sql::update_by_id(table, id, columns)).await?;
        Ok(MutationSummary {
            changes: done.rows_affected(),
            last_insert_id: None,
        })
    }

    /// Delete the rows whose ids are in the list.
    pub async fn delete(
        pool: &SqlitePool,
        table: &TableName,
        ids: &[i64],
    ) -> Result<MutationSummary, AppError> {
        if ids.is_empty() {
            return Err(AppError::MissingParam("id"));
        }
        let done = Self::execute(pool, &sql::delete_by_ids(table, ids)).await?;
        Ok(MutationSummary {
            changes: done.rows_affected(),
            last_insert_id: None,
        })
    }

    /// Advisory next identifier. The actual insert is the only authority on
    /// final id assignment.
    pub async fn next_id(pool: &SqlitePool, table: &TableName) -> Result<i64, AppError> {
        let q = sql::next_id(table);
        tracing::debug!(sql = %q.sql, "execute");
        let row = sqlx::query(&q.sql).fetch_one(pool).await.map_err(classify)?;
        Ok(row.try_get("id")?)
    }

    /// Allow-list check: every supplied column must exist in the live
    /// catalog, and no column may be supplied twice.
    async fn check_columns(
        pool: &SqlitePool,
        table: &TableName,
        columns: &[(String, Value)],
    ) -> Result<(), AppError> {
        let known: HashSet<String> = Catalog::column_info(pool, table)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();
        let mut seen = HashSet::new();
        for (name, _) in columns {
            if !known.contains(name) {
                return Err(AppError::UnknownColumn(name.clone()));
            }
            if !seen.insert(name.as_str()) {
                return Err(AppError::BadRequest(format!("duplicate column '{}'", name)));
            }
        }
        Ok(())
    }

    async fn query_many(pool: &SqlitePool, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, "execute");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(SqliteBindValue::from_json(p));
        }
        let rows = query.fetch_all(pool).await.map_err(classify)?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn execute(pool: &SqlitePool, q: &QueryBuf) -> Result<SqliteQueryResult, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(SqliteBindValue::from_json(p));
        }
        query.execute(pool).await.map_err(classify)
    }
}

/// Store failures caused by schema constraints (not-null, unique,
/// foreign-key, check) get their own kind; everything else stays a generic
/// store error.
fn classify(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        use sqlx::error::ErrorKind;
        if matches!(
            db.kind(),
            ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation
        ) {
            return AppError::Constraint(db.message().to_string());
        }
    }
    AppError::Db(e)
}

fn row_to_json(row: &SqliteRow) -> Value {
    use sqlx::Column;
    let mut map = serde_json::Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    Value::Object(map)
}

fn cell_to_value(row: &SqliteRow, name: &str) -> Value {
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(b)) = row.try_get::<Option<Vec<u8>>, _>(name) {
        return Value::String(String::from_utf8_lossy(&b).into_owned());
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("CREATE TABLE t (id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, year INTEGER)")
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    async fn t(pool: &SqlitePool) -> TableName {
        TableName::resolve(pool, "t").await.unwrap()
    }

    #[tokio::test]
    async fn insert_then_fetch_round_trips_supplied_values() {
        let pool = pool().await;
        let table = t(&pool).await;
        let cols = vec![
            ("name".to_string(), Value::String("Ann".into())),
            ("year".to_string(), Value::String("2000".into())),
        ];
        let summary = TableService::insert(&pool, &table, &cols).await.unwrap();
        assert_eq!(summary.changes, 1);
        assert_eq!(summary.last_insert_id, Some(1));

        let row = TableService::fetch(&pool, &table, 1).await.unwrap().unwrap();
        assert_eq!(row["id"], Value::from(1));
        assert_eq!(row["name"], Value::from("Ann"));
        // INTEGER affinity coerces the bound text.
        assert_eq!(row["year"], Value::from(2000));
    }

    #[tokio::test]
    async fn update_of_absent_id_reports_zero_changes() {
        let pool = pool().await;
        let table = t(&pool).await;
        let cols = vec![("name".to_string(), Value::String("Zed".into()))];
        let summary = TableService::update(&pool, &table, 99, &cols).await.unwrap();
        assert_eq!(summary.changes, 0);
    }

    #[tokio::test]
    async fn unknown_column_is_rejected_before_execution() {
        let pool = pool().await;
        let table = t(&pool).await;
        let cols = vec![("bogus".to_string(), Value::String("x".into()))];
        let err = TableService::insert(&pool, &table, &cols).await.unwrap_err();
        assert!(matches!(err, AppError::UnknownColumn(name) if name == "bogus"));
    }

    #[tokio::test]
    async fn not_null_violation_surfaces_as_constraint() {
        let pool = pool().await;
        let table = t(&pool).await;
        let cols = vec![("year".to_string(), Value::String("1999".into()))];
        let err = TableService::insert(&pool, &table, &cols).await.unwrap_err();
        assert!(matches!(err, AppError::Constraint(_)));
    }

    #[tokio::test]
    async fn next_id_is_max_plus_one_regardless_of_gaps() {
        let pool = pool().await;
        let table = t(&pool).await;
        assert_eq!(TableService::next_id(&pool, &table).await.unwrap(), 1);
        for name in ["a", "b", "c"] {
            let cols = vec![("name".to_string(), Value::String(name.into()))];
            TableService::insert(&pool, &table, &cols).await.unwrap();
        }
        TableService::delete(&pool, &table, &[2]).await.unwrap();
        assert_eq!(TableService::next_id(&pool, &table).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn delete_removes_exactly_the_listed_ids() {
        let pool = pool().await;
        let table = t(&pool).await;
        for name in ["a", "b", "c"] {
            let cols = vec![("name".to_string(), Value::String(name.into()))];
            TableService::insert(&pool, &table, &cols).await.unwrap();
        }
        let summary = TableService::delete(&pool, &table, &[1, 3, 42]).await.unwrap();
        assert_eq!(summary.changes, 2);
        let rows = TableService::list(&pool, &table).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], Value::from(2));
    }
}
