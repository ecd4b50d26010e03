//! Catalog introspection: tables, columns, unique indexes, foreign keys.
//! Everything is re-read from the store on every call; nothing is cached.

use crate::error::AppError;
use serde::Serialize;
use sqlx::{Row, SqlitePool};

/// Quote identifier for interpolation into a PRAGMA (PRAGMAs cannot take
/// bound parameters).
fn quote_ident(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// A table name confirmed to exist in the store. The only way to obtain one
/// from caller input is [`TableName::resolve`], which checks `sqlite_master`
/// with a bound parameter; statement builders interpolate the quoted form
/// and nothing else.
#[derive(Clone, Debug)]
pub struct TableName(String);

impl TableName {
    pub async fn resolve(pool: &SqlitePool, raw: &str) -> Result<TableName, AppError> {
        let found =
            sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(raw)
                .fetch_optional(pool)
                .await?;
        match found {
            Some(_) => Ok(TableName(raw.to_string())),
            None => Err(AppError::UnknownTable(raw.to_string())),
        }
    }

    pub(crate) fn new_unchecked(name: impl Into<String>) -> TableName {
        TableName(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Double-quoted form for statement text.
    pub fn quoted(&self) -> String {
        quote_ident(&self.0)
    }
}

/// One row of `PRAGMA table_info`: a declaration-ordered column descriptor.
#[derive(Clone, Debug, Serialize)]
pub struct ColumnInfo {
    pub cid: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub col_type: String,
    pub notnull: bool,
    pub dflt_value: Option<String>,
    pub pk: bool,
}

/// One row of `PRAGMA foreign_key_list`.
#[derive(Clone, Debug, Serialize)]
pub struct ForeignKeyInfo {
    pub id: i64,
    pub seq: i64,
    pub table: String,
    pub from: String,
    /// None when the declaration references the parent's implicit primary key.
    pub to: Option<String>,
    pub on_update: String,
    pub on_delete: String,
}

pub struct Catalog;

impl Catalog {
    /// Every user-defined table, excluding SQLite's bookkeeping tables.
    pub async fn list_tables(pool: &SqlitePool) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name <> 'sqlite_sequence'",
        )
        .fetch_all(pool)
        .await?;
        rows.iter()
            .map(|r| r.try_get("name").map_err(AppError::from))
            .collect()
    }

    /// Column descriptors as declared, in declaration order.
    pub async fn column_info(
        pool: &SqlitePool,
        table: &TableName,
    ) -> Result<Vec<ColumnInfo>, AppError> {
        let rows = sqlx::query(&format!("PRAGMA table_info({})", table.quoted()))
            .fetch_all(pool)
            .await?;
        rows.iter()
            .map(|r| {
                Ok(ColumnInfo {
                    cid: r.try_get("cid")?,
                    name: r.try_get("name")?,
                    col_type: r.try_get("type")?,
                    notnull: r.try_get::<i64, _>("notnull")? != 0,
                    dflt_value: r.try_get("dflt_value")?,
                    pk: r.try_get::<i64, _>("pk")? != 0,
                })
            })
            .collect()
    }

    /// Column names covered by at least one unique index. Two-phase: list
    /// the table's indexes, filter to unique ones, resolve each to its first
    /// participating column. Composite unique indexes report only their
    /// first column.
    pub async fn unique_columns(
        pool: &SqlitePool,
        table: &TableName,
    ) -> Result<Vec<String>, AppError> {
        let indexes = sqlx::query(&format!("PRAGMA index_list({})", table.quoted()))
            .fetch_all(pool)
            .await?;
        let mut names = Vec::new();
        for idx in &indexes {
            let unique: i64 = idx.try_get("unique")?;
            if unique != 1 {
                continue;
            }
            let index_name: String = idx.try_get("name")?;
            let info = sqlx::query(&format!("PRAGMA index_info({})", quote_ident(&index_name)))
                .fetch_all(pool)
                .await?;
            if let Some(first) = info.first() {
                names.push(first.try_get("name")?);
            }
        }
        Ok(names)
    }

    /// Foreign-key declarations on the table.
    pub async fn foreign_keys(
        pool: &SqlitePool,
        table: &TableName,
    ) -> Result<Vec<ForeignKeyInfo>, AppError> {
        let rows = sqlx::query(&format!("PRAGMA foreign_key_list({})", table.quoted()))
            .fetch_all(pool)
            .await?;
        rows.iter()
            .map(|r| {
                Ok(ForeignKeyInfo {
                    id: r.try_get("id")?,
                    seq: r.try_get("seq")?,
                    table: r.try_get("table")?,
                    from: r.try_get("from")?,
                    to: r.try_get("to")?,
                    on_update: r.try_get("on_update")?,
                    on_delete: r.try_get("on_delete")?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn resolve_rejects_unknown_table() {
        let pool = pool().await;
        sqlx::query("CREATE TABLE t (id INTEGER PRIMARY KEY)")
            .execute(&pool)
            .await
            .unwrap();
        assert!(TableName::resolve(&pool, "t").await.is_ok());
        let err = TableName::resolve(&pool, "missing").await.unwrap_err();
        assert!(matches!(err, AppError::UnknownTable(name) if name == "missing"));
    }

    #[tokio::test]
    async fn list_tables_excludes_sequence_table() {
        let pool = pool().await;
        sqlx::query("CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT, v TEXT)")
            .execute(&pool)
            .await
            .unwrap();
        // Populating an AUTOINCREMENT table creates sqlite_sequence.
        sqlx::query("INSERT INTO t (v) VALUES ('x')")
            .execute(&pool)
            .await
            .unwrap();
        let tables = Catalog::list_tables(&pool).await.unwrap();
        assert_eq!(tables, vec!["t".to_string()]);
    }

    #[tokio::test]
    async fn column_info_reports_declaration_order_and_flags() {
        let pool = pool().await;
        sqlx::query(
            "CREATE TABLE t (id INTEGER NOT NULL PRIMARY KEY, name TEXT NOT NULL, score INTEGER DEFAULT 5)",
        )
        .execute(&pool)
        .await
        .unwrap();
        let table = TableName::resolve(&pool, "t").await.unwrap();
        let cols = Catalog::column_info(&pool, &table).await.unwrap();
        let names: Vec<_> = cols.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "score"]);
        assert!(cols[0].pk && cols[0].notnull);
        assert!(!cols[1].pk && cols[1].notnull);
        assert_eq!(cols[2].dflt_value.as_deref(), Some("5"));
    }

    #[tokio::test]
    async fn unique_columns_resolve_first_column_of_each_unique_index() {
        let pool = pool().await;
        sqlx::query("CREATE TABLE t (a TEXT, b TEXT, c TEXT)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("CREATE UNIQUE INDEX t_bc ON t (b, c)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("CREATE INDEX t_a ON t (a)")
            .execute(&pool)
            .await
            .unwrap();
        let table = TableName::resolve(&pool, "t").await.unwrap();
        let uniques = Catalog::unique_columns(&pool, &table).await.unwrap();
        assert_eq!(uniques, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn foreign_keys_report_actions() {
        let pool = pool().await;
        sqlx::query("CREATE TABLE parent (id INTEGER PRIMARY KEY)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE child (id INTEGER PRIMARY KEY, parentId INTEGER, \
             FOREIGN KEY(parentId) REFERENCES parent(id) ON DELETE CASCADE ON UPDATE CASCADE)",
        )
        .execute(&pool)
        .await
        .unwrap();
        let table = TableName::resolve(&pool, "child").await.unwrap();
        let fks = Catalog::foreign_keys(&pool, &table).await.unwrap();
        assert_eq!(fks.len(), 1);
        assert_eq!(fks[0].table, "parent");
        assert_eq!(fks[0].from, "parentId");
        assert_eq!(fks[0].to.as_deref(), Some("id"));
        assert_eq!(fks[0].on_delete, "CASCADE");
        assert_eq!(fks[0].on_update, "CASCADE");
    }
}
