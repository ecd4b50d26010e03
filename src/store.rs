//! Store connection and the fixed bootstrap schema.

use crate::error::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

/// Open the store. The pool holds exactly one connection for the process
/// lifetime; the store serializes conflicting writes itself.
pub async fn connect(database_url: &str) -> Result<SqlitePool, AppError> {
    let raw_path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);
    if !raw_path.is_empty() && !raw_path.starts_with(':') {
        if let Some(dir) = Path::new(raw_path).parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
    }

    let opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(opts)
        .await?;
    Ok(pool)
}

/// Bootstrap DDL, one statement per table, idempotent. Foreign keys may
/// reference tables created later in the list; SQLite resolves them at DML
/// time.
const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS "certification" (
        "id" INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
        "date" TEXT NOT NULL,
        "type" TEXT NOT NULL,
        "loadId" INTEGER,
        FOREIGN KEY("loadId") REFERENCES "load"("id") ON DELETE SET NULL ON UPDATE CASCADE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "faculty" (
        "id" INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT UNIQUE,
        "name" TEXT NOT NULL UNIQUE,
        "deanName" TEXT NOT NULL,
        "roomPhone" INTEGER NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "group" (
        "id" INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
        "name" TEXT NOT NULL,
        "number" INTEGER NOT NULL,
        "year" INTEGER NOT NULL,
        "course" INTEGER NOT NULL,
        "branch" TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "load" (
        "id" INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
        "year" INTEGER NOT NULL,
        "groupId" INTEGER,
        "subjectId" INTEGER,
        "teacherId" INTEGER,
        FOREIGN KEY("groupId") REFERENCES "group"("id") ON DELETE SET NULL ON UPDATE CASCADE,
        FOREIGN KEY("subjectId") REFERENCES "subject"("id") ON DELETE SET NULL ON UPDATE CASCADE,
        FOREIGN KEY("teacherId") REFERENCES "teacher"("id") ON DELETE SET NULL ON UPDATE CASCADE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "mark" (
        "id" INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
        "mark" INTEGER,
        "studentId" INTEGER NOT NULL,
        "certificationId" INTEGER,
        FOREIGN KEY("certificationId") REFERENCES "certification"("id") ON DELETE SET NULL ON UPDATE CASCADE,
        FOREIGN KEY("studentId") REFERENCES "student"("id") ON DELETE CASCADE ON UPDATE CASCADE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "student" (
        "id" INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
        "name" TEXT NOT NULL,
        "surname" TEXT NOT NULL,
        "birthYear" INTEGER NOT NULL,
        "groupId" INTEGER,
        FOREIGN KEY("groupId") REFERENCES "group"("id") ON DELETE CASCADE ON UPDATE CASCADE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "teacher" (
        "id" INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
        "surname" TEXT NOT NULL,
        "name" TEXT NOT NULL,
        "patronymic" TEXT NOT NULL,
        "category" TEXT NOT NULL,
        "facultyId" INTEGER,
        FOREIGN KEY("facultyId") REFERENCES "faculty"("id") ON DELETE SET NULL ON UPDATE CASCADE
    )"#,
];

/// Create the starting schema if it is not already present. Runs once at
/// process start; the dynamic engine never issues DDL.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), AppError> {
    for ddl in SCHEMA {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}
