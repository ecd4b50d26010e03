//! Builds parameterized SELECT, INSERT, UPDATE, DELETE, and next-id
//! statements for a validated table name. Identifiers come from the catalog,
//! values are always bound as parameters.

use crate::catalog::TableName;
use serde_json::Value;

/// Quote identifier for SQLite.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new(sql: String) -> Self {
        QueryBuf {
            sql,
            params: Vec::new(),
        }
    }
}

/// SELECT every row. No ordering guarantee beyond store default.
pub fn select_all(table: &TableName) -> QueryBuf {
    QueryBuf::new(format!("SELECT * FROM {}", table.quoted()))
}

/// SELECT at most one row by id.
pub fn select_by_id(table: &TableName, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new(format!(
        "SELECT * FROM {} WHERE \"id\" = ?",
        table.quoted()
    ));
    q.params.push(Value::from(id));
    q
}

/// INSERT listing exactly the supplied columns, in the order they were
/// supplied. Omitted columns take the store's default.
pub fn insert(table: &TableName, columns: &[(String, Value)]) -> QueryBuf {
    let mut q = QueryBuf::new(String::new());
    let mut cols = Vec::with_capacity(columns.len());
    let mut placeholders = Vec::with_capacity(columns.len());
    for (name, value) in columns {
        cols.push(quoted(name));
        placeholders.push("?");
        q.params.push(value.clone());
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.quoted(),
        cols.join(", "),
        placeholders.join(", ")
    );
    q
}

/// UPDATE exactly the supplied columns, scoped by id. The id binds last.
pub fn update_by_id(table: &TableName, id: i64, columns: &[(String, Value)]) -> QueryBuf {
    let mut q = QueryBuf::new(String::new());
    let mut sets = Vec::with_capacity(columns.len());
    for (name, value) in columns {
        sets.push(format!("{} = ?", quoted(name)));
        q.params.push(value.clone());
    }
    q.sql = format!(
        "UPDATE {} SET {} WHERE \"id\" = ?",
        table.quoted(),
        sets.join(", ")
    );
    q.params.push(Value::from(id));
    q
}

/// DELETE the rows whose ids are in the list, one placeholder per id.
pub fn delete_by_ids(table: &TableName, ids: &[i64]) -> QueryBuf {
    let mut q = QueryBuf::new(String::new());
    let placeholders = vec!["?"; ids.len()].join(", ");
    q.sql = format!(
        "DELETE FROM {} WHERE \"id\" IN ({})",
        table.quoted(),
        placeholders
    );
    q.params.extend(ids.iter().map(|&id| Value::from(id)));
    q
}

/// Advisory next identifier: max(id) + 1 over the table. Not a reservation;
/// concurrent callers may observe the same maximum.
pub fn next_id(table: &TableName) -> QueryBuf {
    QueryBuf::new(format!(
        "SELECT COALESCE(MAX(\"id\"), 0) + 1 AS \"id\" FROM {}",
        table.quoted()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn student() -> TableName {
        TableName::new_unchecked("student")
    }

    #[test]
    fn select_all_has_no_params() {
        let q = select_all(&student());
        assert_eq!(q.sql, r#"SELECT * FROM "student""#);
        assert!(q.params.is_empty());
    }

    #[test]
    fn select_by_id_binds_the_id() {
        let q = select_by_id(&student(), 7);
        assert_eq!(q.sql, r#"SELECT * FROM "student" WHERE "id" = ?"#);
        assert_eq!(q.params, vec![json!(7)]);
    }

    #[test]
    fn insert_preserves_supplied_column_order() {
        let cols = vec![
            ("name".to_string(), json!("Ann")),
            ("surname".to_string(), json!("Lee")),
            ("birthYear".to_string(), json!("2000")),
        ];
        let q = insert(&student(), &cols);
        assert_eq!(
            q.sql,
            r#"INSERT INTO "student" ("name", "surname", "birthYear") VALUES (?, ?, ?)"#
        );
        assert_eq!(q.params, vec![json!("Ann"), json!("Lee"), json!("2000")]);
    }

    #[test]
    fn update_binds_values_then_id() {
        let cols = vec![("name".to_string(), json!("Zoe"))];
        let q = update_by_id(&student(), 3, &cols);
        assert_eq!(q.sql, r#"UPDATE "student" SET "name" = ? WHERE "id" = ?"#);
        assert_eq!(q.params, vec![json!("Zoe"), json!(3)]);
    }

    #[test]
    fn delete_emits_one_placeholder_per_id() {
        let q = delete_by_ids(&student(), &[1, 3, 5]);
        assert_eq!(q.sql, r#"DELETE FROM "student" WHERE "id" IN (?, ?, ?)"#);
        assert_eq!(q.params, vec![json!(1), json!(3), json!(5)]);
    }

    #[test]
    fn next_id_coalesces_empty_table_to_one() {
        let q = next_id(&student());
        assert_eq!(
            q.sql,
            r#"SELECT COALESCE(MAX("id"), 0) + 1 AS "id" FROM "student""#
        );
    }

    #[test]
    fn embedded_quotes_are_escaped() {
        let table = TableName::new_unchecked(r#"we"ird"#);
        let q = select_all(&table);
        assert_eq!(q.sql, r#"SELECT * FROM "we""ird""#);
    }
}
