//! Schema introspection module.
//!
//! This module provides database schema introspection: listing databases,
//! listing tables in the public schema, and describing a table's columns
//! via `information_schema`. Caller-supplied table names are pre-checked
//! against identifier syntax and always passed as bind parameters.

use std::sync::Arc;

use crate::db::Database;
use crate::error::{PgError, PgResult};
use crate::models::{ColumnDefinition, DatabaseInfo};

pub struct SchemaInspector {
    db: Arc<Database>,
}

impl SchemaInspector {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// List non-template databases, flagging the configured one.
    pub async fn list_databases(&self) -> PgResult<Vec<DatabaseInfo>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT datname FROM pg_database WHERE datistemplate = false ORDER BY datname",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(names
            .into_iter()
            .map(|name| DatabaseInfo {
                current: name == self.db.database_name(),
                name,
            })
            .collect())
    }

    /// List all tables in the public schema of the configured database.
    pub async fn list_tables(&self) -> PgResult<Vec<String>> {
        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT tablename FROM pg_catalog.pg_tables \
             WHERE schemaname = 'public' ORDER BY tablename",
        )
        .fetch_all(self.db.pool())
        .await?;
        Ok(tables)
    }

    /// Describe the columns of one table in the public schema.
    pub async fn describe_table(&self, table_name: &str) -> PgResult<Vec<ColumnDefinition>> {
        if !is_valid_identifier(table_name) {
            return Err(PgError::invalid_input(format!(
                "Invalid table name format: '{table_name}'"
            )));
        }

        let rows: Vec<(String, String, String, Option<String>, Option<i32>)> = sqlx::query_as(
            "SELECT column_name, data_type, is_nullable, column_default, \
                    character_maximum_length \
             FROM information_schema.columns \
             WHERE table_schema = 'public' AND table_name = $1 \
             ORDER BY ordinal_position",
        )
        .bind(table_name)
        .fetch_all(self.db.pool())
        .await?;

        if rows.is_empty() {
            return Err(PgError::schema(
                format!("Table '{table_name}' does not exist or access denied"),
                table_name,
            ));
        }

        Ok(rows
            .into_iter()
            .map(|(field, data_type, is_nullable, default, max_len)| {
                let data_type = match max_len {
                    Some(len) => format!("{data_type}({len})"),
                    None => data_type,
                };
                ColumnDefinition {
                    field,
                    data_type,
                    nullable: is_nullable == "YES",
                    default,
                }
            })
            .collect())
    }
}

/// Plain identifier check: letters, digits, underscores, not digit-leading.
/// Rejects anything that could smuggle quoting or schema qualification.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        assert!(is_valid_identifier("users"));
        assert!(is_valid_identifier("_private"));
        assert!(is_valid_identifier("order_items_2024"));
    }

    #[test]
    fn test_invalid_identifiers() {
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("1table"));
        assert!(!is_valid_identifier("users; DROP TABLE users"));
        assert!(!is_valid_identifier("public.users"));
        assert!(!is_valid_identifier("users\""));
        assert!(!is_valid_identifier("users table"));
    }
}
