//! Schema introspection tools.
//!
//! This module implements the `list_databases`, `list_tables` and
//! `describe_table` MCP tools over [`SchemaInspector`].

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::db::{Database, SchemaInspector};
use crate::error::PgResult;
use crate::models::{ColumnDefinition, DatabaseInfo};

/// Input for the describe_table tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DescribeTableInput {
    /// Name of the table to describe (public schema)
    pub table_name: String,
}

/// Output for the list_databases tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListDatabasesOutput {
    pub status: String,
    pub message: String,
    /// Databases on the server; `current` marks the configured one
    pub databases: Vec<DatabaseInfo>,
    pub count: usize,
}

/// Output for the list_tables tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListTablesOutput {
    pub status: String,
    pub message: String,
    /// Table names in the public schema
    pub tables: Vec<String>,
    pub count: usize,
}

/// Output for the describe_table tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct DescribeTableOutput {
    pub status: String,
    pub message: String,
    pub table_name: String,
    pub columns: Vec<ColumnDefinition>,
}

pub struct SchemaToolHandler {
    db: Arc<Database>,
}

impl SchemaToolHandler {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn list_databases(&self) -> PgResult<ListDatabasesOutput> {
        let databases = SchemaInspector::new(self.db.clone()).list_databases().await?;
        let count = databases.len();
        Ok(ListDatabasesOutput {
            status: "success".to_string(),
            message: format!("Found {count} database(s)"),
            databases,
            count,
        })
    }

    pub async fn list_tables(&self) -> PgResult<ListTablesOutput> {
        let tables = SchemaInspector::new(self.db.clone()).list_tables().await?;
        let count = tables.len();
        Ok(ListTablesOutput {
            status: "success".to_string(),
            message: format!("Found {count} table(s)"),
            tables,
            count,
        })
    }

    pub async fn describe_table(&self, input: DescribeTableInput) -> PgResult<DescribeTableOutput> {
        let columns = SchemaInspector::new(self.db.clone())
            .describe_table(&input.table_name)
            .await?;
        Ok(DescribeTableOutput {
            status: "success".to_string(),
            message: format!(
                "Table '{}' contains {} field(s)",
                input.table_name,
                columns.len()
            ),
            table_name: input.table_name,
            columns,
        })
    }
}
