//! MCP tool implementations.
//!
//! This module contains all database tool handlers:
//! - `query`: Execute a validated SQL query
//! - `list_databases`: List databases on the server
//! - `list_tables`: List tables in the configured database
//! - `describe_table`: Get table column information

pub mod query;
pub mod schema;

pub use query::{QueryInput, QueryOutput, QueryToolHandler};
pub use schema::{
    DescribeTableInput, DescribeTableOutput, ListDatabasesOutput, ListTablesOutput,
    SchemaToolHandler,
};
