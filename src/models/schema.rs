//! Schema-related data models.
//!
//! This module defines types for database schema introspection.

use schemars::JsonSchema;
use serde::Serialize;

/// One database on the server.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct DatabaseInfo {
    /// Database name
    pub name: String,
    /// True for the database this server is configured against
    pub current: bool,
}

/// One column of a described table.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ColumnDefinition {
    /// Column name
    pub field: String,
    /// Data type, with character length when bounded (e.g. "character varying(255)")
    pub data_type: String,
    /// True if the column accepts NULL
    pub nullable: bool,
    /// Default expression, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}
