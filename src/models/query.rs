//! Query-related data models.
//!
//! This module defines types for SQL query results and their limits.

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Default row limit for query results.
pub const DEFAULT_ROW_LIMIT: u32 = 100;

/// Maximum allowed row limit.
pub const MAX_ROW_LIMIT: u32 = 10000;

/// Default query timeout in seconds.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u32 = 30;

/// Maximum query timeout in seconds.
pub const MAX_QUERY_TIMEOUT_SECS: u32 = 300;

/// Metadata for one result column.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ColumnMetadata {
    /// Column name as returned by the server
    pub name: String,
    /// PostgreSQL type name (e.g. "INT4", "TEXT", "NUMERIC")
    pub type_name: String,
}

/// The shaped result of an executed query.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub columns: Vec<ColumnMetadata>,
    /// Rows as ordered key-value maps
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
    pub row_count: usize,
    /// True if the row limit cut the result short
    pub truncated: bool,
    pub execution_time_ms: u64,
}

/// Clamp a requested row limit to the permitted range.
pub fn clamp_row_limit(requested: Option<u32>) -> u32 {
    requested.unwrap_or(DEFAULT_ROW_LIMIT).min(MAX_ROW_LIMIT)
}

/// Clamp a requested timeout to the permitted range.
pub fn clamp_timeout_secs(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_QUERY_TIMEOUT_SECS)
        .min(MAX_QUERY_TIMEOUT_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_row_limit_default() {
        assert_eq!(clamp_row_limit(None), DEFAULT_ROW_LIMIT);
    }

    #[test]
    fn test_clamp_row_limit_max() {
        assert_eq!(clamp_row_limit(Some(999_999)), MAX_ROW_LIMIT);
        assert_eq!(clamp_row_limit(Some(50)), 50);
    }

    #[test]
    fn test_clamp_timeout() {
        assert_eq!(clamp_timeout_secs(None), DEFAULT_QUERY_TIMEOUT_SECS);
        assert_eq!(clamp_timeout_secs(Some(600)), MAX_QUERY_TIMEOUT_SECS);
        assert_eq!(clamp_timeout_secs(Some(5)), 5);
    }
}
