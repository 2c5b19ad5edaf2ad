//! Query execution tool.
//!
//! This module implements the `query` MCP tool. Every submitted SQL text
//! runs through the validator first; under restrictive mode a denial is
//! surfaced verbatim and the query never reaches the database.

use std::sync::Arc;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::info;

use crate::db::{Database, QueryExecutor};
use crate::error::{PgError, PgResult};
use crate::models::{ColumnMetadata, query::clamp_row_limit, query::clamp_timeout_secs};
use crate::validator::{SecurityMode, ValidationOutcome, validate};

/// Default value for decode_binary field.
fn default_decode_binary() -> bool {
    true
}

/// Input for the query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryInput {
    /// SQL statement to execute. Under restrictive mode only SELECT, SHOW,
    /// DESCRIBE and EXPLAIN are accepted, as a single statement.
    pub sql: String,
    /// Maximum rows to return. Default: 100, max: 10000
    #[serde(default)]
    pub limit: Option<u32>,
    /// Query timeout in seconds. Default: 30, max: 300
    #[serde(default)]
    pub timeout_secs: Option<u32>,
    /// If true (default), decode bytea columns as UTF-8 text when possible
    /// (fallback to base64). If false, always use base64 encoding.
    #[serde(default = "default_decode_binary")]
    pub decode_binary: bool,
}

/// Output from the query tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct QueryOutput {
    /// Always "success"; failures are returned as tool errors
    pub status: String,
    /// Human-readable result summary
    pub message: String,
    /// Column metadata (name, type)
    pub columns: Vec<ColumnMetadata>,
    /// Result rows as key-value maps
    pub data: Vec<serde_json::Map<String, JsonValue>>,
    /// Number of rows returned
    pub row_count: usize,
    /// True if result was truncated due to limit
    pub truncated: bool,
    /// Query execution time in milliseconds
    pub execution_time_ms: u64,
}

pub struct QueryToolHandler {
    db: Arc<Database>,
    security_mode: SecurityMode,
}

impl QueryToolHandler {
    pub fn new(db: Arc<Database>, security_mode: SecurityMode) -> Self {
        Self { db, security_mode }
    }

    /// Validate and execute one query.
    pub async fn query(&self, input: QueryInput) -> PgResult<QueryOutput> {
        if input.sql.trim().is_empty() {
            return Err(PgError::invalid_input("Empty SQL statement"));
        }

        if let ValidationOutcome::Denied(denial) = validate(&input.sql, self.security_mode) {
            info!(
                violation = ?denial.violation,
                offending_kind = ?denial.offending_kind,
                depth = denial.depth,
                "Query rejected by validator"
            );
            return Err(PgError::from(denial));
        }

        let limit = clamp_row_limit(input.limit);
        let timeout = Duration::from_secs(clamp_timeout_secs(input.timeout_secs) as u64);

        let executor = QueryExecutor::new(self.db.clone());
        let result = executor
            .run(&input.sql, limit, timeout, input.decode_binary)
            .await?;

        let message = if result.row_count == 0 {
            "Query executed successfully, but no results returned".to_string()
        } else {
            format!(
                "Query executed successfully, returned {} row(s)",
                result.row_count
            )
        };

        Ok(QueryOutput {
            status: "success".to_string(),
            message,
            columns: result.columns,
            data: result.rows,
            row_count: result.row_count,
            truncated: result.truncated,
            execution_time_ms: result.execution_time_ms,
        })
    }
}
