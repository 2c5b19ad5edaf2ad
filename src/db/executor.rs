//! Query execution engine.
//!
//! Runs a validated query against the pool, streaming rows up to the limit
//! so an unbounded result set never lands in memory, and shapes each row
//! into JSON via the type mappings. The whole execution is wrapped in a
//! timeout; validation has already happened by the time a query gets here.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::TryStreamExt;
use tracing::debug;

use crate::db::Database;
use crate::db::types::{column_metadata, row_to_json_map};
use crate::error::{PgError, PgResult};
use crate::models::{ColumnMetadata, QueryResult};

pub struct QueryExecutor {
    db: Arc<Database>,
}

impl QueryExecutor {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Execute `sql` and shape up to `limit` rows.
    ///
    /// Fetches one row past the limit to detect truncation without ever
    /// materializing the full result.
    pub async fn run(
        &self,
        sql: &str,
        limit: u32,
        timeout: Duration,
        decode_binary: bool,
    ) -> PgResult<QueryResult> {
        let started = Instant::now();

        let fetch = async {
            let mut columns: Vec<ColumnMetadata> = Vec::new();
            let mut rows = Vec::new();
            let mut truncated = false;

            let mut stream = sqlx::query(sql).fetch(self.db.pool());
            while let Some(row) = stream.try_next().await? {
                if columns.is_empty() {
                    columns = column_metadata(&row);
                }
                if rows.len() as u32 >= limit {
                    truncated = true;
                    break;
                }
                rows.push(row_to_json_map(&row, decode_binary));
            }
            Ok::<_, PgError>((columns, rows, truncated))
        };

        let (columns, rows, truncated) = tokio::time::timeout(timeout, fetch)
            .await
            .map_err(|_| PgError::timeout("query", timeout.as_secs() as u32))??;

        let execution_time_ms = started.elapsed().as_millis() as u64;
        debug!(
            rows = rows.len(),
            truncated, execution_time_ms, "Query executed"
        );

        Ok(QueryResult {
            columns,
            row_count: rows.len(),
            rows,
            truncated,
            execution_time_ms,
        })
    }
}
