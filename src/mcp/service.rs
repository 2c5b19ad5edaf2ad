//! MCP service implementation using rmcp.
//!
//! This module defines the PgService struct with all database tools
//! exposed via the MCP protocol using the rmcp framework's macros. The
//! security mode is captured once at construction and never changes.

use std::sync::Arc;

use rmcp::Json;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};

use crate::db::Database;
use crate::tools::query::{QueryInput, QueryOutput, QueryToolHandler};
use crate::tools::schema::{
    DescribeTableInput, DescribeTableOutput, ListDatabasesOutput, ListTablesOutput,
    SchemaToolHandler,
};
use crate::validator::SecurityMode;

#[derive(Clone)]
pub struct PgService {
    /// Shared pool for all database operations
    db: Arc<Database>,
    /// Validation mode, fixed at startup
    security_mode: SecurityMode,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl PgService {
    /// Create a new PgService instance.
    ///
    /// # Arguments
    ///
    /// * `db` - Shared database pool
    /// * `security_mode` - Validation mode read once from configuration
    pub fn new(db: Arc<Database>, security_mode: SecurityMode) -> Self {
        Self {
            db,
            security_mode,
            tool_router: Self::tool_router(),
        }
    }

    pub fn security_mode(&self) -> SecurityMode {
        self.security_mode
    }
}

#[tool_router]
impl PgService {
    #[tool(
        description = "Execute a SQL query and return results as JSON.\nBy default only read-only statements (SELECT, SHOW, DESCRIBE, EXPLAIN) are accepted, one statement per call; everything else is rejected before reaching the database."
    )]
    async fn query(
        &self,
        Parameters(input): Parameters<QueryInput>,
    ) -> Result<Json<QueryOutput>, McpError> {
        let handler = QueryToolHandler::new(self.db.clone(), self.security_mode);
        handler.query(input).await.map(Json).map_err(McpError::from)
    }

    #[tool(
        description = "List all databases in the PostgreSQL instance.\nThe configured database is flagged with current: true."
    )]
    async fn list_databases(&self) -> Result<Json<ListDatabasesOutput>, McpError> {
        let handler = SchemaToolHandler::new(self.db.clone());
        handler
            .list_databases()
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(description = "List all tables in the current database (public schema).")]
    async fn list_tables(&self) -> Result<Json<ListTablesOutput>, McpError> {
        let handler = SchemaToolHandler::new(self.db.clone());
        handler
            .list_tables()
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "Get column information for a table in the public schema.\nReturns field names, data types, nullability, and defaults."
    )]
    async fn describe_table(
        &self,
        Parameters(input): Parameters<DescribeTableInput>,
    ) -> Result<Json<DescribeTableOutput>, McpError> {
        let handler = SchemaToolHandler::new(self.db.clone());
        handler
            .describe_table(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }
}

#[tool_handler]
impl ServerHandler for PgService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "pg-mcp-server".to_owned(),
                title: Some("PG MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "PostgreSQL tools for querying a single configured database.\n\
                \n\
                ## Tools\n\
                - `list_databases`: databases on the server (the configured one is flagged)\n\
                - `list_tables`: tables in the configured database's public schema\n\
                - `describe_table`: column details for one table\n\
                - `query`: run a SQL statement and get rows back as JSON\n\
                \n\
                ## Query Policy\n\
                By default the server is restrictive: `query` accepts a single\n\
                SELECT, SHOW, DESCRIBE, or EXPLAIN statement. Write operations,\n\
                DDL, multiple `;`-separated statements, and statements hiding a\n\
                write inside a subquery, CTE, or UNION branch are rejected with\n\
                the reason in the error message. The operator can disable this\n\
                with ALLOW_DANGEROUS_OPERATIONS at server startup.\n\
                \n\
                ## Results\n\
                Query results include `columns`, `data` (rows as objects),\n\
                `row_count`, and `truncated`. Use the `limit` parameter (default\n\
                100, max 10000) to page through larger results."
                    .to_string(),
            ),
        }
    }
}
