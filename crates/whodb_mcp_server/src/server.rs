use crate::confirm::ConfirmationStore;
use crate::options::ServerOptions;
use crate::security::{self, Decision};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo,
    },
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use whodb_core::manager::{ConnectionManager, QueryContext, run_with_context};
use whodb_core::{Connection, CoreError, PluginConfig, Rows};

/// Shared state behind every tool invocation. The server itself keeps no
/// per-connection session: each call resolves its connection fresh, and
/// only confirmation tokens (and the HTTP rate counters) outlive a call.
pub struct ServerState {
    pub manager: ConnectionManager,
    pub options: ServerOptions,
    pub confirmations: ConfirmationStore,
}

impl ServerState {
    pub fn new(manager: ConnectionManager, options: ServerOptions) -> Self {
        let confirmations = ConfirmationStore::new(options.confirmation_ttl);
        Self {
            manager,
            options,
            confirmations,
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct QueryArgs {
    /// Saved connection name or env-profile alias.
    pub connection: String,
    /// SQL (or engine-native query) to execute.
    pub sql: String,
    /// Optional row cap below the server-wide limit.
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SchemasArgs {
    pub connection: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TablesArgs {
    pub connection: String,
    pub schema: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ColumnsArgs {
    pub connection: String,
    pub schema: Option<String>,
    pub table: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConfirmArgs {
    /// Confirmation token id returned by a gated write.
    pub id: String,
}

#[derive(Clone)]
pub struct WhodbMcpServer {
    state: Arc<ServerState>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl WhodbMcpServer {
    pub fn new(state: Arc<ServerState>) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    fn resolve(&self, name: &str) -> Result<(Connection, PluginConfig), McpError> {
        let connection = self
            .state
            .manager
            .resolve_connection(name)
            .map_err(to_mcp_error)?;
        let config = PluginConfig::new(connection.credentials());
        Ok((connection, config))
    }

    fn context(&self) -> QueryContext {
        QueryContext::with_timeout(self.state.options.query_timeout)
    }

    /// Runs the statement and renders the capped result payload.
    async fn run_sql(
        &self,
        connection_name: &str,
        sql: &str,
        limit: Option<usize>,
    ) -> Result<serde_json::Value, McpError> {
        let (connection, config) = self.resolve(connection_name)?;
        let plugin = self
            .state
            .manager
            .engine()
            .plugin(connection.database_type)
            .map_err(to_mcp_error)?;

        let sql = sql.to_string();
        let mut rows: Rows = run_with_context(self.context(), move || {
            plugin.raw_execute(&config, &sql)
        })
        .await
        .map_err(to_mcp_error)?;

        let cap = limit
            .unwrap_or(self.state.options.row_limit)
            .min(self.state.options.row_limit);
        let truncated = rows.truncate_rows(cap);

        Ok(json!({
            "columns": rows.columns,
            "rows": rows.rows,
            "truncated": truncated,
        }))
    }

    #[tool(
        description = "Execute a SQL statement against a named connection. Writes may return a confirmation token instead of executing, depending on server policy."
    )]
    pub async fn whodb_query(
        &self,
        Parameters(QueryArgs {
            connection,
            sql,
            limit,
        }): Parameters<QueryArgs>,
    ) -> Result<CallToolResult, McpError> {
        match security::validate(&sql, &self.state.options) {
            Decision::Reject(reason) => Err(McpError::invalid_params(reason, None)),
            Decision::NeedsConfirmation => {
                // Resolve first so a bad connection name fails before a
                // token is minted.
                self.resolve(&connection)?;
                let summary = security::summarize(&sql);
                let pending = self.state.confirmations.insert(&connection, &sql, &summary);
                log::info!(
                    "[CONFIRM] held {} for {} (token {})",
                    pending.summary,
                    connection,
                    pending.id
                );
                Ok(json_result(json!({
                    "confirmationToken": pending.id.to_string(),
                    "summary": pending.summary,
                    "expiresAt": pending.expires_at.to_rfc3339(),
                })))
            }
            Decision::Allow => {
                let payload = self.run_sql(&connection, &sql, limit).await?;
                Ok(json_result(payload))
            }
        }
    }

    #[tool(description = "List schemas (or databases) available on a connection.")]
    pub async fn whodb_schemas(
        &self,
        Parameters(SchemasArgs { connection }): Parameters<SchemasArgs>,
    ) -> Result<CallToolResult, McpError> {
        let (resolved, _) = self.resolve(&connection)?;

        // Catalog reads go through the manager so the per-connection TTL
        // cache serves repeat calls.
        let state = self.state.clone();
        let schemas = run_with_context(self.context(), move || {
            state.manager.schemas_for(&resolved)
        })
        .await
        .map_err(to_mcp_error)?;

        Ok(json_result(json!({ "schemas": schemas })))
    }

    #[tool(description = "List tables (or collections, indices, keys) in a schema.")]
    pub async fn whodb_tables(
        &self,
        Parameters(TablesArgs { connection, schema }): Parameters<TablesArgs>,
    ) -> Result<CallToolResult, McpError> {
        let (resolved, _) = self.resolve(&connection)?;
        let schema = schema
            .or_else(|| resolved.schema.clone())
            .unwrap_or_else(|| resolved.database_type.default_schema(&resolved.database));

        let state = self.state.clone();
        let tables = run_with_context(self.context(), move || {
            state.manager.storage_units_for(&resolved, &schema)
        })
        .await
        .map_err(to_mcp_error)?;

        Ok(json_result(json!({ "tables": tables })))
    }

    #[tool(description = "List columns of a table, with primary/foreign key markers.")]
    pub async fn whodb_columns(
        &self,
        Parameters(ColumnsArgs {
            connection,
            schema,
            table,
        }): Parameters<ColumnsArgs>,
    ) -> Result<CallToolResult, McpError> {
        let (resolved, _) = self.resolve(&connection)?;
        let schema = schema
            .or_else(|| resolved.schema.clone())
            .unwrap_or_else(|| resolved.database_type.default_schema(&resolved.database));

        let state = self.state.clone();
        let columns = run_with_context(self.context(), move || {
            state.manager.columns_for(&resolved, &schema, &table)
        })
        .await
        .map_err(to_mcp_error)?;

        Ok(json_result(json!({ "columns": columns })))
    }

    #[tool(description = "List configured connections (saved and environment profiles).")]
    pub async fn whodb_connections(&self) -> Result<CallToolResult, McpError> {
        let listed = self.state.manager.list_connections_with_source();
        let connections: Vec<serde_json::Value> = listed
            .into_iter()
            .map(|(connection, source)| {
                json!({
                    "name": connection.name,
                    "type": connection.database_type.display_name(),
                    "host": connection.host,
                    "port": connection.port,
                    "database": connection.database,
                    "source": source,
                })
            })
            .collect();
        Ok(json_result(json!({ "connections": connections })))
    }

    #[tool(description = "Execute a previously confirmed write by its confirmation token.")]
    pub async fn whodb_confirm(
        &self,
        Parameters(ConfirmArgs { id }): Parameters<ConfirmArgs>,
    ) -> Result<CallToolResult, McpError> {
        let id = Uuid::parse_str(&id)
            .map_err(|_| McpError::invalid_params("malformed confirmation id", None))?;

        let Some(pending) = self.state.confirmations.take(id) else {
            return Err(McpError::resource_not_found(
                "confirmation token not found or expired",
                None,
            ));
        };

        log::info!("[CONFIRM] executing {} (token {})", pending.summary, id);
        let payload = self.run_sql(&pending.connection, &pending.sql, None).await?;
        Ok(json_result(payload))
    }
}

#[tool_handler]
impl ServerHandler for WhodbMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_server_info(Implementation::from_build_env())
            .with_instructions(
                "Query and inspect configured databases. Use whodb_connections to discover \
                 connection names, the catalog tools (whodb_schemas, whodb_tables, \
                 whodb_columns) to explore structure, and whodb_query to run SQL. Under \
                 confirm-writes policy a write returns a confirmation token; pass it to \
                 whodb_confirm to execute.",
            )
    }
}

fn json_result(payload: serde_json::Value) -> CallToolResult {
    CallToolResult::success(vec![Content::text(payload.to_string())])
}

/// Maps core error kinds onto canonical MCP errors. Messages are already
/// sanitized at the core layer; nothing driver-specific leaks here.
fn to_mcp_error(error: CoreError) -> McpError {
    match &error {
        CoreError::NotFound(_) => McpError::resource_not_found(error.to_string(), None),
        CoreError::BadRequest(_) | CoreError::Unsupported(_) => {
            McpError::invalid_params(error.to_string(), None)
        }
        CoreError::Unauthorized(_) | CoreError::Conflict(_) | CoreError::NotConnected => {
            McpError::invalid_request(error.to_string(), None)
        }
        CoreError::Timeout | CoreError::Cancelled | CoreError::Internal(_) => {
            McpError::internal_error(error.to_string(), None)
        }
    }
}
