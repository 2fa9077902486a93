use rmcp::handler::server::tool::Parameters;
use rmcp::model::CallToolResult;
use std::sync::Arc;
use whodb_core::config::ConfigStore;
use whodb_core::manager::ConnectionManager;
use whodb_core::testing::FakePlugin;
use whodb_core::{AdvancedOptions, Connection, DatabaseType, Engine};
use whodb_mcp_server::server::{ColumnsArgs, ConfirmArgs, QueryArgs, TablesArgs};
use whodb_mcp_server::{PermissionMode, ServerOptions, ServerState, WhodbMcpServer};

fn connection(name: &str) -> Connection {
    Connection {
        name: name.to_string(),
        database_type: DatabaseType::Postgres,
        host: "localhost".to_string(),
        port: Some(5432),
        username: "app".to_string(),
        password: "secret".to_string(),
        database: "app".to_string(),
        schema: None,
        advanced: AdvancedOptions::new(),
        is_profile: false,
    }
}

fn server_with(options: ServerOptions) -> (WhodbMcpServer, Arc<FakePlugin>) {
    let fake = Arc::new(FakePlugin::new(DatabaseType::Postgres));
    let mut engine = Engine::new();
    engine.register(fake.clone());

    let config = ConfigStore::in_memory();
    config.add(connection("prod")).unwrap();

    let manager = ConnectionManager::new(Arc::new(engine), Arc::new(config));
    let state = Arc::new(ServerState::new(manager, options));
    (WhodbMcpServer::new(state), fake)
}

/// Digs the JSON payload out of a tool result via its serialized form, so
/// the test tracks the MCP wire shape rather than internal struct fields.
fn payload_of(result: &CallToolResult) -> serde_json::Value {
    let serialized = serde_json::to_value(result).expect("tool results serialize");
    let text = serialized["content"][0]["text"]
        .as_str()
        .expect("tool result carries one text content");
    serde_json::from_str(text).expect("tool result text is JSON")
}

#[tokio::test]
async fn multi_statement_queries_are_rejected() {
    let (server, fake) = server_with(ServerOptions::default());

    let result = server
        .whodb_query(Parameters(QueryArgs {
            connection: "prod".to_string(),
            sql: "SELECT 1; SELECT 2".to_string(),
            limit: None,
        }))
        .await;

    let error = result.expect_err("multi-statement must be rejected");
    assert!(error.message.contains("multi-statement"));
    assert_eq!(fake.execute_calls(), 0, "no query may be issued");
}

#[tokio::test]
async fn confirm_writes_flow_is_single_use() {
    let (server, fake) = server_with(ServerOptions::default());

    // (a) The write is held and a token comes back.
    let held = server
        .whodb_query(Parameters(QueryArgs {
            connection: "prod".to_string(),
            sql: "DELETE FROM users WHERE id = 5".to_string(),
            limit: None,
        }))
        .await
        .unwrap();
    let payload = payload_of(&held);
    let token = payload["confirmationToken"].as_str().unwrap().to_string();
    assert_eq!(payload["summary"], "DELETE on users");
    assert!(payload["expiresAt"].as_str().is_some());
    assert_eq!(fake.execute_calls(), 0);

    // (b) Confirming executes the stored SQL on the stored connection.
    let confirmed = server
        .whodb_confirm(Parameters(ConfirmArgs { id: token.clone() }))
        .await
        .unwrap();
    let payload = payload_of(&confirmed);
    assert_eq!(payload["rows"][0][0], "DELETE FROM users WHERE id = 5");
    assert_eq!(fake.execute_calls(), 1);

    // (c) The token is gone.
    let replay = server
        .whodb_confirm(Parameters(ConfirmArgs { id: token }))
        .await;
    assert!(replay.is_err(), "tokens are single-use");
    assert_eq!(fake.execute_calls(), 1);
}

#[tokio::test]
async fn read_only_mode_rejects_writes_outright() {
    let options = ServerOptions {
        permission_mode: PermissionMode::ReadOnly,
        ..ServerOptions::default()
    };
    let (server, fake) = server_with(options);

    let result = server
        .whodb_query(Parameters(QueryArgs {
            connection: "prod".to_string(),
            sql: "INSERT INTO t VALUES (1)".to_string(),
            limit: None,
        }))
        .await;
    assert!(result.is_err());
    assert_eq!(fake.execute_calls(), 0);

    let read = server
        .whodb_query(Parameters(QueryArgs {
            connection: "prod".to_string(),
            sql: "SELECT 1".to_string(),
            limit: None,
        }))
        .await;
    assert!(read.is_ok());
}

#[tokio::test]
async fn unknown_connection_is_not_found() {
    let (server, _) = server_with(ServerOptions::default());
    let result = server
        .whodb_query(Parameters(QueryArgs {
            connection: "ghost".to_string(),
            sql: "SELECT 1".to_string(),
            limit: None,
        }))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn tables_tool_lists_storage_units() {
    let (server, _) = server_with(ServerOptions::default());
    let result = server
        .whodb_tables(Parameters(TablesArgs {
            connection: "prod".to_string(),
            schema: Some("public".to_string()),
        }))
        .await
        .unwrap();
    let payload = payload_of(&result);
    assert_eq!(payload["tables"][0]["name"], "users");
}

#[tokio::test]
async fn repeat_catalog_reads_are_served_from_cache() {
    let (server, fake) = server_with(ServerOptions::default());

    for _ in 0..3 {
        server
            .whodb_tables(Parameters(TablesArgs {
                connection: "prod".to_string(),
                schema: None,
            }))
            .await
            .unwrap();
    }
    assert_eq!(fake.unit_calls(), 1, "repeat reads must hit the cache");

    for _ in 0..2 {
        server
            .whodb_columns(Parameters(ColumnsArgs {
                connection: "prod".to_string(),
                schema: None,
                table: "users".to_string(),
            }))
            .await
            .unwrap();
    }
    assert_eq!(fake.column_calls(), 1);
}

#[tokio::test]
async fn row_cap_truncates_after_fetch() {
    let options = ServerOptions {
        permission_mode: PermissionMode::AllowWrite,
        row_limit: 2,
        ..ServerOptions::default()
    };
    let (server, _) = server_with(options);

    let result = server
        .whodb_query(Parameters(QueryArgs {
            connection: "prod".to_string(),
            sql: "SELECT 1".to_string(),
            limit: Some(10),
        }))
        .await
        .unwrap();
    let payload = payload_of(&result);
    // The fake echoes three rows; the requested limit may not exceed the
    // server-wide cap of two.
    assert_eq!(payload["rows"].as_array().unwrap().len(), 2);
    assert_eq!(payload["truncated"], true);
}

#[tokio::test]
async fn saved_connections_shadow_env_profiles() {
    // Lock in the precedence rule: listing and resolution must agree,
    // with saved entries winning over env profiles of the same name.
    unsafe {
        std::env::set_var(
            "WHODB_POSTGRES",
            r#"[{"alias":"prod","host":"env-host"},{"alias":"env-only","host":"env2"}]"#,
        );
    }

    let (server, _) = server_with(ServerOptions::default());
    let result = server.whodb_connections().await.unwrap();
    let payload = payload_of(&result);
    let connections = payload["connections"].as_array().unwrap().clone();

    unsafe {
        std::env::remove_var("WHODB_POSTGRES");
    }

    let prods: Vec<_> = connections
        .iter()
        .filter(|c| c["name"] == "prod")
        .collect();
    assert_eq!(prods.len(), 1, "duplicate env profile must be suppressed");
    assert_eq!(prods[0]["source"], "saved");
    assert_eq!(prods[0]["host"], "localhost", "saved entry wins");
    assert!(
        connections.iter().all(|c| c.get("password").is_none()),
        "passwords never appear in listings"
    );
    assert!(
        connections
            .iter()
            .any(|c| c["name"] == "env-only" && c["source"] == "env")
    );
}
