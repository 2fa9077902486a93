use crate::{
    Column, Connection, ConnectionSource, CoreError, MetadataCache, PluginConfig, Result, Rows,
    StorageUnit, config::ConfigStore, engine::Engine, env_profiles,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Deadline and cancellation bundle carried by the context-bound call
/// variants.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    pub timeout: Option<Duration>,
    pub cancel: CancellationToken,
}

impl QueryContext {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            cancel: CancellationToken::new(),
        }
    }
}

/// Runs a blocking plugin call under a context.
///
/// The call is moved onto the blocking pool and raced against the
/// cancellation token and the deadline. On cancellation or timeout the
/// caller gets `Cancelled`/`Timeout` immediately; the driver call is not
/// interrupted and runs to completion in its task, its result discarded.
/// Callers that need the database work undone must compensate themselves.
pub async fn run_with_context<T, F>(ctx: QueryContext, call: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(call);

    let joined = tokio::select! {
        _ = ctx.cancel.cancelled() => {
            log::debug!("[CANCEL] caller gave up waiting; driver call continues detached");
            return Err(CoreError::Cancelled);
        }
        joined = async {
            match ctx.timeout {
                Some(timeout) => tokio::time::timeout(timeout, handle)
                    .await
                    .map_err(|_| CoreError::Timeout),
                None => Ok(handle.await),
            }
        } => joined?,
    };

    joined.map_err(|e| {
        log::error!("[QUERY] blocking task failed: {e}");
        CoreError::internal("query task failed")
    })?
}

enum ManagerState {
    Disconnected,
    Connecting,
    Connected(Connection),
    Disconnecting,
}

/// Resolves connections by name, applies credentials to the matching
/// plugin, and owns the metadata caches: one `MetadataCache` per
/// connection name, so both the stateful current-connection flow and
/// stateless per-call consumers are served from the same TTL cache.
///
/// State machine: Disconnected -> Connecting -> Connected -> Disconnecting
/// -> Disconnected. Connecting while already connected disconnects first.
/// Query methods require Connected.
pub struct ConnectionManager {
    engine: Arc<Engine>,
    config: Arc<ConfigStore>,
    caches: RwLock<HashMap<String, Arc<MetadataCache>>>,
    state: RwLock<ManagerState>,
}

impl ConnectionManager {
    pub fn new(engine: Arc<Engine>, config: Arc<ConfigStore>) -> Self {
        Self {
            engine,
            config,
            caches: RwLock::new(HashMap::new()),
            state: RwLock::new(ManagerState::Disconnected),
        }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    fn cache_for(&self, connection_name: &str) -> Arc<MetadataCache> {
        if let Some(cache) = self
            .caches
            .read()
            .expect("cache map poisoned")
            .get(connection_name)
        {
            return cache.clone();
        }
        self.caches
            .write()
            .expect("cache map poisoned")
            .entry(connection_name.to_string())
            .or_insert_with(|| Arc::new(MetadataCache::new()))
            .clone()
    }

    fn drop_cache(&self, connection_name: &str) {
        self.caches
            .write()
            .expect("cache map poisoned")
            .remove(connection_name);
    }

    /// Connects to the given record, implicitly disconnecting first.
    ///
    /// Failures are genericized: the caller learns that the connection did
    /// not work, not whether the host, the account, or the password was the
    /// problem.
    pub fn connect(&self, connection: Connection) -> Result<()> {
        self.disconnect();

        {
            let mut state = self.state.write().expect("manager state poisoned");
            *state = ManagerState::Connecting;
        }

        let result = (|| {
            let plugin = self.engine.plugin(connection.database_type)?;
            let config = PluginConfig::new(connection.credentials());
            if !plugin.is_available(&config) {
                return Err(CoreError::connect_failed(format!(
                    "{} is not reachable",
                    connection.name
                )));
            }
            Ok(())
        })();

        let mut state = self.state.write().expect("manager state poisoned");
        match result {
            Ok(()) => {
                log::info!("[CONNECT] connected to {}", connection.name);
                self.drop_cache(&connection.name);
                *state = ManagerState::Connected(connection);
                Ok(())
            }
            Err(e) => {
                *state = ManagerState::Disconnected;
                Err(e)
            }
        }
    }

    pub fn disconnect(&self) {
        let mut state = self.state.write().expect("manager state poisoned");
        let ManagerState::Connected(connection) = &*state else {
            *state = ManagerState::Disconnected;
            return;
        };
        let name = connection.name.clone();
        *state = ManagerState::Disconnecting;
        self.drop_cache(&name);
        *state = ManagerState::Disconnected;
        log::info!("[CONNECT] disconnected");
    }

    pub fn is_connected(&self) -> bool {
        matches!(
            *self.state.read().expect("manager state poisoned"),
            ManagerState::Connected(_)
        )
    }

    pub fn current_connection(&self) -> Result<Connection> {
        match &*self.state.read().expect("manager state poisoned") {
            ManagerState::Connected(connection) => Ok(connection.clone()),
            _ => Err(CoreError::NotConnected),
        }
    }

    /// Drops every cached catalog entry, for all connections. Clients call
    /// this after schema-mutating queries when they need immediate
    /// visibility.
    pub fn invalidate_cache(&self) {
        self.caches.write().expect("cache map poisoned").clear();
    }

    /// Looks a connection up by name: saved config first, then env
    /// profiles. The ordering here must agree with
    /// `list_connections_with_source`, which emits saved entries first.
    pub fn resolve_connection(&self, name: &str) -> Result<Connection> {
        if let Some(connection) = self.config.find(name) {
            return Ok(connection);
        }
        env_profiles::discover_env_profiles()
            .into_iter()
            .find(|c| c.name == name)
            .ok_or_else(|| CoreError::not_found(format!("no connection named {name}")))
    }

    /// Saved entries first, env profiles after; an env profile whose name
    /// collides with a saved connection is suppressed.
    pub fn list_connections_with_source(&self) -> Vec<(Connection, ConnectionSource)> {
        let mut listed: Vec<(Connection, ConnectionSource)> = self
            .config
            .list()
            .into_iter()
            .map(|c| (c, ConnectionSource::Saved))
            .collect();

        for profile in env_profiles::discover_env_profiles() {
            if listed.iter().any(|(c, _)| c.name == profile.name) {
                continue;
            }
            listed.push((profile, ConnectionSource::Env));
        }

        listed
    }

    fn connected_plugin(&self) -> Result<(Arc<dyn crate::Plugin>, PluginConfig)> {
        let connection = self.current_connection()?;
        let plugin = self.engine.plugin(connection.database_type)?;
        Ok((plugin, PluginConfig::new(connection.credentials())))
    }

    /// Schema list for a resolved connection, served from its cache when
    /// fresh. Stateless consumers (the MCP catalog tools) call these
    /// `_for` variants directly with whatever connection they resolved.
    pub fn schemas_for(&self, connection: &Connection) -> Result<Vec<String>> {
        let cache = self.cache_for(&connection.name);
        if let Some(cached) = cache.get_schemas() {
            return Ok(cached);
        }
        let plugin = self.engine.plugin(connection.database_type)?;
        let schemas = plugin.get_all_schemas(&PluginConfig::new(connection.credentials()))?;
        cache.set_schemas(schemas.clone());
        Ok(schemas)
    }

    pub fn storage_units_for(
        &self,
        connection: &Connection,
        schema: &str,
    ) -> Result<Vec<StorageUnit>> {
        let cache = self.cache_for(&connection.name);
        if let Some(cached) = cache.get_tables(schema) {
            return Ok(cached);
        }
        let plugin = self.engine.plugin(connection.database_type)?;
        let units =
            plugin.get_storage_units(&PluginConfig::new(connection.credentials()), schema)?;
        cache.set_tables(schema, units.clone());
        Ok(units)
    }

    pub fn columns_for(
        &self,
        connection: &Connection,
        schema: &str,
        unit: &str,
    ) -> Result<Vec<Column>> {
        let cache = self.cache_for(&connection.name);
        if let Some(cached) = cache.get_columns(schema, unit) {
            return Ok(cached);
        }
        let plugin = self.engine.plugin(connection.database_type)?;
        let columns =
            plugin.get_columns(&PluginConfig::new(connection.credentials()), schema, unit)?;
        cache.set_columns(schema, unit, columns.clone());
        Ok(columns)
    }

    /// Cached catalog reads for the current connection.
    pub fn schemas(&self) -> Result<Vec<String>> {
        let connection = self.current_connection()?;
        self.schemas_for(&connection)
    }

    pub fn storage_units(&self, schema: &str) -> Result<Vec<StorageUnit>> {
        let connection = self.current_connection()?;
        self.storage_units_for(&connection, schema)
    }

    pub fn columns(&self, schema: &str, unit: &str) -> Result<Vec<Column>> {
        let connection = self.current_connection()?;
        self.columns_for(&connection, schema, unit)
    }

    /// Context-bound raw execution against the current connection.
    pub async fn execute_query_with_context(&self, ctx: QueryContext, sql: &str) -> Result<Rows> {
        let (plugin, config) = self.connected_plugin()?;
        let sql = sql.to_string();
        run_with_context(ctx, move || plugin.raw_execute(&config, &sql)).await
    }

    /// Context-bound paginated row fetch against the current connection.
    pub async fn get_rows_with_context(
        &self,
        ctx: QueryContext,
        schema: &str,
        unit: &str,
        page_size: u32,
        page_offset: u64,
    ) -> Result<Rows> {
        let (plugin, config) = self.connected_plugin()?;
        let schema = schema.to_string();
        let unit = unit.to_string();
        run_with_context(ctx, move || {
            plugin.get_rows(&config, &schema, &unit, None, &[], page_size, page_offset)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DatabaseType;
    use crate::testing::FakePlugin;

    fn manager_with_fake(available: bool) -> (ConnectionManager, Arc<FakePlugin>) {
        let fake = Arc::new(FakePlugin::new(DatabaseType::Postgres).with_available(available));
        let mut engine = Engine::new();
        engine.register(fake.clone());
        let manager = ConnectionManager::new(Arc::new(engine), Arc::new(ConfigStore::in_memory()));
        (manager, fake)
    }

    fn connection(name: &str) -> Connection {
        Connection {
            name: name.to_string(),
            database_type: DatabaseType::Postgres,
            host: "localhost".to_string(),
            port: None,
            username: String::new(),
            password: String::new(),
            database: "db".to_string(),
            schema: None,
            advanced: Default::default(),
            is_profile: false,
        }
    }

    #[test]
    fn connect_then_disconnect_walks_the_state_machine() {
        let (manager, _) = manager_with_fake(true);
        assert!(!manager.is_connected());

        manager.connect(connection("c1")).unwrap();
        assert!(manager.is_connected());
        assert_eq!(manager.current_connection().unwrap().name, "c1");

        manager.disconnect();
        assert!(!manager.is_connected());
        assert!(matches!(
            manager.current_connection().unwrap_err(),
            CoreError::NotConnected
        ));
    }

    #[test]
    fn unreachable_server_yields_generic_error() {
        let (manager, _) = manager_with_fake(false);
        let err = manager.connect(connection("c1")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot connect to database, check credentials"
        );
        assert!(!manager.is_connected());
    }

    #[test]
    fn query_methods_require_connected_state() {
        let (manager, _) = manager_with_fake(true);
        assert!(matches!(
            manager.schemas().unwrap_err(),
            CoreError::NotConnected
        ));
    }

    #[test]
    fn catalog_reads_hit_the_cache_on_repeat() {
        let (manager, fake) = manager_with_fake(true);
        manager.connect(connection("c1")).unwrap();

        manager.schemas().unwrap();
        manager.schemas().unwrap();
        assert_eq!(fake.schema_calls(), 1);

        manager.invalidate_cache();
        manager.schemas().unwrap();
        assert_eq!(fake.schema_calls(), 2);
    }

    #[test]
    fn keyed_catalog_reads_cache_without_a_current_connection() {
        let (manager, fake) = manager_with_fake(true);

        // Stateless consumers pass a resolved connection; no Connected
        // state is required and each name gets its own cache.
        let first = connection("a");
        manager.schemas_for(&first).unwrap();
        manager.schemas_for(&first).unwrap();
        assert_eq!(fake.schema_calls(), 1);

        let second = connection("b");
        manager.schemas_for(&second).unwrap();
        assert_eq!(fake.schema_calls(), 2);

        manager.invalidate_cache();
        manager.schemas_for(&first).unwrap();
        assert_eq!(fake.schema_calls(), 3);
    }

    #[test]
    fn disconnect_clears_the_cache() {
        let (manager, fake) = manager_with_fake(true);
        manager.connect(connection("c1")).unwrap();
        manager.schemas().unwrap();

        manager.disconnect();
        manager.connect(connection("c1")).unwrap();
        manager.schemas().unwrap();
        assert_eq!(fake.schema_calls(), 2);
    }

    #[tokio::test]
    async fn cancellation_returns_promptly_while_driver_runs_on() {
        let (manager, fake) = manager_with_fake(true);
        manager.connect(connection("c1")).unwrap();
        fake.set_delay(Duration::from_secs(5));

        let ctx = QueryContext::default();
        let cancel = ctx.cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel.cancel();
        });

        let started = std::time::Instant::now();
        let err = manager
            .execute_query_with_context(ctx, "SELECT pg_sleep(10)")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn deadline_maps_to_timeout() {
        let (manager, fake) = manager_with_fake(true);
        fake.set_delay(Duration::from_millis(200));
        manager.connect(connection("c1")).unwrap();

        let err = manager
            .execute_query_with_context(
                QueryContext::with_timeout(Duration::from_millis(20)),
                "SELECT 1",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Timeout));
    }
}
