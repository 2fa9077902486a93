use crate::{CoreError, DatabaseType, Plugin, Result};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};

type EngineHook = fn(&mut Engine);

static POST_INIT_HOOKS: LazyLock<Mutex<Vec<EngineHook>>> = LazyLock::new(|| Mutex::new(Vec::new()));

/// Registers a hook run after built-in plugin registration. This is the
/// extension point editions use to add plugins without touching the core
/// boot path. Hooks registered after an engine is built only affect engines
/// built later.
pub fn register_engine_hook(hook: EngineHook) {
    POST_INIT_HOOKS
        .lock()
        .expect("engine hook registry poisoned")
        .push(hook);
}

/// Process-wide plugin map keyed by `DatabaseType`.
///
/// Populated once at boot and read-only afterwards; lookups clone the
/// `Arc`, so the engine can be shared freely across tasks.
#[derive(Default)]
pub struct Engine {
    plugins: HashMap<DatabaseType, Arc<dyn Plugin>>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every registered post-init hook against a fresh engine. The
    /// caller registers built-in plugins first, then calls this.
    pub fn run_post_init_hooks(&mut self) {
        let hooks = POST_INIT_HOOKS
            .lock()
            .expect("engine hook registry poisoned")
            .clone();
        for hook in hooks {
            hook(self);
        }
    }

    /// Registers a plugin, replacing any previous registration for the
    /// same database type.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.insert(plugin.database_type(), plugin);
    }

    /// Selects the plugin for a database type.
    ///
    /// The failure message is deliberately generic: remote callers must not
    /// be able to probe which engines this deployment supports.
    pub fn plugin(&self, database_type: DatabaseType) -> Result<Arc<dyn Plugin>> {
        self.plugins
            .get(&database_type)
            .cloned()
            .ok_or_else(|| CoreError::unsupported("database type is not supported"))
    }

    pub fn supports(&self, database_type: DatabaseType) -> bool {
        self.plugins.contains_key(&database_type)
    }

    pub fn registered_types(&self) -> Vec<DatabaseType> {
        DatabaseType::ALL
            .into_iter()
            .filter(|t| self.plugins.contains_key(t))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DatabaseType, &Arc<dyn Plugin>)> {
        self.plugins.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePlugin;

    #[test]
    fn plugin_lookup_is_generic_on_unknown_type() {
        let engine = Engine::new();
        let err = engine.plugin(DatabaseType::Postgres).unwrap_err();
        let message = err.to_string();
        assert!(!message.contains("Postgres"), "must not leak type: {message}");
    }

    #[test]
    fn registered_types_follow_declaration_order() {
        let mut engine = Engine::new();
        engine.register(Arc::new(FakePlugin::new(DatabaseType::Sqlite)));
        engine.register(Arc::new(FakePlugin::new(DatabaseType::Postgres)));
        assert_eq!(
            engine.registered_types(),
            vec![DatabaseType::Postgres, DatabaseType::Sqlite]
        );
    }
}
