use crate::{AdvancedOptions, CoreError, Credentials, DatabaseType, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Where a connection record came from. Saved entries are mutable through
/// the config store; env-profile entries are read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionSource {
    Saved,
    Env,
}

/// A named connection record, the unit of configuration callers resolve by
/// name and hand to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub name: String,
    pub database_type: DatabaseType,
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub database: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default)]
    pub advanced: AdvancedOptions,
    #[serde(default)]
    pub is_profile: bool,
}

impl Connection {
    /// Lowers the record into plugin credentials. The port is folded into
    /// the advanced bag, which is the sole channel for dialect knobs.
    pub fn credentials(&self) -> Credentials {
        let mut advanced = self.advanced.clone();
        if let Some(port) = self.port {
            advanced.upsert("Port", port.to_string());
        }
        Credentials {
            database_type: self.database_type,
            hostname: self.host.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
            is_profile: self.is_profile,
            advanced,
        }
    }
}

/// JSON-file-backed store of saved connections.
///
/// The on-disk layout is a plain serde derive of `Vec<Connection>`; the
/// format is deliberately unspecified beyond that. Name uniqueness is
/// enforced on add.
pub struct ConfigStore {
    path: Option<PathBuf>,
    connections: RwLock<Vec<Connection>>,
}

impl ConfigStore {
    /// In-memory store with no backing file.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            connections: RwLock::new(Vec::new()),
        }
    }

    /// Loads the store from a JSON file. A missing file is an empty store;
    /// unreadable content is an error so a typo never silently hides saved
    /// connections.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let connections = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(|e| {
                log::error!("[CONFIG] failed to read {}: {e}", path.display());
                CoreError::internal("failed to read connection config")
            })?;
            serde_json::from_str(&raw).map_err(|e| {
                log::error!("[CONFIG] failed to parse {}: {e}", path.display());
                CoreError::internal("failed to parse connection config")
            })?
        } else {
            Vec::new()
        };

        Ok(Self {
            path: Some(path),
            connections: RwLock::new(connections),
        })
    }

    pub fn list(&self) -> Vec<Connection> {
        self.connections
            .read()
            .expect("config store poisoned")
            .clone()
    }

    pub fn find(&self, name: &str) -> Option<Connection> {
        self.connections
            .read()
            .expect("config store poisoned")
            .iter()
            .find(|c| c.name == name)
            .cloned()
    }

    pub fn add(&self, connection: Connection) -> Result<()> {
        {
            let mut connections = self.connections.write().expect("config store poisoned");
            if connections.iter().any(|c| c.name == connection.name) {
                return Err(CoreError::conflict(format!(
                    "a connection named {} already exists",
                    connection.name
                )));
            }
            connections.push(connection);
        }
        self.persist()
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        {
            let mut connections = self.connections.write().expect("config store poisoned");
            let before = connections.len();
            connections.retain(|c| c.name != name);
            if connections.len() == before {
                return Err(CoreError::not_found(format!("no connection named {name}")));
            }
        }
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let connections = self.connections.read().expect("config store poisoned");
        let raw = serde_json::to_string_pretty(&*connections)
            .map_err(|e| CoreError::internal(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, raw).map_err(|e| {
            log::error!("[CONFIG] failed to write {}: {e}", path.display());
            CoreError::internal("failed to write connection config")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(name: &str) -> Connection {
        Connection {
            name: name.to_string(),
            database_type: DatabaseType::Postgres,
            host: "localhost".to_string(),
            port: Some(5432),
            username: "postgres".to_string(),
            password: String::new(),
            database: "postgres".to_string(),
            schema: None,
            advanced: AdvancedOptions::new(),
            is_profile: false,
        }
    }

    #[test]
    fn add_enforces_name_uniqueness() {
        let store = ConfigStore::in_memory();
        store.add(conn("prod")).unwrap();
        assert!(matches!(
            store.add(conn("prod")).unwrap_err(),
            CoreError::Conflict(_)
        ));
    }

    #[test]
    fn remove_unknown_is_not_found() {
        let store = ConfigStore::in_memory();
        assert!(matches!(
            store.remove("ghost").unwrap_err(),
            CoreError::NotFound(_)
        ));
    }

    #[test]
    fn credentials_fold_port_into_advanced() {
        let creds = conn("prod").credentials();
        assert_eq!(creds.advanced.get("Port"), Some("5432"));
        assert_eq!(creds.port().unwrap(), Some(5432));
    }

    #[test]
    fn store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("connections.json");

        let store = ConfigStore::load(&path).unwrap();
        store.add(conn("prod")).unwrap();
        drop(store);

        let reloaded = ConfigStore::load(&path).unwrap();
        assert!(reloaded.find("prod").is_some());
    }
}
