use crate::{CoreError, DatabaseType, Result};
use serde::{Deserialize, Serialize};

/// One key/value pair in the advanced-options bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub key: String,
    pub value: String,
}

impl Record {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Ordered key/value bag carrying dialect-specific connection knobs
/// (Port, SSL Mode, certificates, engine settings).
///
/// Order is preserved and duplicate keys are rejected: the bag is the sole
/// channel for dialect knobs, so a duplicate would make the effective value
/// ambiguous.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdvancedOptions(Vec<Record>);

impl AdvancedOptions {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let record = Record::new(key, value);
        if self.0.iter().any(|r| r.key == record.key) {
            return Err(CoreError::bad_request(format!(
                "duplicate advanced option: {}",
                record.key
            )));
        }
        self.0.push(record);
        Ok(())
    }

    /// Replaces an existing value or appends a new record.
    pub fn upsert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let record = Record::new(key, value);
        match self.0.iter_mut().find(|r| r.key == record.key) {
            Some(existing) => existing.value = record.value,
            None => self.0.push(record),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|r| r.key == key)
            .map(|r| r.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses the `Port` option, falling back to the engine default.
    pub fn port(&self, database_type: DatabaseType) -> Result<Option<u16>> {
        match self.get("Port") {
            Some(raw) => raw
                .parse::<u16>()
                .map(Some)
                .map_err(|_| CoreError::bad_request(format!("invalid port: {raw}"))),
            None => Ok(database_type.default_port()),
        }
    }
}

impl FromIterator<Record> for AdvancedOptions {
    fn from_iter<T: IntoIterator<Item = Record>>(iter: T) -> Self {
        let mut bag = AdvancedOptions::new();
        for record in iter {
            bag.upsert(record.key, record.value);
        }
        bag
    }
}

/// Connection credentials handed to a plugin.
///
/// `is_profile` marks credentials sourced from an environment profile;
/// only those may load certificates from filesystem paths. Everything
/// dialect-specific travels in `advanced`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub database_type: DatabaseType,
    pub hostname: String,
    pub username: String,
    pub password: String,
    pub database: String,
    #[serde(default)]
    pub is_profile: bool,
    #[serde(default)]
    pub advanced: AdvancedOptions,
}

impl Credentials {
    pub fn port(&self) -> Result<Option<u16>> {
        self.advanced.port(self.database_type)
    }
}

/// AI provider reference carried alongside credentials for chat-capable
/// plugins. Opaque to the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalModel {
    pub provider_type: String,
    pub token: String,
    pub model_name: String,
}

/// Read-only bundle passed to every capability method.
#[derive(Debug, Clone)]
pub struct PluginConfig {
    pub credentials: Credentials,
    pub external_model: Option<ExternalModel>,
}

impl PluginConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            external_model: None,
        }
    }

    pub fn with_external_model(mut self, model: ExternalModel) -> Self {
        self.external_model = Some(model);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_rejects_duplicate_keys() {
        let mut bag = AdvancedOptions::new();
        bag.set("Port", "5432").unwrap();
        assert!(bag.set("Port", "5433").is_err());
        assert_eq!(bag.get("Port"), Some("5432"));
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut bag = AdvancedOptions::new();
        bag.set("SSL Mode", "required").unwrap();
        bag.upsert("SSL Mode", "verify-ca");
        assert_eq!(bag.get("SSL Mode"), Some("verify-ca"));
        assert_eq!(bag.iter().count(), 1);
    }

    #[test]
    fn port_falls_back_to_engine_default() {
        let bag = AdvancedOptions::new();
        assert_eq!(bag.port(DatabaseType::Postgres).unwrap(), Some(5432));
        assert_eq!(bag.port(DatabaseType::Sqlite).unwrap(), None);
    }

    #[test]
    fn port_rejects_garbage() {
        let mut bag = AdvancedOptions::new();
        bag.set("Port", "not-a-port").unwrap();
        assert!(bag.port(DatabaseType::Postgres).is_err());
    }
}
