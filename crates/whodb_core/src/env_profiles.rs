use crate::{AdvancedOptions, Connection, DatabaseType};
use serde::Deserialize;

/// One credential profile as it appears in a `WHODB_<TYPE>` environment
/// variable. All fields are optional; unset fields keep their zero values
/// in the resulting `Connection`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvProfile {
    #[serde(default)]
    alias: Option<String>,
    #[serde(default)]
    custom_id: Option<String>,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    port: Option<serde_json::Value>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    database: Option<String>,
    #[serde(default)]
    config: Option<serde_json::Map<String, serde_json::Value>>,
}

impl EnvProfile {
    fn into_connection(self, database_type: DatabaseType, seq: usize) -> Connection {
        let name = self
            .alias
            .or(self.custom_id)
            .unwrap_or_else(|| format!("{}-{}", database_type.env_key().to_lowercase(), seq));

        // Ports may arrive as JSON numbers or strings; anything else is
        // dropped rather than failing the whole profile.
        let port = self.port.and_then(|v| match v {
            serde_json::Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        });

        let mut advanced = AdvancedOptions::new();
        if let Some(config) = self.config {
            for (key, value) in config {
                let rendered = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                advanced.upsert(key, rendered);
            }
        }

        Connection {
            name,
            database_type,
            host: self.host.unwrap_or_default(),
            port,
            username: self.user.unwrap_or_default(),
            password: self.password.unwrap_or_default(),
            database: self.database.unwrap_or_default(),
            schema: None,
            advanced,
            is_profile: true,
        }
    }
}

/// Discovers credential profiles from the environment.
///
/// For each database type: `WHODB_<TYPE>` holds a JSON array of profile
/// objects, and `WHODB_<TYPE>_<N>` (N = 1.. until the first gap) hold
/// single objects. Malformed JSON is logged and skipped; discovery never
/// fails.
pub fn discover_env_profiles() -> Vec<Connection> {
    discover_with(|key| std::env::var(key).ok())
}

/// Testable core of `discover_env_profiles`: the lookup function supplies
/// environment values.
pub fn discover_with(lookup: impl Fn(&str) -> Option<String>) -> Vec<Connection> {
    let mut connections = Vec::new();

    for database_type in DatabaseType::ALL {
        let mut seq = 1usize;

        let array_key = format!("WHODB_{}", database_type.env_key());
        if let Some(raw) = lookup(&array_key) {
            match serde_json::from_str::<Vec<EnvProfile>>(&raw) {
                Ok(profiles) => {
                    for profile in profiles {
                        connections.push(profile.into_connection(database_type, seq));
                        seq += 1;
                    }
                }
                Err(e) => log::warn!("[ENV] skipping {array_key}: {e}"),
            }
        }

        for n in 1.. {
            let key = format!("WHODB_{}_{n}", database_type.env_key());
            let Some(raw) = lookup(&key) else {
                break;
            };
            match serde_json::from_str::<EnvProfile>(&raw) {
                Ok(profile) => {
                    connections.push(profile.into_connection(database_type, seq));
                    seq += 1;
                }
                Err(e) => log::warn!("[ENV] skipping {key}: {e}"),
            }
        }
    }

    connections
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn array_form_yields_one_connection_per_object() {
        let lookup = lookup_from(&[(
            "WHODB_POSTGRES",
            r#"[{"alias":"prod","host":"db1","port":5432,"user":"app"},
                {"host":"db2","port":"5433"}]"#,
        )]);
        let connections = discover_with(lookup);

        assert_eq!(connections.len(), 2);
        assert_eq!(connections[0].name, "prod");
        assert_eq!(connections[0].port, Some(5432));
        assert!(connections[0].is_profile);
        // Unnamed profiles fall back to <type>-<seq>.
        assert_eq!(connections[1].name, "postgres-2");
        assert_eq!(connections[1].port, Some(5433));
    }

    #[test]
    fn numbered_form_stops_at_first_gap() {
        let lookup = lookup_from(&[
            ("WHODB_REDIS_1", r#"{"host":"cache1"}"#),
            ("WHODB_REDIS_2", r#"{"host":"cache2"}"#),
            ("WHODB_REDIS_4", r#"{"host":"cache4"}"#),
        ]);
        let connections = discover_with(lookup);
        assert_eq!(connections.len(), 2);
        assert_eq!(connections[1].host, "cache2");
    }

    #[test]
    fn custom_id_names_when_alias_absent() {
        let lookup = lookup_from(&[("WHODB_MYSQL_1", r#"{"customId":"legacy","host":"m"}"#)]);
        let connections = discover_with(lookup);
        assert_eq!(connections[0].name, "legacy");
    }

    #[test]
    fn config_keys_flow_into_advanced() {
        let lookup = lookup_from(&[(
            "WHODB_POSTGRES_1",
            r#"{"host":"db","config":{"SSL Mode":"require","Debug":true}}"#,
        )]);
        let connections = discover_with(lookup);
        assert_eq!(connections[0].advanced.get("SSL Mode"), Some("require"));
        assert_eq!(connections[0].advanced.get("Debug"), Some("true"));
    }

    #[test]
    fn malformed_json_is_skipped() {
        let lookup = lookup_from(&[
            ("WHODB_POSTGRES", "{not json"),
            ("WHODB_REDIS_1", r#"{"host":"ok"}"#),
        ]);
        let connections = discover_with(lookup);
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].host, "ok");
    }
}
