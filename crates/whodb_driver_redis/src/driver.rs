use crate::metadata::METADATA;
use redis::{Commands, Connection};
use whodb_core::{
    Column, CoreError, DatabaseMetadata, DatabaseType, OrderBy, Plugin, PluginConfig, Record,
    Result, Rows, SslStatus, StorageUnit, WhereCondition, ssl,
};

/// Redis plugin. Schema-less: keys are the storage units, and `get_rows`
/// renders a key's contents in a shape that depends on its type.
pub struct RedisPlugin;

impl RedisPlugin {
    pub fn new() -> Self {
        Self
    }

    fn connect(&self, config: &PluginConfig) -> Result<Connection> {
        let credentials = &config.credentials;
        let port = credentials.port()?.unwrap_or(6379);
        let db_index: u32 = if credentials.database.is_empty() {
            0
        } else {
            credentials
                .database
                .parse()
                .map_err(|_| CoreError::bad_request("redis database must be an index"))?
        };

        let auth = if credentials.password.is_empty() {
            String::new()
        } else if credentials.username.is_empty() {
            format!(":{}@", urlencoding::encode(&credentials.password))
        } else {
            format!(
                "{}:{}@",
                urlencoding::encode(&credentials.username),
                urlencoding::encode(&credentials.password)
            )
        };

        let (scheme, fragment) = match ssl::parse_ssl_config(credentials)? {
            Some(ssl_config) if ssl_config.mode.uses_tls() => {
                if ssl_config.mode.verifies_chain() {
                    ("rediss", "")
                } else {
                    ("rediss", "#insecure")
                }
            }
            _ => ("redis", ""),
        };

        let url = format!(
            "{scheme}://{auth}{}:{port}/{db_index}{fragment}",
            credentials.hostname
        );

        log::debug!("[CONNECT] Redis at {}:{port}/{db_index}", credentials.hostname);
        let client = redis::Client::open(url).map_err(CoreError::connect_failed)?;
        client.get_connection().map_err(CoreError::connect_failed)
    }
}

impl Default for RedisPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for RedisPlugin {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Redis
    }

    fn metadata(&self) -> &DatabaseMetadata {
        &METADATA
    }

    fn is_available(&self, config: &PluginConfig) -> bool {
        match self.connect(config) {
            Ok(mut con) => redis::cmd("PING").query::<String>(&mut con).is_ok(),
            Err(_) => false,
        }
    }

    fn get_all_schemas(&self, _config: &PluginConfig) -> Result<Vec<String>> {
        Err(CoreError::unsupported("redis does not have schemas"))
    }

    fn get_storage_units(&self, config: &PluginConfig, _schema: &str) -> Result<Vec<StorageUnit>> {
        let mut con = self.connect(config)?;

        let mut keys: Vec<String> = Vec::new();
        {
            let iter = con
                .scan_match::<_, String>("*")
                .map_err(CoreError::query_failed)?;
            keys.extend(iter);
        }
        keys.sort();

        let mut units = Vec::with_capacity(keys.len());
        for key in keys {
            let key_type: String = redis::cmd("TYPE")
                .arg(&key)
                .query(&mut con)
                .map_err(CoreError::query_failed)?;
            let ttl: i64 = con.ttl(&key).map_err(CoreError::query_failed)?;
            let count = entry_count(&mut con, &key, &key_type);

            units.push(StorageUnit::new(
                key,
                vec![
                    Record::new("Type", key_type),
                    Record::new(
                        "TTL",
                        if ttl < 0 {
                            "persistent".to_string()
                        } else {
                            format!("{ttl}s")
                        },
                    ),
                    Record::new("Count", count.to_string()),
                ],
            ));
        }
        Ok(units)
    }

    fn get_columns(&self, config: &PluginConfig, _schema: &str, unit: &str) -> Result<Vec<Column>> {
        let mut con = self.connect(config)?;
        let key_type: String = redis::cmd("TYPE")
            .arg(unit)
            .query(&mut con)
            .map_err(CoreError::query_failed)?;
        Ok(columns_for(&key_type))
    }

    fn get_rows(
        &self,
        config: &PluginConfig,
        _schema: &str,
        unit: &str,
        _filter: Option<&WhereCondition>,
        _order_by: &[OrderBy],
        page_size: u32,
        page_offset: u64,
    ) -> Result<Rows> {
        let mut con = self.connect(config)?;
        let key_type: String = redis::cmd("TYPE")
            .arg(unit)
            .query(&mut con)
            .map_err(CoreError::query_failed)?;

        let start = page_offset as isize;
        let stop = start + page_size as isize - 1;

        let rows: Vec<Vec<String>> = match key_type.as_str() {
            "string" => {
                let value: String = con.get(unit).map_err(CoreError::query_failed)?;
                vec![vec![value]]
            }
            "hash" => {
                let entries: Vec<(String, String)> =
                    con.hgetall(unit).map_err(CoreError::query_failed)?;
                entries
                    .into_iter()
                    .skip(page_offset as usize)
                    .take(page_size as usize)
                    .map(|(field, value)| vec![field, value])
                    .collect()
            }
            "list" => {
                let values: Vec<String> = con
                    .lrange(unit, start, stop)
                    .map_err(CoreError::query_failed)?;
                values
                    .into_iter()
                    .enumerate()
                    .map(|(i, value)| vec![(page_offset + i as u64).to_string(), value])
                    .collect()
            }
            "set" => {
                let members: Vec<String> =
                    con.smembers(unit).map_err(CoreError::query_failed)?;
                members
                    .into_iter()
                    .skip(page_offset as usize)
                    .take(page_size as usize)
                    .map(|member| vec![member])
                    .collect()
            }
            "zset" => {
                let members: Vec<(String, f64)> = con
                    .zrange_withscores(unit, start, stop)
                    .map_err(CoreError::query_failed)?;
                members
                    .into_iter()
                    .map(|(member, score)| vec![member, score.to_string()])
                    .collect()
            }
            "none" => return Err(CoreError::not_found(format!("no key named {unit}"))),
            other => {
                return Err(CoreError::unsupported(format!(
                    "unsupported key type: {other}"
                )));
            }
        };

        Ok(Rows {
            columns: columns_for(&key_type),
            rows,
        })
    }

    fn raw_execute(&self, _config: &PluginConfig, _sql: &str) -> Result<Rows> {
        Err(CoreError::unsupported(
            "raw query execution is not supported for Redis",
        ))
    }

    /// Sets a string key or a hash field, depending on the target key's
    /// type.
    fn add_row(
        &self,
        config: &PluginConfig,
        _schema: &str,
        unit: &str,
        values: &[Record],
    ) -> Result<()> {
        self.write_values(config, unit, values)
    }

    fn update_row(
        &self,
        config: &PluginConfig,
        _schema: &str,
        unit: &str,
        values: &[Record],
    ) -> Result<()> {
        self.write_values(config, unit, values)
    }

    /// Deletes a hash field when the predicate names one, otherwise the
    /// whole key.
    fn delete_row(
        &self,
        config: &PluginConfig,
        _schema: &str,
        unit: &str,
        predicate: &[Record],
    ) -> Result<()> {
        let mut con = self.connect(config)?;

        if let Some(field) = predicate.iter().find(|r| r.key == "field") {
            let removed: i64 = con
                .hdel(unit, &field.value)
                .map_err(CoreError::query_failed)?;
            if removed == 0 {
                return Err(CoreError::not_found("no such hash field"));
            }
            return Ok(());
        }

        let removed: i64 = con.del(unit).map_err(CoreError::query_failed)?;
        if removed == 0 {
            return Err(CoreError::not_found(format!("no key named {unit}")));
        }
        Ok(())
    }

    fn get_ssl_status(&self, config: &PluginConfig) -> Result<SslStatus> {
        let mode = ssl::parse_ssl_config(&config.credentials)?
            .map(|c| c.mode)
            .unwrap_or(ssl::SslMode::Disabled);
        Ok(SslStatus {
            is_enabled: mode.uses_tls(),
            mode: mode.label().to_string(),
        })
    }

    fn form_table_name(&self, _schema: &str, unit: &str) -> String {
        unit.to_string()
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }
}

impl RedisPlugin {
    fn write_values(&self, config: &PluginConfig, unit: &str, values: &[Record]) -> Result<()> {
        let mut con = self.connect(config)?;
        let key_type: String = redis::cmd("TYPE")
            .arg(unit)
            .query(&mut con)
            .map_err(CoreError::query_failed)?;

        match key_type.as_str() {
            "hash" => {
                for record in values {
                    let _: () = con
                        .hset(unit, &record.key, &record.value)
                        .map_err(CoreError::query_failed)?;
                }
                Ok(())
            }
            "string" | "none" => {
                let value = values
                    .iter()
                    .find(|r| r.key == "value")
                    .or_else(|| values.first())
                    .ok_or_else(|| CoreError::bad_request("no value supplied"))?;
                let _: () = con
                    .set(unit, &value.value)
                    .map_err(CoreError::query_failed)?;
                Ok(())
            }
            other => Err(CoreError::unsupported(format!(
                "writes are not supported for {other} keys"
            ))),
        }
    }
}

fn columns_for(key_type: &str) -> Vec<Column> {
    match key_type {
        "hash" => vec![
            Column::new("field", "string"),
            Column::new("value", "string"),
        ],
        "list" => vec![
            Column::new("index", "string"),
            Column::new("value", "string"),
        ],
        "zset" => vec![
            Column::new("member", "string"),
            Column::new("score", "string"),
        ],
        "set" => vec![Column::new("member", "string")],
        _ => vec![Column::new("value", "string")],
    }
}

fn entry_count(con: &mut Connection, key: &str, key_type: &str) -> i64 {
    let result: redis::RedisResult<i64> = match key_type {
        "string" => redis::cmd("STRLEN").arg(key).query(con),
        "hash" => redis::cmd("HLEN").arg(key).query(con),
        "list" => redis::cmd("LLEN").arg(key).query(con),
        "set" => redis::cmd("SCARD").arg(key).query(con),
        "zset" => redis::cmd("ZCARD").arg(key).query(con),
        _ => Ok(1),
    };
    result.unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_shapes_follow_key_type() {
        assert_eq!(columns_for("hash").len(), 2);
        assert_eq!(columns_for("hash")[0].name, "field");
        assert_eq!(columns_for("set").len(), 1);
        assert_eq!(columns_for("string")[0].name, "value");
    }
}
