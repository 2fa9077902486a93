use serde::{Deserialize, Serialize};

/// Supported database engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseType {
    Postgres,
    MySql,
    MariaDb,
    Sqlite,
    ClickHouse,
    MongoDb,
    Redis,
    ElasticSearch,
}

impl DatabaseType {
    pub const ALL: [DatabaseType; 8] = [
        DatabaseType::Postgres,
        DatabaseType::MySql,
        DatabaseType::MariaDb,
        DatabaseType::Sqlite,
        DatabaseType::ClickHouse,
        DatabaseType::MongoDb,
        DatabaseType::Redis,
        DatabaseType::ElasticSearch,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            DatabaseType::Postgres => "Postgres",
            DatabaseType::MySql => "MySQL",
            DatabaseType::MariaDb => "MariaDB",
            DatabaseType::Sqlite => "Sqlite3",
            DatabaseType::ClickHouse => "ClickHouse",
            DatabaseType::MongoDb => "MongoDB",
            DatabaseType::Redis => "Redis",
            DatabaseType::ElasticSearch => "ElasticSearch",
        }
    }

    /// Key used in credential-profile environment variables
    /// (`WHODB_<KEY>` / `WHODB_<KEY>_<N>`).
    pub fn env_key(&self) -> &'static str {
        match self {
            DatabaseType::Postgres => "POSTGRES",
            DatabaseType::MySql => "MYSQL",
            DatabaseType::MariaDb => "MARIADB",
            DatabaseType::Sqlite => "SQLITE",
            DatabaseType::ClickHouse => "CLICKHOUSE",
            DatabaseType::MongoDb => "MONGODB",
            DatabaseType::Redis => "REDIS",
            DatabaseType::ElasticSearch => "ELASTICSEARCH",
        }
    }

    /// Default schema to browse when the caller names none. Postgres has a
    /// conventional default; engines that treat databases as schemas fall
    /// back to the connection's database; schema-less engines have none.
    pub fn default_schema(&self, database: &str) -> String {
        match self {
            DatabaseType::Postgres => "public".to_string(),
            DatabaseType::MySql
            | DatabaseType::MariaDb
            | DatabaseType::ClickHouse
            | DatabaseType::MongoDb => database.to_string(),
            DatabaseType::Sqlite | DatabaseType::Redis | DatabaseType::ElasticSearch => {
                String::new()
            }
        }
    }

    /// Default server port, when the engine has one. Sqlite is file-based.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            DatabaseType::Postgres => Some(5432),
            DatabaseType::MySql | DatabaseType::MariaDb => Some(3306),
            DatabaseType::Sqlite => None,
            DatabaseType::ClickHouse => Some(8123),
            DatabaseType::MongoDb => Some(27017),
            DatabaseType::Redis => Some(6379),
            DatabaseType::ElasticSearch => Some(9200),
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for DatabaseType {
    type Err = crate::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        let kind = match lowered.as_str() {
            "postgres" | "postgresql" => DatabaseType::Postgres,
            "mysql" => DatabaseType::MySql,
            "mariadb" => DatabaseType::MariaDb,
            "sqlite" | "sqlite3" => DatabaseType::Sqlite,
            "clickhouse" => DatabaseType::ClickHouse,
            "mongodb" | "mongo" => DatabaseType::MongoDb,
            "redis" => DatabaseType::Redis,
            "elasticsearch" => DatabaseType::ElasticSearch,
            _ => {
                return Err(crate::CoreError::bad_request(format!(
                    "unknown database type: {s}"
                )));
            }
        };
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schema_follows_dialect_conventions() {
        assert_eq!(DatabaseType::Postgres.default_schema("app"), "public");
        assert_eq!(DatabaseType::MySql.default_schema("app"), "app");
        assert_eq!(DatabaseType::ClickHouse.default_schema("events"), "events");
        assert_eq!(DatabaseType::Redis.default_schema("0"), "");
    }

    #[test]
    fn from_str_accepts_display_and_lowercase_names() {
        for kind in DatabaseType::ALL {
            let parsed: DatabaseType = kind.display_name().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert_eq!(
            "postgresql".parse::<DatabaseType>().unwrap(),
            DatabaseType::Postgres
        );
    }
}
