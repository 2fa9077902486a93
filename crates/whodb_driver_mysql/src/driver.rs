use crate::metadata::METADATA;
use mysql::consts::ColumnType;
use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder, Params, Row, SslOpts, Value as MySqlValue};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use whodb_core::sql::dialect::{MySqlDialect, SqlDialect};
use whodb_core::sql::{builder, format};
use whodb_core::{
    Column, ConstraintMap, CoreError, DatabaseMetadata, DatabaseType, GraphRelation, GraphUnit,
    OrderBy, Plugin, PluginConfig, Record, RelationType, Result, Rows, SslStatus, StorageUnit,
    TypeCategory, WhereCondition, ssl,
};

/// MySQL plugin, registered twice: once as MySQL and once as MariaDB. The
/// wire protocol and catalog are shared; only the reported kind differs.
pub struct MySqlPlugin {
    kind: DatabaseType,
}

impl MySqlPlugin {
    pub fn new(kind: DatabaseType) -> Self {
        debug_assert!(matches!(kind, DatabaseType::MySql | DatabaseType::MariaDb));
        Self { kind }
    }

    fn connect(&self, config: &PluginConfig) -> Result<Conn> {
        let credentials = &config.credentials;
        let port = credentials.port()?.unwrap_or(3306);

        let mut opts = OptsBuilder::new()
            .ip_or_hostname(Some(credentials.hostname.clone()))
            .tcp_port(port)
            .user(Some(credentials.username.clone()))
            .pass(Some(credentials.password.clone()));

        if !credentials.database.is_empty() {
            opts = opts.db_name(Some(credentials.database.clone()));
        }

        if let Some(ssl_config) = ssl::parse_ssl_config(credentials)? {
            opts = opts.ssl_opts(Some(build_ssl_opts(&ssl_config)?));
        }

        log::debug!(
            "[CONNECT] {} at {}:{}",
            self.kind,
            credentials.hostname,
            port
        );
        Conn::new(opts).map_err(CoreError::connect_failed)
    }
}

/// Maps the unified SSL config onto the connector options the `mysql`
/// crate accepts. The crate takes certificate paths, not inline PEM, so
/// CA material is profile-gated path configuration only.
fn build_ssl_opts(ssl_config: &ssl::SslConfig) -> Result<SslOpts> {
    let mut opts = SslOpts::default();

    match ssl_config.mode {
        ssl::SslMode::Required | ssl::SslMode::Insecure | ssl::SslMode::Preferred => {
            opts = opts
                .with_danger_accept_invalid_certs(true)
                .with_danger_skip_domain_validation(true);
        }
        ssl::SslMode::VerifyCa => {
            opts = opts.with_danger_skip_domain_validation(true);
        }
        ssl::SslMode::VerifyIdentity | ssl::SslMode::Enabled => {}
        ssl::SslMode::Disabled => {
            return Err(CoreError::bad_request(
                "cannot build SSL options for the disabled mode",
            ));
        }
    }

    if let Some(ca) = &ssl_config.ca_cert {
        match &ca.path {
            Some(path) => {
                opts = opts.with_root_cert_path(Some(PathBuf::from(path)));
            }
            None => {
                return Err(CoreError::bad_request(
                    "MySQL connections take a CA certificate path, not inline content",
                ));
            }
        }
    }

    Ok(opts)
}

impl Plugin for MySqlPlugin {
    fn database_type(&self) -> DatabaseType {
        self.kind
    }

    fn metadata(&self) -> &DatabaseMetadata {
        &METADATA
    }

    fn is_available(&self, config: &PluginConfig) -> bool {
        match self.connect(config) {
            Ok(mut conn) => conn.query_drop("SELECT 1").is_ok(),
            Err(_) => false,
        }
    }

    fn get_all_schemas(&self, config: &PluginConfig) -> Result<Vec<String>> {
        let mut conn = self.connect(config)?;
        let schemas: Vec<String> = conn
            .query(
                r"SELECT SCHEMA_NAME FROM information_schema.SCHEMATA
                  WHERE SCHEMA_NAME NOT IN ('information_schema', 'mysql', 'performance_schema', 'sys')
                  ORDER BY SCHEMA_NAME",
            )
            .map_err(CoreError::query_failed)?;
        Ok(schemas)
    }

    fn get_storage_units(&self, config: &PluginConfig, schema: &str) -> Result<Vec<StorageUnit>> {
        let mut conn = self.connect(config)?;
        let rows: Vec<Row> = conn
            .exec(
                r"SELECT TABLE_NAME, TABLE_TYPE, IFNULL(ENGINE, ''),
                         IFNULL(TABLE_ROWS, 0), IFNULL(DATA_LENGTH + INDEX_LENGTH, 0)
                  FROM information_schema.TABLES
                  WHERE TABLE_SCHEMA = ?
                  ORDER BY TABLE_NAME",
                (schema,),
            )
            .map_err(CoreError::query_failed)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let name: String = row.get(0).unwrap_or_default();
                let table_type: String = row.get(1).unwrap_or_default();
                let engine: String = row.get(2).unwrap_or_default();
                let count: u64 = row.get(3).unwrap_or(0);
                let size: u64 = row.get(4).unwrap_or(0);
                StorageUnit::new(
                    name,
                    vec![
                        Record::new("Type", table_type),
                        Record::new("Engine", engine),
                        Record::new("Count", count.to_string()),
                        Record::new("Total Size", format!("{size} B")),
                    ],
                )
            })
            .collect())
    }

    fn get_columns(&self, config: &PluginConfig, schema: &str, unit: &str) -> Result<Vec<Column>> {
        let mut conn = self.connect(config)?;
        fetch_columns(&mut conn, schema, unit)
    }

    fn get_column_constraints(
        &self,
        config: &PluginConfig,
        schema: &str,
        unit: &str,
    ) -> Result<ConstraintMap> {
        let mut conn = self.connect(config)?;
        let rows: Vec<Row> = conn
            .exec(
                r"SELECT COLUMN_NAME, IS_NULLABLE, COLUMN_DEFAULT, COLUMN_TYPE,
                         CHARACTER_MAXIMUM_LENGTH, NUMERIC_PRECISION, NUMERIC_SCALE
                  FROM information_schema.COLUMNS
                  WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
                  ORDER BY ORDINAL_POSITION",
                (schema, unit),
            )
            .map_err(CoreError::query_failed)?;

        let mut constraints = ConstraintMap::new();
        for row in rows {
            let name: String = row.get(0).unwrap_or_default();
            let nullable: String = row.get(1).unwrap_or_default();
            let default: Option<String> = row.get(2).unwrap_or(None);
            let column_type: String = row.get(3).unwrap_or_default();
            let length: Option<u64> = row.get(4).unwrap_or(None);
            let precision: Option<u64> = row.get(5).unwrap_or(None);
            let scale: Option<u64> = row.get(6).unwrap_or(None);

            let mut facts = BTreeMap::new();
            facts.insert(
                "nullable".to_string(),
                serde_json::Value::Bool(nullable == "YES"),
            );
            if let Some(default) = default {
                facts.insert("default".to_string(), serde_json::Value::String(default));
            }
            if let Some(length) = length {
                facts.insert("length".to_string(), serde_json::Value::from(length));
            }
            if let Some(precision) = precision {
                facts.insert("precision".to_string(), serde_json::Value::from(precision));
            }
            if let Some(scale) = scale {
                facts.insert("scale".to_string(), serde_json::Value::from(scale));
            }
            if let Some(values) = parse_enum_values(&column_type) {
                facts.insert(
                    "check_values".to_string(),
                    serde_json::Value::Array(
                        values.into_iter().map(serde_json::Value::String).collect(),
                    ),
                );
            }
            constraints.insert(name, facts);
        }

        Ok(constraints)
    }

    fn get_rows(
        &self,
        config: &PluginConfig,
        schema: &str,
        unit: &str,
        filter: Option<&WhereCondition>,
        order_by: &[OrderBy],
        page_size: u32,
        page_offset: u64,
    ) -> Result<Rows> {
        let mut conn = self.connect(config)?;
        let columns = fetch_columns(&mut conn, schema, unit)?;
        if columns.is_empty() {
            return Err(CoreError::not_found(format!("no storage unit {unit}")));
        }

        let dialect = MySqlDialect;
        let table = dialect.qualified_table(schema, unit);
        let statement = builder::build_select(
            &dialect,
            &table,
            &[],
            filter,
            &METADATA.operators,
            order_by,
            page_size,
            page_offset,
        )?;

        let mut params = Vec::new();
        if let Some(condition) = filter {
            let types: HashMap<&str, &str> = columns
                .iter()
                .map(|c| (c.name.as_str(), c.column_type.as_str()))
                .collect();
            for (column, value) in condition.atoms() {
                let declared = types.get(column).copied().unwrap_or("TEXT");
                params.push(bind_param(declared, value)?);
            }
        }

        let fetched: Vec<Row> = conn
            .exec(&statement.sql, Params::Positional(params))
            .map_err(CoreError::query_failed)?;

        let rows = fetched.iter().map(render_row).collect();
        Ok(Rows { columns, rows })
    }

    fn raw_execute(&self, config: &PluginConfig, sql: &str) -> Result<Rows> {
        let mut conn = self.connect(config)?;
        let fetched: Vec<Row> = conn.query(sql).map_err(CoreError::query_failed)?;

        let Some(first) = fetched.first() else {
            return Ok(Rows::empty());
        };

        let columns: Vec<Column> = first
            .columns_ref()
            .iter()
            .map(|c| Column::new(c.name_str().to_string(), column_type_name(c.column_type())))
            .collect();
        let rows = fetched.iter().map(render_row).collect();
        Ok(Rows { columns, rows })
    }

    fn raw_execute_with_params(
        &self,
        config: &PluginConfig,
        sql: &str,
        params: &[String],
    ) -> Result<Rows> {
        let mut conn = self.connect(config)?;
        let bound: Vec<MySqlValue> = params
            .iter()
            .map(|p| MySqlValue::Bytes(p.as_bytes().to_vec()))
            .collect();
        let fetched: Vec<Row> = conn
            .exec(sql, Params::Positional(bound))
            .map_err(CoreError::query_failed)?;

        let Some(first) = fetched.first() else {
            return Ok(Rows::empty());
        };

        let columns: Vec<Column> = first
            .columns_ref()
            .iter()
            .map(|c| Column::new(c.name_str().to_string(), column_type_name(c.column_type())))
            .collect();
        let rows = fetched.iter().map(render_row).collect();
        Ok(Rows { columns, rows })
    }

    fn add_storage_unit(
        &self,
        config: &PluginConfig,
        schema: &str,
        unit: &str,
        fields: &[Record],
    ) -> Result<()> {
        let dialect = MySqlDialect;
        let table = dialect.qualified_table(schema, unit);
        let sql = builder::build_create_table(&dialect, &table, fields)?;

        let mut conn = self.connect(config)?;
        conn.query_drop(&sql).map_err(CoreError::query_failed)
    }

    fn add_row(
        &self,
        config: &PluginConfig,
        schema: &str,
        unit: &str,
        values: &[Record],
    ) -> Result<()> {
        let mut conn = self.connect(config)?;
        let columns = fetch_columns(&mut conn, schema, unit)?;

        let dialect = MySqlDialect;
        let table = dialect.qualified_table(schema, unit);
        let statement = builder::build_insert(&dialect, &table, values)?;
        let params = bind_records(&columns, values)?;

        conn.exec_drop(&statement.sql, Params::Positional(params))
            .map_err(CoreError::query_failed)
    }

    fn update_row(
        &self,
        config: &PluginConfig,
        schema: &str,
        unit: &str,
        values: &[Record],
    ) -> Result<()> {
        let mut conn = self.connect(config)?;
        let columns = fetch_columns(&mut conn, schema, unit)?;
        let pk_columns: Vec<String> = columns
            .iter()
            .filter(|c| c.is_primary)
            .map(|c| c.name.clone())
            .collect();

        let dialect = MySqlDialect;
        let table = dialect.qualified_table(schema, unit);
        let statement = builder::build_update(&dialect, &table, values, &pk_columns)?;

        let (keys, sets): (Vec<&Record>, Vec<&Record>) =
            values.iter().partition(|r| pk_columns.contains(&r.key));
        let ordered: Vec<Record> = sets.into_iter().chain(keys).cloned().collect();
        let params = bind_records(&columns, &ordered)?;

        conn.exec_drop(&statement.sql, Params::Positional(params))
            .map_err(CoreError::query_failed)?;

        if conn.affected_rows() == 0 {
            return Err(CoreError::not_found("no row matched the primary key"));
        }
        Ok(())
    }

    fn delete_row(
        &self,
        config: &PluginConfig,
        schema: &str,
        unit: &str,
        predicate: &[Record],
    ) -> Result<()> {
        let mut conn = self.connect(config)?;
        let columns = fetch_columns(&mut conn, schema, unit)?;

        let dialect = MySqlDialect;
        let table = dialect.qualified_table(schema, unit);
        let statement = builder::build_delete(&dialect, &table, predicate, false)?;
        let params = bind_records(&columns, predicate)?;

        conn.exec_drop(&statement.sql, Params::Positional(params))
            .map_err(CoreError::query_failed)
    }

    fn get_graph(&self, config: &PluginConfig, schema: &str) -> Result<Vec<GraphUnit>> {
        let units = self.get_storage_units(config, schema)?;

        let mut conn = self.connect(config)?;
        let fk_rows: Vec<Row> = conn
            .exec(
                r"SELECT TABLE_NAME, REFERENCED_TABLE_NAME
                  FROM information_schema.KEY_COLUMN_USAGE
                  WHERE TABLE_SCHEMA = ? AND REFERENCED_TABLE_NAME IS NOT NULL",
                (schema,),
            )
            .map_err(CoreError::query_failed)?;

        let mut relations: HashMap<String, Vec<GraphRelation>> = HashMap::new();
        for row in fk_rows {
            let table: String = row.get(0).unwrap_or_default();
            let foreign_table: String = row.get(1).unwrap_or_default();
            relations.entry(table.clone()).or_default().push(GraphRelation {
                name: foreign_table.clone(),
                relation: RelationType::ManyToOne,
            });
            relations.entry(foreign_table).or_default().push(GraphRelation {
                name: table,
                relation: RelationType::OneToMany,
            });
        }

        Ok(units
            .into_iter()
            .map(|unit| {
                let relations = relations.remove(&unit.name).unwrap_or_default();
                GraphUnit { unit, relations }
            })
            .collect())
    }

    fn get_ssl_status(&self, config: &PluginConfig) -> Result<SslStatus> {
        let mut conn = self.connect(config)?;
        let rows: Vec<Row> = conn
            .query("SHOW STATUS LIKE 'Ssl_cipher'")
            .map_err(CoreError::query_failed)?;
        let cipher: String = rows
            .first()
            .and_then(|row| row.get(1))
            .unwrap_or_default();

        let mode = ssl::parse_ssl_config(&config.credentials)?
            .map(|c| c.mode.label().to_string())
            .unwrap_or_else(|| ssl::SslMode::Disabled.label().to_string());

        Ok(SslStatus {
            is_enabled: !cipher.is_empty(),
            mode,
        })
    }

    fn form_table_name(&self, schema: &str, unit: &str) -> String {
        MySqlDialect.qualified_table(schema, unit)
    }

    fn placeholder(&self, index: usize) -> String {
        MySqlDialect.placeholder(index)
    }
}

fn fetch_columns(conn: &mut Conn, schema: &str, unit: &str) -> Result<Vec<Column>> {
    let rows: Vec<Row> = conn
        .exec(
            r"SELECT COLUMN_NAME, DATA_TYPE, COLUMN_KEY = 'PRI'
              FROM information_schema.COLUMNS
              WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
              ORDER BY ORDINAL_POSITION",
            (schema, unit),
        )
        .map_err(CoreError::query_failed)?;

    let mut columns: Vec<Column> = rows
        .into_iter()
        .map(|row| {
            let name: String = row.get(0).unwrap_or_default();
            let data_type: String = row.get(1).unwrap_or_default();
            let is_primary: bool = row.get::<i64, _>(2).unwrap_or(0) != 0;
            let mut column = Column::new(name, METADATA.normalize_type(&data_type));
            column.is_primary = is_primary;
            column
        })
        .collect();

    let fk_rows: Vec<Row> = conn
        .exec(
            r"SELECT COLUMN_NAME, REFERENCED_TABLE_NAME, REFERENCED_COLUMN_NAME
              FROM information_schema.KEY_COLUMN_USAGE
              WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
                AND REFERENCED_TABLE_NAME IS NOT NULL",
            (schema, unit),
        )
        .map_err(CoreError::query_failed)?;

    for fk in fk_rows {
        let column_name: String = fk.get(0).unwrap_or_default();
        if let Some(column) = columns.iter_mut().find(|c| c.name == column_name) {
            column.is_foreign = true;
            column.referenced_table = fk.get(1).unwrap_or(None);
            column.referenced_column = fk.get(2).unwrap_or(None);
        }
    }

    Ok(columns)
}

/// Extracts the value list from an `enum('a','b')` or `set('a','b')`
/// COLUMN_TYPE string.
fn parse_enum_values(column_type: &str) -> Option<Vec<String>> {
    let lowered = column_type.to_ascii_lowercase();
    let prefix_len = if lowered.starts_with("enum(") {
        "enum(".len()
    } else if lowered.starts_with("set(") {
        "set(".len()
    } else {
        return None;
    };
    let body = column_type[prefix_len..].strip_suffix(')')?;

    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' if in_quote && chars.peek() == Some(&'\'') => {
                current.push('\'');
                chars.next();
            }
            '\'' => {
                if in_quote {
                    values.push(std::mem::take(&mut current));
                }
                in_quote = !in_quote;
            }
            _ if in_quote => current.push(c),
            _ => {}
        }
    }
    Some(values)
}

fn render_row(row: &Row) -> Vec<String> {
    (0..row.len())
        .map(|i| match row.as_ref(i) {
            Some(value) => render_value(value),
            None => String::new(),
        })
        .collect()
}

/// Renders a protocol value to its display string following the shared
/// conventions: NULL is empty, bytes that are not valid UTF-8 become
/// `0x`-hex, temporal values use the canonical formats.
fn render_value(value: &MySqlValue) -> String {
    match value {
        MySqlValue::NULL => String::new(),
        MySqlValue::Bytes(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(_) => format::format_bytes(bytes),
        },
        MySqlValue::Int(i) => i.to_string(),
        MySqlValue::UInt(u) => u.to_string(),
        MySqlValue::Float(f) => format::format_float(*f as f64),
        MySqlValue::Double(d) => format::format_float(*d),
        MySqlValue::Date(year, month, day, 0, 0, 0, 0) => {
            format!("{year:04}-{month:02}-{day:02}")
        }
        MySqlValue::Date(year, month, day, hour, minute, second, _) => {
            format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}")
        }
        MySqlValue::Time(negative, days, hours, minutes, seconds, _) => {
            let total_hours = u32::from(*hours) + days * 24;
            format!(
                "{}{total_hours:02}:{minutes:02}:{seconds:02}",
                if *negative { "-" } else { "" }
            )
        }
    }
}

/// Binds a raw string according to the declared column type. MySQL's
/// protocol is weakly typed, so everything non-numeric travels as bytes.
fn bind_param(declared: &str, raw: &str) -> Result<MySqlValue> {
    if raw.is_empty() {
        return Ok(MySqlValue::NULL);
    }
    match METADATA.category_of(declared) {
        TypeCategory::Numeric => {
            if let Ok(i) = raw.parse::<i64>() {
                return Ok(MySqlValue::Int(i));
            }
            if let Ok(d) = raw.parse::<f64>() {
                return Ok(MySqlValue::Double(d));
            }
            Err(CoreError::bad_request(format!(
                "invalid numeric value: {raw}"
            )))
        }
        TypeCategory::Boolean => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(MySqlValue::Int(1)),
            "false" | "0" => Ok(MySqlValue::Int(0)),
            other => Err(CoreError::bad_request(format!(
                "invalid boolean value: {other}"
            ))),
        },
        _ => Ok(MySqlValue::Bytes(raw.as_bytes().to_vec())),
    }
}

fn bind_records(columns: &[Column], records: &[Record]) -> Result<Vec<MySqlValue>> {
    let types: HashMap<&str, &str> = columns
        .iter()
        .map(|c| (c.name.as_str(), c.column_type.as_str()))
        .collect();
    records
        .iter()
        .map(|r| {
            let declared = types.get(r.key.as_str()).copied().unwrap_or("TEXT");
            bind_param(declared, &r.value)
        })
        .collect()
}

fn column_type_name(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::MYSQL_TYPE_TINY => "TINYINT",
        ColumnType::MYSQL_TYPE_SHORT => "SMALLINT",
        ColumnType::MYSQL_TYPE_INT24 => "MEDIUMINT",
        ColumnType::MYSQL_TYPE_LONG => "INT",
        ColumnType::MYSQL_TYPE_LONGLONG => "BIGINT",
        ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL => "DECIMAL",
        ColumnType::MYSQL_TYPE_FLOAT => "FLOAT",
        ColumnType::MYSQL_TYPE_DOUBLE => "DOUBLE",
        ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE => "DATE",
        ColumnType::MYSQL_TYPE_TIME | ColumnType::MYSQL_TYPE_TIME2 => "TIME",
        ColumnType::MYSQL_TYPE_DATETIME | ColumnType::MYSQL_TYPE_DATETIME2 => "DATETIME",
        ColumnType::MYSQL_TYPE_TIMESTAMP | ColumnType::MYSQL_TYPE_TIMESTAMP2 => "TIMESTAMP",
        ColumnType::MYSQL_TYPE_YEAR => "YEAR",
        ColumnType::MYSQL_TYPE_JSON => "JSON",
        ColumnType::MYSQL_TYPE_ENUM => "ENUM",
        ColumnType::MYSQL_TYPE_SET => "SET",
        ColumnType::MYSQL_TYPE_TINY_BLOB
        | ColumnType::MYSQL_TYPE_MEDIUM_BLOB
        | ColumnType::MYSQL_TYPE_LONG_BLOB
        | ColumnType::MYSQL_TYPE_BLOB => "BLOB",
        ColumnType::MYSQL_TYPE_VARCHAR | ColumnType::MYSQL_TYPE_VAR_STRING => "VARCHAR",
        ColumnType::MYSQL_TYPE_STRING => "CHAR",
        _ => "TEXT",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_values_parse_from_column_type() {
        assert_eq!(
            parse_enum_values("enum('small','medium','large')"),
            Some(vec![
                "small".to_string(),
                "medium".to_string(),
                "large".to_string()
            ])
        );
        assert_eq!(parse_enum_values("varchar(255)"), None);
    }

    #[test]
    fn enum_values_unescape_doubled_quotes() {
        assert_eq!(
            parse_enum_values("enum('it''s','plain')"),
            Some(vec!["it's".to_string(), "plain".to_string()])
        );
    }

    #[test]
    fn null_renders_empty_and_binary_renders_hex() {
        assert_eq!(render_value(&MySqlValue::NULL), "");
        assert_eq!(
            render_value(&MySqlValue::Bytes(vec![0xff, 0x00])),
            "0xff00"
        );
        assert_eq!(
            render_value(&MySqlValue::Bytes(b"hello".to_vec())),
            "hello"
        );
    }

    #[test]
    fn temporal_values_use_canonical_formats() {
        assert_eq!(
            render_value(&MySqlValue::Date(2024, 3, 9, 0, 0, 0, 0)),
            "2024-03-09"
        );
        assert_eq!(
            render_value(&MySqlValue::Date(2024, 3, 9, 14, 5, 6, 0)),
            "2024-03-09 14:05:06"
        );
    }

    #[test]
    fn numeric_binding_rejects_garbage() {
        assert!(bind_param("INT", "abc").is_err());
        assert!(matches!(
            bind_param("INT", "42").unwrap(),
            MySqlValue::Int(42)
        ));
        assert!(matches!(bind_param("TEXT", "").unwrap(), MySqlValue::NULL));
    }
}
