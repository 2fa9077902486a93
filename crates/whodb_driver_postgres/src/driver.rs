use crate::metadata::METADATA;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use postgres::types::{ToSql, Type};
use postgres::{Client, NoTls, SimpleQueryMessage};
use postgres_native_tls::MakeTlsConnector;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use whodb_core::sql::dialect::{PostgresDialect, SqlDialect};
use whodb_core::sql::{builder, format};
use whodb_core::{
    Column, ConstraintMap, CoreError, DatabaseMetadata, DatabaseType, GraphRelation, GraphUnit,
    OrderBy, Plugin, PluginConfig, Record, RelationType, Result, Rows, SslStatus, StorageUnit,
    WhereCondition, ssl,
};

pub struct PostgresPlugin;

impl PostgresPlugin {
    pub fn new() -> Self {
        Self
    }

    fn connect(&self, config: &PluginConfig) -> Result<Client> {
        let credentials = &config.credentials;
        let port = credentials.port()?.unwrap_or(5432);

        let conn_string = format!(
            "host={} port={} user={} password={} dbname={} connect_timeout=30",
            credentials.hostname,
            port,
            credentials.username,
            credentials.password,
            credentials.database
        );

        log::debug!(
            "[CONNECT] Postgres at {}:{} (database: {})",
            credentials.hostname,
            port,
            credentials.database
        );

        match ssl::parse_ssl_config(credentials)? {
            None => Client::connect(&conn_string, NoTls).map_err(CoreError::connect_failed),
            Some(ssl_config) => {
                let connector = ssl::build_tls_connector(&ssl_config)?;
                let tls = MakeTlsConnector::new(connector);
                match Client::connect(&conn_string, tls) {
                    Ok(client) => Ok(client),
                    // Preferred falls back to plaintext when the server
                    // refuses TLS.
                    Err(_) if ssl_config.mode == ssl::SslMode::Preferred => {
                        Client::connect(&conn_string, NoTls).map_err(CoreError::connect_failed)
                    }
                    Err(e) => Err(CoreError::connect_failed(e)),
                }
            }
        }
    }
}

impl Default for PostgresPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for PostgresPlugin {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Postgres
    }

    fn metadata(&self) -> &DatabaseMetadata {
        &METADATA
    }

    fn is_available(&self, config: &PluginConfig) -> bool {
        match self.connect(config) {
            Ok(mut client) => client.simple_query("SELECT 1").is_ok(),
            Err(_) => false,
        }
    }

    fn get_all_schemas(&self, config: &PluginConfig) -> Result<Vec<String>> {
        let mut client = self.connect(config)?;
        let rows = client
            .query(
                r#"
                SELECT schema_name
                FROM information_schema.schemata
                WHERE schema_name NOT IN ('pg_catalog', 'information_schema', 'pg_toast')
                ORDER BY schema_name
                "#,
                &[],
            )
            .map_err(CoreError::query_failed)?;

        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    fn get_storage_units(&self, config: &PluginConfig, schema: &str) -> Result<Vec<StorageUnit>> {
        let mut client = self.connect(config)?;
        let rows = client
            .query(
                r#"
                SELECT
                    c.relname,
                    CASE c.relkind
                        WHEN 'r' THEN 'BASE TABLE'
                        WHEN 'v' THEN 'VIEW'
                        WHEN 'm' THEN 'MATERIALIZED VIEW'
                        ELSE 'OTHER'
                    END,
                    pg_size_pretty(pg_total_relation_size(c.oid)),
                    GREATEST(c.reltuples, 0)::bigint
                FROM pg_class c
                JOIN pg_namespace n ON n.oid = c.relnamespace
                WHERE n.nspname = $1 AND c.relkind IN ('r', 'v', 'm')
                ORDER BY c.relname
                "#,
                &[&schema],
            )
            .map_err(CoreError::query_failed)?;

        Ok(rows
            .iter()
            .map(|row| {
                let count: i64 = row.get(3);
                StorageUnit::new(
                    row.get::<_, String>(0),
                    vec![
                        Record::new("Type", row.get::<_, String>(1)),
                        Record::new("Total Size", row.get::<_, String>(2)),
                        Record::new("Count", count.to_string()),
                    ],
                )
            })
            .collect())
    }

    fn get_columns(&self, config: &PluginConfig, schema: &str, unit: &str) -> Result<Vec<Column>> {
        let mut client = self.connect(config)?;
        fetch_columns(&mut client, schema, unit)
    }

    fn get_column_constraints(
        &self,
        config: &PluginConfig,
        schema: &str,
        unit: &str,
    ) -> Result<ConstraintMap> {
        let mut client = self.connect(config)?;
        let rows = client
            .query(
                r#"
                SELECT
                    column_name,
                    is_nullable = 'YES',
                    column_default,
                    character_maximum_length,
                    numeric_precision,
                    numeric_scale
                FROM information_schema.columns
                WHERE table_schema = $1 AND table_name = $2
                ORDER BY ordinal_position
                "#,
                &[&schema, &unit],
            )
            .map_err(CoreError::query_failed)?;

        let mut constraints = ConstraintMap::new();
        for row in rows {
            let mut facts = BTreeMap::new();
            facts.insert(
                "nullable".to_string(),
                serde_json::Value::Bool(row.get(1)),
            );
            if let Some(default) = row.get::<_, Option<String>>(2) {
                facts.insert("default".to_string(), serde_json::Value::String(default));
            }
            if let Some(length) = row.get::<_, Option<i32>>(3) {
                facts.insert("length".to_string(), serde_json::Value::from(length));
            }
            if let Some(precision) = row.get::<_, Option<i32>>(4) {
                facts.insert("precision".to_string(), serde_json::Value::from(precision));
            }
            if let Some(scale) = row.get::<_, Option<i32>>(5) {
                facts.insert("scale".to_string(), serde_json::Value::from(scale));
            }
            constraints.insert(row.get(0), facts);
        }

        // Enum columns carry their value set as check_values.
        let enum_rows = client
            .query(
                r#"
                SELECT c.column_name, e.enumlabel
                FROM information_schema.columns c
                JOIN pg_type t ON t.typname = c.udt_name
                JOIN pg_enum e ON e.enumtypid = t.oid
                WHERE c.table_schema = $1 AND c.table_name = $2
                ORDER BY c.column_name, e.enumsortorder
                "#,
                &[&schema, &unit],
            )
            .map_err(CoreError::query_failed)?;

        let mut enum_values: BTreeMap<String, Vec<serde_json::Value>> = BTreeMap::new();
        for row in enum_rows {
            enum_values
                .entry(row.get(0))
                .or_default()
                .push(serde_json::Value::String(row.get(1)));
        }
        for (column, values) in enum_values {
            constraints
                .entry(column)
                .or_default()
                .insert("check_values".to_string(), serde_json::Value::Array(values));
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
        let mut client = self.connect(config)?;
        let columns = fetch_columns(&mut client, schema, unit)?;
        if columns.is_empty() {
            return Err(CoreError::not_found(format!("no storage unit {unit}")));
        }

        let dialect = PostgresDialect;
        let table = dialect.qualified_table(schema, unit);
        let select_list = columns
            .iter()
            .map(|c| select_expr(&dialect, c))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!("SELECT {select_list} FROM {table}");
        let mut params: Vec<Box<dyn ToSql + Sync>> = Vec::new();

        if let Some(condition) = filter {
            let compiled = condition.compile(&dialect, &METADATA.operators, 1)?;
            sql.push_str(" WHERE ");
            sql.push_str(&compiled.sql);

            let types: HashMap<&str, &str> = columns
                .iter()
                .map(|c| (c.name.as_str(), c.column_type.as_str()))
                .collect();
            for (column, value) in condition.atoms() {
                let declared = types.get(column).copied().unwrap_or("TEXT");
                params.push(bind_param(declared, value)?);
            }
        }

        if !order_by.is_empty() {
            let keys = order_by
                .iter()
                .map(|o| {
                    format!(
                        "{}{}",
                        dialect.quote_identifier(&o.column),
                        if o.descending { " DESC" } else { "" }
                    )
                })
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(" ORDER BY ");
            sql.push_str(&keys);
        }
        sql.push_str(&format!(" LIMIT {page_size} OFFSET {page_offset}"));

        let refs: Vec<&(dyn ToSql + Sync)> = params.iter().map(|p| p.as_ref()).collect();
        let fetched = client.query(&sql, &refs).map_err(CoreError::query_failed)?;

        let rows = fetched
            .iter()
            .map(|row| (0..columns.len()).map(|i| cell_to_string(row, i)).collect())
            .collect();

        Ok(Rows { columns, rows })
    }

    fn raw_execute(&self, config: &PluginConfig, sql: &str) -> Result<Rows> {
        let mut client = self.connect(config)?;
        let messages = client.simple_query(sql).map_err(CoreError::query_failed)?;

        let mut columns: Vec<Column> = Vec::new();
        let mut rows: Vec<Vec<String>> = Vec::new();

        for message in &messages {
            if let SimpleQueryMessage::Row(row) = message {
                if columns.is_empty() {
                    columns = row
                        .columns()
                        .iter()
                        .map(|c| Column::new(c.name(), "TEXT"))
                        .collect();
                }
                rows.push(
                    (0..row.len())
                        .map(|i| row.get(i).unwrap_or_default().to_string())
                        .collect(),
                );
            }
        }

        Ok(Rows { columns, rows })
    }

    fn raw_execute_with_params(
        &self,
        config: &PluginConfig,
        sql: &str,
        params: &[String],
    ) -> Result<Rows> {
        let mut client = self.connect(config)?;

        // The prepared statement tells us the declared parameter types, so
        // string inputs can be coerced before binding.
        let statement = client.prepare(sql).map_err(CoreError::query_failed)?;
        let mut bound: Vec<Box<dyn ToSql + Sync>> = Vec::with_capacity(params.len());
        for (raw, ty) in params.iter().zip(statement.params()) {
            bound.push(bind_param(ty.name(), raw)?);
        }
        if params.len() != statement.params().len() {
            return Err(CoreError::bad_request(format!(
                "statement expects {} parameters, got {}",
                statement.params().len(),
                params.len()
            )));
        }

        let refs: Vec<&(dyn ToSql + Sync)> = bound.iter().map(|p| p.as_ref()).collect();
        let fetched = client
            .query(&statement, &refs)
            .map_err(CoreError::query_failed)?;

        let Some(first) = fetched.first() else {
            return Ok(Rows::empty());
        };

        let columns: Vec<Column> = first
            .columns()
            .iter()
            .map(|c| Column::new(c.name(), METADATA.normalize_type(c.type_().name())))
            .collect();
        let rows = fetched
            .iter()
            .map(|row| (0..columns.len()).map(|i| cell_to_string(row, i)).collect())
            .collect();

        Ok(Rows { columns, rows })
    }

    fn add_storage_unit(
        &self,
        config: &PluginConfig,
        schema: &str,
        unit: &str,
        fields: &[Record],
    ) -> Result<()> {
        let dialect = PostgresDialect;
        let table = dialect.qualified_table(schema, unit);
        let sql = builder::build_create_table(&dialect, &table, fields)?;

        let mut client = self.connect(config)?;
        client
            .batch_execute(&sql)
            .map_err(CoreError::query_failed)?;
        Ok(())
    }

    fn add_row(
        &self,
        config: &PluginConfig,
        schema: &str,
        unit: &str,
        values: &[Record],
    ) -> Result<()> {
        let mut client = self.connect(config)?;
        let columns = fetch_columns(&mut client, schema, unit)?;

        let dialect = PostgresDialect;
        let table = dialect.qualified_table(schema, unit);
        let statement = builder::build_insert(&dialect, &table, values)?;
        let bound = bind_records(&columns, values)?;
        let refs: Vec<&(dyn ToSql + Sync)> = bound.iter().map(|p| p.as_ref()).collect();

        client
            .execute(&statement.sql, &refs)
            .map_err(CoreError::query_failed)?;
        Ok(())
    }

    fn update_row(
        &self,
        config: &PluginConfig,
        schema: &str,
        unit: &str,
        values: &[Record],
    ) -> Result<()> {
        let mut client = self.connect(config)?;
        let columns = fetch_columns(&mut client, schema, unit)?;
        let pk_columns: Vec<String> = columns
            .iter()
            .filter(|c| c.is_primary)
            .map(|c| c.name.clone())
            .collect();

        let dialect = PostgresDialect;
        let table = dialect.qualified_table(schema, unit);
        let statement = builder::build_update(&dialect, &table, values, &pk_columns)?;

        // build_update reorders values (SET list first, then predicate);
        // rebuild the record list in that order for binding.
        let ordered = reorder_for_update(values, &pk_columns);
        let bound = bind_records(&columns, &ordered)?;
        let refs: Vec<&(dyn ToSql + Sync)> = bound.iter().map(|p| p.as_ref()).collect();

        let affected = client
            .execute(&statement.sql, &refs)
            .map_err(CoreError::query_failed)?;
        if affected == 0 {
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
        let mut client = self.connect(config)?;
        let columns = fetch_columns(&mut client, schema, unit)?;

        let dialect = PostgresDialect;
        let table = dialect.qualified_table(schema, unit);
        let statement = builder::build_delete(&dialect, &table, predicate, false)?;
        let bound = bind_records(&columns, predicate)?;
        let refs: Vec<&(dyn ToSql + Sync)> = bound.iter().map(|p| p.as_ref()).collect();

        client
            .execute(&statement.sql, &refs)
            .map_err(CoreError::query_failed)?;
        Ok(())
    }

    fn get_graph(&self, config: &PluginConfig, schema: &str) -> Result<Vec<GraphUnit>> {
        let units = self.get_storage_units(config, schema)?;

        let mut client = self.connect(config)?;
        let fk_rows = client
            .query(
                r#"
                SELECT tc.table_name, ccu.table_name AS foreign_table
                FROM information_schema.table_constraints tc
                JOIN information_schema.constraint_column_usage ccu
                  ON ccu.constraint_name = tc.constraint_name
                 AND ccu.table_schema = tc.table_schema
                WHERE tc.constraint_type = 'FOREIGN KEY' AND tc.table_schema = $1
                "#,
                &[&schema],
            )
            .map_err(CoreError::query_failed)?;

        let mut relations: HashMap<String, Vec<GraphRelation>> = HashMap::new();
        for row in fk_rows {
            let table: String = row.get(0);
            let foreign_table: String = row.get(1);
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
        let mut client = self.connect(config)?;
        let row = client
            .query_one(
                "SELECT COALESCE(ssl, false) FROM pg_stat_ssl WHERE pid = pg_backend_pid()",
                &[],
            )
            .map_err(CoreError::query_failed)?;
        let is_enabled: bool = row.get(0);

        let mode = ssl::parse_ssl_config(&config.credentials)?
            .map(|c| c.mode.label().to_string())
            .unwrap_or_else(|| ssl::SslMode::Disabled.label().to_string());

        Ok(SslStatus { is_enabled, mode })
    }

    fn form_table_name(&self, schema: &str, unit: &str) -> String {
        PostgresDialect.qualified_table(schema, unit)
    }

    fn placeholder(&self, index: usize) -> String {
        PostgresDialect.placeholder(index)
    }
}

fn fetch_columns(client: &mut Client, schema: &str, unit: &str) -> Result<Vec<Column>> {
    let rows = client
        .query(
            r#"
            SELECT
                c.column_name,
                c.data_type,
                COALESCE(
                    (SELECT true FROM information_schema.table_constraints tc
                     JOIN information_schema.key_column_usage kcu
                       ON tc.constraint_name = kcu.constraint_name
                      AND tc.table_schema = kcu.table_schema
                     WHERE tc.constraint_type = 'PRIMARY KEY'
                       AND tc.table_schema = c.table_schema
                       AND tc.table_name = c.table_name
                       AND kcu.column_name = c.column_name),
                    false
                )
            FROM information_schema.columns c
            WHERE c.table_schema = $1 AND c.table_name = $2
            ORDER BY c.ordinal_position
            "#,
            &[&schema, &unit],
        )
        .map_err(CoreError::query_failed)?;

    let mut columns: Vec<Column> = rows
        .iter()
        .map(|row| {
            let mut column = Column::new(
                row.get::<_, String>(0),
                METADATA.normalize_type(&row.get::<_, String>(1)),
            );
            column.is_primary = row.get(2);
            column
        })
        .collect();

    // Second pass merges foreign-key targets by column name.
    let fk_rows = client
        .query(
            r#"
            SELECT kcu.column_name, ccu.table_name, ccu.column_name
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
              ON tc.constraint_name = kcu.constraint_name
             AND tc.table_schema = kcu.table_schema
            JOIN information_schema.constraint_column_usage ccu
              ON ccu.constraint_name = tc.constraint_name
             AND ccu.table_schema = tc.table_schema
            WHERE tc.constraint_type = 'FOREIGN KEY'
              AND tc.table_schema = $1 AND tc.table_name = $2
            "#,
            &[&schema, &unit],
        )
        .map_err(CoreError::query_failed)?;

    for fk in fk_rows {
        let column_name: String = fk.get(0);
        if let Some(column) = columns.iter_mut().find(|c| c.name == column_name) {
            column.is_foreign = true;
            column.referenced_table = Some(fk.get(1));
            column.referenced_column = Some(fk.get(2));
        }
    }

    Ok(columns)
}

/// Select-list expression for one column. Types the scanner cannot decode
/// natively (enums, network addresses, ranges) are cast to text server-side
/// so every cell still arrives scannable.
fn select_expr(dialect: &PostgresDialect, column: &Column) -> String {
    let quoted = dialect.quote_identifier(&column.name);
    if scans_natively(&column.column_type) {
        quoted
    } else {
        format!("{quoted}::text AS {quoted}")
    }
}

fn scans_natively(normalized_type: &str) -> bool {
    matches!(
        normalized_type,
        "SMALLINT"
            | "INTEGER"
            | "BIGINT"
            | "SERIAL"
            | "BIGSERIAL"
            | "NUMERIC"
            | "REAL"
            | "DOUBLE PRECISION"
            | "BOOLEAN"
            | "VARCHAR"
            | "CHAR"
            | "TEXT"
            | "DATE"
            | "TIME"
            | "TIMESTAMP"
            | "TIMESTAMPTZ"
            | "UUID"
            | "JSON"
            | "JSONB"
            | "BYTEA"
    )
}

/// Converts one typed cell to its display string. NULL is the empty string.
fn cell_to_string(row: &postgres::Row, idx: usize) -> String {
    let ty: &Type = row.columns()[idx].type_();

    macro_rules! scan {
        ($t:ty, $render:expr) => {
            match row.try_get::<_, Option<$t>>(idx) {
                Ok(Some(v)) => return $render(v),
                Ok(None) => return String::new(),
                Err(_) => {}
            }
        };
    }

    match ty.name() {
        "bool" => scan!(bool, |v: bool| format::format_bool(v)),
        "int2" => scan!(i16, |v: i16| v.to_string()),
        "int4" => scan!(i32, |v: i32| v.to_string()),
        "int8" => scan!(i64, |v: i64| v.to_string()),
        "float4" => scan!(f32, |v: f32| format::format_float(v as f64)),
        "float8" => scan!(f64, |v: f64| format::format_float(v)),
        "numeric" => scan!(Decimal, |v: Decimal| v.to_string()),
        "bytea" => scan!(Vec<u8>, |v: Vec<u8>| format::format_bytes(&v)),
        "timestamp" => scan!(NaiveDateTime, |v| format::format_timestamp(v)),
        "timestamptz" => {
            scan!(DateTime<Utc>, |v: DateTime<Utc>| format::format_timestamp(
                v.naive_utc()
            ))
        }
        "date" => scan!(NaiveDate, |v| format::format_date(v)),
        "time" => scan!(NaiveTime, |v| format::format_time(v)),
        "uuid" => scan!(uuid::Uuid, |v: uuid::Uuid| v.to_string()),
        "json" | "jsonb" => scan!(serde_json::Value, |v: serde_json::Value| v.to_string()),
        _ => {}
    }

    // Text family and text-cast exotics.
    match row.try_get::<_, Option<String>>(idx) {
        Ok(Some(v)) => v,
        Ok(None) => String::new(),
        Err(_) => String::new(),
    }
}

/// Binds one raw string by the column's declared (or normalized) type.
/// Empty strings bind as typed NULLs.
fn bind_param(declared: &str, raw: &str) -> Result<Box<dyn ToSql + Sync>> {
    let normalized = METADATA.normalize_type(declared);

    macro_rules! parse {
        ($t:ty) => {{
            if raw.is_empty() {
                return Ok(Box::new(Option::<$t>::None));
            }
            let parsed: $t = raw.parse().map_err(|_| {
                CoreError::bad_request(format!("invalid {normalized} value: {raw}"))
            })?;
            Ok(Box::new(parsed))
        }};
    }

    match normalized.as_str() {
        "SMALLINT" => parse!(i16),
        "INTEGER" | "SERIAL" => parse!(i32),
        "BIGINT" | "BIGSERIAL" => parse!(i64),
        "REAL" => parse!(f32),
        "DOUBLE PRECISION" => parse!(f64),
        "NUMERIC" => parse!(Decimal),
        "BOOLEAN" => parse!(bool),
        "UUID" => parse!(uuid::Uuid),
        "DATE" => {
            if raw.is_empty() {
                return Ok(Box::new(Option::<NaiveDate>::None));
            }
            let parsed = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| CoreError::bad_request(format!("invalid date: {raw}")))?;
            Ok(Box::new(parsed))
        }
        "TIME" => {
            if raw.is_empty() {
                return Ok(Box::new(Option::<NaiveTime>::None));
            }
            let parsed = NaiveTime::parse_from_str(raw, "%H:%M:%S")
                .map_err(|_| CoreError::bad_request(format!("invalid time: {raw}")))?;
            Ok(Box::new(parsed))
        }
        "TIMESTAMP" | "TIMESTAMPTZ" => {
            if raw.is_empty() {
                return Ok(Box::new(Option::<NaiveDateTime>::None));
            }
            let parsed = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .map_err(|_| CoreError::bad_request(format!("invalid timestamp: {raw}")))?;
            if normalized == "TIMESTAMPTZ" {
                Ok(Box::new(parsed.and_utc()))
            } else {
                Ok(Box::new(parsed))
            }
        }
        "JSON" | "JSONB" => {
            if raw.is_empty() {
                return Ok(Box::new(Option::<serde_json::Value>::None));
            }
            let parsed: serde_json::Value = serde_json::from_str(raw)
                .map_err(|_| CoreError::bad_request(format!("invalid JSON value: {raw}")))?;
            Ok(Box::new(parsed))
        }
        "BYTEA" => {
            if raw.is_empty() {
                return Ok(Box::new(Option::<Vec<u8>>::None));
            }
            let stripped = raw.strip_prefix("0x").unwrap_or(raw);
            let bytes = hex::decode(stripped)
                .map_err(|_| CoreError::bad_request(format!("invalid hex bytes: {raw}")))?;
            Ok(Box::new(bytes))
        }
        _ => {
            if raw.is_empty() {
                return Ok(Box::new(Option::<String>::None));
            }
            Ok(Box::new(raw.to_string()))
        }
    }
}

fn bind_records(columns: &[Column], records: &[Record]) -> Result<Vec<Box<dyn ToSql + Sync>>> {
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

fn reorder_for_update(values: &[Record], pk_columns: &[String]) -> Vec<Record> {
    let (keys, sets): (Vec<&Record>, Vec<&Record>) =
        values.iter().partition(|r| pk_columns.contains(&r.key));
    sets.into_iter().chain(keys).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_param_rejects_type_mismatches() {
        assert!(bind_param("INTEGER", "abc").is_err());
        assert!(bind_param("BOOLEAN", "maybe").is_err());
        assert!(bind_param("NUMERIC", "12.5.3").is_err());
        assert!(bind_param("INTEGER", "42").is_ok());
    }

    #[test]
    fn bind_param_accepts_prefixed_hex_bytes() {
        assert!(bind_param("BYTEA", "0xdeadbeef").is_ok());
        assert!(bind_param("BYTEA", "deadbeef").is_ok());
        assert!(bind_param("BYTEA", "zz").is_err());
    }

    #[test]
    fn exotic_columns_are_cast_to_text_in_select() {
        let dialect = PostgresDialect;
        let plain = Column::new("id", "INTEGER");
        let exotic = Column::new("addr", "INET");
        assert_eq!(select_expr(&dialect, &plain), r#""id""#);
        assert_eq!(select_expr(&dialect, &exotic), r#""addr"::text AS "addr""#);
    }

    #[test]
    fn update_binding_order_matches_built_sql() {
        let values = vec![
            Record::new("id", "5"),
            Record::new("name", "bob"),
        ];
        let ordered = reorder_for_update(&values, &["id".to_string()]);
        assert_eq!(ordered[0].key, "name");
        assert_eq!(ordered[1].key, "id");
    }
}
