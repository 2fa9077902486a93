use crate::literals::{ChValue, format_literal, parse_value};
use crate::metadata::METADATA;
use crate::types::{ChType, parse_type};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use whodb_core::sql::dialect::{ClickHouseDialect, SqlDialect};
use whodb_core::{
    Column, ConstraintMap, CoreError, DatabaseMetadata, DatabaseType, OrderBy, Plugin,
    PluginConfig, Record, Result, Rows, SslStatus, StorageUnit, WhereCondition, ssl,
};

/// ClickHouse plugin over the HTTP interface (`FORMAT JSON`).
///
/// Databases play the role of schemas. The session's `database` query
/// parameter carries the active schema, which is also why DDL and mutation
/// paths use the bare table name: the server resolves the database from
/// session context, and dotted names are not accepted everywhere.
pub struct ClickHousePlugin;

#[derive(Debug, Deserialize)]
struct ChMeta {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
}

#[derive(Debug, Deserialize)]
struct ChResponse {
    #[serde(default)]
    meta: Vec<ChMeta>,
    #[serde(default)]
    data: Vec<serde_json::Map<String, serde_json::Value>>,
}

struct HttpSession {
    client: reqwest::blocking::Client,
    base_url: String,
    user: String,
    password: String,
    database: String,
}

impl HttpSession {
    fn request(&self, sql: &str, params: &[(String, String)]) -> reqwest::blocking::RequestBuilder {
        self.client
            .post(&self.base_url)
            .header("X-ClickHouse-User", &self.user)
            .header("X-ClickHouse-Key", &self.password)
            .query(&[
                ("database", self.database.as_str()),
                ("default_format", "JSON"),
            ])
            .query(params)
            .body(sql.to_string())
    }

    /// Runs a statement and parses the JSON result. An empty body (DDL,
    /// INSERT) yields an empty response.
    fn execute(&self, sql: &str, params: &[(String, String)]) -> Result<ChResponse> {
        let response = self
            .request(sql, params)
            .send()
            .map_err(CoreError::connect_failed)?;

        let status = response.status();
        let body = response.text().map_err(CoreError::query_failed)?;

        if !status.is_success() {
            return Err(CoreError::query_failed(format!(
                "clickhouse returned {status}: {body}"
            )));
        }
        if body.trim().is_empty() {
            return Ok(ChResponse {
                meta: Vec::new(),
                data: Vec::new(),
            });
        }
        serde_json::from_str(&body).map_err(CoreError::query_failed)
    }

    /// Mutation path with the legacy success heuristic: some ALTER
    /// statements complete on the server while the HTTP exchange dies.
    /// When the transport (not the server) reports the failure, a healthy
    /// `SELECT 1` probe is taken as confirmation of success.
    fn execute_mutation(&self, sql: &str) -> Result<()> {
        match self.request(sql, &[]).send() {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(());
                }
                let body = response.text().unwrap_or_default();
                Err(CoreError::query_failed(format!(
                    "clickhouse returned {status}: {body}"
                )))
            }
            Err(transport_error) => {
                log::warn!(
                    "[QUERY] transport error after mutation, probing connection: {transport_error}"
                );
                match self.execute("SELECT 1", &[]) {
                    Ok(_) => Ok(()),
                    Err(_) => Err(CoreError::query_failed(transport_error)),
                }
            }
        }
    }
}

impl ClickHousePlugin {
    pub fn new() -> Self {
        Self
    }

    fn session(&self, config: &PluginConfig, database: &str) -> Result<HttpSession> {
        let credentials = &config.credentials;
        let port = credentials.port()?.unwrap_or(8123);

        let ssl_config = ssl::parse_ssl_config(credentials)?;
        let scheme = match &ssl_config {
            Some(config) if config.mode.uses_tls() => "https",
            _ => "http",
        };

        let mut builder = reqwest::blocking::Client::builder().timeout(Duration::from_secs(30));
        if let Some(ssl_config) = &ssl_config {
            if !ssl_config.mode.verifies_chain() {
                builder = builder.danger_accept_invalid_certs(true);
            }
            if !ssl_config.mode.verifies_hostname() {
                builder = builder.danger_accept_invalid_hostnames(true);
            }
            if let Some(ca) = &ssl_config.ca_cert {
                let pem = ca.load()?;
                let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                    log::error!("[SSL] invalid CA certificate: {e}");
                    CoreError::bad_request("invalid CA certificate")
                })?;
                builder = builder.add_root_certificate(cert);
            }
        }

        let client = builder.build().map_err(|e| {
            log::error!("[CONNECT] failed to build HTTP client: {e}");
            CoreError::internal("failed to initialize HTTP client")
        })?;

        let database = if database.is_empty() {
            credentials.database.clone()
        } else {
            database.to_string()
        };

        Ok(HttpSession {
            client,
            base_url: format!("{scheme}://{}:{port}/", credentials.hostname),
            user: credentials.username.clone(),
            password: credentials.password.clone(),
            database,
        })
    }
}

impl Default for ClickHousePlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for ClickHousePlugin {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::ClickHouse
    }

    fn metadata(&self) -> &DatabaseMetadata {
        &METADATA
    }

    fn is_available(&self, config: &PluginConfig) -> bool {
        self.session(config, "")
            .and_then(|session| session.execute("SELECT 1", &[]))
            .is_ok()
    }

    /// ClickHouse treats databases as schemas.
    fn get_all_schemas(&self, config: &PluginConfig) -> Result<Vec<String>> {
        let session = self.session(config, "")?;
        let response = session.execute(
            "SELECT name FROM system.databases \
             WHERE name NOT IN ('system', 'INFORMATION_SCHEMA', 'information_schema') \
             ORDER BY name",
            &[],
        )?;
        Ok(response
            .data
            .iter()
            .filter_map(|row| row.get("name").and_then(|v| v.as_str()))
            .map(str::to_string)
            .collect())
    }

    fn get_storage_units(&self, config: &PluginConfig, schema: &str) -> Result<Vec<StorageUnit>> {
        let session = self.session(config, schema)?;
        let response = session.execute(
            "SELECT name, engine, total_rows, total_bytes FROM system.tables \
             WHERE database = {db:String} ORDER BY name",
            &[("param_db".to_string(), session.database.clone())],
        )?;

        Ok(response
            .data
            .iter()
            .map(|row| {
                let name = json_str(row.get("name"));
                StorageUnit::new(
                    name,
                    vec![
                        Record::new("Type", json_str(row.get("engine"))),
                        Record::new("Count", json_u64(row.get("total_rows")).to_string()),
                        Record::new(
                            "Total Size",
                            format!("{} B", json_u64(row.get("total_bytes"))),
                        ),
                    ],
                )
            })
            .collect())
    }

    fn get_columns(&self, config: &PluginConfig, schema: &str, unit: &str) -> Result<Vec<Column>> {
        let session = self.session(config, schema)?;
        fetch_columns(&session, unit)
    }

    /// A separate `system.columns` pass: enum value sets and decimal
    /// scale/precision come out of the raw type string, and `nullable` is
    /// authoritative from the presence of the `Nullable(...)` wrapper.
    fn get_column_constraints(
        &self,
        config: &PluginConfig,
        schema: &str,
        unit: &str,
    ) -> Result<ConstraintMap> {
        let session = self.session(config, schema)?;
        let response = session.execute(
            "SELECT name, type, default_expression FROM system.columns \
             WHERE database = {db:String} AND table = {table:String} ORDER BY position",
            &[
                ("param_db".to_string(), session.database.clone()),
                ("param_table".to_string(), unit.to_string()),
            ],
        )?;

        let mut constraints = ConstraintMap::new();
        for row in &response.data {
            let name = json_str(row.get("name"));
            let raw_type = json_str(row.get("type"));
            let parsed = parse_type(&raw_type)?;

            let mut facts = BTreeMap::new();
            facts.insert(
                "nullable".to_string(),
                serde_json::Value::Bool(parsed.is_nullable()),
            );

            let default = json_str(row.get("default_expression"));
            if !default.is_empty() {
                facts.insert("default".to_string(), serde_json::Value::String(default));
            }

            match parsed.core_type() {
                ChType::Enum { values, .. } => {
                    facts.insert(
                        "check_values".to_string(),
                        serde_json::Value::Array(
                            values
                                .iter()
                                .map(|(name, _)| serde_json::Value::String(name.clone()))
                                .collect(),
                        ),
                    );
                }
                ChType::Decimal { precision, scale } => {
                    facts.insert("precision".to_string(), serde_json::Value::from(*precision));
                    facts.insert("scale".to_string(), serde_json::Value::from(*scale));
                }
                _ => {}
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
        let session = self.session(config, schema)?;
        let columns = fetch_columns(&session, unit)?;
        if columns.is_empty() {
            return Err(CoreError::not_found(format!("no storage unit {unit}")));
        }

        let dialect = ClickHouseDialect;
        let mut sql = format!("SELECT * FROM {}", dialect.quote_identifier(unit));
        let mut params = Vec::new();

        if let Some(condition) = filter {
            let (clause, bound) = compile_where(condition, &columns)?;
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
            params = bound;
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

        let response = session.execute(&sql, &params)?;
        rows_from_response(response)
    }

    fn raw_execute(&self, config: &PluginConfig, sql: &str) -> Result<Rows> {
        let session = self.session(config, "")?;
        let response = session.execute(sql, &[])?;
        rows_from_response(response)
    }

    fn add_storage_unit(
        &self,
        config: &PluginConfig,
        schema: &str,
        unit: &str,
        fields: &[Record],
    ) -> Result<()> {
        if fields.is_empty() {
            return Err(CoreError::bad_request(
                "create table requires at least one column",
            ));
        }
        let dialect = ClickHouseDialect;
        let columns = fields
            .iter()
            .map(|r| format!("{} {}", dialect.quote_identifier(&r.key), r.value))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "CREATE TABLE {} ({columns}) ENGINE = MergeTree ORDER BY tuple()",
            dialect.quote_identifier(unit)
        );

        let session = self.session(config, schema)?;
        session.execute_mutation(&sql)
    }

    /// The canonical literal write path: every value is parsed against the
    /// declared type and re-rendered through the literal formatter, so
    /// arrays, tuples, and maps reach the server in the exact container
    /// grammar.
    fn add_row(
        &self,
        config: &PluginConfig,
        schema: &str,
        unit: &str,
        values: &[Record],
    ) -> Result<()> {
        let session = self.session(config, schema)?;
        let columns = fetch_columns(&session, unit)?;

        let dialect = ClickHouseDialect;
        let mut names = Vec::with_capacity(values.len());
        let mut literals = Vec::with_capacity(values.len());
        for record in values {
            let declared = column_type(&columns, &record.key)?;
            let parsed = parse_value(&record.value, &declared)?;
            names.push(dialect.quote_identifier(&record.key));
            literals.push(format_literal(&parsed));
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            dialect.quote_identifier(unit),
            names.join(", "),
            literals.join(", ")
        );
        session.execute_mutation(&sql)
    }

    fn update_row(
        &self,
        config: &PluginConfig,
        schema: &str,
        unit: &str,
        values: &[Record],
    ) -> Result<()> {
        let session = self.session(config, schema)?;
        let columns = fetch_columns(&session, unit)?;
        let pk_names: Vec<&str> = columns
            .iter()
            .filter(|c| c.is_primary)
            .map(|c| c.name.as_str())
            .collect();
        if pk_names.is_empty() {
            return Err(CoreError::bad_request(
                "table has no primary key; update is not possible",
            ));
        }

        let dialect = ClickHouseDialect;
        let mut sets = Vec::new();
        let mut predicate = Vec::new();
        for record in values {
            let declared = column_type(&columns, &record.key)?;
            let literal = format_literal(&parse_value(&record.value, &declared)?);
            let clause = format!("{} = {literal}", dialect.quote_identifier(&record.key));
            if pk_names.contains(&record.key.as_str()) {
                predicate.push(clause);
            } else {
                sets.push(clause);
            }
        }
        if sets.is_empty() {
            return Err(CoreError::bad_request("update has no columns to set"));
        }
        if predicate.is_empty() {
            return Err(CoreError::bad_request(
                "update requires a value for every primary-key column",
            ));
        }

        let sql = format!(
            "ALTER TABLE {} UPDATE {} WHERE {}",
            dialect.quote_identifier(unit),
            sets.join(", "),
            predicate.join(" AND ")
        );
        session.execute_mutation(&sql)
    }

    fn delete_row(
        &self,
        config: &PluginConfig,
        schema: &str,
        unit: &str,
        predicate: &[Record],
    ) -> Result<()> {
        if predicate.is_empty() {
            return Err(CoreError::bad_request(
                "delete without a predicate is not allowed",
            ));
        }
        let session = self.session(config, schema)?;
        let columns = fetch_columns(&session, unit)?;

        let dialect = ClickHouseDialect;
        let clauses = predicate
            .iter()
            .map(|record| {
                let declared = column_type(&columns, &record.key)?;
                let literal = format_literal(&parse_value(&record.value, &declared)?);
                Ok(format!(
                    "{} = {literal}",
                    dialect.quote_identifier(&record.key)
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let sql = format!(
            "ALTER TABLE {} DELETE WHERE {}",
            dialect.quote_identifier(unit),
            clauses.join(" AND ")
        );
        session.execute_mutation(&sql)
    }

    fn get_ssl_status(&self, config: &PluginConfig) -> Result<SslStatus> {
        // The HTTP interface has no live TLS catalog; derive from config.
        let mode = ssl::parse_ssl_config(&config.credentials)?
            .map(|c| c.mode)
            .unwrap_or(ssl::SslMode::Disabled);
        Ok(SslStatus {
            is_enabled: mode.uses_tls(),
            mode: mode.label().to_string(),
        })
    }

    fn form_table_name(&self, schema: &str, unit: &str) -> String {
        ClickHouseDialect.qualified_table(schema, unit)
    }

    fn placeholder(&self, index: usize) -> String {
        ClickHouseDialect.placeholder(index)
    }
}

fn fetch_columns(session: &HttpSession, unit: &str) -> Result<Vec<Column>> {
    let response = session.execute(
        "SELECT name, type, is_in_primary_key FROM system.columns \
         WHERE database = {db:String} AND table = {table:String} ORDER BY position",
        &[
            ("param_db".to_string(), session.database.clone()),
            ("param_table".to_string(), unit.to_string()),
        ],
    )?;

    Ok(response
        .data
        .iter()
        .map(|row| {
            let mut column = Column::new(json_str(row.get("name")), json_str(row.get("type")));
            column.is_primary = json_u64(row.get("is_in_primary_key")) == 1;
            column
        })
        .collect())
}

fn column_type(columns: &[Column], name: &str) -> Result<ChType> {
    let column = columns
        .iter()
        .find(|c| c.name == name)
        .ok_or_else(|| CoreError::bad_request(format!("unknown column: {name}")))?;
    parse_type(&column.column_type)
}

/// Compiles a condition tree into HTTP named parameters
/// (`{p1:Int64}` + `param_p1=...`). Scalar values travel in the server's
/// text format unquoted; containers travel in literal form.
fn compile_where(
    condition: &WhereCondition,
    columns: &[Column],
) -> Result<(String, Vec<(String, String)>)> {
    let mut params = Vec::new();
    let clause = compile_node(condition, columns, &mut params)?;
    Ok((clause, params))
}

fn compile_node(
    node: &WhereCondition,
    columns: &[Column],
    params: &mut Vec<(String, String)>,
) -> Result<String> {
    let dialect = ClickHouseDialect;
    match node {
        WhereCondition::Atom {
            column,
            operator,
            value,
        } => {
            let Some(sql_op) = METADATA.operators.sql_for(operator) else {
                return Err(CoreError::bad_request(format!(
                    "unknown operator: {operator}"
                )));
            };
            let declared = column_type(columns, column)?;
            let parsed = parse_value(value, &declared)?;
            let rendered = match &parsed {
                ChValue::Array(_) | ChValue::Tuple(_) | ChValue::Map(_) => format_literal(&parsed),
                ChValue::Str(s) => s.clone(),
                other => format_literal(other),
            };
            let index = params.len() + 1;
            params.push((format!("param_p{index}"), rendered));
            Ok(format!(
                "{} {} {{p{index}:{}}}",
                dialect.quote_identifier(column),
                sql_op,
                declared.binding_name()
            ))
        }
        WhereCondition::And(children) => {
            let parts = children
                .iter()
                .map(|c| compile_node(c, columns, params))
                .collect::<Result<Vec<_>>>()?;
            Ok(format!("({})", parts.join(" AND ")))
        }
        WhereCondition::Or(children) => {
            let parts = children
                .iter()
                .map(|c| compile_node(c, columns, params))
                .collect::<Result<Vec<_>>>()?;
            Ok(format!("({})", parts.join(" OR ")))
        }
    }
}

fn rows_from_response(response: ChResponse) -> Result<Rows> {
    if response.meta.is_empty() {
        return Ok(Rows::empty());
    }

    let parsed_types = response
        .meta
        .iter()
        .map(|m| parse_type(&m.type_name))
        .collect::<Result<Vec<_>>>()?;
    let columns: Vec<Column> = response
        .meta
        .iter()
        .map(|m| Column::new(m.name.clone(), m.type_name.clone()))
        .collect();

    let rows = response
        .data
        .iter()
        .map(|row| {
            columns
                .iter()
                .zip(&parsed_types)
                .map(|(column, ty)| {
                    render_cell(row.get(&column.name).unwrap_or(&serde_json::Value::Null), ty)
                })
                .collect()
        })
        .collect();

    Ok(Rows { columns, rows })
}

/// Renders one JSON cell into its display string. Containers re-render in
/// literal shape (`[..]`, `(..)`, `{'k': v}`); scalars stay bare.
fn render_cell(value: &serde_json::Value, ty: &ChType) -> String {
    if value.is_null() {
        return String::new();
    }
    match ty.core_type() {
        ChType::Array(_) | ChType::Tuple(_) | ChType::Map(_, _) => {
            format_literal(&json_to_value(value, ty))
        }
        ChType::FixedString(_) => {
            // Short values arrive padded with trailing zero bytes.
            json_display(value).trim_end_matches('\0').to_string()
        }
        _ => json_display(value),
    }
}

fn json_to_value(value: &serde_json::Value, ty: &ChType) -> ChValue {
    match (value, ty.core_type()) {
        (serde_json::Value::Null, _) => ChValue::Null,
        (serde_json::Value::Array(items), ChType::Array(element)) => {
            ChValue::Array(items.iter().map(|v| json_to_value(v, element)).collect())
        }
        (serde_json::Value::Array(items), ChType::Tuple(types)) => ChValue::Tuple(
            items
                .iter()
                .zip(types)
                .map(|(v, t)| json_to_value(v, t))
                .collect(),
        ),
        (serde_json::Value::Object(entries), ChType::Map(key_type, value_type)) => ChValue::Map(
            entries
                .iter()
                .map(|(k, v)| {
                    (
                        json_scalar_to_value(&serde_json::Value::String(k.clone()), key_type),
                        json_to_value(v, value_type),
                    )
                })
                .collect(),
        ),
        (scalar, scalar_type) => json_scalar_to_value(scalar, scalar_type),
    }
}

fn json_scalar_to_value(value: &serde_json::Value, ty: &ChType) -> ChValue {
    match value {
        serde_json::Value::Null => ChValue::Null,
        serde_json::Value::Bool(b) => ChValue::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                ChValue::Int(i)
            } else if let Some(u) = n.as_u64() {
                ChValue::UInt(u)
            } else {
                ChValue::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => {
            // 64-bit and wider integers arrive as quoted strings; keep
            // numbers numeric so literals render without quotes.
            match ty.core_type() {
                ChType::Simple(name)
                    if name.starts_with("Int") || name.starts_with("UInt") =>
                {
                    if let Ok(i) = s.parse::<i64>() {
                        ChValue::Int(i)
                    } else if let Ok(u) = s.parse::<u64>() {
                        ChValue::UInt(u)
                    } else {
                        ChValue::Str(s.clone())
                    }
                }
                _ => ChValue::Str(s.clone()),
            }
        }
        other => ChValue::Str(other.to_string()),
    }
}

fn json_display(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn json_str(value: Option<&serde_json::Value>) -> String {
    value.map(json_display).unwrap_or_default()
}

fn json_u64(value: Option<&serde_json::Value>) -> u64 {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(serde_json::Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("id", "UInt64"),
            Column::new("name", "String"),
            Column::new("tags", "Array(String)"),
        ]
    }

    #[test]
    fn where_compiles_to_named_http_params() {
        let condition = WhereCondition::And(vec![
            WhereCondition::eq("id", "5"),
            WhereCondition::eq("name", "alice"),
        ]);
        let (clause, params) = compile_where(&condition, &columns()).unwrap();
        assert_eq!(clause, "(`id` = {p1:UInt64} AND `name` = {p2:String})");
        assert_eq!(
            params,
            vec![
                ("param_p1".to_string(), "5".to_string()),
                ("param_p2".to_string(), "alice".to_string()),
            ]
        );
    }

    #[test]
    fn where_rejects_values_that_fail_the_type_grammar() {
        let condition = WhereCondition::eq("id", "not-a-number");
        assert!(compile_where(&condition, &columns()).is_err());
    }

    #[test]
    fn compound_cells_render_in_literal_shape() {
        let map_ty = parse_type("Map(String, Int32)").unwrap();
        let cell = serde_json::json!({"key2": 20, "key1": 10});
        assert_eq!(render_cell(&cell, &map_ty), "{'key1': 10, 'key2': 20}");

        let tuple_ty = parse_type("Tuple(String, Int32, Float64)").unwrap();
        let cell = serde_json::json!(["hello", 42, 3.14]);
        assert_eq!(render_cell(&cell, &tuple_ty), "('hello', 42, 3.14)");

        let array_ty = parse_type("Array(Int32)").unwrap();
        let cell = serde_json::json!([1, 2, 3]);
        assert_eq!(render_cell(&cell, &array_ty), "[1, 2, 3]");
    }

    #[test]
    fn quoted_bigints_render_unquoted_in_containers() {
        let array_ty = parse_type("Array(UInt64)").unwrap();
        let cell = serde_json::json!(["18446744073709551615", "1"]);
        assert_eq!(render_cell(&cell, &array_ty), "[18446744073709551615, 1]");
    }

    #[test]
    fn fixed_strings_trim_trailing_zero_bytes() {
        let ty = parse_type("FixedString(8)").unwrap();
        let cell = serde_json::json!("abc\u{0}\u{0}\u{0}\u{0}\u{0}");
        assert_eq!(render_cell(&cell, &ty), "abc");
    }

    #[test]
    fn scalar_cells_render_bare() {
        let ty = parse_type("String").unwrap();
        assert_eq!(render_cell(&serde_json::json!("plain"), &ty), "plain");
        let ty = parse_type("Nullable(Int64)").unwrap();
        assert_eq!(render_cell(&serde_json::Value::Null, &ty), "");
    }
}
