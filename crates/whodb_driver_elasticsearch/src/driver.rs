use crate::metadata::METADATA;
use serde_json::{Value, json};
use std::time::Duration;
use whodb_core::{
    Column, CoreError, DatabaseMetadata, DatabaseType, OrderBy, Plugin, PluginConfig, Record,
    Result, Rows, SslStatus, StorageUnit, WhereCondition, ssl,
};

/// Elasticsearch plugin over the REST interface. Indices are the storage
/// units; rows are `_id` plus the `_source` document.
pub struct ElasticSearchPlugin;

struct HttpSession {
    client: reqwest::blocking::Client,
    base_url: String,
    username: String,
    password: String,
}

impl HttpSession {
    fn send(&self, request: reqwest::blocking::RequestBuilder) -> Result<Value> {
        let request = if self.username.is_empty() {
            request
        } else {
            request.basic_auth(&self.username, Some(&self.password))
        };

        let response = request.send().map_err(CoreError::connect_failed)?;
        let status = response.status();
        let body = response.text().map_err(CoreError::query_failed)?;

        if !status.is_success() {
            return Err(CoreError::query_failed(format!(
                "elasticsearch returned {status}: {body}"
            )));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(CoreError::query_failed)
    }

    fn get(&self, path: &str) -> Result<Value> {
        self.send(self.client.get(format!("{}{path}", self.base_url)))
    }

    fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.send(
            self.client
                .post(format!("{}{path}", self.base_url))
                .json(body),
        )
    }

    fn put(&self, path: &str, body: &Value) -> Result<Value> {
        self.send(
            self.client
                .put(format!("{}{path}", self.base_url))
                .json(body),
        )
    }

    fn delete(&self, path: &str) -> Result<Value> {
        self.send(self.client.delete(format!("{}{path}", self.base_url)))
    }
}

impl ElasticSearchPlugin {
    pub fn new() -> Self {
        Self
    }

    fn session(&self, config: &PluginConfig) -> Result<HttpSession> {
        let credentials = &config.credentials;
        let port = credentials.port()?.unwrap_or(9200);

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

        Ok(HttpSession {
            client,
            base_url: format!("{scheme}://{}:{port}/", credentials.hostname),
            username: credentials.username.clone(),
            password: credentials.password.clone(),
        })
    }
}

impl Default for ElasticSearchPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for ElasticSearchPlugin {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::ElasticSearch
    }

    fn metadata(&self) -> &DatabaseMetadata {
        &METADATA
    }

    fn is_available(&self, config: &PluginConfig) -> bool {
        self.session(config)
            .and_then(|session| session.get(""))
            .is_ok()
    }

    fn get_all_schemas(&self, _config: &PluginConfig) -> Result<Vec<String>> {
        Err(CoreError::unsupported("elasticsearch does not have schemas"))
    }

    fn get_storage_units(&self, config: &PluginConfig, _schema: &str) -> Result<Vec<StorageUnit>> {
        let session = self.session(config)?;
        let response = session.get("_cat/indices?format=json")?;

        let Value::Array(indices) = response else {
            return Err(CoreError::query_failed("unexpected _cat/indices shape"));
        };

        let mut units: Vec<StorageUnit> = indices
            .iter()
            .filter_map(|entry| {
                let name = entry.get("index")?.as_str()?;
                Some(StorageUnit::new(
                    name,
                    vec![
                        Record::new("Type", "Index"),
                        Record::new("Health", json_str(entry.get("health"))),
                        Record::new("Count", json_str(entry.get("docs.count"))),
                        Record::new("Total Size", json_str(entry.get("store.size"))),
                    ],
                ))
            })
            .collect();
        units.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(units)
    }

    fn get_columns(&self, config: &PluginConfig, _schema: &str, unit: &str) -> Result<Vec<Column>> {
        let session = self.session(config)?;
        let response = session.get(&format!("{unit}/_mapping"))?;

        let properties = response
            .get(unit)
            .and_then(|index| index.get("mappings"))
            .and_then(|mappings| mappings.get("properties"));

        let mut columns = Vec::new();
        if let Some(Value::Object(properties)) = properties {
            flatten_properties(properties, "", &mut columns);
        }
        Ok(columns)
    }

    fn get_rows(
        &self,
        config: &PluginConfig,
        _schema: &str,
        unit: &str,
        filter: Option<&WhereCondition>,
        order_by: &[OrderBy],
        page_size: u32,
        page_offset: u64,
    ) -> Result<Rows> {
        let session = self.session(config)?;

        let query = match filter {
            Some(condition) => compile_query(condition)?,
            None => json!({ "match_all": {} }),
        };
        let mut body = json!({
            "from": page_offset,
            "size": page_size,
            "query": query,
        });
        if !order_by.is_empty() {
            let sort: Vec<Value> = order_by
                .iter()
                .map(|o| json!({ o.column.clone(): { "order": if o.descending { "desc" } else { "asc" } } }))
                .collect();
            body["sort"] = Value::Array(sort);
        }

        let response = session.post(&format!("{unit}/_search"), &body)?;
        rows_from_search(&response)
    }

    /// Executes a JSON search body of the shape
    /// `{"index": "...", "query": {...}}`. Anything else has no SQL-free
    /// rendering here and is rejected.
    fn raw_execute(&self, config: &PluginConfig, sql: &str) -> Result<Rows> {
        let parsed: Value = serde_json::from_str(sql).map_err(|_| {
            CoreError::bad_request(
                "elasticsearch queries must be JSON: {\"index\": ..., \"query\": ...}",
            )
        })?;
        let Some(index) = parsed.get("index").and_then(|v| v.as_str()) else {
            return Err(CoreError::bad_request(
                "elasticsearch queries must name an index",
            ));
        };

        let mut body = serde_json::Map::new();
        for key in ["query", "from", "size", "sort", "aggs"] {
            if let Some(value) = parsed.get(key) {
                body.insert(key.to_string(), value.clone());
            }
        }

        let session = self.session(config)?;
        let response = session.post(&format!("{index}/_search"), &Value::Object(body))?;
        rows_from_search(&response)
    }

    fn add_row(
        &self,
        config: &PluginConfig,
        _schema: &str,
        unit: &str,
        values: &[Record],
    ) -> Result<()> {
        let document = document_from_records(values)?;
        let session = self.session(config)?;
        session.post(&format!("{unit}/_doc"), &document)?;
        Ok(())
    }

    fn update_row(
        &self,
        config: &PluginConfig,
        _schema: &str,
        unit: &str,
        values: &[Record],
    ) -> Result<()> {
        let id = values
            .iter()
            .find(|r| r.key == "_id")
            .ok_or_else(|| CoreError::bad_request("update requires an _id value"))?;
        let body: Vec<Record> = values.iter().filter(|r| r.key != "_id").cloned().collect();
        let document = document_from_records(&body)?;

        let session = self.session(config)?;
        session.put(&format!("{unit}/_doc/{}", id.value), &document)?;
        Ok(())
    }

    fn delete_row(
        &self,
        config: &PluginConfig,
        _schema: &str,
        unit: &str,
        predicate: &[Record],
    ) -> Result<()> {
        let id = predicate
            .iter()
            .find(|r| r.key == "_id")
            .ok_or_else(|| CoreError::bad_request("delete requires an _id value"))?;

        let session = self.session(config)?;
        session.delete(&format!("{unit}/_doc/{}", id.value))?;
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

/// Flattens nested mapping properties into dotted column paths.
fn flatten_properties(
    properties: &serde_json::Map<String, Value>,
    prefix: &str,
    out: &mut Vec<Column>,
) {
    for (name, definition) in properties {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };

        if let Some(Value::Object(nested)) = definition.get("properties") {
            flatten_properties(nested, &path, out);
            continue;
        }

        let field_type = definition
            .get("type")
            .and_then(|v| v.as_str())
            .unwrap_or("object");
        out.push(Column::new(path, field_type));
    }
}

/// Compiles the condition tree into a bool query. Equality becomes `term`,
/// inequality a negated `term`, and comparisons become `range` bounds.
fn compile_query(condition: &WhereCondition) -> Result<Value> {
    match condition {
        WhereCondition::Atom {
            column,
            operator,
            value,
        } => {
            if !METADATA.operators.is_allowed(operator) {
                return Err(CoreError::bad_request(format!(
                    "unknown operator: {operator}"
                )));
            }
            let typed = parse_json_scalar(value);
            Ok(match operator.as_str() {
                "=" => json!({ "term": { column.clone(): typed } }),
                "!=" => json!({ "bool": { "must_not": { "term": { column.clone(): typed } } } }),
                ">" => json!({ "range": { column.clone(): { "gt": typed } } }),
                ">=" => json!({ "range": { column.clone(): { "gte": typed } } }),
                "<" => json!({ "range": { column.clone(): { "lt": typed } } }),
                "<=" => json!({ "range": { column.clone(): { "lte": typed } } }),
                _ => unreachable!("operator table and match arms disagree"),
            })
        }
        WhereCondition::And(children) => {
            let compiled = children
                .iter()
                .map(compile_query)
                .collect::<Result<Vec<_>>>()?;
            Ok(json!({ "bool": { "must": compiled } }))
        }
        WhereCondition::Or(children) => {
            let compiled = children
                .iter()
                .map(compile_query)
                .collect::<Result<Vec<_>>>()?;
            Ok(json!({ "bool": { "should": compiled, "minimum_should_match": 1 } }))
        }
    }
}

fn parse_json_scalar(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return Value::from(f);
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

fn rows_from_search(response: &Value) -> Result<Rows> {
    let hits = response
        .get("hits")
        .and_then(|h| h.get("hits"))
        .and_then(|h| h.as_array())
        .ok_or_else(|| CoreError::query_failed("unexpected search response shape"))?;

    let rows = hits
        .iter()
        .map(|hit| {
            let id = hit.get("_id").and_then(|v| v.as_str()).unwrap_or_default();
            let source = hit.get("_source").cloned().unwrap_or(Value::Null);
            vec![id.to_string(), source.to_string()]
        })
        .collect();

    Ok(Rows {
        columns: vec![
            Column::new("_id", "keyword"),
            Column::new("document", "object"),
        ],
        rows,
    })
}

fn document_from_records(records: &[Record]) -> Result<Value> {
    if let [only] = records {
        if only.key == "document" {
            return serde_json::from_str(&only.value)
                .map_err(|e| CoreError::bad_request(format!("invalid document JSON: {e}")));
        }
    }

    let mut document = serde_json::Map::new();
    for record in records {
        let value = serde_json::from_str(&record.value)
            .unwrap_or_else(|_| Value::String(record.value.clone()));
        document.insert(record.key.clone(), value);
    }
    Ok(Value::Object(document))
}

fn json_str(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_compiles_to_term_query() {
        let compiled = compile_query(&WhereCondition::eq("age", "30")).unwrap();
        assert_eq!(compiled, json!({ "term": { "age": 30 } }));
    }

    #[test]
    fn comparisons_compile_to_range_bounds() {
        let condition = WhereCondition::Atom {
            column: "age".to_string(),
            operator: ">=".to_string(),
            value: "18".to_string(),
        };
        assert_eq!(
            compile_query(&condition).unwrap(),
            json!({ "range": { "age": { "gte": 18 } } })
        );
    }

    #[test]
    fn groups_compile_to_bool_queries() {
        let condition = WhereCondition::Or(vec![
            WhereCondition::eq("a", "1"),
            WhereCondition::eq("b", "x"),
        ]);
        let compiled = compile_query(&condition).unwrap();
        assert_eq!(compiled["bool"]["should"].as_array().unwrap().len(), 2);
        // String values stay strings, numerics become numbers.
        assert_eq!(
            compiled["bool"]["should"][1],
            json!({ "term": { "b": "x" } })
        );
    }

    #[test]
    fn mapping_properties_flatten_to_dotted_paths() {
        let mapping = json!({
            "name": { "type": "text" },
            "address": {
                "properties": {
                    "city": { "type": "keyword" },
                    "geo": { "type": "geo_point" }
                }
            }
        });
        let Value::Object(properties) = mapping else {
            unreachable!()
        };
        let mut columns = Vec::new();
        flatten_properties(&properties, "", &mut columns);
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"name"));
        assert!(names.contains(&"address.city"));
        assert!(names.contains(&"address.geo"));
    }
}
