use crate::metadata::METADATA;
use mongodb::bson::{Bson, Document, doc, oid::ObjectId};
use mongodb::sync::Client;
use whodb_core::{
    Column, CoreError, DatabaseMetadata, DatabaseType, OrderBy, Plugin, PluginConfig, Record,
    Result, Rows, SslStatus, StorageUnit, WhereCondition, ssl,
};

/// MongoDB plugin. Databases are schemas, collections are storage units,
/// and every row is one document rendered as relaxed extended JSON in a
/// single `document` column.
pub struct MongoDbPlugin;

impl MongoDbPlugin {
    pub fn new() -> Self {
        Self
    }

    fn connect(&self, config: &PluginConfig) -> Result<Client> {
        let credentials = &config.credentials;
        let port = credentials.port()?.unwrap_or(27017);

        let auth = if credentials.username.is_empty() {
            String::new()
        } else {
            format!(
                "{}:{}@",
                urlencoding::encode(&credentials.username),
                urlencoding::encode(&credentials.password)
            )
        };

        let mut options = vec!["authSource=admin".to_string()];
        if let Some(ssl_config) = ssl::parse_ssl_config(credentials)? {
            if ssl_config.mode.uses_tls() {
                options.push("tls=true".to_string());
                if !ssl_config.mode.verifies_chain() {
                    options.push("tlsInsecure=true".to_string());
                }
            }
        }

        let uri = format!(
            "mongodb://{auth}{}:{port}/?{}",
            credentials.hostname,
            options.join("&")
        );

        log::debug!("[CONNECT] MongoDB at {}:{port}", credentials.hostname);
        Client::with_uri_str(&uri).map_err(CoreError::connect_failed)
    }
}

impl Default for MongoDbPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for MongoDbPlugin {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::MongoDb
    }

    fn metadata(&self) -> &DatabaseMetadata {
        &METADATA
    }

    fn is_available(&self, config: &PluginConfig) -> bool {
        match self.connect(config) {
            Ok(client) => client
                .database("admin")
                .run_command(doc! { "ping": 1 })
                .run()
                .is_ok(),
            Err(_) => false,
        }
    }

    fn get_all_schemas(&self, config: &PluginConfig) -> Result<Vec<String>> {
        let client = self.connect(config)?;
        client
            .list_database_names()
            .run()
            .map_err(CoreError::query_failed)
    }

    fn get_storage_units(&self, config: &PluginConfig, schema: &str) -> Result<Vec<StorageUnit>> {
        let client = self.connect(config)?;
        let database = client.database(schema);
        let names = database
            .list_collection_names()
            .run()
            .map_err(CoreError::query_failed)?;

        let mut units = Vec::with_capacity(names.len());
        for name in names {
            let count = database
                .collection::<Document>(&name)
                .estimated_document_count()
                .run()
                .unwrap_or(0);
            units.push(StorageUnit::new(
                name,
                vec![
                    Record::new("Type", "Collection"),
                    Record::new("Count", count.to_string()),
                ],
            ));
        }
        units.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(units)
    }

    /// Field layout inferred from one sampled document. Collections are
    /// schemaless, so this is a hint, not a contract.
    fn get_columns(&self, config: &PluginConfig, schema: &str, unit: &str) -> Result<Vec<Column>> {
        let client = self.connect(config)?;
        let sample = client
            .database(schema)
            .collection::<Document>(unit)
            .find_one(doc! {})
            .run()
            .map_err(CoreError::query_failed)?;

        let Some(document) = sample else {
            return Ok(Vec::new());
        };

        Ok(document
            .iter()
            .map(|(key, value)| {
                let mut column = Column::new(key, bson_type_name(value));
                column.is_primary = key == "_id";
                column
            })
            .collect())
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
        let client = self.connect(config)?;
        let collection = client.database(schema).collection::<Document>(unit);

        let query = match filter {
            Some(condition) => compile_filter(condition)?,
            None => doc! {},
        };

        let mut find = collection
            .find(query)
            .limit(i64::from(page_size))
            .skip(page_offset);
        if !order_by.is_empty() {
            let mut sort = Document::new();
            for key in order_by {
                sort.insert(&key.column, if key.descending { -1 } else { 1 });
            }
            find = find.sort(sort);
        }

        let cursor = find.run().map_err(CoreError::query_failed)?;
        let mut rows = Vec::new();
        for document in cursor {
            let document = document.map_err(CoreError::query_failed)?;
            rows.push(vec![render_document(&document)]);
        }

        Ok(Rows {
            columns: vec![Column::new("document", "Object")],
            rows,
        })
    }

    fn raw_execute(&self, _config: &PluginConfig, _sql: &str) -> Result<Rows> {
        Err(CoreError::unsupported(
            "raw query execution is not supported for MongoDB",
        ))
    }

    fn add_storage_unit(
        &self,
        config: &PluginConfig,
        schema: &str,
        unit: &str,
        _fields: &[Record],
    ) -> Result<()> {
        let client = self.connect(config)?;
        client
            .database(schema)
            .create_collection(unit)
            .run()
            .map_err(CoreError::query_failed)
    }

    /// Inserts one document. A single `document` record carries the full
    /// JSON body; otherwise each record becomes a field.
    fn add_row(
        &self,
        config: &PluginConfig,
        schema: &str,
        unit: &str,
        values: &[Record],
    ) -> Result<()> {
        let document = document_from_records(values)?;
        let client = self.connect(config)?;
        client
            .database(schema)
            .collection::<Document>(unit)
            .insert_one(document)
            .run()
            .map_err(CoreError::query_failed)?;
        Ok(())
    }

    /// Replaces the document matching `_id` with the supplied body.
    fn update_row(
        &self,
        config: &PluginConfig,
        schema: &str,
        unit: &str,
        values: &[Record],
    ) -> Result<()> {
        let id = values
            .iter()
            .find(|r| r.key == "_id")
            .ok_or_else(|| CoreError::bad_request("update requires an _id value"))?;
        let body: Vec<Record> = values.iter().filter(|r| r.key != "_id").cloned().collect();
        let mut replacement = document_from_records(&body)?;
        replacement.remove("_id");

        let client = self.connect(config)?;
        let result = client
            .database(schema)
            .collection::<Document>(unit)
            .replace_one(doc! { "_id": parse_id(&id.value) }, replacement)
            .run()
            .map_err(CoreError::query_failed)?;

        if result.matched_count == 0 {
            return Err(CoreError::not_found("no document matched the _id"));
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
        let id = predicate
            .iter()
            .find(|r| r.key == "_id")
            .ok_or_else(|| CoreError::bad_request("delete requires an _id value"))?;

        let client = self.connect(config)?;
        let result = client
            .database(schema)
            .collection::<Document>(unit)
            .delete_one(doc! { "_id": parse_id(&id.value) })
            .run()
            .map_err(CoreError::query_failed)?;

        if result.deleted_count == 0 {
            return Err(CoreError::not_found("no document matched the _id"));
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

    fn form_table_name(&self, schema: &str, unit: &str) -> String {
        if schema.is_empty() {
            unit.to_string()
        } else {
            format!("{schema}.{unit}")
        }
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }
}

fn bson_type_name(value: &Bson) -> &'static str {
    match value {
        Bson::Double(_) => "Double",
        Bson::String(_) => "String",
        Bson::Array(_) => "Array",
        Bson::Document(_) => "Object",
        Bson::Boolean(_) => "Boolean",
        Bson::Null => "Null",
        Bson::Int32(_) => "Int32",
        Bson::Int64(_) => "Int64",
        Bson::Decimal128(_) => "Decimal128",
        Bson::ObjectId(_) => "ObjectId",
        Bson::DateTime(_) => "Date",
        Bson::Timestamp(_) => "Timestamp",
        Bson::Binary(_) => "Binary",
        _ => "Object",
    }
}

fn render_document(document: &Document) -> String {
    Bson::Document(document.clone())
        .into_relaxed_extjson()
        .to_string()
}

/// Compiles the condition tree onto query operators. Operator spellings
/// come from the metadata table (`=` -> `$eq`, ...).
fn compile_filter(condition: &WhereCondition) -> Result<Document> {
    match condition {
        WhereCondition::Atom {
            column,
            operator,
            value,
        } => {
            let Some(mongo_op) = METADATA.operators.sql_for(operator) else {
                return Err(CoreError::bad_request(format!(
                    "unknown operator: {operator}"
                )));
            };
            let mut comparison = Document::new();
            comparison.insert(mongo_op, parse_filter_value(column, value));
            let mut filter = Document::new();
            filter.insert(column, comparison);
            Ok(filter)
        }
        WhereCondition::And(children) => {
            let compiled = children
                .iter()
                .map(compile_filter)
                .collect::<Result<Vec<_>>>()?;
            Ok(doc! { "$and": compiled })
        }
        WhereCondition::Or(children) => {
            let compiled = children
                .iter()
                .map(compile_filter)
                .collect::<Result<Vec<_>>>()?;
            Ok(doc! { "$or": compiled })
        }
    }
}

/// Best-effort typing for filter literals: `_id` becomes an ObjectId when
/// it parses as one, numerics and booleans take their native types, and
/// everything else stays a string.
fn parse_filter_value(column: &str, raw: &str) -> Bson {
    if column == "_id" {
        return parse_id(raw);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Bson::Int64(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return Bson::Double(f);
    }
    match raw {
        "true" => Bson::Boolean(true),
        "false" => Bson::Boolean(false),
        _ => Bson::String(raw.to_string()),
    }
}

fn parse_id(raw: &str) -> Bson {
    match ObjectId::parse_str(raw) {
        Ok(oid) => Bson::ObjectId(oid),
        Err(_) => Bson::String(raw.to_string()),
    }
}

fn document_from_records(records: &[Record]) -> Result<Document> {
    if let [only] = records {
        if only.key == "document" {
            let value: serde_json::Value = serde_json::from_str(&only.value)
                .map_err(|e| CoreError::bad_request(format!("invalid document JSON: {e}")))?;
            let bson: Bson = value
                .try_into()
                .map_err(|_| CoreError::bad_request("document JSON is not valid BSON"))?;
            return match bson {
                Bson::Document(document) => Ok(document),
                _ => Err(CoreError::bad_request("document JSON must be an object")),
            };
        }
    }

    let mut document = Document::new();
    for record in records {
        let value: Bson = match serde_json::from_str::<serde_json::Value>(&record.value) {
            Ok(json) => json
                .try_into()
                .unwrap_or_else(|_| Bson::String(record.value.clone())),
            Err(_) => Bson::String(record.value.clone()),
        };
        document.insert(&record.key, value);
    }
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_compiles_to_query_operators() {
        let condition = WhereCondition::And(vec![
            WhereCondition::eq("age", "30"),
            WhereCondition::Atom {
                column: "name".to_string(),
                operator: ">".to_string(),
                value: "m".to_string(),
            },
        ]);
        let compiled = compile_filter(&condition).unwrap();
        let and = compiled.get_array("$and").unwrap();
        assert_eq!(and.len(), 2);
        assert_eq!(
            and[0].as_document().unwrap(),
            &doc! { "age": { "$eq": Bson::Int64(30) } }
        );
        assert_eq!(
            and[1].as_document().unwrap(),
            &doc! { "name": { "$gt": "m" } }
        );
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let condition = WhereCondition::Atom {
            column: "a".to_string(),
            operator: "LIKE".to_string(),
            value: "x".to_string(),
        };
        assert!(compile_filter(&condition).is_err());
    }

    #[test]
    fn object_ids_parse_when_well_formed() {
        assert!(matches!(
            parse_id("507f1f77bcf86cd799439011"),
            Bson::ObjectId(_)
        ));
        assert!(matches!(parse_id("custom-key"), Bson::String(_)));
    }

    fn int_of(document: &Document, key: &str) -> i64 {
        match document.get(key) {
            Some(Bson::Int32(v)) => i64::from(*v),
            Some(Bson::Int64(v)) => *v,
            other => panic!("expected an integer for {key}, got {other:?}"),
        }
    }

    #[test]
    fn document_records_accept_a_json_body() {
        let records = [Record::new("document", r#"{"name": "ada", "age": 36}"#)];
        let document = document_from_records(&records).unwrap();
        assert_eq!(document.get_str("name").unwrap(), "ada");
        assert_eq!(int_of(&document, "age"), 36);
    }

    #[test]
    fn field_records_build_a_document() {
        let records = [
            Record::new("name", "ada"),
            Record::new("age", "36"),
        ];
        let document = document_from_records(&records).unwrap();
        assert_eq!(document.get_str("name").unwrap(), "ada");
        assert_eq!(int_of(&document, "age"), 36);
    }
}
