use crate::metadata::METADATA;
use rusqlite::types::{Value as SqliteValue, ValueRef};
use rusqlite::{Connection, params_from_iter};
use std::collections::{BTreeMap, HashMap};
use whodb_core::sql::dialect::{SqlDialect, SqliteDialect};
use whodb_core::sql::{builder, format};
use whodb_core::{
    Column, ConstraintMap, CoreError, DatabaseMetadata, DatabaseType, GraphRelation, GraphUnit,
    OrderBy, Plugin, PluginConfig, Record, RelationType, Result, Rows, SslStatus, StorageUnit,
    TypeCategory, WhereCondition,
};

/// SQLite plugin. The credentials' `database` field is the database file
/// path; host, port, and TLS have no meaning for a file-based engine.
pub struct SqlitePlugin;

impl SqlitePlugin {
    pub fn new() -> Self {
        Self
    }

    fn connect(&self, config: &PluginConfig) -> Result<Connection> {
        let path = &config.credentials.database;
        if path.is_empty() {
            return Err(CoreError::bad_request("sqlite requires a database file path"));
        }
        log::debug!("[CONNECT] sqlite file {path}");
        Connection::open(path).map_err(CoreError::connect_failed)
    }
}

impl Default for SqlitePlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for SqlitePlugin {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    fn metadata(&self) -> &DatabaseMetadata {
        &METADATA
    }

    fn is_available(&self, config: &PluginConfig) -> bool {
        match self.connect(config) {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => false,
        }
    }

    fn get_all_schemas(&self, _config: &PluginConfig) -> Result<Vec<String>> {
        Err(CoreError::unsupported("sqlite does not have schemas"))
    }

    fn get_storage_units(&self, config: &PluginConfig, _schema: &str) -> Result<Vec<StorageUnit>> {
        let conn = self.connect(config)?;
        let mut stmt = conn
            .prepare(
                r"SELECT name, type FROM sqlite_master
                  WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%'
                  ORDER BY name",
            )
            .map_err(CoreError::query_failed)?;

        let entries = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(CoreError::query_failed)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(CoreError::query_failed)?;

        let dialect = SqliteDialect;
        let mut units = Vec::with_capacity(entries.len());
        for (name, kind) in entries {
            let count: i64 = conn
                .query_row(
                    &format!("SELECT COUNT(*) FROM {}", dialect.quote_identifier(&name)),
                    [],
                    |row| row.get(0),
                )
                .unwrap_or(0);
            units.push(StorageUnit::new(
                name,
                vec![
                    Record::new("Type", kind.to_uppercase()),
                    Record::new("Count", count.to_string()),
                ],
            ));
        }
        Ok(units)
    }

    fn get_columns(&self, config: &PluginConfig, _schema: &str, unit: &str) -> Result<Vec<Column>> {
        let conn = self.connect(config)?;
        fetch_columns(&conn, unit)
    }

    fn get_column_constraints(
        &self,
        config: &PluginConfig,
        _schema: &str,
        unit: &str,
    ) -> Result<ConstraintMap> {
        let conn = self.connect(config)?;
        let mut stmt = conn
            .prepare(
                r#"SELECT name, "notnull", dflt_value FROM pragma_table_info(?1)"#,
            )
            .map_err(CoreError::query_failed)?;

        let rows = stmt
            .query_map([unit], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })
            .map_err(CoreError::query_failed)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(CoreError::query_failed)?;

        let mut constraints = ConstraintMap::new();
        for (name, not_null, default) in rows {
            let mut facts = BTreeMap::new();
            facts.insert(
                "nullable".to_string(),
                serde_json::Value::Bool(not_null == 0),
            );
            if let Some(default) = default {
                facts.insert("default".to_string(), serde_json::Value::String(default));
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
        let conn = self.connect(config)?;
        let columns = fetch_columns(&conn, unit)?;
        if columns.is_empty() {
            return Err(CoreError::not_found(format!("no storage unit {unit}")));
        }

        let dialect = SqliteDialect;
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

        let mut stmt = conn
            .prepare(&statement.sql)
            .map_err(CoreError::query_failed)?;
        let column_count = stmt.column_count();
        let mut rows = Vec::new();
        let mut fetched = stmt
            .query(params_from_iter(params))
            .map_err(CoreError::query_failed)?;
        while let Some(row) = fetched.next().map_err(CoreError::query_failed)? {
            rows.push(render_row(row, column_count));
        }

        Ok(Rows { columns, rows })
    }

    fn raw_execute(&self, config: &PluginConfig, sql: &str) -> Result<Rows> {
        let conn = self.connect(config)?;
        let mut stmt = conn.prepare(sql).map_err(CoreError::query_failed)?;

        // Statements without a result shape (DDL, mutations) execute and
        // return the empty mutation shape.
        if stmt.column_count() == 0 {
            stmt.execute([]).map_err(CoreError::query_failed)?;
            return Ok(Rows::empty());
        }

        let columns: Vec<Column> = (0..stmt.column_count())
            .map(|i| {
                let name = stmt.column_name(i).unwrap_or("?").to_string();
                Column::new(name, "TEXT")
            })
            .collect();

        let column_count = columns.len();
        let mut rows = Vec::new();
        let mut fetched = stmt.query([]).map_err(CoreError::query_failed)?;
        while let Some(row) = fetched.next().map_err(CoreError::query_failed)? {
            rows.push(render_row(row, column_count));
        }

        Ok(Rows { columns, rows })
    }

    fn add_storage_unit(
        &self,
        config: &PluginConfig,
        schema: &str,
        unit: &str,
        fields: &[Record],
    ) -> Result<()> {
        let dialect = SqliteDialect;
        let table = dialect.qualified_table(schema, unit);
        let sql = builder::build_create_table(&dialect, &table, fields)?;

        let conn = self.connect(config)?;
        conn.execute_batch(&sql).map_err(CoreError::query_failed)
    }

    fn add_row(
        &self,
        config: &PluginConfig,
        schema: &str,
        unit: &str,
        values: &[Record],
    ) -> Result<()> {
        let conn = self.connect(config)?;
        let columns = fetch_columns(&conn, unit)?;

        let dialect = SqliteDialect;
        let table = dialect.qualified_table(schema, unit);
        let statement = builder::build_insert(&dialect, &table, values)?;
        let params = bind_records(&columns, values)?;

        conn.execute(&statement.sql, params_from_iter(params))
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
        let conn = self.connect(config)?;
        let columns = fetch_columns(&conn, unit)?;
        let pk_columns: Vec<String> = columns
            .iter()
            .filter(|c| c.is_primary)
            .map(|c| c.name.clone())
            .collect();

        let dialect = SqliteDialect;
        let table = dialect.qualified_table(schema, unit);
        let statement = builder::build_update(&dialect, &table, values, &pk_columns)?;

        let (keys, sets): (Vec<&Record>, Vec<&Record>) =
            values.iter().partition(|r| pk_columns.contains(&r.key));
        let ordered: Vec<Record> = sets.into_iter().chain(keys).cloned().collect();
        let params = bind_records(&columns, &ordered)?;

        let affected = conn
            .execute(&statement.sql, params_from_iter(params))
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
        let conn = self.connect(config)?;
        let columns = fetch_columns(&conn, unit)?;

        let dialect = SqliteDialect;
        let table = dialect.qualified_table(schema, unit);
        let statement = builder::build_delete(&dialect, &table, predicate, false)?;
        let params = bind_records(&columns, predicate)?;

        conn.execute(&statement.sql, params_from_iter(params))
            .map_err(CoreError::query_failed)?;
        Ok(())
    }

    fn get_graph(&self, config: &PluginConfig, schema: &str) -> Result<Vec<GraphUnit>> {
        let units = self.get_storage_units(config, schema)?;
        let conn = self.connect(config)?;

        let mut relations: HashMap<String, Vec<GraphRelation>> = HashMap::new();
        for unit in &units {
            let mut stmt = conn
                .prepare(r#"SELECT "table" FROM pragma_foreign_key_list(?1)"#)
                .map_err(CoreError::query_failed)?;
            let targets = stmt
                .query_map([unit.name.as_str()], |row| row.get::<_, String>(0))
                .map_err(CoreError::query_failed)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(CoreError::query_failed)?;

            for target in targets {
                relations
                    .entry(unit.name.clone())
                    .or_default()
                    .push(GraphRelation {
                        name: target.clone(),
                        relation: RelationType::ManyToOne,
                    });
                relations.entry(target).or_default().push(GraphRelation {
                    name: unit.name.clone(),
                    relation: RelationType::OneToMany,
                });
            }
        }

        Ok(units
            .into_iter()
            .map(|unit| {
                let relations = relations.remove(&unit.name).unwrap_or_default();
                GraphUnit { unit, relations }
            })
            .collect())
    }

    fn get_ssl_status(&self, _config: &PluginConfig) -> Result<SslStatus> {
        // File-based database: there is no transport to secure.
        Ok(SslStatus {
            is_enabled: false,
            mode: "disabled".to_string(),
        })
    }

    fn form_table_name(&self, schema: &str, unit: &str) -> String {
        SqliteDialect.qualified_table(schema, unit)
    }

    fn placeholder(&self, index: usize) -> String {
        SqliteDialect.placeholder(index)
    }
}

fn fetch_columns(conn: &Connection, unit: &str) -> Result<Vec<Column>> {
    let mut stmt = conn
        .prepare(r"SELECT name, type, pk FROM pragma_table_info(?1)")
        .map_err(CoreError::query_failed)?;

    let mut columns: Vec<Column> = stmt
        .query_map([unit], |row| {
            let name: String = row.get(0)?;
            let declared: String = row.get(1)?;
            let pk: i64 = row.get(2)?;
            Ok((name, declared, pk))
        })
        .map_err(CoreError::query_failed)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(CoreError::query_failed)?
        .into_iter()
        .map(|(name, declared, pk)| {
            let mut column = Column::new(name, METADATA.normalize_type(&declared));
            column.is_primary = pk > 0;
            column
        })
        .collect();

    let mut fk_stmt = conn
        .prepare(r#"SELECT "from", "table", "to" FROM pragma_foreign_key_list(?1)"#)
        .map_err(CoreError::query_failed)?;
    let fks = fk_stmt
        .query_map([unit], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })
        .map_err(CoreError::query_failed)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(CoreError::query_failed)?;

    for (from, table, to) in fks {
        if let Some(column) = columns.iter_mut().find(|c| c.name == from) {
            column.is_foreign = true;
            column.referenced_table = Some(table);
            column.referenced_column = to;
        }
    }

    Ok(columns)
}

fn render_row(row: &rusqlite::Row<'_>, column_count: usize) -> Vec<String> {
    (0..column_count)
        .map(|i| match row.get_ref(i) {
            Ok(ValueRef::Null) => String::new(),
            Ok(ValueRef::Integer(v)) => v.to_string(),
            Ok(ValueRef::Real(v)) => format::format_float(v),
            Ok(ValueRef::Text(bytes)) => String::from_utf8_lossy(bytes).to_string(),
            Ok(ValueRef::Blob(bytes)) => format::format_bytes(bytes),
            Err(_) => String::new(),
        })
        .collect()
}

fn bind_param(declared: &str, raw: &str) -> Result<SqliteValue> {
    if raw.is_empty() {
        return Ok(SqliteValue::Null);
    }
    match METADATA.category_of(declared) {
        TypeCategory::Numeric => {
            if let Ok(i) = raw.parse::<i64>() {
                return Ok(SqliteValue::Integer(i));
            }
            if let Ok(f) = raw.parse::<f64>() {
                return Ok(SqliteValue::Real(f));
            }
            Err(CoreError::bad_request(format!(
                "invalid numeric value: {raw}"
            )))
        }
        TypeCategory::Boolean => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(SqliteValue::Integer(1)),
            "false" | "0" => Ok(SqliteValue::Integer(0)),
            other => Err(CoreError::bad_request(format!(
                "invalid boolean value: {other}"
            ))),
        },
        _ => Ok(SqliteValue::Text(raw.to_string())),
    }
}

fn bind_records(columns: &[Column], records: &[Record]) -> Result<Vec<SqliteValue>> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use whodb_core::{AdvancedOptions, Credentials};

    fn config_for(path: &str) -> PluginConfig {
        PluginConfig::new(Credentials {
            database_type: DatabaseType::Sqlite,
            hostname: String::new(),
            username: String::new(),
            password: String::new(),
            database: path.to_string(),
            is_profile: false,
            advanced: AdvancedOptions::new(),
        })
    }

    fn seeded_db(dir: &tempfile::TempDir) -> PluginConfig {
        let path = dir.path().join("test.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            r"CREATE TABLE artists (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
              CREATE TABLE albums (
                  id INTEGER PRIMARY KEY,
                  title TEXT,
                  artist_id INTEGER REFERENCES artists(id)
              );
              INSERT INTO artists (id, name) VALUES (1, 'Holst'), (2, 'Bartok');
              INSERT INTO albums (id, title, artist_id) VALUES (1, 'The Planets', 1);",
        )
        .unwrap();
        config_for(path.to_str().unwrap())
    }

    #[test]
    fn schemas_are_unsupported() {
        let plugin = SqlitePlugin::new();
        let dir = tempfile::tempdir().unwrap();
        let config = seeded_db(&dir);
        assert!(matches!(
            plugin.get_all_schemas(&config).unwrap_err(),
            CoreError::Unsupported(_)
        ));
    }

    #[test]
    fn storage_units_report_type_and_count() {
        let plugin = SqlitePlugin::new();
        let dir = tempfile::tempdir().unwrap();
        let config = seeded_db(&dir);

        let units = plugin.get_storage_units(&config, "").unwrap();
        let artists = units.iter().find(|u| u.name == "artists").unwrap();
        assert_eq!(artists.attribute("Type"), Some("TABLE"));
        assert_eq!(artists.attribute("Count"), Some("2"));
    }

    #[test]
    fn columns_carry_primary_and_foreign_keys() {
        let plugin = SqlitePlugin::new();
        let dir = tempfile::tempdir().unwrap();
        let config = seeded_db(&dir);

        let columns = plugin.get_columns(&config, "", "albums").unwrap();
        let id = columns.iter().find(|c| c.name == "id").unwrap();
        assert!(id.is_primary);

        let artist_id = columns.iter().find(|c| c.name == "artist_id").unwrap();
        assert!(artist_id.is_foreign);
        assert_eq!(artist_id.referenced_table.as_deref(), Some("artists"));
    }

    #[test]
    fn get_rows_pages_and_filters() {
        let plugin = SqlitePlugin::new();
        let dir = tempfile::tempdir().unwrap();
        let config = seeded_db(&dir);

        let all = plugin
            .get_rows(&config, "", "artists", None, &[], 10, 0)
            .unwrap();
        assert_eq!(all.rows.len(), 2);

        let filtered = plugin
            .get_rows(
                &config,
                "",
                "artists",
                Some(&WhereCondition::eq("name", "Holst")),
                &[],
                10,
                0,
            )
            .unwrap();
        assert_eq!(filtered.rows.len(), 1);
        assert_eq!(filtered.rows[0][1], "Holst");
    }

    #[test]
    fn raw_execute_distinguishes_reads_from_mutations() {
        let plugin = SqlitePlugin::new();
        let dir = tempfile::tempdir().unwrap();
        let config = seeded_db(&dir);

        let read = plugin
            .raw_execute(&config, "SELECT name FROM artists ORDER BY name")
            .unwrap();
        assert_eq!(read.rows, vec![vec!["Bartok"], vec!["Holst"]]);

        let mutation = plugin
            .raw_execute(&config, "INSERT INTO artists (id, name) VALUES (3, 'Ives')")
            .unwrap();
        assert_eq!(mutation.columns.len(), 0);
        assert_eq!(mutation.rows.len(), 0);
    }

    #[test]
    fn crud_round_trip() {
        let plugin = SqlitePlugin::new();
        let dir = tempfile::tempdir().unwrap();
        let config = seeded_db(&dir);

        plugin
            .add_row(
                &config,
                "",
                "artists",
                &[Record::new("id", "3"), Record::new("name", "Ives")],
            )
            .unwrap();

        plugin
            .update_row(
                &config,
                "",
                "artists",
                &[Record::new("id", "3"), Record::new("name", "Charles Ives")],
            )
            .unwrap();

        let rows = plugin
            .get_rows(
                &config,
                "",
                "artists",
                Some(&WhereCondition::eq("id", "3")),
                &[],
                10,
                0,
            )
            .unwrap();
        assert_eq!(rows.rows[0][1], "Charles Ives");

        plugin
            .delete_row(&config, "", "artists", &[Record::new("id", "3")])
            .unwrap();
        let rows = plugin
            .get_rows(&config, "", "artists", None, &[], 10, 0)
            .unwrap();
        assert_eq!(rows.rows.len(), 2);
    }

    #[test]
    fn delete_without_predicate_is_rejected() {
        let plugin = SqlitePlugin::new();
        let dir = tempfile::tempdir().unwrap();
        let config = seeded_db(&dir);
        assert!(plugin.delete_row(&config, "", "artists", &[]).is_err());
    }
}
