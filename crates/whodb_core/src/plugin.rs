use crate::{
    ChatMessage, Column, CoreError, DatabaseMetadata, DatabaseType, GraphUnit, PluginConfig,
    Record, Result, Rows, SslStatus, StorageUnit, Value,
};
use std::collections::BTreeMap;

/// Constraint facts per column: `nullable`, `default`, `check_values`,
/// `length`, `precision`, `scale`. Values are JSON so booleans and lists
/// keep their shape.
pub type ConstraintMap = BTreeMap<String, BTreeMap<String, serde_json::Value>>;

/// Filter tree applied to `get_rows`. Leaves reference a column, an
/// operator from the plugin's `OperatorSet`, and a literal; literals are
/// always bound as parameters, never inlined.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereCondition {
    Atom {
        column: String,
        operator: String,
        value: String,
    },
    And(Vec<WhereCondition>),
    Or(Vec<WhereCondition>),
}

impl WhereCondition {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        WhereCondition::Atom {
            column: column.into(),
            operator: "=".to_string(),
            value: value.into(),
        }
    }

    /// Leaves in pre-order: the same order `compile` emits placeholders,
    /// so drivers can pair each bound parameter with its column.
    pub fn atoms(&self) -> Vec<(&str, &str)> {
        let mut out = Vec::new();
        self.collect_atoms(&mut out);
        out
    }

    fn collect_atoms<'a>(&'a self, out: &mut Vec<(&'a str, &'a str)>) {
        match self {
            WhereCondition::Atom { column, value, .. } => out.push((column, value)),
            WhereCondition::And(children) | WhereCondition::Or(children) => {
                for child in children {
                    child.collect_atoms(out);
                }
            }
        }
    }
}

/// Sort key for `get_rows`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

/// Capability contract every database driver satisfies.
///
/// Plugins are stateless per invocation: each call receives a
/// `PluginConfig` and opens a fresh driver session (or borrows from the
/// driver's own pool). Implementations must be `Send + Sync`; callers
/// bridge to async with `spawn_blocking`.
///
/// Engines that cannot express an operation return
/// `CoreError::Unsupported`, which the defaults here already do for the
/// optional capabilities.
pub trait Plugin: Send + Sync {
    fn database_type(&self) -> DatabaseType;

    /// Type palette, operator table, and alias map for this engine.
    fn metadata(&self) -> &DatabaseMetadata;

    /// Cheap reachability check (ping).
    fn is_available(&self, config: &PluginConfig) -> bool;

    /// Lists schemas, or databases for engines that treat databases as
    /// schemas. Schema-less engines fail with `Unsupported`.
    fn get_all_schemas(&self, config: &PluginConfig) -> Result<Vec<String>>;

    fn get_storage_units(&self, config: &PluginConfig, schema: &str) -> Result<Vec<StorageUnit>>;

    fn get_columns(&self, config: &PluginConfig, schema: &str, unit: &str) -> Result<Vec<Column>>;

    fn get_column_constraints(
        &self,
        _config: &PluginConfig,
        _schema: &str,
        _unit: &str,
    ) -> Result<ConstraintMap> {
        Ok(ConstraintMap::new())
    }

    #[allow(clippy::too_many_arguments)]
    fn get_rows(
        &self,
        config: &PluginConfig,
        schema: &str,
        unit: &str,
        filter: Option<&WhereCondition>,
        order_by: &[OrderBy],
        page_size: u32,
        page_offset: u64,
    ) -> Result<Rows>;

    fn raw_execute(&self, config: &PluginConfig, sql: &str) -> Result<Rows>;

    fn raw_execute_with_params(
        &self,
        _config: &PluginConfig,
        _sql: &str,
        _params: &[String],
    ) -> Result<Rows> {
        Err(CoreError::unsupported(
            "parameterized execution is not supported by this engine",
        ))
    }

    /// Creates a storage unit from `(name, type)` field definitions.
    fn add_storage_unit(
        &self,
        _config: &PluginConfig,
        _schema: &str,
        _unit: &str,
        _fields: &[Record],
    ) -> Result<()> {
        Err(CoreError::unsupported(
            "creating storage units is not supported by this engine",
        ))
    }

    fn add_row(
        &self,
        _config: &PluginConfig,
        _schema: &str,
        _unit: &str,
        _values: &[Record],
    ) -> Result<()> {
        Err(CoreError::unsupported(
            "inserting rows is not supported by this engine",
        ))
    }

    /// Updates one row identified by its primary-key columns.
    fn update_row(
        &self,
        _config: &PluginConfig,
        _schema: &str,
        _unit: &str,
        _values: &[Record],
    ) -> Result<()> {
        Err(CoreError::unsupported(
            "updating rows is not supported by this engine",
        ))
    }

    /// Deletes rows matching the predicate values. An empty predicate is
    /// rejected unless the engine explicitly supports unbounded deletes.
    fn delete_row(
        &self,
        _config: &PluginConfig,
        _schema: &str,
        _unit: &str,
        _predicate: &[Record],
    ) -> Result<()> {
        Err(CoreError::unsupported(
            "deleting rows is not supported by this engine",
        ))
    }

    /// Schema graph derived from the foreign-key catalog. Engines without
    /// foreign keys return one node per unit with no relations.
    fn get_graph(&self, config: &PluginConfig, schema: &str) -> Result<Vec<GraphUnit>> {
        let units = self.get_storage_units(config, schema)?;
        Ok(units
            .into_iter()
            .map(|unit| GraphUnit {
                unit,
                relations: Vec::new(),
            })
            .collect())
    }

    fn get_ssl_status(&self, config: &PluginConfig) -> Result<SslStatus>;

    /// Dialect-quoted `schema.unit` join. SQLite emits the bare name;
    /// ClickHouse joins without quoting.
    fn form_table_name(&self, schema: &str, unit: &str) -> String;

    /// Positional placeholder for the 1-based parameter index
    /// (`$N` for Postgres, `?` elsewhere).
    fn placeholder(&self, index: usize) -> String;

    /// Coerces a user-entered string into a typed value according to the
    /// declared column type, for parameter binding.
    fn convert_string_value(&self, value: &str, declared_type: &str) -> Result<Value> {
        Value::parse_as(value, self.metadata().category_of(declared_type))
    }

    fn chat(
        &self,
        _config: &PluginConfig,
        _schema: &str,
        _previous: &[ChatMessage],
        _query: &str,
    ) -> Result<Vec<ChatMessage>> {
        Err(CoreError::unsupported(
            "chat is not supported by this engine",
        ))
    }
}
