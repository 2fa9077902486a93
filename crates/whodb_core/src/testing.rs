//! In-memory fake plugin for manager and server tests.

use crate::{
    Column, CoreError, DatabaseMetadata, DatabaseType, OperatorSet, PluginConfig, Plugin, Result,
    Rows, SslStatus, StorageUnit, TypeCategory, TypeDefinition,
    plugin::{OrderBy, WhereCondition},
};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A configurable plugin that serves canned catalog data and records call
/// counts. An optional artificial delay makes every data call block, which
/// the cancellation and timeout tests rely on.
pub struct FakePlugin {
    database_type: DatabaseType,
    metadata: DatabaseMetadata,
    available: bool,
    delay: Mutex<Duration>,
    schemas: Vec<String>,
    schema_calls: AtomicUsize,
    unit_calls: AtomicUsize,
    column_calls: AtomicUsize,
    execute_calls: AtomicUsize,
}

impl FakePlugin {
    pub fn new(database_type: DatabaseType) -> Self {
        Self {
            database_type,
            metadata: DatabaseMetadata {
                database_type,
                type_definitions: vec![
                    TypeDefinition::simple("INTEGER", "Integer", TypeCategory::Numeric),
                    TypeDefinition::simple("TEXT", "Text", TypeCategory::Text),
                ],
                operators: OperatorSet::from_pairs(&[("=", "="), (">", ">"), ("<", "<")]),
                alias_map: Default::default(),
            },
            available: true,
            delay: Mutex::new(Duration::ZERO),
            schemas: vec!["public".to_string()],
            schema_calls: AtomicUsize::new(0),
            unit_calls: AtomicUsize::new(0),
            column_calls: AtomicUsize::new(0),
            execute_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn schema_calls(&self) -> usize {
        self.schema_calls.load(Ordering::SeqCst)
    }

    pub fn unit_calls(&self) -> usize {
        self.unit_calls.load(Ordering::SeqCst)
    }

    pub fn column_calls(&self) -> usize {
        self.column_calls.load(Ordering::SeqCst)
    }

    pub fn execute_calls(&self) -> usize {
        self.execute_calls.load(Ordering::SeqCst)
    }

    fn block_for_delay(&self) {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

impl Plugin for FakePlugin {
    fn database_type(&self) -> DatabaseType {
        self.database_type
    }

    fn metadata(&self) -> &DatabaseMetadata {
        &self.metadata
    }

    fn is_available(&self, _config: &PluginConfig) -> bool {
        self.available
    }

    fn get_all_schemas(&self, _config: &PluginConfig) -> Result<Vec<String>> {
        self.schema_calls.fetch_add(1, Ordering::SeqCst);
        self.block_for_delay();
        Ok(self.schemas.clone())
    }

    fn get_storage_units(
        &self,
        _config: &PluginConfig,
        _schema: &str,
    ) -> Result<Vec<StorageUnit>> {
        self.unit_calls.fetch_add(1, Ordering::SeqCst);
        self.block_for_delay();
        Ok(vec![StorageUnit::new(
            "users",
            vec![crate::Record::new("Type", "BASE TABLE")],
        )])
    }

    fn get_columns(
        &self,
        _config: &PluginConfig,
        _schema: &str,
        unit: &str,
    ) -> Result<Vec<Column>> {
        self.column_calls.fetch_add(1, Ordering::SeqCst);
        if unit != "users" {
            return Err(CoreError::not_found(format!("no storage unit {unit}")));
        }
        self.block_for_delay();
        let mut id = Column::new("id", "INTEGER");
        id.is_primary = true;
        Ok(vec![id, Column::new("name", "TEXT")])
    }

    fn get_rows(
        &self,
        _config: &PluginConfig,
        _schema: &str,
        _unit: &str,
        _filter: Option<&WhereCondition>,
        _order_by: &[OrderBy],
        page_size: u32,
        page_offset: u64,
    ) -> Result<Rows> {
        self.block_for_delay();
        let rows = (0..3u64)
            .skip(page_offset as usize)
            .take(page_size as usize)
            .map(|i| vec![i.to_string(), format!("user-{i}")])
            .collect();
        Ok(Rows {
            columns: vec![Column::new("id", "INTEGER"), Column::new("name", "TEXT")],
            rows,
        })
    }

    fn raw_execute(&self, _config: &PluginConfig, sql: &str) -> Result<Rows> {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        self.block_for_delay();
        // Three echo rows, so callers can observe row-cap truncation.
        Ok(Rows {
            columns: vec![Column::new("sql", "TEXT")],
            rows: vec![vec![sql.to_string()]; 3],
        })
    }

    fn get_ssl_status(&self, _config: &PluginConfig) -> Result<SslStatus> {
        Ok(SslStatus {
            is_enabled: false,
            mode: "disabled".to_string(),
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
