use crate::{Column, StorageUnit};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Key separator for the columns sub-cache. NUL cannot appear in
/// identifiers, so `schema\x00table` never collides.
const KEY_SEP: char = '\0';

struct Stamped<T> {
    value: T,
    fetched_at: Instant,
}

impl<T: Clone> Stamped<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            fetched_at: Instant::now(),
        }
    }

    fn get(&self, ttl: Duration) -> Option<T> {
        if self.fetched_at.elapsed() <= ttl {
            Some(self.value.clone())
        } else {
            None
        }
    }
}

/// Per-connection TTL cache of catalog metadata.
///
/// Three independent sub-caches: the schema list, per-schema table lists,
/// and per-table column lists. Each is guarded by its own `RwLock`; locks
/// are held only for the map access, never across a plugin call, so two
/// racing fetches for a cold key at worst duplicate one catalog query.
pub struct MetadataCache {
    ttl: Duration,
    schemas: RwLock<Option<Stamped<Vec<String>>>>,
    tables: RwLock<HashMap<String, Stamped<Vec<StorageUnit>>>>,
    columns: RwLock<HashMap<String, Stamped<Vec<Column>>>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            schemas: RwLock::new(None),
            tables: RwLock::new(HashMap::new()),
            columns: RwLock::new(HashMap::new()),
        }
    }

    fn column_key(schema: &str, table: &str) -> String {
        format!("{schema}{KEY_SEP}{table}")
    }

    pub fn get_schemas(&self) -> Option<Vec<String>> {
        self.schemas
            .read()
            .expect("schema cache poisoned")
            .as_ref()
            .and_then(|entry| entry.get(self.ttl))
    }

    pub fn set_schemas(&self, schemas: Vec<String>) {
        *self.schemas.write().expect("schema cache poisoned") = Some(Stamped::new(schemas));
    }

    pub fn get_tables(&self, schema: &str) -> Option<Vec<StorageUnit>> {
        self.tables
            .read()
            .expect("table cache poisoned")
            .get(schema)
            .and_then(|entry| entry.get(self.ttl))
    }

    pub fn set_tables(&self, schema: &str, tables: Vec<StorageUnit>) {
        self.tables
            .write()
            .expect("table cache poisoned")
            .insert(schema.to_string(), Stamped::new(tables));
    }

    pub fn get_columns(&self, schema: &str, table: &str) -> Option<Vec<Column>> {
        self.columns
            .read()
            .expect("column cache poisoned")
            .get(&Self::column_key(schema, table))
            .and_then(|entry| entry.get(self.ttl))
    }

    pub fn set_columns(&self, schema: &str, table: &str, columns: Vec<Column>) {
        self.columns
            .write()
            .expect("column cache poisoned")
            .insert(Self::column_key(schema, table), Stamped::new(columns));
    }

    /// Drops everything. Called on disconnect and on explicit invalidation.
    pub fn clear(&self) {
        *self.schemas.write().expect("schema cache poisoned") = None;
        self.tables.write().expect("table cache poisoned").clear();
        self.columns.write().expect("column cache poisoned").clear();
    }
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips_within_ttl() {
        let cache = MetadataCache::new();
        cache.set_schemas(vec!["public".to_string()]);
        assert_eq!(cache.get_schemas(), Some(vec!["public".to_string()]));

        cache.set_tables("public", vec![StorageUnit::new("users", Vec::new())]);
        let tables = cache.get_tables("public").unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "users");

        cache.set_columns("public", "users", vec![Column::new("id", "INTEGER")]);
        assert_eq!(cache.get_columns("public", "users").unwrap().len(), 1);
    }

    #[test]
    fn clear_resets_all_sub_caches() {
        let cache = MetadataCache::new();
        cache.set_schemas(vec!["public".to_string()]);
        cache.set_tables("public", Vec::new());
        cache.set_columns("public", "users", Vec::new());

        cache.clear();

        assert!(cache.get_schemas().is_none());
        assert!(cache.get_tables("public").is_none());
        assert!(cache.get_columns("public", "users").is_none());
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache = MetadataCache::with_ttl(Duration::ZERO);
        cache.set_schemas(vec!["public".to_string()]);
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get_schemas().is_none());
    }

    #[test]
    fn column_keys_do_not_collide_across_schemas() {
        let cache = MetadataCache::new();
        cache.set_columns("a", "b.c", vec![Column::new("x", "TEXT")]);
        assert!(cache.get_columns("a.b", "c").is_none());
    }
}
