use crate::Record;
use serde::{Deserialize, Serialize};

/// Column descriptor in a result set or a table catalog.
///
/// `column_type` is the plugin's canonical type string after alias
/// normalization; it is the join key between UI metadata and scanner
/// selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub is_foreign: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_column: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            is_primary: false,
            is_foreign: false,
            referenced_table: None,
            referenced_column: None,
        }
    }
}

/// Uniform result shape for every engine.
///
/// All cells are pre-formatted strings; formatting is a plugin
/// responsibility. The empty string denotes NULL across all engines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rows {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
}

impl Rows {
    /// Zero columns, zero rows: the mutation success shape.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Caps the row list in place, returning whether anything was dropped.
    /// Applied at the server boundary after fetch; the query is unchanged.
    pub fn truncate_rows(&mut self, cap: usize) -> bool {
        if self.rows.len() > cap {
            self.rows.truncate(cap);
            true
        } else {
            false
        }
    }
}

/// A catalog object holding rows: table, view, collection, index, or key
/// depending on the engine. Attributes are ordered display facts with
/// dialect-specific keys (`Type`, `Total Size`, `Count`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageUnit {
    pub name: String,
    pub attributes: Vec<Record>,
}

impl StorageUnit {
    pub fn new(name: impl Into<String>, attributes: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|r| r.key == key)
            .map(|r| r.value.as_str())
    }
}

/// Cardinality of a relation edge, derived from the foreign-key catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationType {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphRelation {
    pub name: String,
    pub relation: RelationType,
}

/// One node of the schema graph: a storage unit plus its outgoing
/// relations. Engines without foreign keys emit units with empty relation
/// lists (the trivial one-node-per-table graph).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphUnit {
    pub unit: StorageUnit,
    pub relations: Vec<GraphRelation>,
}

/// Live TLS state of a connection, probed from the server when the dialect
/// exposes it and derived from config otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SslStatus {
    pub is_enabled: bool,
    pub mode: String,
}

/// One turn of a plugin-mediated chat exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub kind: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Rows>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_rows_reports_dropped() {
        let mut rows = Rows {
            columns: vec![Column::new("n", "INTEGER")],
            rows: (0..5).map(|i| vec![i.to_string()]).collect(),
        };
        assert!(rows.truncate_rows(3));
        assert_eq!(rows.row_count(), 3);
        assert!(!rows.truncate_rows(3));
    }
}
