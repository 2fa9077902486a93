use crate::DatabaseType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Broad category a column type belongs to. The UI and the value coercion
/// path both branch on this rather than on raw dialect type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeCategory {
    Numeric,
    Text,
    DateTime,
    Boolean,
    Json,
    Other,
}

/// One entry of a plugin's type palette.
#[derive(Debug, Clone, Serialize)]
pub struct TypeDefinition {
    /// Canonical type identifier (e.g. `VARCHAR`, `Int64`).
    pub id: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    pub category: TypeCategory,
    #[serde(default)]
    pub has_length: bool,
    #[serde(default)]
    pub has_precision: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_precision: Option<u32>,
}

impl TypeDefinition {
    pub const fn simple(id: &'static str, label: &'static str, category: TypeCategory) -> Self {
        Self {
            id,
            label,
            category,
            has_length: false,
            has_precision: false,
            default_length: None,
            default_precision: None,
        }
    }

    pub const fn with_length(
        id: &'static str,
        label: &'static str,
        category: TypeCategory,
        default_length: u32,
    ) -> Self {
        Self {
            id,
            label,
            category,
            has_length: true,
            has_precision: false,
            default_length: Some(default_length),
            default_precision: None,
        }
    }

    pub const fn with_precision(
        id: &'static str,
        label: &'static str,
        category: TypeCategory,
        default_precision: u32,
    ) -> Self {
        Self {
            id,
            label,
            category,
            has_length: false,
            has_precision: true,
            default_length: None,
            default_precision: Some(default_precision),
        }
    }
}

/// Ordered operator table for WHERE compilation. Maps the operator the
/// caller supplies to the SQL fragment the dialect emits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperatorSet(Vec<(String, String)>);

impl OperatorSet {
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(op, sql)| (op.to_string(), sql.to_string()))
                .collect(),
        )
    }

    pub fn sql_for(&self, operator: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(op, _)| op == operator)
            .map(|(_, sql)| sql.as_str())
    }

    pub fn is_allowed(&self, operator: &str) -> bool {
        self.sql_for(operator).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(op, _)| op.as_str())
    }
}

/// Single source of truth about a plugin's type system, consumed by the UI
/// and the MCP catalog tools.
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseMetadata {
    pub database_type: DatabaseType,
    pub type_definitions: Vec<TypeDefinition>,
    pub operators: OperatorSet,
    /// Dialect spellings mapped to canonical type ids.
    pub alias_map: BTreeMap<String, String>,
}

impl DatabaseMetadata {
    /// Canonicalizes a dialect type name.
    ///
    /// Aliases map to their canonical id; canonical ids map to themselves;
    /// unknown names pass through upper-cased parameter-stripped so the
    /// caller can still display them.
    pub fn normalize_type(&self, raw: &str) -> String {
        let base = strip_type_params(raw);
        if let Some(canonical) = self.alias_map.get(&base.to_ascii_lowercase()) {
            return canonical.clone();
        }
        if let Some(def) = self
            .type_definitions
            .iter()
            .find(|d| d.id.eq_ignore_ascii_case(&base))
        {
            return def.id.to_string();
        }
        base
    }

    /// Whether a (normalized) type name is part of the palette.
    pub fn covers_type(&self, raw: &str) -> bool {
        let normalized = self.normalize_type(raw);
        self.type_definitions.iter().any(|d| d.id == normalized)
    }

    pub fn category_of(&self, raw: &str) -> TypeCategory {
        let normalized = self.normalize_type(raw);
        self.type_definitions
            .iter()
            .find(|d| d.id == normalized)
            .map(|d| d.category)
            .unwrap_or(TypeCategory::Other)
    }
}

/// Drops a trailing parameter list: `VARCHAR(255)` -> `VARCHAR`.
fn strip_type_params(raw: &str) -> String {
    match raw.find('(') {
        Some(idx) => raw[..idx].trim().to_string(),
        None => raw.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DatabaseMetadata {
        let mut alias_map = BTreeMap::new();
        alias_map.insert("int4".to_string(), "INTEGER".to_string());
        alias_map.insert("int".to_string(), "INTEGER".to_string());
        alias_map.insert("character varying".to_string(), "VARCHAR".to_string());
        DatabaseMetadata {
            database_type: DatabaseType::Postgres,
            type_definitions: vec![
                TypeDefinition::simple("INTEGER", "Integer", TypeCategory::Numeric),
                TypeDefinition::with_length("VARCHAR", "Varchar", TypeCategory::Text, 255),
            ],
            operators: OperatorSet::from_pairs(&[("=", "="), (">", ">")]),
            alias_map,
        }
    }

    #[test]
    fn aliases_normalize_to_canonical() {
        let meta = sample();
        assert_eq!(meta.normalize_type("int4"), "INTEGER");
        assert_eq!(meta.normalize_type("character varying"), "VARCHAR");
    }

    #[test]
    fn canonical_forms_are_fixed_points() {
        let meta = sample();
        for def in &meta.type_definitions {
            assert_eq!(meta.normalize_type(def.id), def.id);
        }
        // Second application changes nothing.
        assert_eq!(
            meta.normalize_type(&meta.normalize_type("int4")),
            "INTEGER"
        );
    }

    #[test]
    fn parameters_are_stripped_before_lookup() {
        let meta = sample();
        assert_eq!(meta.normalize_type("VARCHAR(64)"), "VARCHAR");
        assert!(meta.covers_type("VARCHAR(64)"));
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let meta = sample();
        assert!(meta.operators.is_allowed("="));
        assert!(!meta.operators.is_allowed("LIKE"));
    }
}
