use std::collections::BTreeMap;
use std::sync::LazyLock;
use whodb_core::{DatabaseMetadata, DatabaseType, OperatorSet, TypeCategory, TypeDefinition};

/// Redis value kinds as the type palette. Filtering happens client-side on
/// rendered rows, so only equality is offered.
pub static METADATA: LazyLock<DatabaseMetadata> = LazyLock::new(|| DatabaseMetadata {
    database_type: DatabaseType::Redis,
    type_definitions: vec![
        TypeDefinition::simple("string", "String", TypeCategory::Text),
        TypeDefinition::simple("hash", "Hash", TypeCategory::Other),
        TypeDefinition::simple("list", "List", TypeCategory::Other),
        TypeDefinition::simple("set", "Set", TypeCategory::Other),
        TypeDefinition::simple("zset", "Sorted Set", TypeCategory::Other),
        TypeDefinition::simple("stream", "Stream", TypeCategory::Other),
    ],
    operators: OperatorSet::from_pairs(&[("=", "=")]),
    alias_map: BTreeMap::new(),
});
