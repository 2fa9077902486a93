use std::collections::BTreeMap;
use std::sync::LazyLock;
use whodb_core::{DatabaseMetadata, DatabaseType, OperatorSet, TypeCategory, TypeDefinition};

pub static METADATA: LazyLock<DatabaseMetadata> = LazyLock::new(|| DatabaseMetadata {
    database_type: DatabaseType::ElasticSearch,
    type_definitions: vec![
        TypeDefinition::simple("text", "Text", TypeCategory::Text),
        TypeDefinition::simple("keyword", "Keyword", TypeCategory::Text),
        TypeDefinition::simple("long", "Long", TypeCategory::Numeric),
        TypeDefinition::simple("integer", "Integer", TypeCategory::Numeric),
        TypeDefinition::simple("short", "Short", TypeCategory::Numeric),
        TypeDefinition::simple("byte", "Byte", TypeCategory::Numeric),
        TypeDefinition::simple("double", "Double", TypeCategory::Numeric),
        TypeDefinition::simple("float", "Float", TypeCategory::Numeric),
        TypeDefinition::simple("half_float", "Half Float", TypeCategory::Numeric),
        TypeDefinition::simple("scaled_float", "Scaled Float", TypeCategory::Numeric),
        TypeDefinition::simple("boolean", "Boolean", TypeCategory::Boolean),
        TypeDefinition::simple("date", "Date", TypeCategory::DateTime),
        TypeDefinition::simple("object", "Object", TypeCategory::Json),
        TypeDefinition::simple("nested", "Nested", TypeCategory::Json),
        TypeDefinition::simple("ip", "IP", TypeCategory::Other),
        TypeDefinition::simple("geo_point", "Geo Point", TypeCategory::Other),
        TypeDefinition::simple("binary", "Binary", TypeCategory::Other),
    ],
    operators: OperatorSet::from_pairs(&[
        ("=", "term"),
        ("!=", "must_not"),
        (">", "gt"),
        (">=", "gte"),
        ("<", "lt"),
        ("<=", "lte"),
    ]),
    alias_map: BTreeMap::new(),
});
