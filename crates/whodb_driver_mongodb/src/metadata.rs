use std::collections::BTreeMap;
use std::sync::LazyLock;
use whodb_core::{DatabaseMetadata, DatabaseType, OperatorSet, TypeCategory, TypeDefinition};

/// BSON element types as the column palette. Operators are the comparison
/// subset that translates onto query operators (`$eq`, `$gt`, ...).
pub static METADATA: LazyLock<DatabaseMetadata> = LazyLock::new(|| DatabaseMetadata {
    database_type: DatabaseType::MongoDb,
    type_definitions: vec![
        TypeDefinition::simple("String", "String", TypeCategory::Text),
        TypeDefinition::simple("Int32", "Int32", TypeCategory::Numeric),
        TypeDefinition::simple("Int64", "Int64", TypeCategory::Numeric),
        TypeDefinition::simple("Double", "Double", TypeCategory::Numeric),
        TypeDefinition::simple("Decimal128", "Decimal128", TypeCategory::Numeric),
        TypeDefinition::simple("Boolean", "Boolean", TypeCategory::Boolean),
        TypeDefinition::simple("Date", "Date", TypeCategory::DateTime),
        TypeDefinition::simple("Timestamp", "Timestamp", TypeCategory::DateTime),
        TypeDefinition::simple("ObjectId", "ObjectId", TypeCategory::Other),
        TypeDefinition::simple("Array", "Array", TypeCategory::Json),
        TypeDefinition::simple("Object", "Object", TypeCategory::Json),
        TypeDefinition::simple("Binary", "Binary", TypeCategory::Other),
        TypeDefinition::simple("Null", "Null", TypeCategory::Other),
    ],
    operators: OperatorSet::from_pairs(&[
        ("=", "$eq"),
        ("!=", "$ne"),
        (">", "$gt"),
        (">=", "$gte"),
        ("<", "$lt"),
        ("<=", "$lte"),
    ]),
    alias_map: alias_map(),
});

fn alias_map() -> BTreeMap<String, String> {
    [
        ("string", "String"),
        ("int", "Int32"),
        ("int32", "Int32"),
        ("long", "Int64"),
        ("int64", "Int64"),
        ("double", "Double"),
        ("decimal", "Decimal128"),
        ("bool", "Boolean"),
        ("boolean", "Boolean"),
        ("date", "Date"),
        ("timestamp", "Timestamp"),
        ("objectid", "ObjectId"),
        ("array", "Array"),
        ("object", "Object"),
        ("bindata", "Binary"),
        ("null", "Null"),
    ]
    .into_iter()
    .map(|(alias, canonical)| (alias.to_string(), canonical.to_string()))
    .collect()
}
