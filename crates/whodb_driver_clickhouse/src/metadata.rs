use std::collections::BTreeMap;
use std::sync::LazyLock;
use whodb_core::{DatabaseMetadata, DatabaseType, OperatorSet, TypeCategory, TypeDefinition};

/// Base scalar palette. Compound types (`Array(T)`, `Tuple(..)`,
/// `Map(K, V)`, wrappers) compose over these and keep their full spelling
/// as the canonical column type.
pub static METADATA: LazyLock<DatabaseMetadata> = LazyLock::new(|| DatabaseMetadata {
    database_type: DatabaseType::ClickHouse,
    type_definitions: vec![
        TypeDefinition::simple("Int8", "Int8", TypeCategory::Numeric),
        TypeDefinition::simple("Int16", "Int16", TypeCategory::Numeric),
        TypeDefinition::simple("Int32", "Int32", TypeCategory::Numeric),
        TypeDefinition::simple("Int64", "Int64", TypeCategory::Numeric),
        TypeDefinition::simple("Int128", "Int128", TypeCategory::Numeric),
        TypeDefinition::simple("Int256", "Int256", TypeCategory::Numeric),
        TypeDefinition::simple("UInt8", "UInt8", TypeCategory::Numeric),
        TypeDefinition::simple("UInt16", "UInt16", TypeCategory::Numeric),
        TypeDefinition::simple("UInt32", "UInt32", TypeCategory::Numeric),
        TypeDefinition::simple("UInt64", "UInt64", TypeCategory::Numeric),
        TypeDefinition::simple("UInt128", "UInt128", TypeCategory::Numeric),
        TypeDefinition::simple("UInt256", "UInt256", TypeCategory::Numeric),
        TypeDefinition::simple("Float32", "Float32", TypeCategory::Numeric),
        TypeDefinition::simple("Float64", "Float64", TypeCategory::Numeric),
        TypeDefinition::with_precision("Decimal", "Decimal", TypeCategory::Numeric, 10),
        TypeDefinition::simple("Bool", "Bool", TypeCategory::Boolean),
        TypeDefinition::simple("String", "String", TypeCategory::Text),
        TypeDefinition::with_length("FixedString", "FixedString", TypeCategory::Text, 16),
        TypeDefinition::simple("Date", "Date", TypeCategory::DateTime),
        TypeDefinition::simple("Date32", "Date32", TypeCategory::DateTime),
        TypeDefinition::simple("DateTime", "DateTime", TypeCategory::DateTime),
        TypeDefinition::with_precision("DateTime64", "DateTime64", TypeCategory::DateTime, 3),
        TypeDefinition::simple("UUID", "UUID", TypeCategory::Other),
        TypeDefinition::simple("IPv4", "IPv4", TypeCategory::Other),
        TypeDefinition::simple("IPv6", "IPv6", TypeCategory::Other),
        TypeDefinition::simple("Enum8", "Enum8", TypeCategory::Text),
        TypeDefinition::simple("Enum16", "Enum16", TypeCategory::Text),
        TypeDefinition::simple("JSON", "JSON", TypeCategory::Json),
    ],
    operators: OperatorSet::from_pairs(&[
        ("=", "="),
        ("!=", "!="),
        ("<>", "<>"),
        ("<", "<"),
        ("<=", "<="),
        (">", ">"),
        (">=", ">="),
        ("LIKE", "LIKE"),
        ("NOT LIKE", "NOT LIKE"),
        ("ILIKE", "ILIKE"),
    ]),
    alias_map: alias_map(),
});

fn alias_map() -> BTreeMap<String, String> {
    [
        ("int8", "Int8"),
        ("int16", "Int16"),
        ("int32", "Int32"),
        ("int64", "Int64"),
        ("uint8", "UInt8"),
        ("uint16", "UInt16"),
        ("uint32", "UInt32"),
        ("uint64", "UInt64"),
        ("float32", "Float32"),
        ("float64", "Float64"),
        ("decimal", "Decimal"),
        ("decimal32", "Decimal"),
        ("decimal64", "Decimal"),
        ("decimal128", "Decimal"),
        ("decimal256", "Decimal"),
        ("bool", "Bool"),
        ("boolean", "Bool"),
        ("string", "String"),
        ("fixedstring", "FixedString"),
        ("date", "Date"),
        ("date32", "Date32"),
        ("datetime", "DateTime"),
        ("datetime64", "DateTime64"),
        ("uuid", "UUID"),
        ("ipv4", "IPv4"),
        ("ipv6", "IPv6"),
        ("enum8", "Enum8"),
        ("enum16", "Enum16"),
        ("json", "JSON"),
    ]
    .into_iter()
    .map(|(alias, canonical)| (alias.to_string(), canonical.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_spellings_normalize() {
        assert_eq!(METADATA.normalize_type("int64"), "Int64");
        assert_eq!(METADATA.normalize_type("Decimal64(4)"), "Decimal");
        assert_eq!(METADATA.normalize_type("DateTime64(3)"), "DateTime64");
    }
}
