use std::collections::BTreeMap;
use std::sync::LazyLock;
use whodb_core::{DatabaseMetadata, DatabaseType, OperatorSet, TypeCategory, TypeDefinition};

pub static METADATA: LazyLock<DatabaseMetadata> = LazyLock::new(|| DatabaseMetadata {
    database_type: DatabaseType::Postgres,
    type_definitions: vec![
        TypeDefinition::simple("SMALLINT", "Small Integer", TypeCategory::Numeric),
        TypeDefinition::simple("INTEGER", "Integer", TypeCategory::Numeric),
        TypeDefinition::simple("BIGINT", "Big Integer", TypeCategory::Numeric),
        TypeDefinition::with_precision("NUMERIC", "Numeric", TypeCategory::Numeric, 10),
        TypeDefinition::simple("REAL", "Real", TypeCategory::Numeric),
        TypeDefinition::simple("DOUBLE PRECISION", "Double Precision", TypeCategory::Numeric),
        TypeDefinition::simple("SERIAL", "Serial", TypeCategory::Numeric),
        TypeDefinition::simple("BIGSERIAL", "Big Serial", TypeCategory::Numeric),
        TypeDefinition::with_length("VARCHAR", "Varchar", TypeCategory::Text, 255),
        TypeDefinition::with_length("CHAR", "Char", TypeCategory::Text, 1),
        TypeDefinition::simple("TEXT", "Text", TypeCategory::Text),
        TypeDefinition::simple("BOOLEAN", "Boolean", TypeCategory::Boolean),
        TypeDefinition::simple("DATE", "Date", TypeCategory::DateTime),
        TypeDefinition::simple("TIME", "Time", TypeCategory::DateTime),
        TypeDefinition::simple("TIMESTAMP", "Timestamp", TypeCategory::DateTime),
        TypeDefinition::simple("TIMESTAMPTZ", "Timestamp With Time Zone", TypeCategory::DateTime),
        TypeDefinition::simple("INTERVAL", "Interval", TypeCategory::Other),
        TypeDefinition::simple("UUID", "UUID", TypeCategory::Other),
        TypeDefinition::simple("JSON", "JSON", TypeCategory::Json),
        TypeDefinition::simple("JSONB", "JSONB", TypeCategory::Json),
        TypeDefinition::simple("BYTEA", "Bytea", TypeCategory::Other),
        TypeDefinition::simple("INET", "Inet", TypeCategory::Other),
        TypeDefinition::simple("CIDR", "Cidr", TypeCategory::Other),
        TypeDefinition::simple("MACADDR", "Macaddr", TypeCategory::Other),
        TypeDefinition::simple("USER-DEFINED", "User Defined", TypeCategory::Other),
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
        ("int2", "SMALLINT"),
        ("smallint", "SMALLINT"),
        ("int", "INTEGER"),
        ("int4", "INTEGER"),
        ("integer", "INTEGER"),
        ("int8", "BIGINT"),
        ("bigint", "BIGINT"),
        ("serial", "SERIAL"),
        ("serial4", "SERIAL"),
        ("serial8", "BIGSERIAL"),
        ("bigserial", "BIGSERIAL"),
        ("decimal", "NUMERIC"),
        ("numeric", "NUMERIC"),
        ("float4", "REAL"),
        ("real", "REAL"),
        ("float8", "DOUBLE PRECISION"),
        ("double precision", "DOUBLE PRECISION"),
        ("character varying", "VARCHAR"),
        ("varchar", "VARCHAR"),
        ("character", "CHAR"),
        ("bpchar", "CHAR"),
        ("char", "CHAR"),
        ("text", "TEXT"),
        ("bool", "BOOLEAN"),
        ("boolean", "BOOLEAN"),
        ("date", "DATE"),
        ("time", "TIME"),
        ("time without time zone", "TIME"),
        ("timestamp", "TIMESTAMP"),
        ("timestamp without time zone", "TIMESTAMP"),
        ("timestamptz", "TIMESTAMPTZ"),
        ("timestamp with time zone", "TIMESTAMPTZ"),
        ("interval", "INTERVAL"),
        ("uuid", "UUID"),
        ("json", "JSON"),
        ("jsonb", "JSONB"),
        ("bytea", "BYTEA"),
        ("inet", "INET"),
        ("cidr", "CIDR"),
        ("macaddr", "MACADDR"),
    ]
    .into_iter()
    .map(|(alias, canonical)| (alias.to_string(), canonical.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_alias_lands_on_a_defined_type() {
        for canonical in METADATA.alias_map.values() {
            assert!(
                METADATA.type_definitions.iter().any(|d| d.id == canonical),
                "alias target {canonical} missing from type definitions"
            );
        }
    }

    #[test]
    fn catalog_spellings_normalize() {
        assert_eq!(METADATA.normalize_type("character varying"), "VARCHAR");
        assert_eq!(METADATA.normalize_type("int4"), "INTEGER");
        assert_eq!(
            METADATA.normalize_type("timestamp with time zone"),
            "TIMESTAMPTZ"
        );
        assert!(METADATA.covers_type("numeric(10,2)"));
    }
}
