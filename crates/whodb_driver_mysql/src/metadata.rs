use std::collections::BTreeMap;
use std::sync::LazyLock;
use whodb_core::{DatabaseMetadata, DatabaseType, OperatorSet, TypeCategory, TypeDefinition};

/// MySQL and MariaDB share one palette; the plugin reports the metadata
/// under whichever kind it was registered as.
pub static METADATA: LazyLock<DatabaseMetadata> = LazyLock::new(|| DatabaseMetadata {
    database_type: DatabaseType::MySql,
    type_definitions: vec![
        TypeDefinition::simple("TINYINT", "Tiny Integer", TypeCategory::Numeric),
        TypeDefinition::simple("SMALLINT", "Small Integer", TypeCategory::Numeric),
        TypeDefinition::simple("MEDIUMINT", "Medium Integer", TypeCategory::Numeric),
        TypeDefinition::simple("INT", "Integer", TypeCategory::Numeric),
        TypeDefinition::simple("BIGINT", "Big Integer", TypeCategory::Numeric),
        TypeDefinition::with_precision("DECIMAL", "Decimal", TypeCategory::Numeric, 10),
        TypeDefinition::simple("FLOAT", "Float", TypeCategory::Numeric),
        TypeDefinition::simple("DOUBLE", "Double", TypeCategory::Numeric),
        TypeDefinition::with_length("VARCHAR", "Varchar", TypeCategory::Text, 255),
        TypeDefinition::with_length("CHAR", "Char", TypeCategory::Text, 1),
        TypeDefinition::simple("TEXT", "Text", TypeCategory::Text),
        TypeDefinition::simple("MEDIUMTEXT", "Medium Text", TypeCategory::Text),
        TypeDefinition::simple("LONGTEXT", "Long Text", TypeCategory::Text),
        TypeDefinition::simple("BOOLEAN", "Boolean", TypeCategory::Boolean),
        TypeDefinition::simple("DATE", "Date", TypeCategory::DateTime),
        TypeDefinition::simple("TIME", "Time", TypeCategory::DateTime),
        TypeDefinition::simple("DATETIME", "Datetime", TypeCategory::DateTime),
        TypeDefinition::simple("TIMESTAMP", "Timestamp", TypeCategory::DateTime),
        TypeDefinition::simple("YEAR", "Year", TypeCategory::Numeric),
        TypeDefinition::simple("JSON", "JSON", TypeCategory::Json),
        TypeDefinition::simple("BLOB", "Blob", TypeCategory::Other),
        TypeDefinition::simple("MEDIUMBLOB", "Medium Blob", TypeCategory::Other),
        TypeDefinition::simple("LONGBLOB", "Long Blob", TypeCategory::Other),
        TypeDefinition::with_length("BINARY", "Binary", TypeCategory::Other, 1),
        TypeDefinition::with_length("VARBINARY", "Varbinary", TypeCategory::Other, 255),
        TypeDefinition::simple("ENUM", "Enum", TypeCategory::Text),
        TypeDefinition::simple("SET", "Set", TypeCategory::Text),
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
    ]),
    alias_map: alias_map(),
});

fn alias_map() -> BTreeMap<String, String> {
    [
        ("tinyint", "TINYINT"),
        ("bool", "BOOLEAN"),
        ("smallint", "SMALLINT"),
        ("mediumint", "MEDIUMINT"),
        ("int", "INT"),
        ("integer", "INT"),
        ("bigint", "BIGINT"),
        ("decimal", "DECIMAL"),
        ("numeric", "DECIMAL"),
        ("dec", "DECIMAL"),
        ("float", "FLOAT"),
        ("double", "DOUBLE"),
        ("double precision", "DOUBLE"),
        ("real", "DOUBLE"),
        ("varchar", "VARCHAR"),
        ("char", "CHAR"),
        ("text", "TEXT"),
        ("tinytext", "TEXT"),
        ("mediumtext", "MEDIUMTEXT"),
        ("longtext", "LONGTEXT"),
        ("date", "DATE"),
        ("time", "TIME"),
        ("datetime", "DATETIME"),
        ("timestamp", "TIMESTAMP"),
        ("year", "YEAR"),
        ("json", "JSON"),
        ("blob", "BLOB"),
        ("tinyblob", "BLOB"),
        ("mediumblob", "MEDIUMBLOB"),
        ("longblob", "LONGBLOB"),
        ("binary", "BINARY"),
        ("varbinary", "VARBINARY"),
        ("enum", "ENUM"),
        ("set", "SET"),
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
    fn column_type_spellings_normalize() {
        assert_eq!(METADATA.normalize_type("varchar(255)"), "VARCHAR");
        assert_eq!(METADATA.normalize_type("enum('a','b')"), "ENUM");
        assert_eq!(METADATA.normalize_type("bool"), "BOOLEAN");
    }
}
