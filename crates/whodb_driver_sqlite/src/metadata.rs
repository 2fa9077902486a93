use std::collections::BTreeMap;
use std::sync::LazyLock;
use whodb_core::{DatabaseMetadata, DatabaseType, OperatorSet, TypeCategory, TypeDefinition};

pub static METADATA: LazyLock<DatabaseMetadata> = LazyLock::new(|| DatabaseMetadata {
    database_type: DatabaseType::Sqlite,
    type_definitions: vec![
        TypeDefinition::simple("INTEGER", "Integer", TypeCategory::Numeric),
        TypeDefinition::simple("REAL", "Real", TypeCategory::Numeric),
        TypeDefinition::simple("NUMERIC", "Numeric", TypeCategory::Numeric),
        TypeDefinition::simple("TEXT", "Text", TypeCategory::Text),
        TypeDefinition::simple("BLOB", "Blob", TypeCategory::Other),
        TypeDefinition::simple("BOOLEAN", "Boolean", TypeCategory::Boolean),
        TypeDefinition::simple("DATE", "Date", TypeCategory::DateTime),
        TypeDefinition::simple("DATETIME", "Datetime", TypeCategory::DateTime),
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
    // SQLite's type affinity rules collapse most declared types onto a
    // handful of storage classes.
    [
        ("int", "INTEGER"),
        ("integer", "INTEGER"),
        ("tinyint", "INTEGER"),
        ("smallint", "INTEGER"),
        ("mediumint", "INTEGER"),
        ("bigint", "INTEGER"),
        ("real", "REAL"),
        ("double", "REAL"),
        ("double precision", "REAL"),
        ("float", "REAL"),
        ("numeric", "NUMERIC"),
        ("decimal", "NUMERIC"),
        ("text", "TEXT"),
        ("varchar", "TEXT"),
        ("character", "TEXT"),
        ("nvarchar", "TEXT"),
        ("clob", "TEXT"),
        ("blob", "BLOB"),
        ("bool", "BOOLEAN"),
        ("boolean", "BOOLEAN"),
        ("date", "DATE"),
        ("datetime", "DATETIME"),
        ("timestamp", "DATETIME"),
    ]
    .into_iter()
    .map(|(alias, canonical)| (alias.to_string(), canonical.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affinity_aliases_normalize() {
        assert_eq!(METADATA.normalize_type("varchar(40)"), "TEXT");
        assert_eq!(METADATA.normalize_type("BIGINT"), "INTEGER");
        assert_eq!(METADATA.normalize_type("bool"), "BOOLEAN");
    }
}
