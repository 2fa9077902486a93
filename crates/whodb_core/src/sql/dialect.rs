/// Database-specific SQL syntax: identifier quoting, table qualification,
/// and parameter placeholders.
///
/// All dynamic table and column names flow through `quote_identifier`;
/// user values flow through placeholders exclusively. Nothing in the core
/// ever interpolates either into SQL text.
pub trait SqlDialect: Send + Sync {
    /// Quotes an identifier, doubling any embedded quote characters.
    fn quote_identifier(&self, name: &str) -> String;

    /// Builds the qualified table reference the dialect expects.
    fn qualified_table(&self, schema: &str, table: &str) -> String {
        if schema.is_empty() {
            self.quote_identifier(table)
        } else {
            format!(
                "{}.{}",
                self.quote_identifier(schema),
                self.quote_identifier(table)
            )
        }
    }

    /// Positional placeholder for the 1-based parameter index.
    fn placeholder(&self, index: usize) -> String;

    /// Whether INSERT/UPDATE/DELETE support a RETURNING clause.
    fn supports_returning(&self) -> bool {
        false
    }
}

/// PostgreSQL: `"name"`, `$N` placeholders, RETURNING.
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn supports_returning(&self) -> bool {
        true
    }
}

/// MySQL/MariaDB: `` `name` ``, `?` placeholders.
pub struct MySqlDialect;

impl SqlDialect for MySqlDialect {
    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }
}

/// SQLite: `"name"`, `?` placeholders, no schema prefix.
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn qualified_table(&self, _schema: &str, table: &str) -> String {
        self.quote_identifier(table)
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }
}

/// ClickHouse: backtick quoting for bare identifiers, but the
/// database.table join stays unquoted because the server resolves the
/// database from session context.
pub struct ClickHouseDialect;

impl SqlDialect for ClickHouseDialect {
    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn qualified_table(&self, schema: &str, table: &str) -> String {
        if schema.is_empty() {
            table.to_string()
        } else {
            format!("{schema}.{table}")
        }
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Strips one level of quoting, undoing doubled quote characters.
    fn unquote(quoted: &str, quote: char) -> String {
        let inner = &quoted[1..quoted.len() - 1];
        inner.replace(&format!("{quote}{quote}"), &quote.to_string())
    }

    #[test]
    fn identifiers_round_trip_through_quoting() {
        let cases = ["users", "weird\"name", "with`tick", "sp ace", "mixed\"`"];
        for name in cases {
            assert_eq!(unquote(&PostgresDialect.quote_identifier(name), '"'), name);
            assert_eq!(unquote(&SqliteDialect.quote_identifier(name), '"'), name);
            assert_eq!(unquote(&MySqlDialect.quote_identifier(name), '`'), name);
            assert_eq!(
                unquote(&ClickHouseDialect.quote_identifier(name), '`'),
                name
            );
        }
    }

    #[test]
    fn qualified_tables_follow_dialect_shape() {
        assert_eq!(
            PostgresDialect.qualified_table("public", "users"),
            r#""public"."users""#
        );
        assert_eq!(
            MySqlDialect.qualified_table("app", "users"),
            "`app`.`users`"
        );
        assert_eq!(SqliteDialect.qualified_table("main", "users"), r#""users""#);
        assert_eq!(
            ClickHouseDialect.qualified_table("analytics", "events"),
            "analytics.events"
        );
    }

    #[test]
    fn placeholders_follow_dialect_style() {
        assert_eq!(PostgresDialect.placeholder(2), "$2");
        assert_eq!(MySqlDialect.placeholder(2), "?");
        assert_eq!(SqliteDialect.placeholder(7), "?");
    }
}
