use crate::metadata::OperatorSet;
use crate::plugin::{OrderBy, WhereCondition};
use crate::sql::dialect::SqlDialect;
use crate::{CoreError, Record, Result};

/// A statement ready to hand to a driver: SQL text plus the literals to
/// bind, in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundStatement {
    pub sql: String,
    pub params: Vec<String>,
}

/// Builds a paginated SELECT over one table.
///
/// Identifiers pass through the dialect's quoting; filter literals become
/// placeholders. `columns` may be empty for `SELECT *`.
#[allow(clippy::too_many_arguments)]
pub fn build_select(
    dialect: &dyn SqlDialect,
    table: &str,
    columns: &[String],
    filter: Option<&WhereCondition>,
    operators: &OperatorSet,
    order_by: &[OrderBy],
    limit: u32,
    offset: u64,
) -> Result<BoundStatement> {
    let select_list = if columns.is_empty() {
        "*".to_string()
    } else {
        columns
            .iter()
            .map(|c| dialect.quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut sql = format!("SELECT {select_list} FROM {table}");
    let mut params = Vec::new();

    if let Some(condition) = filter {
        let compiled = condition.compile(dialect, operators, 1)?;
        sql.push_str(" WHERE ");
        sql.push_str(&compiled.sql);
        params = compiled.params;
    }

    if !order_by.is_empty() {
        let keys = order_by
            .iter()
            .map(|o| {
                format!(
                    "{}{}",
                    dialect.quote_identifier(&o.column),
                    if o.descending { " DESC" } else { "" }
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        sql.push_str(" ORDER BY ");
        sql.push_str(&keys);
    }

    sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));

    Ok(BoundStatement { sql, params })
}

/// Composes `INSERT INTO t (c, ...) VALUES (?, ...)`.
pub fn build_insert(
    dialect: &dyn SqlDialect,
    table: &str,
    values: &[Record],
) -> Result<BoundStatement> {
    if values.is_empty() {
        return Err(CoreError::bad_request("insert requires at least one value"));
    }

    let columns = values
        .iter()
        .map(|r| dialect.quote_identifier(&r.key))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=values.len())
        .map(|i| dialect.placeholder(i))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(BoundStatement {
        sql: format!("INSERT INTO {table} ({columns}) VALUES ({placeholders})"),
        params: values.iter().map(|r| r.value.clone()).collect(),
    })
}

/// Composes an UPDATE predicated on primary-key equality.
///
/// `pk_columns` must be non-empty: a table without a primary key cannot be
/// updated through this path. Values whose key is a primary-key column form
/// the predicate; the rest form the SET list.
pub fn build_update(
    dialect: &dyn SqlDialect,
    table: &str,
    values: &[Record],
    pk_columns: &[String],
) -> Result<BoundStatement> {
    if pk_columns.is_empty() {
        return Err(CoreError::bad_request(
            "table has no primary key; update is not possible",
        ));
    }

    let (keys, sets): (Vec<&Record>, Vec<&Record>) = values
        .iter()
        .partition(|r| pk_columns.contains(&r.key));

    if keys.len() != pk_columns.len() {
        return Err(CoreError::bad_request(
            "update requires a value for every primary-key column",
        ));
    }
    if sets.is_empty() {
        return Err(CoreError::bad_request("update has no columns to set"));
    }

    let mut params = Vec::with_capacity(values.len());
    let mut index = 1;

    let set_list = sets
        .iter()
        .map(|r| {
            let clause = format!(
                "{} = {}",
                dialect.quote_identifier(&r.key),
                dialect.placeholder(index)
            );
            params.push(r.value.clone());
            index += 1;
            clause
        })
        .collect::<Vec<_>>()
        .join(", ");

    let predicate = keys
        .iter()
        .map(|r| {
            let clause = format!(
                "{} = {}",
                dialect.quote_identifier(&r.key),
                dialect.placeholder(index)
            );
            params.push(r.value.clone());
            index += 1;
            clause
        })
        .collect::<Vec<_>>()
        .join(" AND ");

    Ok(BoundStatement {
        sql: format!("UPDATE {table} SET {set_list} WHERE {predicate}"),
        params,
    })
}

/// Composes a DELETE with an equality predicate.
///
/// An empty predicate would delete every row; it is rejected unless the
/// caller explicitly forces an unbounded delete.
pub fn build_delete(
    dialect: &dyn SqlDialect,
    table: &str,
    predicate: &[Record],
    force_unbounded: bool,
) -> Result<BoundStatement> {
    if predicate.is_empty() {
        if !force_unbounded {
            return Err(CoreError::bad_request(
                "delete without a predicate is not allowed",
            ));
        }
        return Ok(BoundStatement {
            sql: format!("DELETE FROM {table}"),
            params: Vec::new(),
        });
    }

    let mut params = Vec::with_capacity(predicate.len());
    let clause = predicate
        .iter()
        .enumerate()
        .map(|(i, r)| {
            params.push(r.value.clone());
            format!(
                "{} = {}",
                dialect.quote_identifier(&r.key),
                dialect.placeholder(i + 1)
            )
        })
        .collect::<Vec<_>>()
        .join(" AND ");

    Ok(BoundStatement {
        sql: format!("DELETE FROM {table} WHERE {clause}"),
        params,
    })
}

/// Composes `CREATE TABLE t (col type, ...)` from `(name, type)` field
/// records. Types come from the plugin's own palette, so they are emitted
/// verbatim; names are quoted.
pub fn build_create_table(
    dialect: &dyn SqlDialect,
    table: &str,
    fields: &[Record],
) -> Result<String> {
    if fields.is_empty() {
        return Err(CoreError::bad_request(
            "create table requires at least one column",
        ));
    }
    let columns = fields
        .iter()
        .map(|r| format!("{} {}", dialect.quote_identifier(&r.key), r.value))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("CREATE TABLE {table} ({columns})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::dialect::{MySqlDialect, PostgresDialect};

    fn operators() -> OperatorSet {
        OperatorSet::from_pairs(&[("=", "=")])
    }

    #[test]
    fn select_with_filter_and_paging() {
        let stmt = build_select(
            &PostgresDialect,
            r#""public"."users""#,
            &[],
            Some(&WhereCondition::eq("id", "5")),
            &operators(),
            &[OrderBy {
                column: "name".to_string(),
                descending: true,
            }],
            25,
            50,
        )
        .unwrap();
        assert_eq!(
            stmt.sql,
            r#"SELECT * FROM "public"."users" WHERE "id" = $1 ORDER BY "name" DESC LIMIT 25 OFFSET 50"#
        );
        assert_eq!(stmt.params, vec!["5"]);
    }

    #[test]
    fn insert_uses_dialect_placeholders() {
        let stmt = build_insert(
            &MySqlDialect,
            "`app`.`users`",
            &[Record::new("id", "1"), Record::new("name", "alice")],
        )
        .unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO `app`.`users` (`id`, `name`) VALUES (?, ?)"
        );
        assert_eq!(stmt.params, vec!["1", "alice"]);
    }

    #[test]
    fn update_partitions_pk_from_set_columns() {
        let stmt = build_update(
            &PostgresDialect,
            r#""public"."users""#,
            &[
                Record::new("id", "5"),
                Record::new("name", "bob"),
                Record::new("age", "41"),
            ],
            &["id".to_string()],
        )
        .unwrap();
        assert_eq!(
            stmt.sql,
            r#"UPDATE "public"."users" SET "name" = $1, "age" = $2 WHERE "id" = $3"#
        );
        assert_eq!(stmt.params, vec!["bob", "41", "5"]);
    }

    #[test]
    fn update_without_pk_fails() {
        let err = build_update(
            &PostgresDialect,
            "t",
            &[Record::new("name", "bob")],
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::BadRequest(_)));
    }

    #[test]
    fn unbounded_delete_requires_force() {
        assert!(build_delete(&PostgresDialect, "t", &[], false).is_err());
        let stmt = build_delete(&PostgresDialect, "t", &[], true).unwrap();
        assert_eq!(stmt.sql, "DELETE FROM t");
    }
}
