use crate::metadata::OperatorSet;
use crate::plugin::WhereCondition;
use crate::sql::dialect::SqlDialect;
use crate::{CoreError, Result};

/// Compiled filter: SQL fragment plus the literals to bind, in placeholder
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledWhere {
    pub sql: String,
    pub params: Vec<String>,
}

impl WhereCondition {
    /// Compiles the condition tree into a parameterized SQL fragment.
    ///
    /// Operators must come from the plugin's operator table; anything else
    /// is a `BadRequest`. Literals are emitted as placeholders only.
    /// `next_index` is the 1-based index of the first placeholder, letting
    /// callers append the fragment after earlier parameters.
    pub fn compile(
        &self,
        dialect: &dyn SqlDialect,
        operators: &OperatorSet,
        next_index: usize,
    ) -> Result<CompiledWhere> {
        let mut params = Vec::new();
        let sql = compile_node(self, dialect, operators, next_index, &mut params)?;
        Ok(CompiledWhere { sql, params })
    }
}

fn compile_node(
    node: &WhereCondition,
    dialect: &dyn SqlDialect,
    operators: &OperatorSet,
    next_index: usize,
    params: &mut Vec<String>,
) -> Result<String> {
    match node {
        WhereCondition::Atom {
            column,
            operator,
            value,
        } => {
            let Some(sql_op) = operators.sql_for(operator) else {
                return Err(CoreError::bad_request(format!(
                    "unknown operator: {operator}"
                )));
            };
            let placeholder = dialect.placeholder(next_index + params.len());
            params.push(value.clone());
            Ok(format!(
                "{} {} {}",
                dialect.quote_identifier(column),
                sql_op,
                placeholder
            ))
        }
        WhereCondition::And(children) => join_children(children, "AND", dialect, operators, next_index, params),
        WhereCondition::Or(children) => join_children(children, "OR", dialect, operators, next_index, params),
    }
}

fn join_children(
    children: &[WhereCondition],
    joiner: &str,
    dialect: &dyn SqlDialect,
    operators: &OperatorSet,
    next_index: usize,
    params: &mut Vec<String>,
) -> Result<String> {
    if children.is_empty() {
        return Err(CoreError::bad_request("empty condition group"));
    }
    let mut parts = Vec::with_capacity(children.len());
    for child in children {
        parts.push(compile_node(child, dialect, operators, next_index, params)?);
    }
    Ok(format!("({})", parts.join(&format!(" {joiner} "))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::dialect::{MySqlDialect, PostgresDialect};

    fn operators() -> OperatorSet {
        OperatorSet::from_pairs(&[("=", "="), (">", ">"), ("LIKE", "LIKE")])
    }

    #[test]
    fn atom_compiles_to_placeholder() {
        let condition = WhereCondition::eq("name", "alice");
        let compiled = condition
            .compile(&PostgresDialect, &operators(), 1)
            .unwrap();
        assert_eq!(compiled.sql, r#""name" = $1"#);
        assert_eq!(compiled.params, vec!["alice"]);
    }

    #[test]
    fn nested_tree_preserves_parameter_order() {
        let condition = WhereCondition::And(vec![
            WhereCondition::eq("a", "1"),
            WhereCondition::Or(vec![
                WhereCondition::Atom {
                    column: "b".to_string(),
                    operator: ">".to_string(),
                    value: "2".to_string(),
                },
                WhereCondition::eq("c", "3"),
            ]),
        ]);
        let compiled = condition
            .compile(&PostgresDialect, &operators(), 1)
            .unwrap();
        assert_eq!(compiled.sql, r#"("a" = $1 AND ("b" > $2 OR "c" = $3))"#);
        assert_eq!(compiled.params, vec!["1", "2", "3"]);
    }

    #[test]
    fn offset_shifts_placeholder_numbering() {
        let condition = WhereCondition::eq("a", "x");
        let compiled = condition
            .compile(&PostgresDialect, &operators(), 3)
            .unwrap();
        assert_eq!(compiled.sql, r#""a" = $3"#);
    }

    #[test]
    fn question_mark_dialects_ignore_numbering() {
        let condition = WhereCondition::eq("a", "x");
        let compiled = condition.compile(&MySqlDialect, &operators(), 5).unwrap();
        assert_eq!(compiled.sql, "`a` = ?");
    }

    #[test]
    fn unknown_operator_is_bad_request() {
        let condition = WhereCondition::Atom {
            column: "a".to_string(),
            operator: "REGEXP".to_string(),
            value: "x".to_string(),
        };
        assert!(matches!(
            condition
                .compile(&PostgresDialect, &operators(), 1)
                .unwrap_err(),
            CoreError::BadRequest(_)
        ));
    }
}
