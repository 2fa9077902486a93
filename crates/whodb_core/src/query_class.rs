//! Light statement classification for the security policy layer.
//!
//! This is deliberately not a SQL parser: it strips comments, finds the
//! first keyword, and counts top-level statement separators, all while
//! respecting quoted regions. Policy decisions build on these primitives.

/// Statement class derived from the first non-comment keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementType {
    Select,
    With,
    Insert,
    Update,
    Delete,
    Create,
    Alter,
    Drop,
    Truncate,
    Show,
    Describe,
    Explain,
    Other,
}

impl StatementType {
    /// Read-only classes: the only ones permitted under read-only policy.
    pub fn is_read(&self) -> bool {
        matches!(
            self,
            StatementType::Select
                | StatementType::With
                | StatementType::Show
                | StatementType::Describe
                | StatementType::Explain
        )
    }

    /// Classes gated behind the explicit destructive-DDL flag.
    pub fn is_destructive_ddl(&self) -> bool {
        matches!(self, StatementType::Drop | StatementType::Truncate)
    }

    pub fn name(&self) -> &'static str {
        match self {
            StatementType::Select => "SELECT",
            StatementType::With => "WITH",
            StatementType::Insert => "INSERT",
            StatementType::Update => "UPDATE",
            StatementType::Delete => "DELETE",
            StatementType::Create => "CREATE",
            StatementType::Alter => "ALTER",
            StatementType::Drop => "DROP",
            StatementType::Truncate => "TRUNCATE",
            StatementType::Show => "SHOW",
            StatementType::Describe => "DESCRIBE",
            StatementType::Explain => "EXPLAIN",
            StatementType::Other => "OTHER",
        }
    }
}

/// Classifies a statement by its first non-comment keyword.
pub fn classify(sql: &str) -> StatementType {
    let stripped = strip_comments(sql);
    let Some(keyword) = first_keyword(&stripped) else {
        return StatementType::Other;
    };

    match keyword.as_str() {
        "SELECT" => StatementType::Select,
        "WITH" => StatementType::With,
        "INSERT" | "REPLACE" => StatementType::Insert,
        "UPDATE" => StatementType::Update,
        "DELETE" => StatementType::Delete,
        "CREATE" => StatementType::Create,
        "ALTER" => StatementType::Alter,
        "DROP" => StatementType::Drop,
        "TRUNCATE" => StatementType::Truncate,
        "SHOW" => StatementType::Show,
        "DESC" | "DESCRIBE" => StatementType::Describe,
        "EXPLAIN" => StatementType::Explain,
        _ => StatementType::Other,
    }
}

/// Counts top-level `;`-separated statements, ignoring separators inside
/// quotes and comments and a trailing empty segment.
pub fn statement_count(sql: &str) -> usize {
    let stripped = strip_comments(sql);
    let mut count = 0;
    let mut segment_has_content = false;
    let mut state = ScanState::Normal;
    let chars: Vec<char> = stripped.chars().collect();
    let mut index = 0;

    while index < chars.len() {
        let current = chars[index];
        let next = chars.get(index + 1).copied();

        match state {
            ScanState::Normal => {
                if current == '\'' {
                    state = ScanState::SingleQuote;
                    segment_has_content = true;
                } else if current == '"' {
                    state = ScanState::DoubleQuote;
                    segment_has_content = true;
                } else if current == ';' {
                    if segment_has_content {
                        count += 1;
                    }
                    segment_has_content = false;
                } else if !current.is_whitespace() {
                    segment_has_content = true;
                }
            }
            ScanState::SingleQuote => {
                if current == '\'' {
                    if next == Some('\'') {
                        index += 1;
                    } else {
                        state = ScanState::Normal;
                    }
                }
            }
            ScanState::DoubleQuote => {
                if current == '"' {
                    if next == Some('"') {
                        index += 1;
                    } else {
                        state = ScanState::Normal;
                    }
                }
            }
            ScanState::LineComment | ScanState::BlockComment => {}
        }

        index += 1;
    }

    if segment_has_content {
        count += 1;
    }
    count
}

/// Detects a DELETE statement with no WHERE clause at the top level.
pub fn delete_without_where(sql: &str) -> bool {
    if classify(sql) != StatementType::Delete {
        return false;
    }
    let stripped = strip_comments(sql);
    !contains_top_level_keyword(&stripped, "WHERE")
}

fn contains_top_level_keyword(sql: &str, keyword: &str) -> bool {
    let mut state = ScanState::Normal;
    let chars: Vec<char> = sql.chars().collect();
    let upper: Vec<char> = sql.to_ascii_uppercase().chars().collect();
    let needle: Vec<char> = keyword.chars().collect();
    let mut index = 0;

    while index < chars.len() {
        let current = chars[index];
        let next = chars.get(index + 1).copied();

        match state {
            ScanState::Normal => {
                if current == '\'' {
                    state = ScanState::SingleQuote;
                } else if current == '"' {
                    state = ScanState::DoubleQuote;
                } else if upper[index..].starts_with(&needle) {
                    let before_ok = index == 0 || !chars[index - 1].is_ascii_alphanumeric();
                    let after = chars.get(index + needle.len());
                    let after_ok = after.is_none_or(|c| !c.is_ascii_alphanumeric());
                    if before_ok && after_ok {
                        return true;
                    }
                }
            }
            ScanState::SingleQuote => {
                if current == '\'' {
                    if next == Some('\'') {
                        index += 1;
                    } else {
                        state = ScanState::Normal;
                    }
                }
            }
            ScanState::DoubleQuote => {
                if current == '"' {
                    if next == Some('"') {
                        index += 1;
                    } else {
                        state = ScanState::Normal;
                    }
                }
            }
            ScanState::LineComment | ScanState::BlockComment => {}
        }

        index += 1;
    }

    false
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScanState {
    Normal,
    LineComment,
    BlockComment,
    SingleQuote,
    DoubleQuote,
}

/// Removes `--`, `#`, and `/* */` comments while leaving quoted regions
/// intact. Quote characters inside literals never open or close comments.
pub fn strip_comments(sql: &str) -> String {
    let chars: Vec<char> = sql.chars().collect();
    let mut result = String::with_capacity(sql.len());
    let mut index = 0;
    let mut state = ScanState::Normal;

    while index < chars.len() {
        let current = chars[index];
        let next = chars.get(index + 1).copied();

        match state {
            ScanState::Normal => {
                if current == '-' && next == Some('-') {
                    state = ScanState::LineComment;
                    index += 2;
                    continue;
                }

                if current == '#' {
                    state = ScanState::LineComment;
                    index += 1;
                    continue;
                }

                if current == '/' && next == Some('*') {
                    state = ScanState::BlockComment;
                    index += 2;
                    continue;
                }

                if current == '\'' {
                    state = ScanState::SingleQuote;
                } else if current == '"' {
                    state = ScanState::DoubleQuote;
                }

                result.push(current);
                index += 1;
            }

            ScanState::LineComment => {
                if current == '\n' {
                    result.push('\n');
                    state = ScanState::Normal;
                }
                index += 1;
            }

            ScanState::BlockComment => {
                if current == '*' && next == Some('/') {
                    state = ScanState::Normal;
                    index += 2;
                } else {
                    index += 1;
                }
            }

            ScanState::SingleQuote => {
                result.push(current);

                if current == '\'' {
                    if next == Some('\'') {
                        result.push('\'');
                        index += 2;
                        continue;
                    }
                    state = ScanState::Normal;
                }

                index += 1;
            }

            ScanState::DoubleQuote => {
                result.push(current);

                if current == '"' {
                    if next == Some('"') {
                        result.push('"');
                        index += 2;
                        continue;
                    }
                    state = ScanState::Normal;
                }

                index += 1;
            }
        }
    }

    result
}

fn first_keyword(sql: &str) -> Option<String> {
    sql.split_whitespace()
        .map(|part| part.trim_start_matches(|c: char| !c.is_ascii_alphabetic()))
        .find(|part| !part.is_empty())
        .map(|part| {
            part.chars()
                .take_while(|ch| ch.is_ascii_alphabetic())
                .collect::<String>()
                .to_ascii_uppercase()
        })
        .filter(|word| !word.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_read_statements() {
        assert_eq!(classify("SELECT * FROM users"), StatementType::Select);
        assert_eq!(
            classify("with cte as (select 1) select * from cte"),
            StatementType::With
        );
        assert_eq!(classify("SHOW TABLES"), StatementType::Show);
        assert_eq!(classify("DESC users"), StatementType::Describe);
        assert_eq!(classify("EXPLAIN SELECT 1"), StatementType::Explain);
        for sql in ["SELECT 1", "WITH x AS (SELECT 1) SELECT * FROM x"] {
            assert!(classify(sql).is_read(), "{sql} should classify as read");
        }
    }

    #[test]
    fn classifies_write_statements() {
        assert_eq!(classify("INSERT INTO t VALUES (1)"), StatementType::Insert);
        assert_eq!(classify("UPDATE t SET a = 1"), StatementType::Update);
        assert_eq!(classify("DELETE FROM t"), StatementType::Delete);
        assert_eq!(classify("DROP TABLE t"), StatementType::Drop);
        assert_eq!(classify("TRUNCATE t"), StatementType::Truncate);
        assert!(!classify("DELETE FROM t").is_read());
    }

    #[test]
    fn comments_do_not_affect_classification() {
        assert_eq!(
            classify("-- note\nSELECT * FROM users"),
            StatementType::Select
        );
        assert_eq!(
            classify("/* note */ DELETE FROM users"),
            StatementType::Delete
        );
        assert_eq!(classify("# note\nSHOW TABLES"), StatementType::Show);
    }

    #[test]
    fn delete_is_only_reported_when_first_keyword() {
        assert_eq!(
            classify("SELECT * FROM log WHERE action = 'DELETE'"),
            StatementType::Select
        );
    }

    #[test]
    fn counts_top_level_statements() {
        assert_eq!(statement_count("SELECT 1"), 1);
        assert_eq!(statement_count("SELECT 1;"), 1);
        assert_eq!(statement_count("SELECT 1; SELECT 2"), 2);
        assert_eq!(statement_count("SELECT ';'; SELECT 2"), 2);
        assert_eq!(statement_count("SELECT 1 -- ; SELECT 2"), 1);
    }

    #[test]
    fn detects_unpredicated_delete() {
        assert!(delete_without_where("DELETE FROM users"));
        assert!(!delete_without_where("DELETE FROM users WHERE id = 5"));
        assert!(delete_without_where(
            "DELETE FROM audit -- WHERE id = 5\n"
        ));
        assert!(!delete_without_where("SELECT * FROM users"));
    }

    #[test]
    fn quoted_separators_are_not_statement_breaks() {
        assert_eq!(statement_count(r#"SELECT "a;b" FROM t"#), 1);
        assert_eq!(statement_count("SELECT 'it''s; fine'"), 1);
    }
}
