//! SQL security policy: permission mode, multi-statement gate, and
//! validator levels, layered in a fixed order over the core statement
//! classifier.

use crate::options::{PermissionMode, ServerOptions, ValidatorLevel};
use whodb_core::query_class::{self, StatementType};

/// Outcome of validating one statement under the current policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// A write that must be confirmed before execution.
    NeedsConfirmation,
    Reject(String),
}

/// Calls that read files or bridge to the OS. Matched against the
/// comment-stripped, whitespace-normalized statement under the strict
/// validator.
const STRICT_BLOCKLIST: &[&str] = &[
    "pg_read_file",
    "pg_read_binary_file",
    "pg_ls_dir",
    "lo_import",
    "lo_export",
    "from program",
    "load_file",
    "into outfile",
    "into dumpfile",
    "xp_cmdshell",
    "dbms_java",
    "utl_file",
];

/// Validates a statement. Layers apply in order: classification,
/// multi-statement gate, permission mode, destructive-DDL flag, validator
/// level, and finally the write disposition. Rejections name the
/// statement class but never echo the SQL itself.
pub fn validate(sql: &str, options: &ServerOptions) -> Decision {
    let class = query_class::classify(sql);

    if query_class::statement_count(sql) > 1 && !options.allow_multi_statement {
        return Decision::Reject("multi-statement disallowed".to_string());
    }

    if options.is_read_only() && !class.is_read() {
        return Decision::Reject(format!(
            "{} rejected under read-only policy",
            class.name()
        ));
    }

    if class.is_destructive_ddl() && !options.allow_drop {
        return Decision::Reject(format!(
            "{} requires the allow-drop flag",
            class.name()
        ));
    }

    match options.effective_validator() {
        ValidatorLevel::Strict => {
            let normalized = normalize(sql);
            for pattern in STRICT_BLOCKLIST {
                if normalized.contains(pattern) {
                    return Decision::Reject(
                        "statement uses a blocked file or OS function".to_string(),
                    );
                }
            }
        }
        ValidatorLevel::Standard => {}
        ValidatorLevel::Minimal => {
            if query_class::delete_without_where(sql) {
                return Decision::Reject("DELETE without WHERE rejected".to_string());
            }
        }
    }

    if class.is_read() {
        return Decision::Allow;
    }

    match options.permission_mode {
        PermissionMode::AllowWrite => Decision::Allow,
        PermissionMode::ConfirmWrites => Decision::NeedsConfirmation,
        // Read-only modes were handled above; anything that reaches here
        // under them is a logic error, so fail closed.
        PermissionMode::ReadOnly | PermissionMode::SafeMode => {
            Decision::Reject(format!("{} rejected under read-only policy", class.name()))
        }
    }
}

/// A short human-readable summary for confirmation prompts: the statement
/// class plus its apparent target.
pub fn summarize(sql: &str) -> String {
    let class = query_class::classify(sql);
    let stripped = query_class::strip_comments(sql);
    let mut words = stripped.split_whitespace();

    let target = match class {
        StatementType::Insert => keyword_argument(&mut words, "INTO"),
        StatementType::Delete => keyword_argument(&mut words, "FROM"),
        StatementType::Update | StatementType::Drop | StatementType::Truncate
        | StatementType::Create | StatementType::Alter => {
            // Target follows the verb, past any object keyword for DDL.
            let mut found = None;
            for word in stripped.split_whitespace().skip(1) {
                let upper = word.to_ascii_uppercase();
                if matches!(
                    upper.as_str(),
                    "TABLE" | "VIEW" | "INDEX" | "DATABASE" | "SCHEMA" | "IF" | "EXISTS" | "NOT"
                ) {
                    continue;
                }
                found = Some(word.trim_end_matches(';').to_string());
                break;
            }
            found
        }
        _ => None,
    };

    match target {
        Some(target) => format!("{} on {}", class.name(), target),
        None => class.name().to_string(),
    }
}

fn keyword_argument(words: &mut std::str::SplitWhitespace<'_>, keyword: &str) -> Option<String> {
    while let Some(word) = words.next() {
        if word.eq_ignore_ascii_case(keyword) {
            return words.next().map(|w| w.trim_end_matches(';').to_string());
        }
    }
    None
}

fn normalize(sql: &str) -> String {
    query_class::strip_comments(sql)
        .to_ascii_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(mode: PermissionMode, validator: ValidatorLevel) -> ServerOptions {
        ServerOptions {
            permission_mode: mode,
            validator,
            ..ServerOptions::default()
        }
    }

    #[test]
    fn read_only_permits_only_read_classes() {
        let opts = options(PermissionMode::ReadOnly, ValidatorLevel::Standard);
        assert_eq!(validate("SELECT 1", &opts), Decision::Allow);
        assert_eq!(validate("WITH x AS (SELECT 1) SELECT * FROM x", &opts), Decision::Allow);
        assert_eq!(validate("SHOW TABLES", &opts), Decision::Allow);
        assert_eq!(validate("EXPLAIN SELECT 1", &opts), Decision::Allow);
        assert_eq!(validate("DESCRIBE users", &opts), Decision::Allow);

        for sql in [
            "INSERT INTO t VALUES (1)",
            "UPDATE t SET a = 1",
            "DELETE FROM t WHERE id = 1",
            "CREATE TABLE t (a INT)",
            "DROP TABLE t",
            "VACUUM",
        ] {
            assert!(
                matches!(validate(sql, &opts), Decision::Reject(_)),
                "{sql} must be rejected"
            );
        }
    }

    #[test]
    fn confirm_writes_holds_writes_behind_a_token() {
        let opts = options(PermissionMode::ConfirmWrites, ValidatorLevel::Standard);
        assert_eq!(validate("SELECT 1", &opts), Decision::Allow);
        assert_eq!(
            validate("DELETE FROM users WHERE id = 5", &opts),
            Decision::NeedsConfirmation
        );
        assert_eq!(
            validate("INSERT INTO t VALUES (1)", &opts),
            Decision::NeedsConfirmation
        );
    }

    #[test]
    fn allow_write_still_gates_destructive_ddl() {
        let opts = options(PermissionMode::AllowWrite, ValidatorLevel::Standard);
        assert_eq!(validate("UPDATE t SET a = 1", &opts), Decision::Allow);
        assert!(matches!(
            validate("DROP TABLE users", &opts),
            Decision::Reject(_)
        ));
        assert!(matches!(
            validate("TRUNCATE users", &opts),
            Decision::Reject(_)
        ));

        let mut opts = opts;
        opts.allow_drop = true;
        assert_eq!(validate("DROP TABLE users", &opts), Decision::Allow);
    }

    #[test]
    fn multi_statement_is_rejected_by_default() {
        let opts = ServerOptions::default();
        let decision = validate("SELECT 1; SELECT 2", &opts);
        assert_eq!(
            decision,
            Decision::Reject("multi-statement disallowed".to_string())
        );

        let mut opts = ServerOptions::default();
        opts.allow_multi_statement = true;
        assert_eq!(validate("SELECT 1; SELECT 2", &opts), Decision::Allow);
    }

    #[test]
    fn strict_validator_blocks_file_and_os_functions() {
        let opts = options(PermissionMode::AllowWrite, ValidatorLevel::Strict);
        for sql in [
            "SELECT pg_read_file('/etc/passwd')",
            "COPY t FROM PROGRAM 'id'",
            "SELECT LOAD_FILE('/etc/passwd')",
            "SELECT * FROM t INTO OUTFILE '/tmp/x'",
            "EXEC xp_cmdshell 'dir'",
        ] {
            assert!(
                matches!(validate(sql, &opts), Decision::Reject(_)),
                "{sql} must be rejected"
            );
        }
        assert_eq!(validate("SELECT * FROM files", &opts), Decision::Allow);
    }

    #[test]
    fn safe_mode_is_read_only_plus_strict() {
        let opts = options(PermissionMode::SafeMode, ValidatorLevel::Minimal);
        assert!(matches!(
            validate("INSERT INTO t VALUES (1)", &opts),
            Decision::Reject(_)
        ));
        assert!(matches!(
            validate("SELECT pg_read_file('x')", &opts),
            Decision::Reject(_)
        ));
        assert_eq!(validate("SELECT 1", &opts), Decision::Allow);
    }

    #[test]
    fn minimal_validator_rejects_unpredicated_delete() {
        let opts = options(PermissionMode::AllowWrite, ValidatorLevel::Minimal);
        assert!(matches!(
            validate("DELETE FROM users", &opts),
            Decision::Reject(_)
        ));
        assert_eq!(
            validate("DELETE FROM users WHERE id = 1", &opts),
            Decision::Allow
        );
    }

    #[test]
    fn summaries_name_class_and_target() {
        assert_eq!(
            summarize("DELETE FROM users WHERE id = 5"),
            "DELETE on users"
        );
        assert_eq!(summarize("INSERT INTO logs VALUES (1)"), "INSERT on logs");
        assert_eq!(summarize("DROP TABLE IF EXISTS stale"), "DROP on stale");
        assert_eq!(summarize("UPDATE accounts SET x = 1"), "UPDATE on accounts");
    }
}
