use clap::ValueEnum;
use std::time::Duration;

/// Top-level write policy for the query tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PermissionMode {
    /// Only read statements pass.
    ReadOnly,
    /// Writes are held behind a confirmation token.
    ConfirmWrites,
    /// Writes pass through.
    AllowWrite,
    /// Read-only plus the strict validator, regardless of configuration.
    SafeMode,
}

/// Orthogonal SQL filter applied on top of the permission mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ValidatorLevel {
    /// Baseline plus a blocklist of file-reading and OS-bridging calls.
    Strict,
    /// Baseline statement-class validation only.
    Standard,
    /// Permits whatever the permission mode allows, except an
    /// unpredicated DELETE.
    Minimal,
}

/// Server configuration assembled from the CLI.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub permission_mode: PermissionMode,
    pub validator: ValidatorLevel,
    pub allow_drop: bool,
    pub allow_multi_statement: bool,
    pub query_timeout: Duration,
    pub row_limit: usize,
    pub confirmation_ttl: Duration,
    pub qps: f64,
    pub daily_limit: u64,
    pub bypass_token: Option<String>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            permission_mode: PermissionMode::ConfirmWrites,
            validator: ValidatorLevel::Standard,
            allow_drop: false,
            allow_multi_statement: false,
            query_timeout: Duration::from_secs(30),
            row_limit: 500,
            confirmation_ttl: Duration::from_secs(300),
            qps: 5.0,
            daily_limit: 10_000,
            bypass_token: None,
        }
    }
}

impl ServerOptions {
    /// Safe mode forces read-only semantics.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self.permission_mode,
            PermissionMode::ReadOnly | PermissionMode::SafeMode
        )
    }

    /// Safe mode forces the strict validator.
    pub fn effective_validator(&self) -> ValidatorLevel {
        if self.permission_mode == PermissionMode::SafeMode {
            ValidatorLevel::Strict
        } else {
            self.validator
        }
    }
}
