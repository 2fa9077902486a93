use thiserror::Error;

/// Core operation errors.
///
/// Every plugin and manager operation returns this type so callers handle a
/// single taxonomy regardless of the engine behind it. Variants are kinds,
/// not opaque strings: the MCP layer maps each kind to a canonical JSON
/// error, and driver causes are logged at the point of wrapping rather than
/// carried in the variant.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Operation not implemented for this engine.
    #[error("operation not supported: {0}")]
    Unsupported(String),

    /// The manager has no current connection.
    #[error("not connected to a database")]
    NotConnected,

    /// Named connection, table, or token absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed SQL, unknown operator, bad parameters, or a statement class
    /// forbidden under the current policy.
    #[error("{0}")]
    BadRequest(String),

    /// Rate limit exhausted, bypass token mismatch, or a write attempted
    /// without the required confirmation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Confirmation token reused or expired.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The operation exceeded its deadline.
    #[error("operation timed out")]
    Timeout,

    /// The caller gave up waiting. The underlying database work may still
    /// complete; nothing is undone.
    #[error("operation cancelled")]
    Cancelled,

    /// Driver or I/O failure. The message is already sanitized for outbound
    /// use; the full cause was logged where the error originated.
    #[error("{0}")]
    Internal(String),
}

impl CoreError {
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Logs the driver-level cause and returns a generic connection error.
    ///
    /// Authentication and reachability failures produce the same outbound
    /// text so remote callers cannot enumerate hosts or accounts.
    pub fn connect_failed(cause: impl std::fmt::Display) -> Self {
        log::error!("[CONNECT] connection failed: {}", cause);
        Self::Internal("cannot connect to database, check credentials".to_string())
    }

    /// Logs the driver-level cause and returns a sanitized execution error.
    pub fn query_failed(cause: impl std::fmt::Display) -> Self {
        log::error!("[QUERY] execution failed: {}", cause);
        Self::Internal("query execution failed".to_string())
    }

    /// Stable kind identifier used by the MCP error mapping.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unsupported(_) => "unsupported",
            Self::NotConnected => "not_connected",
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::Conflict(_) => "conflict",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Internal(_) => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
