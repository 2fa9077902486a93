//! Standalone MCP server exposing the WhoDB plugin engine to external
//! agents under security policy, write confirmation, rate limiting, and
//! per-query timeout discipline.

pub mod confirm;
pub mod http;
pub mod options;
pub mod rate_limit;
pub mod registry;
pub mod security;
pub mod server;

pub use options::{PermissionMode, ServerOptions, ValidatorLevel};
pub use server::{ServerState, WhodbMcpServer};
