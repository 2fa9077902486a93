//! WhoDB core: a capability-driven plugin engine that normalizes
//! heterogeneous database engines behind a single contract, plus the
//! cross-cutting subsystems the plugins share (SSL registry, metadata
//! cache, connection manager, env-profile discovery).

mod cache;
mod connection;
mod credentials;
mod database_type;
mod engine;
mod error;
mod metadata;
mod plugin;
mod rows;
mod value;

pub mod env_profiles;
pub mod manager;
pub mod query_class;
pub mod sql;
pub mod ssl;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use cache::MetadataCache;
pub use connection::{Connection, ConnectionSource};
pub use credentials::{AdvancedOptions, Credentials, ExternalModel, PluginConfig, Record};
pub use database_type::DatabaseType;
pub use engine::{Engine, register_engine_hook};
pub use error::{CoreError, Result};
pub use manager::{ConnectionManager, QueryContext, run_with_context};
pub use metadata::{DatabaseMetadata, OperatorSet, TypeCategory, TypeDefinition};
pub use plugin::{ConstraintMap, OrderBy, Plugin, WhereCondition};
pub use rows::{
    ChatMessage, Column, GraphRelation, GraphUnit, RelationType, Rows, SslStatus, StorageUnit,
};
pub use value::Value;

pub mod config {
    pub use crate::connection::ConfigStore;
}
