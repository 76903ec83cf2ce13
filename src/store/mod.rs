//! Backing store subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     DatabaseConfig → open() → PostgresStore | MemoryStore
//!     → ensure_schema() (person table)
//!
//! Requests:
//!     health reporter → ping()        (liveness probe)
//!     database-info   → count_people() (row count + latency)
//! ```
//!
//! # Design Decisions
//! - Stores are shared as `Arc<dyn PeopleStore>` so handlers and tests can swap them
//! - Connections are created lazily; an unreachable database does not block startup
//! - Errors are reported to callers, never retried here

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{DatabaseConfig, StoreBackend};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Could not obtain a pooled connection.
    #[error("connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    /// The database rejected or failed a statement.
    #[error("query failed: {0}")]
    Query(#[from] deadpool_postgres::tokio_postgres::Error),
    /// The store could not be constructed from its configuration.
    #[error("invalid store configuration: {0}")]
    Config(String),
    /// The store is known to be unreachable.
    #[error("store unreachable: {0}")]
    Unreachable(String),
}

/// Access to the people table.
#[async_trait]
pub trait PeopleStore: Send + Sync {
    /// Human readable database kind, e.g. "PostgreSQL".
    fn kind(&self) -> &'static str;

    /// Driver name and version.
    fn client_version(&self) -> &'static str;

    /// Host the store connects to, if any.
    fn host(&self) -> Option<String>;

    /// Minimal round trip used to confirm reachability.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Number of rows in the person table.
    async fn count_people(&self) -> Result<u64, StoreError>;

    /// Create the person table if it does not exist yet.
    async fn ensure_schema(&self) -> Result<(), StoreError>;
}

/// Build the store selected by the configuration.
pub fn open(config: &DatabaseConfig) -> Result<Arc<dyn PeopleStore>, StoreError> {
    match config.backend {
        StoreBackend::Postgres => Ok(Arc::new(PostgresStore::connect(config)?)),
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_configured_backend() {
        let mut config = DatabaseConfig::default();
        config.backend = StoreBackend::Memory;
        assert_eq!(open(&config).unwrap().kind(), "In-memory");

        config.backend = StoreBackend::Postgres;
        assert_eq!(open(&config).unwrap().kind(), "PostgreSQL");
    }
}
