//! PostgreSQL store backed by a deadpool connection pool.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::tokio_postgres::{Config, NoTls};
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod, Runtime};

use crate::config::DatabaseConfig;
use crate::store::{PeopleStore, StoreError};

const CREATE_PERSON_TABLE: &str = "CREATE TABLE IF NOT EXISTS person (
    id SERIAL PRIMARY KEY,
    name TEXT NOT NULL
)";

/// Driver reported by `/api/database-info`. Tracks the `deadpool-postgres`
/// requirement in Cargo.toml; a test fails if the two drift apart.
pub const DRIVER_VERSION: &str = "deadpool-postgres 0.10";

/// People store talking to PostgreSQL.
pub struct PostgresStore {
    pool: Pool,
    host: Option<String>,
}

impl std::fmt::Debug for PostgresStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStore")
            .field("host", &self.host)
            .field("status", &self.pool.status())
            .finish()
    }
}

impl PostgresStore {
    /// Build the pool. No connection is opened until the first query.
    pub fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let timeout = Duration::from_secs(config.connect_timeout_secs);

        let mut pg_config: Config = config
            .url
            .parse()
            .map_err(|e: deadpool_postgres::tokio_postgres::Error| StoreError::Config(e.to_string()))?;
        pg_config.connect_timeout(timeout);

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );

        let pool = Pool::builder(manager)
            .max_size(config.pool_max_size)
            .runtime(Runtime::Tokio1)
            .wait_timeout(Some(timeout))
            .create_timeout(Some(timeout))
            .build()
            .map_err(|e| StoreError::Config(e.to_string()))?;

        let host = url::Url::parse(&config.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string));

        tracing::info!(
            host = host.as_deref().unwrap_or("unknown"),
            max_size = config.pool_max_size,
            "PostgreSQL pool created"
        );

        Ok(Self { pool, host })
    }

    async fn client(&self) -> Result<Object, StoreError> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait]
impl PeopleStore for PostgresStore {
    fn kind(&self) -> &'static str {
        "PostgreSQL"
    }

    fn client_version(&self) -> &'static str {
        DRIVER_VERSION
    }

    fn host(&self) -> Option<String> {
        self.host.clone()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let client = self.client().await?;
        client.simple_query("SELECT 1").await?;
        Ok(())
    }

    async fn count_people(&self) -> Result<u64, StoreError> {
        let client = self.client().await?;
        let row = client.query_one("SELECT COUNT(*) FROM person", &[]).await?;
        let count: i64 = row.get(0);
        Ok(count.max(0) as u64)
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        let client = self.client().await?;
        client.batch_execute(CREATE_PERSON_TABLE).await?;
        tracing::debug!("person table ready");
        Ok(())
    }
}
