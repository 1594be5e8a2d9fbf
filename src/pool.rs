use deadpool::{managed, Runtime};
use std::time::Duration;

use crate::cli::DatabaseArgs;
use crate::error::StarNeighboursError;
use crate::surreal_client::SurrealClient;

#[derive(Debug, Clone)]
pub struct SurrealConnectionConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    pub namespace: String,
    pub database: String,
}

impl From<&DatabaseArgs> for SurrealConnectionConfig {
    fn from(args: &DatabaseArgs) -> Self {
        SurrealConnectionConfig {
            url: args.db_url.clone(),
            username: args.db_user.clone(),
            password: args.db_pass.clone(),
            namespace: args.db_namespace.clone(),
            database: args.db_database.clone(),
        }
    }
}

#[derive(Debug)]
pub struct SurrealConnectionManager {
    config: SurrealConnectionConfig,
}

impl SurrealConnectionManager {
    pub fn new(config: SurrealConnectionConfig) -> Self {
        Self { config }
    }
}

impl managed::Manager for SurrealConnectionManager {
    type Type = SurrealClient;
    type Error = StarNeighboursError;

    async fn create(&self) -> Result<Self::Type, Self::Error> {
        SurrealClient::new(
            &self.config.url,
            &self.config.username,
            &self.config.password,
            &self.config.namespace,
            &self.config.database,
        )
        .await
        .map_err(|e| StarNeighboursError::Database(format!("{:#}", e)))
    }

    async fn recycle(
        &self,
        conn: &mut Self::Type,
        _: &managed::Metrics,
    ) -> managed::RecycleResult<Self::Error> {
        conn.ping().await.map_err(|e| {
            managed::RecycleError::Backend(StarNeighboursError::Database(format!(
                "Failed to recycle connection: {:#}",
                e
            )))
        })
    }
}

pub type SurrealPool = managed::Pool<SurrealConnectionManager>;

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_size: usize,
    pub connection_timeout: Duration,
    pub recycle_timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: 10,
            connection_timeout: Duration::from_secs(30),
            recycle_timeout: Some(Duration::from_secs(5)),
        }
    }
}

impl From<&DatabaseArgs> for PoolConfig {
    fn from(args: &DatabaseArgs) -> Self {
        PoolConfig {
            max_size: args.db_pool_max_size,
            connection_timeout: Duration::from_secs(args.db_connection_timeout),
            ..Default::default()
        }
    }
}

pub fn create_pool(
    connection_config: SurrealConnectionConfig,
    pool_config: PoolConfig,
) -> Result<SurrealPool, StarNeighboursError> {
    let manager = SurrealConnectionManager::new(connection_config);

    managed::Pool::builder(manager)
        .max_size(pool_config.max_size)
        .runtime(Runtime::Tokio1)
        .create_timeout(Some(pool_config.connection_timeout))
        .wait_timeout(Some(pool_config.connection_timeout))
        .recycle_timeout(pool_config.recycle_timeout)
        .build()
        .map_err(|e| StarNeighboursError::Database(format!("Failed to create connection pool: {}", e)))
}
