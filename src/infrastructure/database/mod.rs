pub mod entities;
pub mod migrator;
pub mod pool;
pub mod repositories;

pub use pool::{
    validate_dsn, AcquirePolicy, ConnectionPool, PoolOptions, PoolStatus, PooledConnection,
    SharedPool,
};
pub use repositories::SeaOrmRepositoryProvider;

use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::domain::{DomainError, DomainResult};
use migrator::Migrator;

/// Create and initialize the process-wide pool handle
pub async fn init_pool(options: PoolOptions) -> DomainResult<SharedPool> {
    info!("Connecting to database");
    let pool = ConnectionPool::shared();
    pool.initialize(options).await?;
    info!("Database connected successfully");
    Ok(pool)
}

/// Apply pending schema migrations on a borrowed connection
pub async fn run_migrations(pool: &ConnectionPool) -> DomainResult<()> {
    let conn = pool.acquire().await?;
    info!("Running database migrations...");
    Migrator::up(&*conn, None)
        .await
        .map_err(DomainError::storage("migrate"))?;
    info!("Migrations completed");
    Ok(())
}
