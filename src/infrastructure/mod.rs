//! Infrastructure layer - external concerns

pub mod database;

pub use database::{
    init_pool, run_migrations, AcquirePolicy, ConnectionPool, PoolOptions, SeaOrmRepositoryProvider,
    SharedPool,
};
