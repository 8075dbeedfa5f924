//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.
//! Every operation borrows one pooled connection, runs under the
//! caller-supplied timeout, and returns the connection on every exit path.

pub mod repository_provider;
pub mod reservation_repository;
pub mod spot_repository;
pub mod user_repository;

pub use repository_provider::SeaOrmRepositoryProvider;
pub use reservation_repository::SeaOrmReservationRepository;
pub use spot_repository::SeaOrmSpotRepository;
pub use user_repository::SeaOrmUserRepository;

use std::future::Future;
use std::time::Duration;

use log::warn;
use sea_orm::DatabaseTransaction;

use crate::domain::{DomainError, DomainResult};

/// Default upper bound for one repository operation
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Run one repository operation under `limit`.
///
/// On expiry the operation future is dropped, which rolls back any open
/// transaction and returns the borrowed connection to the pool.
pub(crate) async fn within<T, F>(operation: &'static str, limit: Duration, fut: F) -> DomainResult<T>
where
    F: Future<Output = DomainResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!("{} timed out after {:?}", operation, limit);
            Err(DomainError::Timeout {
                operation,
                after: limit,
            })
        }
    }
}

/// Roll back `txn` and hand back `error` for propagation.
pub(crate) async fn abort(txn: DatabaseTransaction, error: DomainError) -> DomainError {
    if let Err(e) = txn.rollback().await {
        warn!("Rollback failed after '{}': {}", error, e);
    }
    error
}
