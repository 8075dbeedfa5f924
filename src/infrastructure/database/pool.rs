//! Bounded connection pool handle
//!
//! `ConnectionPool` owns the SeaORM connection (and through it the sqlx
//! pool) plus a semaphore that bounds how many callers may hold a connection
//! at once. Callers receive a [`PooledConnection`] guard; dropping the guard
//! returns the connection, so every exit path releases it.
//!
//! The handle is created once per process and passed to repositories
//! explicitly. `initialize` may be called again to replace the pool, and
//! `shutdown` drains it.

use std::ops::Deref;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde::{Deserialize, Serialize};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::{debug, info, warn};

use crate::domain::{DomainError, DomainResult};

/// What `acquire` does when every connection is lent out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquirePolicy {
    /// Wait up to the acquire timeout, then fail with `PoolExhausted`
    #[default]
    Wait,
    /// Fail with `PoolExhausted` immediately
    FailFast,
}

#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub dsn: String,
    pub min_size: u32,
    pub max_size: u32,
    pub acquire_policy: AcquirePolicy,
    pub acquire_timeout: Duration,
    pub connect_timeout: Duration,
}

impl PoolOptions {
    pub fn new(dsn: impl Into<String>, min_size: u32, max_size: u32) -> Self {
        Self {
            dsn: dsn.into(),
            min_size,
            max_size,
            acquire_policy: AcquirePolicy::Wait,
            acquire_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_acquire_policy(mut self, policy: AcquirePolicy) -> Self {
        self.acquire_policy = policy;
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        validate_dsn(&self.dsn)?;
        if self.max_size == 0 {
            return Err(DomainError::Configuration(
                "max pool size must be at least 1".to_string(),
            ));
        }
        if self.min_size > self.max_size {
            return Err(DomainError::Configuration(format!(
                "min pool size {} exceeds max pool size {}",
                self.min_size, self.max_size
            )));
        }
        Ok(())
    }
}

const SUPPORTED_SCHEMES: &[&str] = &["sqlite", "postgres", "postgresql"];

/// Reject empty or structurally malformed connection strings before dialing.
pub fn validate_dsn(dsn: &str) -> DomainResult<()> {
    let dsn = dsn.trim();
    if dsn.is_empty() {
        return Err(DomainError::Configuration(
            "database url must be set".to_string(),
        ));
    }

    let Some((scheme, rest)) = dsn.split_once(':') else {
        return Err(DomainError::Configuration(format!(
            "database url '{}' has no scheme",
            dsn
        )));
    };

    if !SUPPORTED_SCHEMES.contains(&scheme) {
        return Err(DomainError::Configuration(format!(
            "unsupported database scheme '{}'",
            scheme
        )));
    }

    let target = if scheme == "sqlite" {
        rest.trim_start_matches("//")
    } else {
        match rest.strip_prefix("//") {
            Some(target) => target,
            None => {
                return Err(DomainError::Configuration(format!(
                    "database url '{}' must look like {}://host/db",
                    dsn, scheme
                )))
            }
        }
    };

    if target.is_empty() {
        return Err(DomainError::Configuration(format!(
            "database url '{}' has no target",
            dsn
        )));
    }
    Ok(())
}

struct PoolInner {
    db: DatabaseConnection,
    permits: Arc<Semaphore>,
    max_size: u32,
    policy: AcquirePolicy,
    acquire_timeout: Duration,
}

impl PoolInner {
    async fn close(&self) {
        // Wakes anyone blocked in `acquire` with a closed-semaphore error.
        self.permits.close();
        if let Err(e) = self.db.clone().close().await {
            warn!("Error closing database connections: {}", e);
        }
    }
}

/// Snapshot of pool usage for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub initialized: bool,
    pub max_size: u32,
    pub in_use: u32,
}

/// A connection lent by the pool. Returned to the pool on drop.
pub struct PooledConnection {
    db: DatabaseConnection,
    _permit: OwnedSemaphorePermit,
}

impl Deref for PooledConnection {
    type Target = DatabaseConnection;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

#[derive(Default)]
pub struct ConnectionPool {
    inner: RwLock<Option<Arc<PoolInner>>>,
}

/// Shared pool handle
pub type SharedPool = Arc<ConnectionPool>;

impl ConnectionPool {
    /// An uninitialized pool; every `acquire` fails until `initialize`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedPool {
        Arc::new(Self::new())
    }

    /// Connect and install a new pool, closing any previous one.
    pub async fn initialize(&self, options: PoolOptions) -> DomainResult<()> {
        options.validate()?;

        let mut connect = ConnectOptions::new(options.dsn.clone());
        connect
            .min_connections(options.min_size)
            .max_connections(options.max_size)
            .connect_timeout(options.connect_timeout)
            .acquire_timeout(options.acquire_timeout.max(Duration::from_millis(100)))
            .sqlx_logging(false);

        let db = Database::connect(connect)
            .await
            .map_err(DomainError::PoolInit)?;

        let inner = Arc::new(PoolInner {
            db,
            permits: Arc::new(Semaphore::new(options.max_size as usize)),
            max_size: options.max_size,
            policy: options.acquire_policy,
            acquire_timeout: options.acquire_timeout,
        });

        let previous = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(inner);

        info!(
            min_size = options.min_size,
            max_size = options.max_size,
            policy = ?options.acquire_policy,
            "Database connection pool created"
        );

        if let Some(previous) = previous {
            warn!("Connection pool re-initialized; closing the previous pool");
            previous.close().await;
        }
        Ok(())
    }

    fn current(&self) -> DomainResult<Arc<PoolInner>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(DomainError::PoolNotInitialized)
    }

    /// Borrow one connection according to the configured acquire policy.
    pub async fn acquire(&self) -> DomainResult<PooledConnection> {
        let inner = self.current()?;

        let permit = match inner.policy {
            AcquirePolicy::FailFast => match inner.permits.clone().try_acquire_owned() {
                Ok(permit) => permit,
                Err(TryAcquireError::Closed) => return Err(DomainError::PoolNotInitialized),
                Err(TryAcquireError::NoPermits) => {
                    metrics::counter!("db_pool_exhausted_total").increment(1);
                    return Err(DomainError::PoolExhausted {
                        max_size: inner.max_size,
                    });
                }
            },
            AcquirePolicy::Wait => {
                match tokio::time::timeout(
                    inner.acquire_timeout,
                    inner.permits.clone().acquire_owned(),
                )
                .await
                {
                    Ok(Ok(permit)) => permit,
                    Ok(Err(_closed)) => return Err(DomainError::PoolNotInitialized),
                    Err(_elapsed) => {
                        metrics::counter!("db_pool_exhausted_total").increment(1);
                        return Err(DomainError::PoolExhausted {
                            max_size: inner.max_size,
                        });
                    }
                }
            }
        };

        metrics::counter!("db_pool_acquire_total").increment(1);
        debug!(
            in_use = inner.max_size as usize - inner.permits.available_permits(),
            "Connection acquired"
        );

        Ok(PooledConnection {
            db: inner.db.clone(),
            _permit: permit,
        })
    }

    /// Give a connection back. Dropping the guard has the same effect.
    pub fn release(&self, connection: PooledConnection) {
        drop(connection);
        debug!("Connection released");
    }

    /// Close every connection. Later `acquire` calls fail with
    /// `PoolNotInitialized` until the pool is initialized again.
    pub async fn shutdown(&self) {
        let inner = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match inner {
            Some(inner) => {
                inner.close().await;
                info!("All database connections closed");
            }
            None => debug!("Shutdown requested for an uninitialized pool"),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn status(&self) -> PoolStatus {
        match self.current() {
            Ok(inner) => PoolStatus {
                initialized: true,
                max_size: inner.max_size,
                in_use: inner.max_size - inner.permits.available_permits() as u32,
            },
            Err(_) => PoolStatus {
                initialized: false,
                max_size: 0,
                in_use: 0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ConnectionTrait, Statement};

    fn memory(max_size: u32) -> PoolOptions {
        PoolOptions::new("sqlite::memory:", 1, max_size)
            .with_acquire_timeout(Duration::from_millis(100))
    }

    #[test]
    fn dsn_validation() {
        assert!(validate_dsn("sqlite::memory:").is_ok());
        assert!(validate_dsn("sqlite://./parking.db?mode=rwc").is_ok());
        assert!(validate_dsn("postgres://user:pw@localhost/parking").is_ok());

        for bad in ["", "   ", "parking.db", "mysql://localhost/db", "postgres:localhost", "sqlite:"] {
            let err = validate_dsn(bad).unwrap_err();
            assert!(matches!(err, DomainError::Configuration(_)), "{bad:?} accepted");
        }
    }

    #[test]
    fn size_validation() {
        assert!(PoolOptions::new("sqlite::memory:", 0, 0).validate().is_err());
        assert!(PoolOptions::new("sqlite::memory:", 3, 2).validate().is_err());
        assert!(PoolOptions::new("sqlite::memory:", 2, 2).validate().is_ok());
    }

    #[tokio::test]
    async fn acquire_before_initialize_fails() {
        let pool = ConnectionPool::new();
        assert!(matches!(
            pool.acquire().await,
            Err(DomainError::PoolNotInitialized)
        ));
        assert!(!pool.status().initialized);
    }

    #[tokio::test]
    async fn malformed_dsn_fails_without_connecting() {
        let pool = ConnectionPool::new();
        let err = pool
            .initialize(PoolOptions::new("", 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Configuration(_)));
        assert!(!pool.is_initialized());
    }

    #[tokio::test]
    async fn unreachable_store_is_pool_init_error() {
        let pool = ConnectionPool::new();
        let err = pool
            .initialize(PoolOptions::new(
                "sqlite:///nonexistent-dir/definitely/missing.db?mode=ro",
                1,
                1,
            )
            .with_acquire_timeout(Duration::from_millis(500)))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PoolInit(_)));
    }

    #[tokio::test]
    async fn lent_connection_runs_queries() {
        let pool = ConnectionPool::new();
        pool.initialize(memory(2)).await.unwrap();

        let conn = pool.acquire().await.unwrap();
        conn.execute(Statement::from_string(
            conn.get_database_backend(),
            "SELECT 1".to_string(),
        ))
        .await
        .unwrap();
        assert_eq!(pool.status().in_use, 1);

        pool.release(conn);
        assert_eq!(pool.status().in_use, 0);
    }

    #[tokio::test]
    async fn fail_fast_when_exhausted() {
        let pool = ConnectionPool::new();
        pool.initialize(memory(1).with_acquire_policy(AcquirePolicy::FailFast))
            .await
            .unwrap();

        let first = pool.acquire().await.unwrap();
        assert!(matches!(
            pool.acquire().await,
            Err(DomainError::PoolExhausted { max_size: 1 })
        ));

        drop(first);
        assert!(pool.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn wait_policy_times_out_when_exhausted() {
        let pool = ConnectionPool::new();
        pool.initialize(memory(1)).await.unwrap();

        let _held = pool.acquire().await.unwrap();
        assert!(matches!(
            pool.acquire().await,
            Err(DomainError::PoolExhausted { .. })
        ));
        assert_eq!(pool.status().in_use, 1);
    }

    #[tokio::test]
    async fn wait_policy_unblocks_on_release() {
        let pool = Arc::new(ConnectionPool::new());
        pool.initialize(memory(1).with_acquire_timeout(Duration::from_secs(2)))
            .await
            .unwrap();

        let held = pool.acquire().await.unwrap();
        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.acquire().await.map(|_| ()) })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        pool.release(held);

        waiter.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn shutdown_fails_later_acquires_and_wakes_waiters() {
        let pool = Arc::new(ConnectionPool::new());
        pool.initialize(memory(1).with_acquire_timeout(Duration::from_secs(5)))
            .await
            .unwrap();

        let held = pool.acquire().await.unwrap();
        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.acquire().await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(held);
        pool.shutdown().await;

        // The waiter either got the released permit before shutdown or was
        // woken by the closed semaphore; it must not hang.
        let _ = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter hung after shutdown");

        assert!(matches!(
            pool.acquire().await,
            Err(DomainError::PoolNotInitialized)
        ));
    }

    #[tokio::test]
    async fn reinitialize_replaces_pool() {
        let pool = ConnectionPool::new();
        pool.initialize(memory(1)).await.unwrap();
        pool.initialize(memory(3)).await.unwrap();

        assert_eq!(pool.status().max_size, 3);
        let a = pool.acquire().await.unwrap();
        let b = pool.acquire().await.unwrap();
        assert_eq!(pool.status().in_use, 2);
        drop((a, b));
    }
}
