use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use sea_orm::EntityTrait;

use super::{within, DEFAULT_OPERATION_TIMEOUT};
use crate::domain::user::{User, UserRepository};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::user;
use crate::infrastructure::database::SharedPool;

/// Users are written by the authentication collaborator; this side only reads.
pub struct SeaOrmUserRepository {
    pool: SharedPool,
    timeout: Duration,
}

impl SeaOrmUserRepository {
    pub fn new(pool: SharedPool) -> Self {
        Self {
            pool,
            timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn fetch(&self, id: &str) -> DomainResult<Option<User>> {
        let conn = self.pool.acquire().await?;
        let model = user::Entity::find_by_id(id.to_string())
            .one(&*conn)
            .await
            .map_err(DomainError::storage("find_user_by_id"))?;
        if model.is_none() {
            debug!("No user with id {}", id);
        }
        Ok(model.map(model_to_domain))
    }
}

fn model_to_domain(m: user::Model) -> User {
    User {
        id: m.id,
        username: m.username,
        email: m.email,
        password_hash: m.password_hash,
        created_at: m.created_at,
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn find_user_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        within("find_user_by_id", self.timeout, self.fetch(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::test_support::{memory_pool, seed_user};

    #[tokio::test]
    async fn finds_seeded_user() {
        let pool = memory_pool(1).await;
        seed_user(&pool, "driver-1").await;
        let repo = SeaOrmUserRepository::new(pool);

        let found = repo.find_user_by_id("driver-1").await.unwrap().unwrap();
        assert_eq!(found.id, "driver-1");
        assert_eq!(found.email, "driver-1@example.com");
        assert!(repo.find_user_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lookup_after_shutdown_is_unavailable() {
        let pool = memory_pool(1).await;
        let repo = SeaOrmUserRepository::new(pool.clone());
        pool.shutdown().await;

        let err = repo.find_user_by_id("driver-1").await.unwrap_err();
        assert!(matches!(err, DomainError::PoolNotInitialized));
    }
}
