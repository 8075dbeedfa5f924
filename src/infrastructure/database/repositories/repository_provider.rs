//! SeaORM implementation of RepositoryProvider

use std::time::Duration;

use crate::domain::repositories::RepositoryProvider;
use crate::domain::reservation::ReservationRepository;
use crate::domain::spot::SpotRepository;
use crate::domain::user::UserRepository;
use crate::infrastructure::database::SharedPool;

use super::reservation_repository::SeaOrmReservationRepository;
use super::spot_repository::SeaOrmSpotRepository;
use super::user_repository::SeaOrmUserRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one pool handle and exposes per-aggregate repository accessors.
/// `operation_timeout` bounds every repository call, including the wait
/// for a pooled connection.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(pool.clone(), Duration::from_secs(5));
/// let spots = repos.spots().list_spots().await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    spots: SeaOrmSpotRepository,
    reservations: SeaOrmReservationRepository,
    users: SeaOrmUserRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(pool: SharedPool, operation_timeout: Duration) -> Self {
        Self {
            spots: SeaOrmSpotRepository::new(pool.clone()).with_timeout(operation_timeout),
            reservations: SeaOrmReservationRepository::new(pool.clone())
                .with_timeout(operation_timeout),
            users: SeaOrmUserRepository::new(pool).with_timeout(operation_timeout),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn spots(&self) -> &dyn SpotRepository {
        &self.spots
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        &self.reservations
    }

    fn users(&self) -> &dyn UserRepository {
        &self.users
    }
}
