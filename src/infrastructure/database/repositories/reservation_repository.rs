//! SeaORM implementation of ReservationRepository

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use super::{abort, within, DEFAULT_OPERATION_TIMEOUT};
use crate::domain::reservation::{parse_reservation_time, Reservation, ReservationRepository};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{parking_spot, reservation, user};
use crate::infrastructure::database::SharedPool;

pub struct SeaOrmReservationRepository {
    pool: SharedPool,
    timeout: Duration,
}

impl SeaOrmReservationRepository {
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

    async fn insert(&self, spot_id: i32, user_id: &str, time: DateTime<Utc>) -> DomainResult<i32> {
        let storage = DomainError::storage("create_reservation");

        let conn = self.pool.acquire().await?;
        let txn = conn.begin().await.map_err(storage)?;

        // Referential checks run inside the insert transaction.
        match parking_spot::Entity::find_by_id(spot_id).one(&txn).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                let err = DomainError::not_found("ParkingSpot", "id", spot_id);
                return Err(abort(txn, err).await);
            }
            Err(e) => {
                let err = DomainError::storage("create_reservation")(e);
                return Err(abort(txn, err).await);
            }
        }

        match user::Entity::find_by_id(user_id.to_string()).one(&txn).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                let err = DomainError::not_found("User", "id", user_id);
                return Err(abort(txn, err).await);
            }
            Err(e) => {
                let err = DomainError::storage("create_reservation")(e);
                return Err(abort(txn, err).await);
            }
        }

        let model = reservation::ActiveModel {
            id: NotSet,
            spot_id: Set(spot_id),
            user_id: Set(user_id.to_string()),
            time: Set(time),
            created_at: Set(Utc::now()),
        };

        let inserted = match model.insert(&txn).await {
            Ok(m) => m,
            Err(e) => {
                let err = DomainError::storage("create_reservation")(e);
                return Err(abort(txn, err).await);
            }
        };

        txn.commit()
            .await
            .map_err(DomainError::storage("create_reservation"))?;

        info!(
            "Reservation {} created: spot={}, user={}, time={}",
            inserted.id,
            spot_id,
            user_id,
            time.to_rfc3339()
        );
        Ok(inserted.id)
    }

    async fn fetch_by_user(&self, user_id: &str) -> DomainResult<Vec<Reservation>> {
        let conn = self.pool.acquire().await?;
        let models = reservation::Entity::find()
            .filter(reservation::Column::UserId.eq(user_id))
            .order_by_asc(reservation::Column::Id)
            .all(&*conn)
            .await
            .map_err(DomainError::storage("list_reservations_by_user"))?;

        debug!("Found {} reservation(s) for user {}", models.len(), user_id);
        Ok(models.into_iter().map(model_to_domain).collect())
    }
}

fn model_to_domain(m: reservation::Model) -> Reservation {
    Reservation {
        id: m.id,
        spot_id: m.spot_id,
        user_id: m.user_id,
        time: m.time,
        created_at: m.created_at,
    }
}

fn validate_user_id(user_id: &str) -> DomainResult<&str> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(DomainError::Validation("User ID is required".to_string()));
    }
    Ok(user_id)
}

#[async_trait]
impl ReservationRepository for SeaOrmReservationRepository {
    async fn create_reservation(
        &self,
        spot_id: i32,
        user_id: &str,
        time: &str,
    ) -> DomainResult<i32> {
        let user_id = validate_user_id(user_id)?;
        let time = parse_reservation_time(time)?;
        within(
            "create_reservation",
            self.timeout,
            self.insert(spot_id, user_id, time),
        )
        .await
    }

    async fn list_reservations_by_user(&self, user_id: &str) -> DomainResult<Vec<Reservation>> {
        within(
            "list_reservations_by_user",
            self.timeout,
            self.fetch_by_user(user_id.trim()),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::spot::SpotRepository;
    use crate::infrastructure::database::repositories::SeaOrmSpotRepository;
    use crate::infrastructure::database::test_support::{memory_pool, seed_user};
    use chrono::TimeZone;
    use sea_orm::{ConnectionTrait, Statement};

    struct Fixture {
        pool: SharedPool,
        spots: SeaOrmSpotRepository,
        reservations: SeaOrmReservationRepository,
    }

    async fn fixture() -> Fixture {
        let pool = memory_pool(2).await;
        seed_user(&pool, "u1").await;
        seed_user(&pool, "u2").await;
        Fixture {
            spots: SeaOrmSpotRepository::new(pool.clone()),
            reservations: SeaOrmReservationRepository::new(pool.clone()),
            pool,
        }
    }

    #[tokio::test]
    async fn create_and_list_for_user() {
        let f = fixture().await;
        let spot = f.spots.add_spot(&[12.0, 34.0], false).await.unwrap();

        let id = f
            .reservations
            .create_reservation(spot, "u1", "2023-01-23T15:30:00")
            .await
            .unwrap();
        assert!(id > 0);

        let mine = f.reservations.list_reservations_by_user("u1").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, id);
        assert_eq!(mine[0].spot_id, spot);
        assert_eq!(mine[0].user_id, "u1");
        assert_eq!(
            mine[0].time,
            Utc.with_ymd_and_hms(2023, 1, 23, 15, 30, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn reservation_does_not_flip_spot_flag() {
        let f = fixture().await;
        let spot = f.spots.add_spot(&[1.0, 2.0], false).await.unwrap();
        f.reservations
            .create_reservation(spot, "u1", "2023-01-23T15:30:00")
            .await
            .unwrap();

        assert!(!f.spots.find_spot(spot).await.unwrap().unwrap().is_reserved);
    }

    #[tokio::test]
    async fn list_keeps_creation_order_and_filters_user() {
        let f = fixture().await;
        let spot = f.spots.add_spot(&[1.0, 2.0], false).await.unwrap();
        let a = f
            .reservations
            .create_reservation(spot, "u1", "2023-01-25T08:00:00")
            .await
            .unwrap();
        f.reservations
            .create_reservation(spot, "u2", "2023-01-24T08:00:00")
            .await
            .unwrap();
        let b = f
            .reservations
            .create_reservation(spot, "u1", "2023-01-20T08:00:00")
            .await
            .unwrap();

        let ids: Vec<i32> = f
            .reservations
            .list_reservations_by_user("u1")
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![a, b]);
        assert!(f
            .reservations
            .list_reservations_by_user("nobody")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn same_spot_and_time_are_not_serialized() {
        let f = fixture().await;
        let spot = f.spots.add_spot(&[1.0, 2.0], false).await.unwrap();
        let first = f
            .reservations
            .create_reservation(spot, "u1", "2023-01-23T15:30:00")
            .await;
        let second = f
            .reservations
            .create_reservation(spot, "u2", "2023-01-23T15:30:00")
            .await;
        assert!(first.is_ok() && second.is_ok());
    }

    #[tokio::test]
    async fn missing_spot_is_not_found_and_writes_nothing() {
        let f = fixture().await;
        f.spots.add_spot(&[1.0, 2.0], false).await.unwrap();
        let before = f.spots.list_spots().await.unwrap();

        let err = f
            .reservations
            .create_reservation(42, "u1", "2023-01-23T15:30:00")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::NotFound {
                entity: "ParkingSpot",
                ..
            }
        ));

        assert_eq!(f.spots.list_spots().await.unwrap(), before);
        assert!(f
            .reservations
            .list_reservations_by_user("u1")
            .await
            .unwrap()
            .is_empty());
        assert_eq!(f.pool.status().in_use, 0);
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let f = fixture().await;
        let spot = f.spots.add_spot(&[1.0, 2.0], false).await.unwrap();
        let err = f
            .reservations
            .create_reservation(spot, "ghost", "2023-01-23T15:30:00")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "User", .. }));
    }

    #[tokio::test]
    async fn malformed_input_is_validation_error() {
        let f = fixture().await;
        let spot = f.spots.add_spot(&[1.0, 2.0], false).await.unwrap();

        let err = f
            .reservations
            .create_reservation(spot, "u1", "next tuesday")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = f
            .reservations
            .create_reservation(spot, "  ", "2023-01-23T15:30:00")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn storage_failure_rolls_back_and_releases() {
        let f = fixture().await;
        let spot = f.spots.add_spot(&[1.0, 2.0], false).await.unwrap();

        {
            let conn = f.pool.acquire().await.unwrap();
            conn.execute(Statement::from_string(
                conn.get_database_backend(),
                "DROP TABLE reservations".to_string(),
            ))
            .await
            .unwrap();
        }

        let err = f
            .reservations
            .create_reservation(spot, "u1", "2023-01-23T15:30:00")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Storage {
                operation: "create_reservation",
                ..
            }
        ));
        assert_eq!(f.pool.status().in_use, 0);
        assert_eq!(f.spots.list_spots().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn spot_with_reservations_cannot_be_deleted() {
        let f = fixture().await;
        let spot = f.spots.add_spot(&[1.0, 2.0], false).await.unwrap();
        f.reservations
            .create_reservation(spot, "u1", "2023-01-23T15:30:00")
            .await
            .unwrap();

        let err = f.spots.delete_spot(spot).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(f.spots.list_spots().await.unwrap().len(), 1);
        assert_eq!(
            f.reservations
                .list_reservations_by_user("u1")
                .await
                .unwrap()
                .len(),
            1
        );
    }
}
