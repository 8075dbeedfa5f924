//! SeaORM implementation of SpotRepository

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use super::{abort, within, DEFAULT_OPERATION_TIMEOUT};
use crate::domain::spot::{Location, ParkingSpot, SpotRepository};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{parking_spot, reservation};
use crate::infrastructure::database::SharedPool;

pub struct SeaOrmSpotRepository {
    pool: SharedPool,
    timeout: Duration,
}

impl SeaOrmSpotRepository {
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

    async fn fetch_all(&self) -> DomainResult<Vec<ParkingSpot>> {
        let conn = self.pool.acquire().await?;
        let models = parking_spot::Entity::find()
            .order_by_asc(parking_spot::Column::Id)
            .all(&*conn)
            .await
            .map_err(DomainError::storage("list_spots"))?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn insert(&self, location: Location, is_reserved: bool) -> DomainResult<i32> {
        let conn = self.pool.acquire().await?;
        let txn = conn
            .begin()
            .await
            .map_err(DomainError::storage("add_spot"))?;

        let model = parking_spot::ActiveModel {
            id: NotSet,
            location_x: Set(location.x),
            location_y: Set(location.y),
            is_reserved: Set(is_reserved),
        };

        let inserted = match model.insert(&txn).await {
            Ok(m) => m,
            Err(e) => return Err(abort(txn, DomainError::storage("add_spot")(e)).await),
        };

        txn.commit()
            .await
            .map_err(DomainError::storage("add_spot"))?;

        info!(
            "Parking spot {} added at ({}, {})",
            inserted.id, location.x, location.y
        );
        Ok(inserted.id)
    }

    async fn delete(&self, id: i32) -> DomainResult<bool> {
        let conn = self.pool.acquire().await?;
        let txn = conn
            .begin()
            .await
            .map_err(DomainError::storage("delete_spot"))?;

        let held = match reservation::Entity::find()
            .filter(reservation::Column::SpotId.eq(id))
            .count(&txn)
            .await
        {
            Ok(n) => n,
            Err(e) => return Err(abort(txn, DomainError::storage("delete_spot")(e)).await),
        };

        if held > 0 {
            let err = DomainError::Conflict(format!(
                "Parking spot {} has {} reservation(s) and cannot be removed",
                id, held
            ));
            return Err(abort(txn, err).await);
        }

        let result = match parking_spot::Entity::delete_by_id(id).exec(&txn).await {
            Ok(r) => r,
            Err(e) => return Err(abort(txn, DomainError::storage("delete_spot")(e)).await),
        };

        txn.commit()
            .await
            .map_err(DomainError::storage("delete_spot"))?;

        let removed = result.rows_affected > 0;
        if removed {
            info!("Parking spot {} removed", id);
        } else {
            debug!("Parking spot {} not found for removal", id);
        }
        Ok(removed)
    }

    async fn fetch_one(&self, id: i32) -> DomainResult<Option<ParkingSpot>> {
        let conn = self.pool.acquire().await?;
        let model = parking_spot::Entity::find_by_id(id)
            .one(&*conn)
            .await
            .map_err(DomainError::storage("find_spot"))?;
        Ok(model.map(model_to_domain))
    }

    async fn update_reserved(&self, id: i32, is_reserved: bool) -> DomainResult<bool> {
        let conn = self.pool.acquire().await?;
        let result = parking_spot::Entity::update_many()
            .col_expr(parking_spot::Column::IsReserved, Expr::value(is_reserved))
            .filter(parking_spot::Column::Id.eq(id))
            .exec(&*conn)
            .await
            .map_err(DomainError::storage("set_reserved"))?;

        debug!("Parking spot {} is_reserved={}", id, is_reserved);
        Ok(result.rows_affected > 0)
    }
}

fn model_to_domain(m: parking_spot::Model) -> ParkingSpot {
    ParkingSpot {
        id: m.id,
        location: Location {
            x: m.location_x,
            y: m.location_y,
        },
        is_reserved: m.is_reserved,
    }
}

#[async_trait]
impl SpotRepository for SeaOrmSpotRepository {
    async fn list_spots(&self) -> DomainResult<Vec<ParkingSpot>> {
        within("list_spots", self.timeout, self.fetch_all()).await
    }

    async fn add_spot(&self, location: &[f64], is_reserved: bool) -> DomainResult<i32> {
        let location = Location::from_components(location)?;
        within("add_spot", self.timeout, self.insert(location, is_reserved)).await
    }

    async fn delete_spot(&self, id: i32) -> DomainResult<bool> {
        within("delete_spot", self.timeout, self.delete(id)).await
    }

    async fn find_spot(&self, id: i32) -> DomainResult<Option<ParkingSpot>> {
        within("find_spot", self.timeout, self.fetch_one(id)).await
    }

    async fn set_reserved(&self, id: i32, is_reserved: bool) -> DomainResult<bool> {
        within("set_reserved", self.timeout, self.update_reserved(id, is_reserved)).await
    }
}
