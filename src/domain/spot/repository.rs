//! Parking spot repository interface

use async_trait::async_trait;

use super::model::ParkingSpot;
use crate::domain::DomainResult;

#[async_trait]
pub trait SpotRepository: Send + Sync {
    /// All spots, ascending by id
    async fn list_spots(&self) -> DomainResult<Vec<ParkingSpot>>;

    /// Insert a spot and return its id.
    ///
    /// `location` must hold exactly two finite numbers; this is checked
    /// before a connection is borrowed.
    async fn add_spot(&self, location: &[f64], is_reserved: bool) -> DomainResult<i32>;

    /// Remove a spot. `Ok(false)` when no spot had that id.
    async fn delete_spot(&self, id: i32) -> DomainResult<bool>;

    async fn find_spot(&self, id: i32) -> DomainResult<Option<ParkingSpot>>;

    /// Set the reservation flag. `Ok(false)` when no spot had that id.
    async fn set_reserved(&self, id: i32, is_reserved: bool) -> DomainResult<bool>;
}
