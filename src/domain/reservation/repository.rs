//! Reservation repository interface

use async_trait::async_trait;

use super::model::Reservation;
use crate::domain::DomainResult;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Record a reservation and return its id.
    ///
    /// `time` must be ISO-8601; the spot and the user must exist. The spot's
    /// `is_reserved` flag is left untouched.
    async fn create_reservation(&self, spot_id: i32, user_id: &str, time: &str)
        -> DomainResult<i32>;

    /// Reservations of one user in creation order
    async fn list_reservations_by_user(&self, user_id: &str) -> DomainResult<Vec<Reservation>>;
}
