//! Reservation DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::Reservation;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReservationRequest {
    pub spot_id: i32,
    /// ISO 8601, e.g. `2023-01-23T15:30:00`; naive times are UTC
    #[validate(length(min = 1, message = "time is required"))]
    #[schema(example = "2023-01-23T15:30:00")]
    pub time: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedReservationResponse {
    pub reservation_id: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReservationDto {
    pub id: i32,
    pub spot_id: i32,
    pub user_id: String,
    pub time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Reservation> for ReservationDto {
    fn from(r: Reservation) -> Self {
        Self {
            id: r.id,
            spot_id: r.spot_id,
            user_id: r.user_id,
            time: r.time,
            created_at: r.created_at,
        }
    }
}
