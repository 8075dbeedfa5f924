//! Parking spot DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::ParkingSpot;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SpotDto {
    pub id: i32,
    /// `[x, y]`
    #[schema(value_type = Vec<f64>, example = json!([12.0, 34.0]))]
    pub location: [f64; 2],
    pub is_reserved: bool,
}

impl From<ParkingSpot> for SpotDto {
    fn from(s: ParkingSpot) -> Self {
        Self {
            id: s.id,
            location: s.location.as_pair(),
            is_reserved: s.is_reserved,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSpotRequest {
    #[validate(length(equal = 2, message = "location must be [x, y]"))]
    #[schema(example = json!([12.0, 34.0]))]
    pub location: Vec<f64>,
    #[serde(default)]
    pub is_reserved: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedSpotResponse {
    pub id: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeletedSpotResponse {
    pub id: i32,
    pub deleted: bool,
}
