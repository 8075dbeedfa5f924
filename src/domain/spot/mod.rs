//! Parking spot aggregate

pub mod model;
pub mod repository;

pub use model::{Location, ParkingSpot};
pub use repository::SpotRepository;
