pub mod occupancy;
pub mod repositories;
pub mod reservation;
pub mod spot;
pub mod user;

pub use occupancy::{OccupancySnapshot, OccupancyStatus, ReconcileReport, SnapshotMapping};
pub use repositories::{DomainResult, RepositoryProvider};
pub use reservation::{Reservation, ReservationRepository};
pub use spot::{Location, ParkingSpot, SpotRepository};
pub use user::{User, UserRepository};

pub use crate::shared::errors::DomainError;
