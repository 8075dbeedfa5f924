//! Reservation aggregate
//!
//! Contains the Reservation entity, time parsing, and repository interface.

pub mod model;
pub mod repository;

pub use model::{parse_reservation_time, Reservation};
pub use repository::ReservationRepository;
