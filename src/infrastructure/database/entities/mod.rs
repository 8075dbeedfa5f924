//! Database entities module

pub mod parking_spot;
pub mod reservation;
pub mod user;

pub use parking_spot::Entity as ParkingSpot;
pub use reservation::Entity as Reservation;
pub use user::Entity as User;
