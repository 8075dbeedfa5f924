//! User aggregate
//!
//! Users are created and authenticated elsewhere; this core stores them so
//! reservations can reference an existing user.

pub mod model;
pub mod repository;

pub use model::User;
pub use repository::UserRepository;
