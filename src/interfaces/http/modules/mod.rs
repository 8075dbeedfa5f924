pub mod health;
pub mod metrics;
pub mod occupancy;
pub mod request_id;
pub mod reservations;
pub mod spots;
