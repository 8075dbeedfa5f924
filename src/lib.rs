//! # Parking Service
//!
//! Parking spots, reservations and live availability driven by an
//! occupancy-detection pipeline.
//!
//! ## Architecture
//!
//! - **domain**: entities, repository traits and the error taxonomy
//! - **application**: availability reconciliation of occupancy snapshots
//! - **infrastructure**: connection pool, SeaORM entities, migrations and repositories
//! - **interfaces**: REST API (axum + Swagger) and the `/ws/spaces` stream
//! - **notifications**: event bus feeding websocket clients
//! - **server**: process lifecycle shared by the CLI

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod notifications;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use infrastructure::database::{
    init_pool, run_migrations, ConnectionPool, PoolOptions, SeaOrmRepositoryProvider, SharedPool,
};

pub use interfaces::http::create_api_router;

pub use notifications::{create_event_bus, Event, EventBus, SharedEventBus};
