//! HTTP REST API
//!
//! - `common`: response envelope, error mapping, extractors
//! - `modules`: per-resource handlers and DTOs
//! - `router`: route table with Swagger documentation

pub mod common;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiDoc, ApiState};
