//! Health check handler

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use sea_orm::{ConnectionTrait, Statement};
use serde::Serialize;
use utoipa::ToSchema;

use crate::infrastructure::database::SharedPool;
use crate::notifications::SharedEventBus;

#[derive(Clone)]
pub struct HealthState {
    pub pool: SharedPool,
    pub event_bus: SharedEventBus,
    pub started_at: Arc<Instant>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub database: DatabaseHealth,
    pub websocket_clients: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DatabaseHealth {
    pub status: String,
    pub latency_ms: Option<u64>,
    pub pool_initialized: bool,
    pub pool_max_size: u32,
    pub pool_in_use: u32,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable or pool exhausted", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    // Status is read before the ping borrows a connection.
    let pool_status = state.pool.status();

    let started = Instant::now();
    let ping = match state.pool.acquire().await {
        Ok(conn) => conn
            .execute(Statement::from_string(
                conn.get_database_backend(),
                "SELECT 1".to_string(),
            ))
            .await
            .map(|_| ())
            .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    let (db_status, latency_ms) = match ping {
        Ok(()) => ("ok", Some(started.elapsed().as_millis() as u64)),
        Err(e) => {
            tracing::warn!("Health check database ping failed: {}", e);
            ("error", None)
        }
    };
    let healthy = db_status == "ok";

    let response = HealthResponse {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        database: DatabaseHealth {
            status: db_status.to_string(),
            latency_ms,
            pool_initialized: pool_status.initialized,
            pool_max_size: pool_status.max_size,
            pool_in_use: pool_status.in_use,
        },
        websocket_clients: state.event_bus.subscriber_count(),
    };

    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(response))
}
