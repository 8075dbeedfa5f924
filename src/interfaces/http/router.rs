//! API router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::{delete, get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::AvailabilityReconciler;
use crate::domain::occupancy::{
    AppliedEntry, FailedEntry, OccupancySnapshot, OccupancyStatus, ReconcileReport, SnapshotEntry,
};
use crate::domain::RepositoryProvider;
use crate::infrastructure::database::SharedPool;
use crate::interfaces::ws::{ws_spaces_handler, NotificationState};
use crate::notifications::SharedEventBus;

use super::common::ApiResponse;
use super::modules::health::{self, DatabaseHealth, HealthResponse, HealthState};
use super::modules::metrics::{http_metrics_middleware, prometheus_metrics, MetricsState};
use super::modules::occupancy::{self, OccupancyAppState, SyncResponse};
use super::modules::request_id::request_id_middleware;
use super::modules::reservations::{
    self, CreateReservationRequest, CreatedReservationResponse, ReservationAppState,
    ReservationDto,
};
use super::modules::spots::{
    self, CreateSpotRequest, CreatedSpotResponse, DeletedSpotResponse, SpotAppState, SpotDto,
};

/// Everything the handlers need; each module extracts its own slice via `FromRef`.
#[derive(Clone)]
pub struct ApiState {
    pub repos: Arc<dyn RepositoryProvider>,
    pub pool: SharedPool,
    pub event_bus: SharedEventBus,
    pub reconciler: Arc<AvailabilityReconciler>,
    pub metrics: PrometheusHandle,
    pub started_at: Arc<Instant>,
}

impl FromRef<ApiState> for SpotAppState {
    fn from_ref(s: &ApiState) -> Self {
        SpotAppState {
            repos: Arc::clone(&s.repos),
            event_bus: s.event_bus.clone(),
            reconciler: Arc::clone(&s.reconciler),
        }
    }
}

impl FromRef<ApiState> for ReservationAppState {
    fn from_ref(s: &ApiState) -> Self {
        ReservationAppState {
            repos: Arc::clone(&s.repos),
            event_bus: s.event_bus.clone(),
        }
    }
}

impl FromRef<ApiState> for OccupancyAppState {
    fn from_ref(s: &ApiState) -> Self {
        OccupancyAppState {
            reconciler: Arc::clone(&s.reconciler),
        }
    }
}

impl FromRef<ApiState> for HealthState {
    fn from_ref(s: &ApiState) -> Self {
        HealthState {
            pool: s.pool.clone(),
            event_bus: s.event_bus.clone(),
            started_at: Arc::clone(&s.started_at),
        }
    }
}

impl FromRef<ApiState> for MetricsState {
    fn from_ref(s: &ApiState) -> Self {
        MetricsState {
            handle: s.metrics.clone(),
        }
    }
}

impl FromRef<ApiState> for NotificationState {
    fn from_ref(s: &ApiState) -> Self {
        NotificationState {
            event_bus: s.event_bus.clone(),
        }
    }
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "user_id",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-User-Id"))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        spots::list_spots,
        spots::create_spot,
        spots::delete_spot,
        reservations::create_reservation,
        reservations::list_my_reservations,
        occupancy::apply_snapshot,
        occupancy::sync_positions,
    ),
    components(
        schemas(
            ApiResponse<String>,
            HealthResponse,
            DatabaseHealth,
            SpotDto,
            CreateSpotRequest,
            CreatedSpotResponse,
            DeletedSpotResponse,
            CreateReservationRequest,
            CreatedReservationResponse,
            ReservationDto,
            OccupancySnapshot,
            SnapshotEntry,
            OccupancyStatus,
            ReconcileReport,
            AppliedEntry,
            FailedEntry,
            SyncResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and connection pool status"),
        (name = "Spots", description = "Parking spot management"),
        (name = "Reservations", description = "Reservations of the calling user"),
        (name = "Occupancy", description = "Occupancy snapshots from the vision pipeline"),
    ),
    info(
        title = "Parking Service API",
        version = "1.0.0",
        description = "Parking spots, reservations and live availability",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

pub fn create_api_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        .route("/spots", get(spots::list_spots).post(spots::create_spot))
        .route("/spots/{id}", delete(spots::delete_spot))
        .route("/reservations", post(reservations::create_reservation))
        .route("/reservations/me", get(reservations::list_my_reservations))
        .route("/occupancy", post(occupancy::apply_snapshot))
        .route("/occupancy/sync", post(occupancy::sync_positions));

    Router::new()
        .nest("/api/v1", api_v1)
        // Path used by the existing camera monitor
        .route("/update_spaces", post(occupancy::apply_snapshot))
        .route("/ws/spaces", get(ws_spaces_handler))
        .route("/health", get(health::health_check))
        .route("/metrics", get(prometheus_metrics))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .with_state(state)
}
