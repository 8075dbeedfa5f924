//! Occupancy snapshot handlers
//!
//! The vision collaborator posts whole-lot snapshots here; the same handler
//! is mounted on the legacy `/update_spaces` path.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::application::AvailabilityReconciler;
use crate::domain::occupancy::{OccupancySnapshot, ReconcileReport};
use crate::interfaces::http::common::{ApiResponse, ApiResult};

use super::dto::SyncResponse;

#[derive(Clone)]
pub struct OccupancyAppState {
    pub reconciler: Arc<AvailabilityReconciler>,
}

#[utoipa::path(
    post,
    path = "/api/v1/occupancy",
    tag = "Occupancy",
    request_body = OccupancySnapshot,
    responses(
        (status = 200, description = "Snapshot applied; failed entries are listed in the report", body = ApiResponse<ReconcileReport>),
        (status = 400, description = "Malformed snapshot")
    )
)]
pub async fn apply_snapshot(
    State(state): State<OccupancyAppState>,
    Json(snapshot): Json<OccupancySnapshot>,
) -> ApiResult<Json<ApiResponse<ReconcileReport>>> {
    let report = state.reconciler.apply_snapshot(&snapshot).await?;
    Ok(Json(ApiResponse::success(report)))
}

#[utoipa::path(
    post,
    path = "/api/v1/occupancy/sync",
    tag = "Occupancy",
    responses(
        (status = 200, description = "Position index refreshed", body = ApiResponse<SyncResponse>)
    )
)]
pub async fn sync_positions(
    State(state): State<OccupancyAppState>,
) -> ApiResult<Json<ApiResponse<SyncResponse>>> {
    let spots = state.reconciler.sync().await?;
    Ok(Json(ApiResponse::success(SyncResponse { spots })))
}
