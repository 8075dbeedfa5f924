//! Parking spot HTTP handlers

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use crate::application::AvailabilityReconciler;
use crate::domain::{DomainError, RepositoryProvider};
use crate::interfaces::http::common::{ApiResponse, ApiResult, ValidatedJson};
use crate::notifications::{Event, SharedEventBus, SpotAddedEvent, SpotRemovedEvent};

use super::dto::*;

#[derive(Clone)]
pub struct SpotAppState {
    pub repos: Arc<dyn RepositoryProvider>,
    pub event_bus: SharedEventBus,
    pub reconciler: Arc<AvailabilityReconciler>,
}

#[utoipa::path(
    get,
    path = "/api/v1/spots",
    tag = "Spots",
    responses(
        (status = 200, description = "All parking spots, ascending by id", body = ApiResponse<Vec<SpotDto>>),
        (status = 503, description = "Database unavailable")
    )
)]
pub async fn list_spots(
    State(state): State<SpotAppState>,
) -> ApiResult<Json<ApiResponse<Vec<SpotDto>>>> {
    let spots = state.repos.spots().list_spots().await?;
    Ok(Json(ApiResponse::success(
        spots.into_iter().map(SpotDto::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/spots",
    tag = "Spots",
    request_body = CreateSpotRequest,
    responses(
        (status = 201, description = "Spot created", body = ApiResponse<CreatedSpotResponse>),
        (status = 400, description = "Invalid location"),
        (status = 422, description = "Location is not [x, y]")
    )
)]
pub async fn create_spot(
    State(state): State<SpotAppState>,
    ValidatedJson(request): ValidatedJson<CreateSpotRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CreatedSpotResponse>>)> {
    let id = state
        .repos
        .spots()
        .add_spot(&request.location, request.is_reserved)
        .await?;
    state.reconciler.invalidate().await;

    state.event_bus.publish(Event::SpotAdded(SpotAddedEvent {
        spot_id: id,
        location: [request.location[0], request.location[1]],
        is_reserved: request.is_reserved,
        timestamp: Utc::now(),
    }));

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CreatedSpotResponse { id })),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/spots/{id}",
    tag = "Spots",
    params(("id" = i32, Path, description = "Spot id")),
    responses(
        (status = 200, description = "Spot removed", body = ApiResponse<DeletedSpotResponse>),
        (status = 404, description = "No such spot"),
        (status = 409, description = "Spot still has reservations")
    )
)]
pub async fn delete_spot(
    State(state): State<SpotAppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<DeletedSpotResponse>>> {
    if !state.repos.spots().delete_spot(id).await? {
        return Err(DomainError::not_found("ParkingSpot", "id", id).into());
    }
    state.reconciler.invalidate().await;

    state.event_bus.publish(Event::SpotRemoved(SpotRemovedEvent {
        spot_id: id,
        timestamp: Utc::now(),
    }));

    Ok(Json(ApiResponse::success(DeletedSpotResponse {
        id,
        deleted: true,
    })))
}
