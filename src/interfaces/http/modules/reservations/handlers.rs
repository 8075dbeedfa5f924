//! Reservation HTTP handlers

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use crate::domain::reservation::parse_reservation_time;
use crate::domain::{DomainError, RepositoryProvider};
use crate::interfaces::http::common::{ApiResponse, ApiResult, UserId, ValidatedJson};
use crate::notifications::{Event, ReservationCreatedEvent, SharedEventBus};

use super::dto::*;

#[derive(Clone)]
pub struct ReservationAppState {
    pub repos: Arc<dyn RepositoryProvider>,
    pub event_bus: SharedEventBus,
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations",
    tag = "Reservations",
    security(("user_id" = [])),
    request_body = CreateReservationRequest,
    responses(
        (status = 201, description = "Reservation recorded", body = ApiResponse<CreatedReservationResponse>),
        (status = 400, description = "Malformed time"),
        (status = 401, description = "Missing X-User-Id"),
        (status = 404, description = "Unknown spot or user")
    )
)]
pub async fn create_reservation(
    State(state): State<ReservationAppState>,
    UserId(user_id): UserId,
    ValidatedJson(request): ValidatedJson<CreateReservationRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CreatedReservationResponse>>)> {
    let time = parse_reservation_time(&request.time)?;
    if state.repos.users().find_user_by_id(&user_id).await?.is_none() {
        return Err(DomainError::not_found("User", "id", &user_id).into());
    }

    let reservation_id = state
        .repos
        .reservations()
        .create_reservation(request.spot_id, &user_id, &request.time)
        .await?;

    state
        .event_bus
        .publish(Event::ReservationCreated(ReservationCreatedEvent {
            reservation_id,
            spot_id: request.spot_id,
            time,
            timestamp: Utc::now(),
        }));

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CreatedReservationResponse {
            reservation_id,
        })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations/me",
    tag = "Reservations",
    security(("user_id" = [])),
    responses(
        (status = 200, description = "Caller's reservations in creation order", body = ApiResponse<Vec<ReservationDto>>),
        (status = 401, description = "Missing X-User-Id")
    )
)]
pub async fn list_my_reservations(
    State(state): State<ReservationAppState>,
    UserId(user_id): UserId,
) -> ApiResult<Json<ApiResponse<Vec<ReservationDto>>>> {
    let reservations = state
        .repos
        .reservations()
        .list_reservations_by_user(&user_id)
        .await?;
    Ok(Json(ApiResponse::success(
        reservations.into_iter().map(ReservationDto::from).collect(),
    )))
}
