//! API Routes
//!
//! HTTP endpoint definitions.

use std::convert::Infallible;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use uuid::Uuid;

use crate::aggregate::RideSnapshot;
use crate::domain::{ActorRole, DriverStatus, OperationContext, PassengerStatus};
use crate::error::{AppError, AppResult};
use crate::handlers::{CreateRideCommand, ListRidesQuery, UpdateRideCommand};

use super::extract::{JsonBody, PathParams, QueryParams};
use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

/// Body of `POST /rides` and `PUT /rides/:ride_id`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideRequest {
    pub driver_id: i64,
    pub passenger_id: i64,
    pub address_from: String,
    pub address_to: String,
}

impl From<RideRequest> for CreateRideCommand {
    fn from(request: RideRequest) -> Self {
        CreateRideCommand::new(
            request.driver_id,
            request.passenger_id,
            request.address_from,
            request.address_to,
        )
    }
}

/// Body of the status endpoints; `status` is the enumeration tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ListRidesParams {
    #[serde(default)]
    pub driver_id: Option<i64>,
    #[serde(default)]
    pub passenger_id: Option<i64>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    ListRidesQuery::DEFAULT_PAGE
}

fn default_limit() -> u32 {
    ListRidesQuery::DEFAULT_LIMIT
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RideListResponse {
    pub rides: Vec<RideSnapshot>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

#[derive(Debug, Deserialize)]
pub struct NotificationStreamParams {
    /// Only forward messages meant for this actor
    #[serde(default)]
    pub actor_id: Option<i64>,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/rides", post(create_ride).get(list_rides))
        .route("/rides/:ride_id", get(get_ride).put(update_ride))
        .route("/rides/:ride_id/driver-status", put(update_driver_status))
        .route("/rides/:ride_id/passenger-status", put(update_passenger_status))
        .route("/notifications/:role", get(stream_notifications))
}

// =========================================================================
// POST /rides
// =========================================================================

async fn create_ride(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    JsonBody(request): JsonBody<RideRequest>,
) -> AppResult<(StatusCode, Json<RideSnapshot>)> {
    let ride = state.rides.create(request.into(), &context).await?;

    Ok((StatusCode::CREATED, Json(ride)))
}

// =========================================================================
// GET /rides
// =========================================================================

async fn list_rides(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ListRidesParams>,
) -> AppResult<Json<RideListResponse>> {
    let query = ListRidesQuery {
        driver_id: params.driver_id,
        passenger_id: params.passenger_id,
        page: params.page,
        limit: params.limit,
    };

    let page = state.rides.list(query).await?;

    Ok(Json(RideListResponse {
        rides: page.items,
        page: page.page,
        limit: page.limit,
        total: page.total,
    }))
}

// =========================================================================
// GET /rides/:ride_id
// =========================================================================

async fn get_ride(
    State(state): State<AppState>,
    PathParams(ride_id): PathParams<Uuid>,
) -> AppResult<Json<RideSnapshot>> {
    Ok(Json(state.rides.get(ride_id).await?))
}

// =========================================================================
// PUT /rides/:ride_id
// =========================================================================

async fn update_ride(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    PathParams(ride_id): PathParams<Uuid>,
    JsonBody(request): JsonBody<RideRequest>,
) -> AppResult<Json<RideSnapshot>> {
    let command = UpdateRideCommand::new(ride_id, request.into());

    Ok(Json(state.rides.update(command, &context).await?))
}

// =========================================================================
// PUT /rides/:ride_id/driver-status
// =========================================================================

async fn update_driver_status(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    PathParams(ride_id): PathParams<Uuid>,
    JsonBody(request): JsonBody<StatusRequest>,
) -> AppResult<Json<RideSnapshot>> {
    let proposed: DriverStatus = request
        .status
        .parse()
        .map_err(|e: crate::domain::UnknownStatus| AppError::InvalidRequest(e.to_string()))?;

    let ride = state
        .rides
        .update_driver_status(ride_id, proposed, &context)
        .await?;

    Ok(Json(ride))
}

// =========================================================================
// PUT /rides/:ride_id/passenger-status
// =========================================================================

async fn update_passenger_status(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    PathParams(ride_id): PathParams<Uuid>,
    JsonBody(request): JsonBody<StatusRequest>,
) -> AppResult<Json<RideSnapshot>> {
    let proposed: PassengerStatus = request
        .status
        .parse()
        .map_err(|e: crate::domain::UnknownStatus| AppError::InvalidRequest(e.to_string()))?;

    let ride = state
        .rides
        .update_passenger_status(ride_id, proposed, &context)
        .await?;

    Ok(Json(ride))
}

// =========================================================================
// GET /notifications/:role
// =========================================================================

/// Stream the notifications of one role channel as Server-Sent Events.
///
/// Each event is named `ride` and carries the JSON `RideNotification`.
/// Subscribers that fall behind skip the missed messages.
async fn stream_notifications(
    State(state): State<AppState>,
    PathParams(role): PathParams<String>,
    QueryParams(params): QueryParams<NotificationStreamParams>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let role: ActorRole = role.parse().map_err(AppError::InvalidRequest)?;
    let actor_id = params.actor_id;

    tracing::info!(%role, ?actor_id, "Notification stream opened");

    let stream = BroadcastStream::new(state.notifications.subscribe(role)).filter_map(
        move |message| match message {
            Ok(notification) => {
                if actor_id.is_some_and(|id| id != notification.recipient_id()) {
                    return None;
                }

                match Event::default()
                    .event("ride")
                    .id(notification.id.to_string())
                    .json_data(&notification)
                {
                    Ok(event) => Some(Ok(event)),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to encode ride notification");
                        None
                    }
                }
            }
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(%role, skipped, "Notification subscriber lagged");
                None
            }
        },
    );

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
