//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::domain::RouteId;
use crate::entity::{LocationEntity, SensorEntity};

use super::dto::*;
use super::state::AppState;

/// Most events returned by `/events` when no limit is given.
const DEFAULT_EVENT_LIMIT: usize = 50;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/routes", get(list_routes))
        .route("/routes/:id", get(route_sensor))
        .route("/routes/:id/location", get(route_location))
        .route("/events", get(recent_events))
        .route("/refresh", post(refresh))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// All routes with their current state.
async fn list_routes(State(state): State<AppState>) -> Json<RoutesResponse> {
    let snapshots = state.snapshots.read().await;
    let routes = snapshots.values().map(RouteSummary::from).collect();
    Json(RoutesResponse { routes })
}

/// The sensor entity of one route.
async fn route_sensor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SensorEntity>, AppError> {
    let snapshots = state.snapshots.read().await;
    snapshots
        .get(&RouteId::new(id.as_str()))
        .map(|s| Json(s.sensor.clone()))
        .ok_or_else(|| not_found(&id))
}

/// The location entity of one route.
async fn route_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LocationEntity>, AppError> {
    let snapshots = state.snapshots.read().await;
    snapshots
        .get(&RouteId::new(id.as_str()))
        .map(|s| Json(s.location.clone()))
        .ok_or_else(|| not_found(&id))
}

/// Recent events, newest first.
async fn recent_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Json<EventsResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_EVENT_LIMIT);
    let mut events = state.events.recent().await;
    events.truncate(limit);
    Json(EventsResponse { events })
}

/// Ask the poller for an immediate cycle.
async fn refresh(State(state): State<AppState>) -> (StatusCode, Json<RefreshResponse>) {
    info!("refresh requested over HTTP");
    state.refresh.notify_one();
    (
        StatusCode::ACCEPTED,
        Json(RefreshResponse {
            status: "scheduled".to_string(),
        }),
    )
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound {
        message: format!("Unknown route: {id}"),
    }
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotFound { message: String },
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
        };

        warn!(%status, %message, "request failed");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
