// Event CRUD HTTP routes
//
// Selector query parameters on /events dispatch to exactly one service
// call each, mirroring the coarse query intents of the service layer.

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::IntoParams;

use gatherly_contracts::{Event, EventForm, JoinRequest, SweepResponse};
use gatherly_storage::StorageBackend;

use crate::error::ApiError;
use crate::services::EventService;

/// App state for event routes
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<EventService>,
}

impl AppState {
    pub fn new(db: Arc<StorageBackend>) -> Self {
        Self {
            service: Arc::new(EventService::new(db)),
        }
    }
}

/// Create event routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/events",
            get(list_events).post(create_event).delete(delete_in_group),
        )
        .route("/events/counts", get(get_event_counts))
        .route("/events/sweep", post(sweep_expired))
        .route(
            "/events/{uuid}",
            get(get_event).put(update_event).delete(delete_events),
        )
        .route("/events/{uuid}/groupUuid", get(get_group_uuid))
        .route("/events/{uuid}/participants", post(join_event))
        .route(
            "/events/{uuid}/participants/{username}",
            delete(leave_event),
        )
        .with_state(state)
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

// ============================================
// Query Parameters
// ============================================

/// Selector parameters for `GET /events`. Exactly one selector is used,
/// checked in declaration order.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsQuery {
    /// Events organized by this user.
    pub organizer_username: Option<String>,
    /// Events this user participates in.
    pub member_username: Option<String>,
    /// Events organized or joined by this user (with `home`: upcoming only).
    pub username: Option<String>,
    /// Presence switches `username` to the home view.
    pub home: Option<String>,
    /// Case-insensitive name substring.
    pub name: Option<String>,
    /// Comma-separated uuid list.
    pub uuids: Option<String>,
    /// Events belonging to this group.
    pub group_uuid: Option<String>,
}

/// Selector parameters for `DELETE /events`.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEventsQuery {
    pub group_uuid: Option<String>,
    /// With `groupUuid`: remove this user from the group's events (leave).
    pub username: Option<String>,
    /// With `groupUuid`: delete only this organizer's events.
    pub organizer_username: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct EventCountsQuery {
    /// Comma-separated group uuid list.
    pub group_uuids: String,
}

// ============================================
// HTTP Handlers
// ============================================

/// GET /events - List events by a selector query parameter
#[utoipa::path(
    get,
    path = "/events",
    params(ListEventsQuery),
    responses(
        (status = 200, description = "Matching events, sorted by event date", body = Vec<Event>),
        (status = 400, description = "No recognized selector parameter"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn list_events(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let path = uri.path();
    let result = if let Some(organizer) = query.organizer_username.as_deref() {
        state.service.get_organized(organizer).await
    } else if let Some(member) = query.member_username.as_deref() {
        state.service.get_joined(member).await
    } else if let Some(username) = query.username.as_deref() {
        if query.home.is_some() {
            state.service.get_home(username).await
        } else {
            state.service.get_my(username).await
        }
    } else if let Some(name) = query.name.as_deref() {
        state.service.get_by_name(name).await
    } else if let Some(uuids) = query.uuids.as_deref() {
        state.service.get_by_uuid_list(&split_csv(uuids)).await
    } else if let Some(group_uuid) = query.group_uuid.as_deref() {
        state.service.get_by_group(group_uuid).await
    } else {
        return Err(ApiError::bad_request(path, "Missing selector parameter!"));
    };
    result
        .map(Json)
        .map_err(|err| ApiError::from_event_error(err, path))
}

/// GET /events/counts - Event counts per group
#[utoipa::path(
    get,
    path = "/events/counts",
    params(EventCountsQuery),
    responses(
        (status = 200, description = "Event count keyed by group uuid"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn get_event_counts(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<EventCountsQuery>,
) -> Result<Json<HashMap<String, i64>>, ApiError> {
    state
        .service
        .get_counts_by_groups(&split_csv(&query.group_uuids))
        .await
        .map(Json)
        .map_err(|err| ApiError::from_event_error(err, uri.path()))
}

/// POST /events - Create a new event
#[utoipa::path(
    post,
    path = "/events",
    request_body = EventForm,
    responses(
        (status = 201, description = "Event created successfully", body = Event),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn create_event(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Json(form): Json<EventForm>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    state
        .service
        .create(form)
        .await
        .map(|event| (StatusCode::CREATED, Json(event)))
        .map_err(|err| ApiError::from_event_error(err, uri.path()))
}

/// GET /events/{uuid} - Get event by uuid
#[utoipa::path(
    get,
    path = "/events/{uuid}",
    params(("uuid" = String, Path, description = "Event uuid")),
    responses(
        (status = 200, description = "Event found", body = Event),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn get_event(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(uuid): Path<String>,
) -> Result<Json<Event>, ApiError> {
    state
        .service
        .get_by_uuid(&uuid)
        .await
        .map(Json)
        .map_err(|err| ApiError::from_event_error(err, uri.path()))
}

/// GET /events/{uuid}/groupUuid - Group uuid of an event
#[utoipa::path(
    get,
    path = "/events/{uuid}/groupUuid",
    params(("uuid" = String, Path, description = "Event uuid")),
    responses(
        (status = 200, description = "Group uuid", body = String),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn get_group_uuid(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(uuid): Path<String>,
) -> Result<Json<String>, ApiError> {
    state
        .service
        .get_group_uuid(&uuid)
        .await
        .map(Json)
        .map_err(|err| ApiError::from_event_error(err, uri.path()))
}

/// PUT /events/{uuid} - Replace an event's mutable fields
#[utoipa::path(
    put,
    path = "/events/{uuid}",
    params(("uuid" = String, Path, description = "Event uuid")),
    request_body = EventForm,
    responses(
        (status = 200, description = "Event updated successfully", body = Event),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn update_event(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(uuid): Path<String>,
    Json(form): Json<EventForm>,
) -> Result<Json<Event>, ApiError> {
    state
        .service
        .update(&uuid, form)
        .await
        .map(Json)
        .map_err(|err| ApiError::from_event_error(err, uri.path()))
}

/// DELETE /events/{uuids} - Bulk delete by comma-separated uuid list
#[utoipa::path(
    delete,
    path = "/events/{uuids}",
    params(("uuids" = String, Path, description = "Comma-separated event uuids")),
    responses(
        (status = 204, description = "Events deleted"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn delete_events(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(uuids): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_by_uuids(&split_csv(&uuids))
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(|err| ApiError::from_event_error(err, uri.path()))
}

/// DELETE /events - Group-scoped bulk removal
///
/// `groupUuid` alone deletes the group's events; with `organizerUsername`
/// only that organizer's events; with `username` the user leaves every
/// event in the group instead (events stay).
#[utoipa::path(
    delete,
    path = "/events",
    params(DeleteEventsQuery),
    responses(
        (status = 204, description = "Removal applied"),
        (status = 400, description = "Missing groupUuid"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn delete_in_group(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<DeleteEventsQuery>,
) -> Result<StatusCode, ApiError> {
    let path = uri.path();
    let Some(group_uuid) = query.group_uuid.as_deref() else {
        return Err(ApiError::bad_request(path, "Missing groupUuid parameter!"));
    };
    let result = if let Some(username) = query.username.as_deref() {
        state
            .service
            .remove_user_from_group_events(group_uuid, username)
            .await
    } else if let Some(organizer) = query.organizer_username.as_deref() {
        state
            .service
            .delete_from_group_by_organizer(group_uuid, organizer)
            .await
    } else {
        state.service.delete_by_group(group_uuid).await
    };
    result
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(|err| ApiError::from_event_error(err, path))
}

/// POST /events/{uuid}/participants - Join an event
#[utoipa::path(
    post,
    path = "/events/{uuid}/participants",
    params(("uuid" = String, Path, description = "Event uuid")),
    request_body = JoinRequest,
    responses(
        (status = 200, description = "Joined; the updated event", body = Event),
        (status = 400, description = "Event full"),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "participants"
)]
pub async fn join_event(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(uuid): Path<String>,
    Json(req): Json<JoinRequest>,
) -> Result<Json<Event>, ApiError> {
    state
        .service
        .join(&uuid, &req.username)
        .await
        .map(Json)
        .map_err(|err| ApiError::from_event_error(err, uri.path()))
}

/// DELETE /events/{uuid}/participants/{username} - Leave an event
#[utoipa::path(
    delete,
    path = "/events/{uuid}/participants/{username}",
    params(
        ("uuid" = String, Path, description = "Event uuid"),
        ("username" = String, Path, description = "Participant username")
    ),
    responses(
        (status = 200, description = "Left; the updated event", body = Event),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "participants"
)]
pub async fn leave_event(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path((uuid, username)): Path<(String, String)>,
) -> Result<Json<Event>, ApiError> {
    state
        .service
        .leave(&uuid, &username)
        .await
        .map(Json)
        .map_err(|err| ApiError::from_event_error(err, uri.path()))
}

/// POST /events/sweep - Delete expired events
///
/// Expiration is an explicit operation; reads never delete.
#[utoipa::path(
    post,
    path = "/events/sweep",
    responses(
        (status = 200, description = "Sweep result", body = SweepResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn sweep_expired(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<SweepResponse>, ApiError> {
    state
        .service
        .sweep_expired()
        .await
        .map(|deleted| Json(SweepResponse { deleted }))
        .map_err(|err| ApiError::from_event_error(err, uri.path()))
}
