// Request DTOs for the events API

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User-submitted form for creating or replacing an event.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventForm {
    pub group_uuid: String,
    pub name: String,
    pub description: String,
    pub max_participants: i32,
    /// Formatted as `dd-MM-yyyy HH:mm`.
    pub event_date: String,
    /// Formatted as `dd-MM-yyyy HH:mm`.
    pub published_date: String,
    pub organizer_username: String,
    /// When true on create, the organizer is enrolled immediately.
    /// This bypasses the capacity check.
    #[serde(default)]
    pub participate: bool,
}

/// Body of `POST /events/{uuid}/participants`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JoinRequest {
    pub username: String,
}
