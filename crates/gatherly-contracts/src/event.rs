// Event and Participant DTOs for the public API

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Date format used for `eventDate` and `publishedDate` on the wire.
/// Dates are stored as formatted strings and parsed on demand.
pub const DATE_FORMAT: &str = "%d-%m-%Y %H:%M";

/// A scheduled gathering with a capacity and a set of participants,
/// owned by an organizer and associated with exactly one external group.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Server-generated identifier, immutable once assigned.
    pub uuid: String,
    pub name: String,
    pub description: String,
    /// Capacity; joins fail once the participant count reaches it.
    pub max_participants: i32,
    /// Formatted as `dd-MM-yyyy HH:mm`.
    pub event_date: String,
    /// Formatted as `dd-MM-yyyy HH:mm`.
    pub published_date: String,
    pub organizer_username: String,
    /// Reference to the external group entity owning this event.
    pub group_uuid: String,
    /// Whether the event date is in the past. Computed, not persisted.
    #[serde(default)]
    pub happened: bool,
    pub participants: Vec<Participant>,
}

/// A membership record linking one username to one event.
/// The owning event reference exists only in storage and is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub uuid: String,
    pub username: String,
}

impl Event {
    /// Parse the event date; `None` when the stored string does not match
    /// [`DATE_FORMAT`].
    pub fn event_date_time(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.event_date, DATE_FORMAT).ok()
    }

    pub fn published_date_time(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.published_date, DATE_FORMAT).ok()
    }

    pub fn is_member(&self, username: &str) -> bool {
        self.participants.iter().any(|p| p.username == username)
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() as i32 >= self.max_participants
    }

    /// The event date is in the past.
    pub fn has_happened(&self, now: NaiveDateTime) -> bool {
        self.event_date_time().is_some_and(|date| date < now)
    }

    /// The event date is more than 24 hours in the past. Expired events are
    /// candidates for removal by the sweep operation.
    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.event_date_time()
            .is_some_and(|date| date < now - Duration::days(1))
    }

    /// Not yet happened and dated within one week of `now`.
    pub fn is_upcoming(&self, now: NaiveDateTime) -> bool {
        self.event_date_time()
            .is_some_and(|date| date >= now && date < now + Duration::weeks(1))
    }
}
