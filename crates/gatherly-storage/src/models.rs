// Database models (internal, may differ from public DTOs)

use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub uuid: String,
    pub name: String,
    pub description: String,
    pub max_participants: i32,
    pub event_date: String,
    pub published_date: String,
    pub organizer_username: String,
    pub group_uuid: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct ParticipantRow {
    pub uuid: String,
    pub event_uuid: String,
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct CreateEventRow {
    pub name: String,
    pub description: String,
    pub max_participants: i32,
    pub event_date: String,
    pub published_date: String,
    pub organizer_username: String,
    pub group_uuid: String,
    /// Usernames enrolled at creation time. The capacity check does not
    /// apply to these.
    pub initial_participants: Vec<String>,
}

/// Full replace of the mutable event fields (PUT semantics).
/// Organizer, group, published date, and uuid never change.
#[derive(Debug, Clone)]
pub struct UpdateEventRow {
    pub name: String,
    pub description: String,
    pub event_date: String,
    pub max_participants: i32,
}

/// An event together with its participants, in join order.
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub event: EventRow,
    pub participants: Vec<ParticipantRow>,
}

/// Result of the atomic join operation.
#[derive(Debug)]
pub enum JoinOutcome {
    Joined(EventRecord),
    /// The username was already enrolled; nothing changed.
    AlreadyMember(EventRecord),
    Full,
    NotFound,
}
