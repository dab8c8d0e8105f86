// Event service for business logic
//
// Coarse query intents are translated into storage calls here, with
// in-memory post-filtering and sorting. Every list result comes back
// sorted by event date ascending; the sort is stable, so equal dates keep
// their relative order and unparseable dates sink to the end.

use chrono::{Duration, NaiveDateTime};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use gatherly_contracts::{Event, EventForm, Participant};
use gatherly_storage::{CreateEventRow, EventRecord, JoinOutcome, StorageBackend, UpdateEventRow};

use crate::error::EventError;

pub struct EventService {
    db: Arc<StorageBackend>,
}

impl EventService {
    pub fn new(db: Arc<StorageBackend>) -> Self {
        Self { db }
    }

    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Event, EventError> {
        let record = self
            .db
            .get_event(uuid)
            .await?
            .ok_or_else(|| EventError::NotFound(uuid.to_string()))?;
        Ok(Self::record_to_event(record, Self::now()))
    }

    pub async fn get_group_uuid(&self, uuid: &str) -> Result<String, EventError> {
        self.db
            .get_group_uuid(uuid)
            .await?
            .ok_or_else(|| EventError::NotFound(uuid.to_string()))
    }

    pub async fn get_by_uuid_list(&self, uuids: &[String]) -> Result<Vec<Event>, EventError> {
        Ok(Self::to_sorted_events(self.db.list_by_uuids(uuids).await?))
    }

    pub async fn get_organized(&self, username: &str) -> Result<Vec<Event>, EventError> {
        Ok(Self::to_sorted_events(self.db.list_organized(username).await?))
    }

    pub async fn get_joined(&self, username: &str) -> Result<Vec<Event>, EventError> {
        Ok(Self::to_sorted_events(self.db.list_joined(username).await?))
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Vec<Event>, EventError> {
        Ok(Self::to_sorted_events(self.db.list_by_name(name).await?))
    }

    pub async fn get_by_group(&self, group_uuid: &str) -> Result<Vec<Event>, EventError> {
        Ok(Self::to_sorted_events(self.db.list_by_group(group_uuid).await?))
    }

    /// Union of organized and joined events, deduplicated by uuid.
    /// An event the user both organizes and joined appears once.
    pub async fn get_my(&self, username: &str) -> Result<Vec<Event>, EventError> {
        let organized = self.db.list_organized(username).await?;
        let joined = self.db.list_joined(username).await?;

        let seen: HashSet<String> = organized.iter().map(|r| r.event.uuid.clone()).collect();
        let mut records = organized;
        records.extend(joined.into_iter().filter(|r| !seen.contains(&r.event.uuid)));
        Ok(Self::to_sorted_events(records))
    }

    /// Organized events filtered to upcoming ones: not yet happened and
    /// dated within one week of now.
    pub async fn get_home(&self, username: &str) -> Result<Vec<Event>, EventError> {
        let now = Self::now();
        let mut events: Vec<Event> = self
            .db
            .list_organized(username)
            .await?
            .into_iter()
            .map(|record| Self::record_to_event(record, now))
            .filter(|event| event.is_upcoming(now))
            .collect();
        Self::sort_by_date(&mut events);
        Ok(events)
    }

    /// Event count for every requested group; groups without events map to 0.
    pub async fn get_counts_by_groups(
        &self,
        group_uuids: &[String],
    ) -> Result<HashMap<String, i64>, EventError> {
        let mut counts = HashMap::with_capacity(group_uuids.len());
        for group_uuid in group_uuids {
            let count = self.db.count_by_group(group_uuid).await?;
            counts.insert(group_uuid.clone(), count);
        }
        Ok(counts)
    }

    /// Build a new event from the form. With `participate` set the
    /// organizer is enrolled immediately; this bypasses the capacity check
    /// and succeeds even with a capacity of zero.
    pub async fn create(&self, form: EventForm) -> Result<Event, EventError> {
        let initial_participants = if form.participate {
            vec![form.organizer_username.clone()]
        } else {
            Vec::new()
        };
        let input = CreateEventRow {
            name: form.name,
            description: form.description,
            max_participants: form.max_participants,
            event_date: form.event_date,
            published_date: form.published_date,
            organizer_username: form.organizer_username,
            group_uuid: form.group_uuid,
            initial_participants,
        };
        let record = self.db.create_event(input).await?;
        tracing::debug!(uuid = %record.event.uuid, "event created");
        Ok(Self::record_to_event(record, Self::now()))
    }

    /// Replace name, description, event date, and capacity. Shrinking the
    /// capacity clears all participants, all-or-nothing.
    pub async fn update(&self, uuid: &str, form: EventForm) -> Result<Event, EventError> {
        let input = UpdateEventRow {
            name: form.name,
            description: form.description,
            event_date: form.event_date,
            max_participants: form.max_participants,
        };
        let record = self
            .db
            .update_event(uuid, input)
            .await?
            .ok_or_else(|| EventError::NotFound(uuid.to_string()))?;
        Ok(Self::record_to_event(record, Self::now()))
    }

    /// Idempotent join: an already-enrolled username gets the event back
    /// unchanged instead of a second membership.
    pub async fn join(&self, uuid: &str, username: &str) -> Result<Event, EventError> {
        match self.db.join_event(uuid, username).await? {
            JoinOutcome::Joined(record) | JoinOutcome::AlreadyMember(record) => {
                Ok(Self::record_to_event(record, Self::now()))
            }
            JoinOutcome::Full => Err(EventError::Full(uuid.to_string())),
            JoinOutcome::NotFound => Err(EventError::NotFound(uuid.to_string())),
        }
    }

    /// Remove the username's membership; silent no-op when not enrolled.
    pub async fn leave(&self, uuid: &str, username: &str) -> Result<Event, EventError> {
        let record = self
            .db
            .leave_event(uuid, username)
            .await?
            .ok_or_else(|| EventError::NotFound(uuid.to_string()))?;
        Ok(Self::record_to_event(record, Self::now()))
    }

    pub async fn remove_user_from_group_events(
        &self,
        group_uuid: &str,
        username: &str,
    ) -> Result<u64, EventError> {
        Ok(self.db.remove_user_from_group(group_uuid, username).await?)
    }

    pub async fn delete_by_uuids(&self, uuids: &[String]) -> Result<u64, EventError> {
        Ok(self.db.delete_by_uuids(uuids).await?)
    }

    pub async fn delete_by_group(&self, group_uuid: &str) -> Result<u64, EventError> {
        Ok(self.db.delete_by_group(group_uuid).await?)
    }

    pub async fn delete_from_group_by_organizer(
        &self,
        group_uuid: &str,
        username: &str,
    ) -> Result<u64, EventError> {
        Ok(self
            .db
            .delete_from_group_by_organizer(group_uuid, username)
            .await?)
    }

    /// Explicit expiration sweep: delete every event dated more than 24
    /// hours in the past. Reads never delete.
    pub async fn sweep_expired(&self) -> Result<u64, EventError> {
        let cutoff = Self::now() - Duration::days(1);
        let deleted = self.db.delete_expired(cutoff).await?;
        if deleted > 0 {
            tracing::info!(deleted, "expired events swept");
        }
        Ok(deleted)
    }

    fn now() -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }

    fn record_to_event(record: EventRecord, now: NaiveDateTime) -> Event {
        let mut event = Event {
            uuid: record.event.uuid,
            name: record.event.name,
            description: record.event.description,
            max_participants: record.event.max_participants,
            event_date: record.event.event_date,
            published_date: record.event.published_date,
            organizer_username: record.event.organizer_username,
            group_uuid: record.event.group_uuid,
            happened: false,
            participants: record
                .participants
                .into_iter()
                .map(|p| Participant {
                    uuid: p.uuid,
                    username: p.username,
                })
                .collect(),
        };
        event.happened = event.has_happened(now);
        event
    }

    fn to_sorted_events(records: Vec<EventRecord>) -> Vec<Event> {
        let now = Self::now();
        let mut events: Vec<Event> = records
            .into_iter()
            .map(|record| Self::record_to_event(record, now))
            .collect();
        Self::sort_by_date(&mut events);
        events
    }

    fn sort_by_date(events: &mut [Event]) {
        events.sort_by_key(|e| (e.event_date_time().is_none(), e.event_date_time()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatherly_contracts::DATE_FORMAT;

    fn service() -> EventService {
        EventService::new(Arc::new(StorageBackend::in_memory()))
    }

    fn date_in(days: i64) -> String {
        (chrono::Local::now().naive_local() + Duration::days(days))
            .format(DATE_FORMAT)
            .to_string()
    }

    fn form(name: &str, capacity: i32, organizer: &str, group: &str, days: i64) -> EventForm {
        EventForm {
            group_uuid: group.to_string(),
            name: name.to_string(),
            description: "a test event".to_string(),
            max_participants: capacity,
            event_date: date_in(days),
            published_date: date_in(-7),
            organizer_username: organizer.to_string(),
            participate: false,
        }
    }

    #[tokio::test]
    async fn join_is_rejected_at_capacity() {
        let service = service();
        let event = service.create(form("social", 2, "org", "g1", 3)).await.unwrap();

        let event = service.join(&event.uuid, "a").await.unwrap();
        assert_eq!(event.participants.len(), 1);
        let event = service.join(&event.uuid, "b").await.unwrap();
        assert_eq!(event.participants.len(), 2);

        let err = service.join(&event.uuid, "c").await.unwrap_err();
        assert!(matches!(err, EventError::Full(_)));
        let event = service.get_by_uuid(&event.uuid).await.unwrap();
        assert_eq!(event.participants.len(), 2);
    }

    #[tokio::test]
    async fn join_unknown_event_is_not_found() {
        let err = service().join("missing", "a").await.unwrap_err();
        assert!(matches!(err, EventError::NotFound(_)));
    }

    #[tokio::test]
    async fn participate_flag_bypasses_capacity() {
        let service = service();
        let mut zero_capacity = form("social", 0, "org", "g1", 3);
        zero_capacity.participate = true;

        let event = service.create(zero_capacity).await.unwrap();
        assert_eq!(event.participants.len(), 1);
        assert_eq!(event.participants[0].username, "org");
        // but a regular join is still rejected
        assert!(matches!(
            service.join(&event.uuid, "a").await.unwrap_err(),
            EventError::Full(_)
        ));
    }

    #[tokio::test]
    async fn my_events_deduplicates_organized_and_joined() {
        let service = service();
        let own = service.create(form("own", 5, "me", "g1", 1)).await.unwrap();
        let other = service.create(form("other", 5, "them", "g1", 2)).await.unwrap();
        service.create(form("unrelated", 5, "them", "g1", 3)).await.unwrap();

        // Joining my own event must not list it twice
        service.join(&own.uuid, "me").await.unwrap();
        service.join(&other.uuid, "me").await.unwrap();

        let my = service.get_my("me").await.unwrap();
        let uuids: Vec<&str> = my.iter().map(|e| e.uuid.as_str()).collect();
        assert_eq!(uuids, vec![own.uuid.as_str(), other.uuid.as_str()]);
    }

    #[tokio::test]
    async fn home_keeps_only_upcoming_organized_events() {
        let service = service();
        service.create(form("past", 5, "me", "g1", -2)).await.unwrap();
        let soon = service.create(form("soon", 5, "me", "g1", 2)).await.unwrap();
        service.create(form("far", 5, "me", "g1", 14)).await.unwrap();
        service.create(form("not mine", 5, "them", "g1", 2)).await.unwrap();

        let home = service.get_home("me").await.unwrap();
        assert_eq!(home.len(), 1);
        assert_eq!(home[0].uuid, soon.uuid);
        assert!(!home[0].happened);
    }

    #[tokio::test]
    async fn lists_are_sorted_by_event_date() {
        let service = service();
        let third = service.create(form("third", 5, "me", "g1", 9)).await.unwrap();
        let first = service.create(form("first", 5, "me", "g1", 1)).await.unwrap();
        let second = service.create(form("second", 5, "me", "g1", 5)).await.unwrap();

        let events = service.get_organized("me").await.unwrap();
        let uuids: Vec<&str> = events.iter().map(|e| e.uuid.as_str()).collect();
        assert_eq!(
            uuids,
            vec![first.uuid.as_str(), second.uuid.as_str(), third.uuid.as_str()]
        );
    }

    #[tokio::test]
    async fn shrinking_capacity_clears_participants_via_update() {
        let service = service();
        let event = service.create(form("social", 5, "org", "g1", 3)).await.unwrap();
        for username in ["a", "b", "c"] {
            service.join(&event.uuid, username).await.unwrap();
        }

        let updated = service
            .update(&event.uuid, form("social", 2, "org", "g1", 3))
            .await
            .unwrap();
        assert!(updated.participants.is_empty());

        let err = service
            .update("missing", form("social", 2, "org", "g1", 3))
            .await
            .unwrap_err();
        assert!(matches!(err, EventError::NotFound(_)));
    }

    #[tokio::test]
    async fn counts_include_groups_without_events() {
        let service = service();
        service.create(form("a", 5, "org", "g1", 1)).await.unwrap();
        service.create(form("b", 5, "org", "g1", 2)).await.unwrap();

        let counts = service
            .get_counts_by_groups(&["g1".to_string(), "empty".to_string()])
            .await
            .unwrap();
        assert_eq!(counts.get("g1"), Some(&2));
        assert_eq!(counts.get("empty"), Some(&0));
    }

    #[tokio::test]
    async fn sweep_removes_events_older_than_a_day() {
        let service = service();
        service.create(form("expired", 5, "org", "g1", -3)).await.unwrap();
        let kept = service.create(form("recent", 5, "org", "g1", 1)).await.unwrap();

        assert_eq!(service.sweep_expired().await.unwrap(), 1);
        let remaining = service.get_by_group("g1").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].uuid, kept.uuid);
    }

    #[tokio::test]
    async fn group_uuid_lookup() {
        let service = service();
        let event = service.create(form("a", 5, "org", "g42", 1)).await.unwrap();
        assert_eq!(service.get_group_uuid(&event.uuid).await.unwrap(), "g42");
        assert!(matches!(
            service.get_group_uuid("missing").await.unwrap_err(),
            EventError::NotFound(_)
        ));
    }
}
