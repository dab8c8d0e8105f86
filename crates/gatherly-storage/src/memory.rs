// In-memory storage implementation for dev mode
// Decision: Use parking_lot for thread-safe access
// Decision: UUIDs generated via uuid v7 (time-ordered)
//
// This implementation provides the same API as the Postgres repository
// backed by a HashMap, allowing the service to run and be tested without a
// database. All data is lost on restart. The write lock plays the role of
// the row lock: join and update are atomic with their capacity checks.

use anyhow::Result;
use chrono::NaiveDateTime;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use gatherly_contracts::DATE_FORMAT;

use crate::models::*;

#[derive(Default)]
pub struct InMemoryDatabase {
    events: RwLock<HashMap<String, EventRecord>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn new_uuid() -> String {
        Uuid::now_v7().to_string()
    }

    /// Snapshot matching records, ordered by uuid (creation order for v7).
    fn collect<F>(&self, predicate: F) -> Vec<EventRecord>
    where
        F: Fn(&EventRecord) -> bool,
    {
        let events = self.events.read();
        let mut records: Vec<EventRecord> =
            events.values().filter(|r| predicate(r)).cloned().collect();
        records.sort_by(|a, b| a.event.uuid.cmp(&b.event.uuid));
        records
    }

    // ============================================
    // Events
    // ============================================

    pub async fn create_event(&self, input: CreateEventRow) -> Result<EventRecord> {
        let uuid = Self::new_uuid();
        let participants = input
            .initial_participants
            .iter()
            .map(|username| ParticipantRow {
                uuid: Self::new_uuid(),
                event_uuid: uuid.clone(),
                username: username.clone(),
            })
            .collect();
        let record = EventRecord {
            event: EventRow {
                uuid: uuid.clone(),
                name: input.name,
                description: input.description,
                max_participants: input.max_participants,
                event_date: input.event_date,
                published_date: input.published_date,
                organizer_username: input.organizer_username,
                group_uuid: input.group_uuid,
            },
            participants,
        };
        self.events.write().insert(uuid, record.clone());
        Ok(record)
    }

    pub async fn get_event(&self, uuid: &str) -> Result<Option<EventRecord>> {
        Ok(self.events.read().get(uuid).cloned())
    }

    pub async fn get_group_uuid(&self, uuid: &str) -> Result<Option<String>> {
        Ok(self
            .events
            .read()
            .get(uuid)
            .map(|r| r.event.group_uuid.clone()))
    }

    pub async fn list_by_uuids(&self, uuids: &[String]) -> Result<Vec<EventRecord>> {
        Ok(self.collect(|r| uuids.contains(&r.event.uuid)))
    }

    pub async fn list_organized(&self, username: &str) -> Result<Vec<EventRecord>> {
        Ok(self.collect(|r| r.event.organizer_username == username))
    }

    pub async fn list_joined(&self, username: &str) -> Result<Vec<EventRecord>> {
        Ok(self.collect(|r| r.participants.iter().any(|p| p.username == username)))
    }

    pub async fn list_by_name(&self, name: &str) -> Result<Vec<EventRecord>> {
        let needle = name.to_lowercase();
        Ok(self.collect(|r| r.event.name.to_lowercase().contains(&needle)))
    }

    pub async fn list_by_group(&self, group_uuid: &str) -> Result<Vec<EventRecord>> {
        Ok(self.collect(|r| r.event.group_uuid == group_uuid))
    }

    pub async fn count_by_group(&self, group_uuid: &str) -> Result<i64> {
        Ok(self
            .events
            .read()
            .values()
            .filter(|r| r.event.group_uuid == group_uuid)
            .count() as i64)
    }

    pub async fn update_event(
        &self,
        uuid: &str,
        input: UpdateEventRow,
    ) -> Result<Option<EventRecord>> {
        let mut events = self.events.write();
        let Some(record) = events.get_mut(uuid) else {
            return Ok(None);
        };
        let shrunk = record.event.max_participants > input.max_participants;
        record.event.name = input.name;
        record.event.description = input.description;
        record.event.event_date = input.event_date;
        record.event.max_participants = input.max_participants;
        if shrunk {
            record.participants.clear();
        }
        Ok(Some(record.clone()))
    }

    // ============================================
    // Participants
    // ============================================

    pub async fn join_event(&self, uuid: &str, username: &str) -> Result<JoinOutcome> {
        let mut events = self.events.write();
        let Some(record) = events.get_mut(uuid) else {
            return Ok(JoinOutcome::NotFound);
        };
        if record.participants.iter().any(|p| p.username == username) {
            return Ok(JoinOutcome::AlreadyMember(record.clone()));
        }
        if record.participants.len() as i32 >= record.event.max_participants {
            return Ok(JoinOutcome::Full);
        }
        record.participants.push(ParticipantRow {
            uuid: Self::new_uuid(),
            event_uuid: uuid.to_string(),
            username: username.to_string(),
        });
        Ok(JoinOutcome::Joined(record.clone()))
    }

    pub async fn leave_event(&self, uuid: &str, username: &str) -> Result<Option<EventRecord>> {
        let mut events = self.events.write();
        let Some(record) = events.get_mut(uuid) else {
            return Ok(None);
        };
        if let Some(index) = record.participants.iter().position(|p| p.username == username) {
            record.participants.remove(index);
        }
        Ok(Some(record.clone()))
    }

    pub async fn remove_user_from_group(&self, group_uuid: &str, username: &str) -> Result<u64> {
        let mut events = self.events.write();
        let mut removed = 0;
        for record in events
            .values_mut()
            .filter(|r| r.event.group_uuid == group_uuid)
        {
            if let Some(index) = record.participants.iter().position(|p| p.username == username) {
                record.participants.remove(index);
                removed += 1;
            }
        }
        Ok(removed)
    }

    // ============================================
    // Bulk deletes
    // ============================================

    pub async fn delete_by_uuids(&self, uuids: &[String]) -> Result<u64> {
        let mut events = self.events.write();
        let mut deleted = 0;
        for uuid in uuids {
            if events.remove(uuid).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    pub async fn delete_by_group(&self, group_uuid: &str) -> Result<u64> {
        let mut events = self.events.write();
        let before = events.len();
        events.retain(|_, r| r.event.group_uuid != group_uuid);
        Ok((before - events.len()) as u64)
    }

    pub async fn delete_from_group_by_organizer(
        &self,
        group_uuid: &str,
        username: &str,
    ) -> Result<u64> {
        let mut events = self.events.write();
        let before = events.len();
        events.retain(|_, r| {
            !(r.event.group_uuid == group_uuid && r.event.organizer_username == username)
        });
        Ok((before - events.len()) as u64)
    }

    pub async fn delete_expired(&self, cutoff: NaiveDateTime) -> Result<u64> {
        let mut events = self.events.write();
        let before = events.len();
        events.retain(|_, r| {
            !NaiveDateTime::parse_from_str(&r.event.event_date, DATE_FORMAT)
                .is_ok_and(|parsed| parsed < cutoff)
        });
        Ok((before - events.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, capacity: i32, group: &str, organizer: &str) -> CreateEventRow {
        CreateEventRow {
            name: name.to_string(),
            description: "a test event".to_string(),
            max_participants: capacity,
            event_date: "20-06-2025 21:30".to_string(),
            published_date: "01-06-2025 09:00".to_string(),
            organizer_username: organizer.to_string(),
            group_uuid: group.to_string(),
            initial_participants: Vec::new(),
        }
    }

    #[tokio::test]
    async fn join_respects_capacity() {
        let db = InMemoryDatabase::new();
        let created = db.create_event(form("social", 2, "g1", "org")).await.unwrap();
        let uuid = created.event.uuid;

        assert!(matches!(
            db.join_event(&uuid, "a").await.unwrap(),
            JoinOutcome::Joined(ref r) if r.participants.len() == 1
        ));
        assert!(matches!(
            db.join_event(&uuid, "b").await.unwrap(),
            JoinOutcome::Joined(ref r) if r.participants.len() == 2
        ));
        assert!(matches!(
            db.join_event(&uuid, "c").await.unwrap(),
            JoinOutcome::Full
        ));
        // The failed join left the count unchanged
        let record = db.get_event(&uuid).await.unwrap().unwrap();
        assert_eq!(record.participants.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_join_is_idempotent() {
        let db = InMemoryDatabase::new();
        let created = db.create_event(form("social", 5, "g1", "org")).await.unwrap();
        let uuid = created.event.uuid;

        db.join_event(&uuid, "a").await.unwrap();
        assert!(matches!(
            db.join_event(&uuid, "a").await.unwrap(),
            JoinOutcome::AlreadyMember(ref r) if r.participants.len() == 1
        ));
    }

    #[tokio::test]
    async fn leave_missing_username_is_a_noop() {
        let db = InMemoryDatabase::new();
        let created = db.create_event(form("social", 5, "g1", "org")).await.unwrap();
        let uuid = created.event.uuid;
        db.join_event(&uuid, "a").await.unwrap();

        let record = db.leave_event(&uuid, "nobody").await.unwrap().unwrap();
        assert_eq!(record.participants.len(), 1);

        let record = db.leave_event(&uuid, "a").await.unwrap().unwrap();
        assert!(record.participants.is_empty());
    }

    #[tokio::test]
    async fn shrinking_capacity_clears_participants() {
        let db = InMemoryDatabase::new();
        let created = db.create_event(form("social", 5, "g1", "org")).await.unwrap();
        let uuid = created.event.uuid;
        for username in ["a", "b", "c"] {
            db.join_event(&uuid, username).await.unwrap();
        }

        let update = UpdateEventRow {
            name: "social".to_string(),
            description: "a test event".to_string(),
            event_date: "20-06-2025 21:30".to_string(),
            max_participants: 2,
        };
        let record = db.update_event(&uuid, update).await.unwrap().unwrap();
        assert_eq!(record.event.max_participants, 2);
        assert!(record.participants.is_empty());
    }

    #[tokio::test]
    async fn equal_or_larger_capacity_preserves_participants() {
        let db = InMemoryDatabase::new();
        let created = db.create_event(form("social", 3, "g1", "org")).await.unwrap();
        let uuid = created.event.uuid;
        db.join_event(&uuid, "a").await.unwrap();

        let update = UpdateEventRow {
            name: "renamed".to_string(),
            description: "a test event".to_string(),
            event_date: "21-06-2025 19:00".to_string(),
            max_participants: 10,
        };
        let record = db.update_event(&uuid, update).await.unwrap().unwrap();
        assert_eq!(record.event.name, "renamed");
        assert_eq!(record.participants.len(), 1);
    }

    #[tokio::test]
    async fn group_scoped_operations() {
        let db = InMemoryDatabase::new();
        let a = db.create_event(form("a", 5, "g1", "org1")).await.unwrap();
        let b = db.create_event(form("b", 5, "g1", "org2")).await.unwrap();
        let _c = db.create_event(form("c", 5, "g2", "org1")).await.unwrap();

        db.join_event(&a.event.uuid, "user").await.unwrap();
        db.join_event(&b.event.uuid, "user").await.unwrap();

        assert_eq!(db.count_by_group("g1").await.unwrap(), 2);
        assert_eq!(db.count_by_group("g2").await.unwrap(), 1);
        assert_eq!(db.count_by_group("missing").await.unwrap(), 0);

        // Leave-all keeps the events but drops the memberships
        assert_eq!(db.remove_user_from_group("g1", "user").await.unwrap(), 2);
        assert_eq!(db.list_joined("user").await.unwrap().len(), 0);
        assert_eq!(db.list_by_group("g1").await.unwrap().len(), 2);

        // Organizer-scoped delete only removes that organizer's events
        assert_eq!(
            db.delete_from_group_by_organizer("g1", "org1").await.unwrap(),
            1
        );
        assert_eq!(db.count_by_group("g1").await.unwrap(), 1);

        assert_eq!(db.delete_by_group("g1").await.unwrap(), 1);
        assert_eq!(db.count_by_group("g1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn name_search_is_case_insensitive_substring() {
        let db = InMemoryDatabase::new();
        db.create_event(form("Lindy Hop Social", 5, "g1", "org"))
            .await
            .unwrap();
        db.create_event(form("Blues night", 5, "g1", "org"))
            .await
            .unwrap();

        assert_eq!(db.list_by_name("lindy").await.unwrap().len(), 1);
        assert_eq!(db.list_by_name("SOCIAL").await.unwrap().len(), 1);
        assert_eq!(db.list_by_name("night").await.unwrap().len(), 1);
        assert_eq!(db.list_by_name("tango").await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn sweep_deletes_only_events_past_cutoff() {
        let db = InMemoryDatabase::new();
        let mut old = form("old", 5, "g1", "org");
        old.event_date = "10-06-2025 12:00".to_string();
        let mut fresh = form("fresh", 5, "g1", "org");
        fresh.event_date = "19-06-2025 12:00".to_string();
        let mut malformed = form("malformed", 5, "g1", "org");
        malformed.event_date = "not a date".to_string();
        db.create_event(old).await.unwrap();
        db.create_event(fresh).await.unwrap();
        db.create_event(malformed).await.unwrap();

        let cutoff =
            NaiveDateTime::parse_from_str("15-06-2025 12:00", DATE_FORMAT).unwrap();
        assert_eq!(db.delete_expired(cutoff).await.unwrap(), 1);
        assert_eq!(db.list_by_group("g1").await.unwrap().len(), 2);
    }
}
