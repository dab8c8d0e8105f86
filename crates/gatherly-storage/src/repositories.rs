// Repository layer for database operations
//
// Queries that must be atomic (join, update with capacity shrink) run in a
// transaction and take a row-level lock on the event; everything else is a
// single statement. Rows come back ordered by uuid — v7 uuids are
// time-ordered, so this is creation order.

use anyhow::Result;
use chrono::NaiveDateTime;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use gatherly_contracts::DATE_FORMAT;

use crate::models::*;

const EVENT_COLUMNS: &str = "uuid, name, description, max_participants, event_date, \
     published_date, organizer_username, group_uuid";

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create database connection from URL
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    // ============================================
    // Events
    // ============================================

    pub async fn create_event(&self, input: CreateEventRow) -> Result<EventRecord> {
        let mut tx = self.pool.begin().await?;

        let event = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            INSERT INTO events (uuid, name, description, max_participants, event_date,
                                published_date, organizer_username, group_uuid)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7().to_string())
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.max_participants)
        .bind(&input.event_date)
        .bind(&input.published_date)
        .bind(&input.organizer_username)
        .bind(&input.group_uuid)
        .fetch_one(&mut *tx)
        .await?;

        let mut participants = Vec::with_capacity(input.initial_participants.len());
        for username in &input.initial_participants {
            let row = sqlx::query_as::<_, ParticipantRow>(
                r#"
                INSERT INTO participants (uuid, event_uuid, username)
                VALUES ($1, $2, $3)
                RETURNING uuid, event_uuid, username
                "#,
            )
            .bind(Uuid::now_v7().to_string())
            .bind(&event.uuid)
            .bind(username)
            .fetch_one(&mut *tx)
            .await?;
            participants.push(row);
        }

        tx.commit().await?;
        Ok(EventRecord {
            event,
            participants,
        })
    }

    pub async fn get_event(&self, uuid: &str) -> Result<Option<EventRecord>> {
        let event = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE uuid = $1"
        ))
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;

        let Some(event) = event else {
            return Ok(None);
        };

        let participants = sqlx::query_as::<_, ParticipantRow>(
            "SELECT uuid, event_uuid, username FROM participants \
             WHERE event_uuid = $1 ORDER BY uuid",
        )
        .bind(uuid)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(EventRecord {
            event,
            participants,
        }))
    }

    pub async fn get_group_uuid(&self, uuid: &str) -> Result<Option<String>> {
        let group_uuid = sqlx::query_scalar::<_, String>(
            "SELECT group_uuid FROM events WHERE uuid = $1",
        )
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group_uuid)
    }

    pub async fn list_by_uuids(&self, uuids: &[String]) -> Result<Vec<EventRecord>> {
        let events = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE uuid = ANY($1) ORDER BY uuid"
        ))
        .bind(uuids)
        .fetch_all(&self.pool)
        .await?;
        self.attach_participants(events).await
    }

    pub async fn list_organized(&self, username: &str) -> Result<Vec<EventRecord>> {
        let events = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE organizer_username = $1 ORDER BY uuid"
        ))
        .bind(username)
        .fetch_all(&self.pool)
        .await?;
        self.attach_participants(events).await
    }

    pub async fn list_joined(&self, username: &str) -> Result<Vec<EventRecord>> {
        let events = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT DISTINCT e.uuid, e.name, e.description, e.max_participants,
                   e.event_date, e.published_date, e.organizer_username, e.group_uuid
            FROM events e
            INNER JOIN participants p ON p.event_uuid = e.uuid
            WHERE p.username = $1
            ORDER BY e.uuid
            "#,
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await?;
        self.attach_participants(events).await
    }

    pub async fn list_by_name(&self, name: &str) -> Result<Vec<EventRecord>> {
        let events = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events \
             WHERE name ILIKE '%' || $1 || '%' ORDER BY uuid"
        ))
        .bind(name)
        .fetch_all(&self.pool)
        .await?;
        self.attach_participants(events).await
    }

    pub async fn list_by_group(&self, group_uuid: &str) -> Result<Vec<EventRecord>> {
        let events = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE group_uuid = $1 ORDER BY uuid"
        ))
        .bind(group_uuid)
        .fetch_all(&self.pool)
        .await?;
        self.attach_participants(events).await
    }

    pub async fn count_by_group(&self, group_uuid: &str) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM events WHERE group_uuid = $1",
        )
        .bind(group_uuid)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Replace the mutable fields. When the capacity shrinks, all
    /// participants are cleared in the same transaction.
    pub async fn update_event(
        &self,
        uuid: &str,
        input: UpdateEventRow,
    ) -> Result<Option<EventRecord>> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE uuid = $1 FOR UPDATE"
        ))
        .bind(uuid)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(existing) = existing else {
            return Ok(None);
        };

        let event = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            UPDATE events
            SET name = $2, description = $3, event_date = $4, max_participants = $5
            WHERE uuid = $1
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(uuid)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.event_date)
        .bind(input.max_participants)
        .fetch_one(&mut *tx)
        .await?;

        if existing.max_participants > input.max_participants {
            sqlx::query("DELETE FROM participants WHERE event_uuid = $1")
                .bind(uuid)
                .execute(&mut *tx)
                .await?;
        }

        let participants = sqlx::query_as::<_, ParticipantRow>(
            "SELECT uuid, event_uuid, username FROM participants \
             WHERE event_uuid = $1 ORDER BY uuid",
        )
        .bind(uuid)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(EventRecord {
            event,
            participants,
        }))
    }

    // ============================================
    // Participants
    // ============================================

    /// Atomic check-and-append: the event row is locked for the duration of
    /// the capacity check, so two concurrent joins at the boundary cannot
    /// both succeed.
    pub async fn join_event(&self, uuid: &str, username: &str) -> Result<JoinOutcome> {
        let mut tx = self.pool.begin().await?;

        let event = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE uuid = $1 FOR UPDATE"
        ))
        .bind(uuid)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(event) = event else {
            return Ok(JoinOutcome::NotFound);
        };

        let mut participants = sqlx::query_as::<_, ParticipantRow>(
            "SELECT uuid, event_uuid, username FROM participants \
             WHERE event_uuid = $1 ORDER BY uuid",
        )
        .bind(uuid)
        .fetch_all(&mut *tx)
        .await?;

        if participants.iter().any(|p| p.username == username) {
            tx.commit().await?;
            return Ok(JoinOutcome::AlreadyMember(EventRecord {
                event,
                participants,
            }));
        }

        if participants.len() as i32 >= event.max_participants {
            return Ok(JoinOutcome::Full);
        }

        let row = sqlx::query_as::<_, ParticipantRow>(
            r#"
            INSERT INTO participants (uuid, event_uuid, username)
            VALUES ($1, $2, $3)
            RETURNING uuid, event_uuid, username
            "#,
        )
        .bind(Uuid::now_v7().to_string())
        .bind(uuid)
        .bind(username)
        .fetch_one(&mut *tx)
        .await?;
        participants.push(row);

        tx.commit().await?;
        Ok(JoinOutcome::Joined(EventRecord {
            event,
            participants,
        }))
    }

    /// Remove the user's participant record. Silent no-op when the user is
    /// not enrolled; `None` when the event does not exist.
    pub async fn leave_event(&self, uuid: &str, username: &str) -> Result<Option<EventRecord>> {
        sqlx::query("DELETE FROM participants WHERE event_uuid = $1 AND username = $2")
            .bind(uuid)
            .bind(username)
            .execute(&self.pool)
            .await?;
        self.get_event(uuid).await
    }

    /// Remove the user as a participant from every event in the group.
    /// Events themselves are untouched.
    pub async fn remove_user_from_group(&self, group_uuid: &str, username: &str) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM participants
            WHERE username = $2
              AND event_uuid IN (SELECT uuid FROM events WHERE group_uuid = $1)
            "#,
        )
        .bind(group_uuid)
        .bind(username)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    // ============================================
    // Bulk deletes
    // ============================================

    pub async fn delete_by_uuids(&self, uuids: &[String]) -> Result<u64> {
        let result = sqlx::query("DELETE FROM events WHERE uuid = ANY($1)")
            .bind(uuids)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_by_group(&self, group_uuid: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM events WHERE group_uuid = $1")
            .bind(group_uuid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_from_group_by_organizer(
        &self,
        group_uuid: &str,
        username: &str,
    ) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM events WHERE group_uuid = $1 AND organizer_username = $2",
        )
        .bind(group_uuid)
        .bind(username)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete every event whose parsed date is before `cutoff`. Dates are
    /// parsed in Rust so a single malformed row cannot fail the sweep;
    /// unparseable dates never expire.
    pub async fn delete_expired(&self, cutoff: NaiveDateTime) -> Result<u64> {
        let rows = sqlx::query_as::<_, (String, String)>("SELECT uuid, event_date FROM events")
            .fetch_all(&self.pool)
            .await?;

        let expired: Vec<String> = rows
            .into_iter()
            .filter(|(_, date)| {
                NaiveDateTime::parse_from_str(date, DATE_FORMAT)
                    .is_ok_and(|parsed| parsed < cutoff)
            })
            .map(|(uuid, _)| uuid)
            .collect();

        if expired.is_empty() {
            return Ok(0);
        }
        self.delete_by_uuids(&expired).await
    }

    // ============================================
    // Helpers
    // ============================================

    /// Fetch the participants of all given events in one query and pair
    /// them up, preserving the event order.
    async fn attach_participants(&self, events: Vec<EventRow>) -> Result<Vec<EventRecord>> {
        if events.is_empty() {
            return Ok(Vec::new());
        }

        let uuids: Vec<String> = events.iter().map(|e| e.uuid.clone()).collect();
        let rows = sqlx::query_as::<_, ParticipantRow>(
            "SELECT uuid, event_uuid, username FROM participants \
             WHERE event_uuid = ANY($1) ORDER BY uuid",
        )
        .bind(&uuids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_event: HashMap<String, Vec<ParticipantRow>> = HashMap::new();
        for row in rows {
            by_event.entry(row.event_uuid.clone()).or_default().push(row);
        }

        Ok(events
            .into_iter()
            .map(|event| {
                let participants = by_event.remove(&event.uuid).unwrap_or_default();
                EventRecord {
                    event,
                    participants,
                }
            })
            .collect())
    }
}
