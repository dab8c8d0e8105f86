// Storage backend abstraction
// Decision: Use enum dispatch for simplicity over trait objects
//
// This module provides a unified StorageBackend enum that can work with
// either PostgreSQL (production) or in-memory (dev mode) storage.

use anyhow::Result;
use chrono::NaiveDateTime;
use sqlx::PgPool;
use std::sync::Arc;

use crate::memory::InMemoryDatabase;
use crate::models::*;
use crate::repositories::Database;

/// Storage backend that can be either PostgreSQL or in-memory
#[derive(Clone)]
pub enum StorageBackend {
    /// PostgreSQL database (production)
    Postgres(Database),
    /// In-memory database (dev mode)
    InMemory(Arc<InMemoryDatabase>),
}

impl StorageBackend {
    /// Create a PostgreSQL storage backend from a database URL
    pub async fn postgres(database_url: &str) -> Result<Self> {
        let db = Database::from_url(database_url).await?;
        Ok(Self::Postgres(db))
    }

    /// Create an in-memory storage backend
    pub fn in_memory() -> Self {
        Self::InMemory(Arc::new(InMemoryDatabase::new()))
    }

    /// Check if this is dev mode (in-memory)
    pub fn is_dev_mode(&self) -> bool {
        matches!(self, Self::InMemory(_))
    }

    /// Get the PostgreSQL pool if using PostgreSQL backend
    /// Returns None for in-memory backend
    pub fn pool(&self) -> Option<&PgPool> {
        match self {
            Self::Postgres(db) => Some(db.pool()),
            Self::InMemory(_) => None,
        }
    }

    /// Run migrations; no-op for the in-memory backend.
    pub async fn migrate(&self) -> Result<()> {
        match self {
            Self::Postgres(db) => db.migrate().await,
            Self::InMemory(_) => Ok(()),
        }
    }

    // ============================================
    // Events
    // ============================================

    pub async fn create_event(&self, input: CreateEventRow) -> Result<EventRecord> {
        match self {
            Self::Postgres(db) => db.create_event(input).await,
            Self::InMemory(db) => db.create_event(input).await,
        }
    }

    pub async fn get_event(&self, uuid: &str) -> Result<Option<EventRecord>> {
        match self {
            Self::Postgres(db) => db.get_event(uuid).await,
            Self::InMemory(db) => db.get_event(uuid).await,
        }
    }

    pub async fn get_group_uuid(&self, uuid: &str) -> Result<Option<String>> {
        match self {
            Self::Postgres(db) => db.get_group_uuid(uuid).await,
            Self::InMemory(db) => db.get_group_uuid(uuid).await,
        }
    }

    pub async fn list_by_uuids(&self, uuids: &[String]) -> Result<Vec<EventRecord>> {
        match self {
            Self::Postgres(db) => db.list_by_uuids(uuids).await,
            Self::InMemory(db) => db.list_by_uuids(uuids).await,
        }
    }

    pub async fn list_organized(&self, username: &str) -> Result<Vec<EventRecord>> {
        match self {
            Self::Postgres(db) => db.list_organized(username).await,
            Self::InMemory(db) => db.list_organized(username).await,
        }
    }

    pub async fn list_joined(&self, username: &str) -> Result<Vec<EventRecord>> {
        match self {
            Self::Postgres(db) => db.list_joined(username).await,
            Self::InMemory(db) => db.list_joined(username).await,
        }
    }

    pub async fn list_by_name(&self, name: &str) -> Result<Vec<EventRecord>> {
        match self {
            Self::Postgres(db) => db.list_by_name(name).await,
            Self::InMemory(db) => db.list_by_name(name).await,
        }
    }

    pub async fn list_by_group(&self, group_uuid: &str) -> Result<Vec<EventRecord>> {
        match self {
            Self::Postgres(db) => db.list_by_group(group_uuid).await,
            Self::InMemory(db) => db.list_by_group(group_uuid).await,
        }
    }

    pub async fn count_by_group(&self, group_uuid: &str) -> Result<i64> {
        match self {
            Self::Postgres(db) => db.count_by_group(group_uuid).await,
            Self::InMemory(db) => db.count_by_group(group_uuid).await,
        }
    }

    pub async fn update_event(
        &self,
        uuid: &str,
        input: UpdateEventRow,
    ) -> Result<Option<EventRecord>> {
        match self {
            Self::Postgres(db) => db.update_event(uuid, input).await,
            Self::InMemory(db) => db.update_event(uuid, input).await,
        }
    }

    // ============================================
    // Participants
    // ============================================

    pub async fn join_event(&self, uuid: &str, username: &str) -> Result<JoinOutcome> {
        match self {
            Self::Postgres(db) => db.join_event(uuid, username).await,
            Self::InMemory(db) => db.join_event(uuid, username).await,
        }
    }

    pub async fn leave_event(&self, uuid: &str, username: &str) -> Result<Option<EventRecord>> {
        match self {
            Self::Postgres(db) => db.leave_event(uuid, username).await,
            Self::InMemory(db) => db.leave_event(uuid, username).await,
        }
    }

    pub async fn remove_user_from_group(&self, group_uuid: &str, username: &str) -> Result<u64> {
        match self {
            Self::Postgres(db) => db.remove_user_from_group(group_uuid, username).await,
            Self::InMemory(db) => db.remove_user_from_group(group_uuid, username).await,
        }
    }

    // ============================================
    // Bulk deletes
    // ============================================

    pub async fn delete_by_uuids(&self, uuids: &[String]) -> Result<u64> {
        match self {
            Self::Postgres(db) => db.delete_by_uuids(uuids).await,
            Self::InMemory(db) => db.delete_by_uuids(uuids).await,
        }
    }

    pub async fn delete_by_group(&self, group_uuid: &str) -> Result<u64> {
        match self {
            Self::Postgres(db) => db.delete_by_group(group_uuid).await,
            Self::InMemory(db) => db.delete_by_group(group_uuid).await,
        }
    }

    pub async fn delete_from_group_by_organizer(
        &self,
        group_uuid: &str,
        username: &str,
    ) -> Result<u64> {
        match self {
            Self::Postgres(db) => db.delete_from_group_by_organizer(group_uuid, username).await,
            Self::InMemory(db) => db.delete_from_group_by_organizer(group_uuid, username).await,
        }
    }

    pub async fn delete_expired(&self, cutoff: NaiveDateTime) -> Result<u64> {
        match self {
            Self::Postgres(db) => db.delete_expired(cutoff).await,
            Self::InMemory(db) => db.delete_expired(cutoff).await,
        }
    }
}
