// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded event database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user_id → serialized User
//! - `user_emails`: normalized email → user_id
//! - `user_handles`: handle → user_id
//! - `events`: event_id → serialized Event
//! - `rsvps`: rsvp_id → serialized Rsvp
//! - `rsvp_pairs`: `user_id|event_id` → rsvp_id
//!
//! Index tables are maintained in the same write transaction as the rows
//! they point to.

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{
    select_window, sort_events, CredentialStore, EventFilter, EventStore, Store, StoreError,
    StoreResult, UnitOfWork,
};
use crate::models::{Event, EventId, NewUser, Rsvp, RsvpId, User, UserId};

// =============================================================================
// Table Definitions
// =============================================================================

const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

const USER_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("user_emails");

const USER_HANDLES: TableDefinition<&str, &str> = TableDefinition::new("user_handles");

const EVENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("events");

const RSVPS: TableDefinition<&str, &[u8]> = TableDefinition::new("rsvps");

/// Uniqueness index for (user, event). Key format: `user_id|event_id`.
const RSVP_PAIRS: TableDefinition<&str, &str> = TableDefinition::new("rsvp_pairs");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
enum DbError {
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Conflict(String),
}

type DbResult<T> = Result<T, DbError>;

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Conflict(msg) => StoreError::Conflict(msg),
            other => {
                tracing::error!(error = %other, "redb operation failed");
                StoreError::Unavailable(other.to_string())
            }
        }
    }
}

// =============================================================================
// Row Helpers
// =============================================================================

fn pair_key(user: UserId, event: EventId) -> String {
    format!("{user}|{event}")
}

fn get_row<T, Tbl>(table: &Tbl, key: &str) -> DbResult<Option<T>>
where
    T: DeserializeOwned,
    Tbl: ReadableTable<&'static str, &'static [u8]>,
{
    match table.get(key)? {
        Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
        None => Ok(None),
    }
}

fn all_rows<T, Tbl>(table: &Tbl) -> DbResult<Vec<T>>
where
    T: DeserializeOwned,
    Tbl: ReadableTable<&'static str, &'static [u8]>,
{
    let mut rows = Vec::new();
    for entry in table.iter()? {
        let (_, value) = entry?;
        rows.push(serde_json::from_slice(value.value())?);
    }
    Ok(rows)
}

fn get_index<Tbl>(table: &Tbl, key: &str) -> DbResult<Option<String>>
where
    Tbl: ReadableTable<&'static str, &'static str>,
{
    Ok(table.get(key)?.map(|v| v.value().to_string()))
}

fn encode<T: Serialize>(row: &T) -> DbResult<Vec<u8>> {
    Ok(serde_json::to_vec(row)?)
}

// =============================================================================
// RedbStore
// =============================================================================

/// Durable store in a single redb file.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Ok(Self::open_inner(path)?)
    }

    fn open_inner(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USER_EMAILS)?;
            let _ = write_txn.open_table(USER_HANDLES)?;
            let _ = write_txn.open_table(EVENTS)?;
            let _ = write_txn.open_table(RSVPS)?;
            let _ = write_txn.open_table(RSVP_PAIRS)?;
        }
        write_txn.commit()?;

        tracing::info!(path = %path.display(), "opened event database");
        Ok(Self { db })
    }

    fn load_user(&self, id: UserId) -> DbResult<Option<User>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        get_row(&table, &id.to_string())
    }

    fn load_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let read_txn = self.db.begin_read()?;
        let emails = read_txn.open_table(USER_EMAILS)?;
        let Some(user_id) = get_index(&emails, email)? else {
            return Ok(None);
        };
        let users = read_txn.open_table(USERS)?;
        get_row(&users, &user_id)
    }

    fn index_contains(
        &self,
        index: TableDefinition<'static, &'static str, &'static str>,
        key: &str,
    ) -> DbResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(index)?;
        Ok(table.get(key)?.is_some())
    }

    fn insert_user(&self, new_user: NewUser, created_at: DateTime<Utc>) -> DbResult<User> {
        let user = User {
            id: UserId::new(),
            handle: new_user.handle,
            email: new_user.email,
            secret_hash: new_user.secret_hash,
            created_at,
        };
        let user_id = user.id.to_string();
        let json = encode(&user)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut handles = write_txn.open_table(USER_HANDLES)?;
            if handles.get(user.handle.as_str())?.is_some() {
                return Err(DbError::Conflict(format!("handle {} is taken", user.handle)));
            }
            let mut emails = write_txn.open_table(USER_EMAILS)?;
            if emails.get(user.email.as_str())?.is_some() {
                return Err(DbError::Conflict(format!("email {} is taken", user.email)));
            }

            handles.insert(user.handle.as_str(), user_id.as_str())?;
            emails.insert(user.email.as_str(), user_id.as_str())?;
            write_txn
                .open_table(USERS)?
                .insert(user_id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(user)
    }

    fn load_event(&self, id: EventId) -> DbResult<Option<Event>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS)?;
        get_row(&table, &id.to_string())
    }

    fn load_events(&self) -> DbResult<Vec<Event>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS)?;
        all_rows(&table)
    }

    fn load_attended(&self, user: UserId) -> DbResult<Vec<Event>> {
        let read_txn = self.db.begin_read()?;
        let rsvps: Vec<Rsvp> = all_rows(&read_txn.open_table(RSVPS)?)?;
        let events = read_txn.open_table(EVENTS)?;

        let mut attended = Vec::new();
        for rsvp in rsvps.into_iter().filter(|r| r.user_id == user) {
            if let Some(event) = get_row(&events, &rsvp.event_id.to_string())? {
                attended.push(event);
            }
        }
        Ok(attended)
    }

    fn load_rsvps(&self) -> DbResult<Vec<Rsvp>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RSVPS)?;
        all_rows(&table)
    }

    fn load_rsvp_for_pair(&self, user: UserId, event: EventId) -> DbResult<Option<Rsvp>> {
        let read_txn = self.db.begin_read()?;
        let pairs = read_txn.open_table(RSVP_PAIRS)?;
        let Some(rsvp_id) = get_index(&pairs, &pair_key(user, event))? else {
            return Ok(None);
        };
        let rsvps = read_txn.open_table(RSVPS)?;
        get_row(&rsvps, &rsvp_id)
    }

    fn ping(&self) -> DbResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(USERS)?;
        Ok(())
    }
}

impl CredentialStore for RedbStore {
    fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.load_user(id)?)
    }

    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.load_user_by_email(email)?)
    }

    fn exists_by_handle(&self, handle: &str) -> StoreResult<bool> {
        Ok(self.index_contains(USER_HANDLES, handle)?)
    }

    fn exists_by_email(&self, email: &str) -> StoreResult<bool> {
        Ok(self.index_contains(USER_EMAILS, email)?)
    }

    fn save_user(&self, user: NewUser, created_at: DateTime<Utc>) -> StoreResult<User> {
        Ok(self.insert_user(user, created_at)?)
    }
}

impl EventStore for RedbStore {
    fn get_event(&self, id: EventId) -> StoreResult<Option<Event>> {
        Ok(self.load_event(id)?)
    }

    fn query_events(
        &self,
        filter: &EventFilter,
        offset: u64,
        limit: u64,
    ) -> StoreResult<(Vec<Event>, u64)> {
        let events = self.load_events()?;
        Ok(select_window(events, filter, offset, limit))
    }

    fn events_by_organizer(&self, organizer: UserId) -> StoreResult<Vec<Event>> {
        let mut events: Vec<Event> = self
            .load_events()?
            .into_iter()
            .filter(|e| e.organizer_id == organizer)
            .collect();
        sort_events(&mut events);
        Ok(events)
    }

    fn events_attended_by(&self, user: UserId) -> StoreResult<Vec<Event>> {
        let mut events = self.load_attended(user)?;
        sort_events(&mut events);
        Ok(events)
    }

    fn rsvps_for_event(&self, event: EventId) -> StoreResult<Vec<Rsvp>> {
        let mut rsvps: Vec<Rsvp> = self
            .load_rsvps()?
            .into_iter()
            .filter(|r| r.event_id == event)
            .collect();
        rsvps.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rsvps)
    }

    fn find_rsvp(&self, user: UserId, event: EventId) -> StoreResult<Option<Rsvp>> {
        Ok(self.load_rsvp_for_pair(user, event)?)
    }
}

impl Store for RedbStore {
    fn begin(&self) -> StoreResult<Box<dyn UnitOfWork + '_>> {
        let txn = self.db.begin_write().map_err(DbError::from)?;
        Ok(Box::new(RedbUnitOfWork { txn }))
    }

    fn health_check(&self) -> StoreResult<()> {
        Ok(self.ping()?)
    }
}

// =============================================================================
// Unit of Work
// =============================================================================

/// A redb write transaction. Aborts on drop unless committed.
struct RedbUnitOfWork {
    txn: WriteTransaction,
}

impl RedbUnitOfWork {
    fn read_event(&self, id: EventId) -> DbResult<Option<Event>> {
        let events = self.txn.open_table(EVENTS)?;
        get_row(&events, &id.to_string())
    }

    fn rsvp_for_pair(&self, user: UserId, event: EventId) -> DbResult<Option<Rsvp>> {
        let pairs = self.txn.open_table(RSVP_PAIRS)?;
        let Some(rsvp_id) = get_index(&pairs, &pair_key(user, event))? else {
            return Ok(None);
        };
        let rsvps = self.txn.open_table(RSVPS)?;
        get_row(&rsvps, &rsvp_id)
    }

    fn write_event(&self, event: &Event) -> DbResult<()> {
        let users = self.txn.open_table(USERS)?;
        if users.get(event.organizer_id.to_string().as_str())?.is_none() {
            return Err(DbError::Conflict(format!(
                "organizer {} does not exist",
                event.organizer_id
            )));
        }

        let json = encode(event)?;
        self.txn
            .open_table(EVENTS)?
            .insert(event.id.to_string().as_str(), json.as_slice())?;
        Ok(())
    }

    fn write_rsvp(&self, rsvp: &Rsvp) -> DbResult<()> {
        if self
            .txn
            .open_table(USERS)?
            .get(rsvp.user_id.to_string().as_str())?
            .is_none()
        {
            return Err(DbError::Conflict(format!("user {} does not exist", rsvp.user_id)));
        }
        if self
            .txn
            .open_table(EVENTS)?
            .get(rsvp.event_id.to_string().as_str())?
            .is_none()
        {
            return Err(DbError::Conflict(format!(
                "event {} does not exist",
                rsvp.event_id
            )));
        }

        let rsvp_id = rsvp.id.to_string();
        let key = pair_key(rsvp.user_id, rsvp.event_id);
        let mut pairs = self.txn.open_table(RSVP_PAIRS)?;
        if let Some(existing) = get_index(&pairs, &key)? {
            if existing != rsvp_id {
                return Err(DbError::Conflict(format!(
                    "user {} already has an RSVP for event {}",
                    rsvp.user_id, rsvp.event_id
                )));
            }
        }

        let json = encode(rsvp)?;
        pairs.insert(key.as_str(), rsvp_id.as_str())?;
        self.txn
            .open_table(RSVPS)?
            .insert(rsvp_id.as_str(), json.as_slice())?;
        Ok(())
    }

    fn remove_rsvp(&self, id: RsvpId) -> DbResult<bool> {
        let mut rsvps = self.txn.open_table(RSVPS)?;
        let removed: Option<Rsvp> = match rsvps.remove(id.to_string().as_str())? {
            Some(value) => Some(serde_json::from_slice(value.value())?),
            None => None,
        };
        let Some(rsvp) = removed else {
            return Ok(false);
        };
        self.txn
            .open_table(RSVP_PAIRS)?
            .remove(pair_key(rsvp.user_id, rsvp.event_id).as_str())?;
        Ok(true)
    }

    fn remove_rsvps_for_event(&self, event: EventId) -> DbResult<usize> {
        let doomed: Vec<Rsvp> = {
            let rsvps = self.txn.open_table(RSVPS)?;
            all_rows::<Rsvp, _>(&rsvps)?
                .into_iter()
                .filter(|r| r.event_id == event)
                .collect()
        };

        let mut rsvps = self.txn.open_table(RSVPS)?;
        let mut pairs = self.txn.open_table(RSVP_PAIRS)?;
        for rsvp in &doomed {
            rsvps.remove(rsvp.id.to_string().as_str())?;
            pairs.remove(pair_key(rsvp.user_id, rsvp.event_id).as_str())?;
        }
        Ok(doomed.len())
    }

    fn remove_event(&self, id: EventId) -> DbResult<bool> {
        let referenced = {
            let rsvps = self.txn.open_table(RSVPS)?;
            all_rows::<Rsvp, _>(&rsvps)?
                .iter()
                .any(|r| r.event_id == id)
        };
        if referenced {
            return Err(DbError::Conflict(format!("event {id} still has RSVPs")));
        }

        let mut events = self.txn.open_table(EVENTS)?;
        let removed = events.remove(id.to_string().as_str())?.is_some();
        Ok(removed)
    }
}

impl UnitOfWork for RedbUnitOfWork {
    fn get_event(&mut self, id: EventId) -> StoreResult<Option<Event>> {
        Ok(self.read_event(id)?)
    }

    fn find_rsvp(&mut self, user: UserId, event: EventId) -> StoreResult<Option<Rsvp>> {
        Ok(self.rsvp_for_pair(user, event)?)
    }

    fn put_event(&mut self, event: &Event) -> StoreResult<()> {
        Ok(self.write_event(event)?)
    }

    fn put_rsvp(&mut self, rsvp: &Rsvp) -> StoreResult<()> {
        Ok(self.write_rsvp(rsvp)?)
    }

    fn delete_rsvp(&mut self, id: RsvpId) -> StoreResult<bool> {
        Ok(self.remove_rsvp(id)?)
    }

    fn delete_rsvps_for_event(&mut self, event: EventId) -> StoreResult<usize> {
        Ok(self.remove_rsvps_for_event(event)?)
    }

    fn delete_event(&mut self, id: EventId) -> StoreResult<bool> {
        Ok(self.remove_event(id)?)
    }

    fn commit(self: Box<Self>) -> StoreResult<()> {
        self.txn.commit().map_err(DbError::from)?;
        Ok(())
    }
}
