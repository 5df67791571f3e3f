// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory store.
//!
//! Used by tests and when no `DATA_DIR` is configured. Nothing survives a
//! restart.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use super::{
    select_window, sort_events, CredentialStore, EventFilter, EventStore, Store, StoreError,
    StoreResult, UnitOfWork,
};
use crate::models::{Event, EventId, NewUser, Rsvp, RsvpId, User, UserId};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    events: HashMap<EventId, Event>,
    rsvps: HashMap<RsvpId, Rsvp>,
}

impl Tables {
    fn rsvp_for_pair(&self, user: UserId, event: EventId) -> Option<&Rsvp> {
        self.rsvps
            .values()
            .find(|r| r.user_id == user && r.event_id == event)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl CredentialStore for MemoryStore {
    fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    fn exists_by_handle(&self, handle: &str) -> StoreResult<bool> {
        Ok(self.read()?.users.values().any(|u| u.handle == handle))
    }

    fn exists_by_email(&self, email: &str) -> StoreResult<bool> {
        Ok(self.read()?.users.values().any(|u| u.email == email))
    }

    fn save_user(&self, user: NewUser, created_at: DateTime<Utc>) -> StoreResult<User> {
        let mut tables = self.write()?;

        if tables.users.values().any(|u| u.handle == user.handle) {
            return Err(StoreError::Conflict(format!("handle {} is taken", user.handle)));
        }
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("email {} is taken", user.email)));
        }

        let user = User {
            id: UserId::new(),
            handle: user.handle,
            email: user.email,
            secret_hash: user.secret_hash,
            created_at,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }
}

impl EventStore for MemoryStore {
    fn get_event(&self, id: EventId) -> StoreResult<Option<Event>> {
        Ok(self.read()?.events.get(&id).cloned())
    }

    fn query_events(
        &self,
        filter: &EventFilter,
        offset: u64,
        limit: u64,
    ) -> StoreResult<(Vec<Event>, u64)> {
        let tables = self.read()?;
        Ok(select_window(
            tables.events.values().cloned(),
            filter,
            offset,
            limit,
        ))
    }

    fn events_by_organizer(&self, organizer: UserId) -> StoreResult<Vec<Event>> {
        let mut events: Vec<Event> = self
            .read()?
            .events
            .values()
            .filter(|e| e.organizer_id == organizer)
            .cloned()
            .collect();
        sort_events(&mut events);
        Ok(events)
    }

    fn events_attended_by(&self, user: UserId) -> StoreResult<Vec<Event>> {
        let tables = self.read()?;
        let mut events: Vec<Event> = tables
            .rsvps
            .values()
            .filter(|r| r.user_id == user)
            .filter_map(|r| tables.events.get(&r.event_id).cloned())
            .collect();
        sort_events(&mut events);
        Ok(events)
    }

    fn rsvps_for_event(&self, event: EventId) -> StoreResult<Vec<Rsvp>> {
        let mut rsvps: Vec<Rsvp> = self
            .read()?
            .rsvps
            .values()
            .filter(|r| r.event_id == event)
            .cloned()
            .collect();
        rsvps.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rsvps)
    }

    fn find_rsvp(&self, user: UserId, event: EventId) -> StoreResult<Option<Rsvp>> {
        Ok(self.read()?.rsvp_for_pair(user, event).cloned())
    }
}

impl Store for MemoryStore {
    fn begin(&self) -> StoreResult<Box<dyn UnitOfWork + '_>> {
        Ok(Box::new(MemoryUnitOfWork {
            tables: self.write()?,
            undo: Vec::new(),
            committed: false,
        }))
    }

    fn health_check(&self) -> StoreResult<()> {
        self.read().map(|_| ())
    }
}

/// Prior state of one row, restored when a unit of work is dropped uncommitted.
enum Undo {
    Event(EventId, Option<Event>),
    Rsvp(RsvpId, Option<Rsvp>),
}

/// Holds the write lock for its whole lifetime and writes straight into the
/// shared tables. Each change records the row it replaced; dropping without
/// commit replays those records in reverse.
struct MemoryUnitOfWork<'a> {
    tables: RwLockWriteGuard<'a, Tables>,
    undo: Vec<Undo>,
    committed: bool,
}

impl MemoryUnitOfWork<'_> {
    fn remove_rsvp(&mut self, id: RsvpId) -> bool {
        match self.tables.rsvps.remove(&id) {
            Some(previous) => {
                self.undo.push(Undo::Rsvp(id, Some(previous)));
                true
            }
            None => false,
        }
    }
}

impl UnitOfWork for MemoryUnitOfWork<'_> {
    fn get_event(&mut self, id: EventId) -> StoreResult<Option<Event>> {
        Ok(self.tables.events.get(&id).cloned())
    }

    fn find_rsvp(&mut self, user: UserId, event: EventId) -> StoreResult<Option<Rsvp>> {
        Ok(self.tables.rsvp_for_pair(user, event).cloned())
    }

    fn put_event(&mut self, event: &Event) -> StoreResult<()> {
        if !self.tables.users.contains_key(&event.organizer_id) {
            return Err(StoreError::Conflict(format!(
                "organizer {} does not exist",
                event.organizer_id
            )));
        }
        let previous = self.tables.events.insert(event.id, event.clone());
        self.undo.push(Undo::Event(event.id, previous));
        Ok(())
    }

    fn put_rsvp(&mut self, rsvp: &Rsvp) -> StoreResult<()> {
        if !self.tables.users.contains_key(&rsvp.user_id) {
            return Err(StoreError::Conflict(format!("user {} does not exist", rsvp.user_id)));
        }
        if !self.tables.events.contains_key(&rsvp.event_id) {
            return Err(StoreError::Conflict(format!(
                "event {} does not exist",
                rsvp.event_id
            )));
        }
        if let Some(existing) = self.tables.rsvp_for_pair(rsvp.user_id, rsvp.event_id) {
            if existing.id != rsvp.id {
                return Err(StoreError::Conflict(format!(
                    "user {} already has an RSVP for event {}",
                    rsvp.user_id, rsvp.event_id
                )));
            }
        }
        let previous = self.tables.rsvps.insert(rsvp.id, rsvp.clone());
        self.undo.push(Undo::Rsvp(rsvp.id, previous));
        Ok(())
    }

    fn delete_rsvp(&mut self, id: RsvpId) -> StoreResult<bool> {
        Ok(self.remove_rsvp(id))
    }

    fn delete_rsvps_for_event(&mut self, event: EventId) -> StoreResult<usize> {
        let ids: Vec<RsvpId> = self
            .tables
            .rsvps
            .values()
            .filter(|r| r.event_id == event)
            .map(|r| r.id)
            .collect();
        for id in &ids {
            self.remove_rsvp(*id);
        }
        Ok(ids.len())
    }

    fn delete_event(&mut self, id: EventId) -> StoreResult<bool> {
        if self.tables.rsvps.values().any(|r| r.event_id == id) {
            return Err(StoreError::Conflict(format!("event {id} still has RSVPs")));
        }
        match self.tables.events.remove(&id) {
            Some(previous) => {
                self.undo.push(Undo::Event(id, Some(previous)));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn commit(mut self: Box<Self>) -> StoreResult<()> {
        self.committed = true;
        Ok(())
    }
}

impl Drop for MemoryUnitOfWork<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        while let Some(undo) = self.undo.pop() {
            match undo {
                Undo::Event(id, Some(event)) => {
                    self.tables.events.insert(id, event);
                }
                Undo::Event(id, None) => {
                    self.tables.events.remove(&id);
                }
                Undo::Rsvp(id, Some(rsvp)) => {
                    self.tables.rsvps.insert(id, rsvp);
                }
                Undo::Rsvp(id, None) => {
                    self.tables.rsvps.remove(&id);
                }
            }
        }
    }
}
