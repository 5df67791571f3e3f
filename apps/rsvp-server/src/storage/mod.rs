// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistence for users, events and RSVPs. The service layer only sees the
//! traits defined here; two backends implement them:
//!
//! - [`MemoryStore`]: hash maps behind a lock (tests, local development)
//! - [`RedbStore`]: embedded ACID database file (`DATA_DIR/events.redb`)
//!
//! ## Guarantees the service layer relies on
//!
//! - handle and email are unique across users
//! - at most one RSVP exists per (user, event) pair
//! - events reference an existing organizer, RSVPs an existing user and event
//! - everything written through one [`UnitOfWork`] lands atomically on
//!   [`UnitOfWork::commit`], or not at all
//!
//! Violations surface as [`StoreError::Conflict`]. Any backend failure is
//! [`StoreError::Unavailable`]; callers do not retry.

use chrono::{DateTime, Utc};

use crate::models::{Event, EventId, NewUser, Rsvp, RsvpId, User, UserId};

pub mod memory;
pub mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

/// Error type for store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backend could not serve the request (I/O, corruption, poisoned lock).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A uniqueness or referential constraint was violated.
    #[error("constraint violated: {0}")]
    Conflict(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// User records and secret verification.
pub trait CredentialStore: Send + Sync {
    fn find_user(&self, id: UserId) -> StoreResult<Option<User>>;

    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    fn exists_by_handle(&self, handle: &str) -> StoreResult<bool>;

    fn exists_by_email(&self, email: &str) -> StoreResult<bool>;

    /// Insert a new user, assigning its identity.
    ///
    /// # Errors
    /// `Conflict` when the handle or email is already taken.
    fn save_user(&self, user: NewUser, created_at: DateTime<Utc>) -> StoreResult<User>;

    /// Constant-time check of `plaintext` against a stored secret hash.
    fn verify_secret(&self, plaintext: &str, hash: &str) -> bool {
        crate::auth::secret::verify_secret(plaintext, hash)
    }
}

/// Read access to events and RSVPs.
pub trait EventStore: Send + Sync {
    fn get_event(&self, id: EventId) -> StoreResult<Option<Event>>;

    /// One window of the events matching `filter`, in [`sort_events`] order,
    /// together with the total number of matches.
    fn query_events(
        &self,
        filter: &EventFilter,
        offset: u64,
        limit: u64,
    ) -> StoreResult<(Vec<Event>, u64)>;

    fn events_by_organizer(&self, organizer: UserId) -> StoreResult<Vec<Event>>;

    /// Events the user has an RSVP on, whatever its status.
    fn events_attended_by(&self, user: UserId) -> StoreResult<Vec<Event>>;

    /// RSVPs of one event, oldest first.
    fn rsvps_for_event(&self, event: EventId) -> StoreResult<Vec<Rsvp>>;

    fn find_rsvp(&self, user: UserId, event: EventId) -> StoreResult<Option<Rsvp>>;
}

/// A batch of writes applied atomically.
///
/// Dropping a unit of work without calling [`commit`](UnitOfWork::commit)
/// discards every change made through it.
pub trait UnitOfWork {
    /// Read an event as seen by this unit of work.
    fn get_event(&mut self, id: EventId) -> StoreResult<Option<Event>>;

    /// Read the (user, event) RSVP as seen by this unit of work.
    fn find_rsvp(&mut self, user: UserId, event: EventId) -> StoreResult<Option<Rsvp>>;

    /// Insert or replace an event.
    fn put_event(&mut self, event: &Event) -> StoreResult<()>;

    /// Insert or replace an RSVP.
    ///
    /// # Errors
    /// `Conflict` when another RSVP already exists for the same pair, or the
    /// user or event does not exist.
    fn put_rsvp(&mut self, rsvp: &Rsvp) -> StoreResult<()>;

    /// Returns whether a row was removed.
    fn delete_rsvp(&mut self, id: RsvpId) -> StoreResult<bool>;

    /// Remove every RSVP of an event; returns how many were removed.
    fn delete_rsvps_for_event(&mut self, event: EventId) -> StoreResult<usize>;

    /// Returns whether a row was removed.
    ///
    /// # Errors
    /// `Conflict` while RSVPs still reference the event.
    fn delete_event(&mut self, id: EventId) -> StoreResult<bool>;

    fn commit(self: Box<Self>) -> StoreResult<()>;
}

/// Everything the service layer needs from a backend.
pub trait Store: CredentialStore + EventStore {
    /// Start a unit of work. Units of work are serialized.
    fn begin(&self) -> StoreResult<Box<dyn UnitOfWork + '_>>;

    /// Cheap read used by the readiness check.
    fn health_check(&self) -> StoreResult<()>;
}

/// Criteria for the public event listing. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Case-insensitive substring of the event name.
    pub name_contains: Option<String>,
    /// Inclusive `[start, end]` bounds on the event date.
    pub date_between: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        let name_ok = self.name_contains.as_ref().is_none_or(|needle| {
            event
                .name
                .to_lowercase()
                .contains(needle.to_lowercase().as_str())
        });
        let date_ok = self
            .date_between
            .is_none_or(|(start, end)| event.date >= start && event.date <= end);
        name_ok && date_ok
    }
}

/// Canonical listing order: by date, then by id so pages are stable.
pub fn sort_events(events: &mut [Event]) {
    events.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
}

/// Filter, order and cut one window out of `events`.
pub(crate) fn select_window(
    events: impl IntoIterator<Item = Event>,
    filter: &EventFilter,
    offset: u64,
    limit: u64,
) -> (Vec<Event>, u64) {
    let mut matching: Vec<Event> = events.into_iter().filter(|e| filter.matches(e)).collect();
    sort_events(&mut matching);
    let total = matching.len() as u64;
    let window = matching
        .into_iter()
        .skip(usize::try_from(offset).unwrap_or(usize::MAX))
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .collect();
    (window, total)
}
