// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Event lifecycle: listing, creation, organizer-only update and delete.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use super::ownership::OwnershipEnforcer;
use super::pagination::{Page, PageRequest};
use super::validation::validate_event_fields;
use super::{authenticated, ServiceError, ServiceResult};
use crate::auth::Identity;
use crate::clock::Clock;
use crate::models::{Event, EventFields, EventId, User, UserId};
use crate::storage::{EventFilter, Store};

/// An event together with its organizer's public record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDetails {
    pub event: Event,
    pub organizer: User,
}

/// Public listing criteria. Raw page values are clamped by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    /// Case-insensitive name substring. Blank means no filter.
    pub name: Option<String>,
    /// Only events on this UTC day.
    pub day: Option<NaiveDate>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

/// Page size limits for the public listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_size: u64,
    pub max_size: u64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_size: 10,
            max_size: 100,
        }
    }
}

pub(crate) fn event_not_found(id: EventId) -> ServiceError {
    ServiceError::NotFound(format!("Event not found with id: {id}"))
}

/// `[00:00, 23:59:59.999999999]` of a UTC day.
fn day_window(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day.and_time(NaiveTime::MIN).and_utc();
    let end = day
        .and_hms_nano_opt(23, 59, 59, 999_999_999)
        .map_or(DateTime::<Utc>::MAX_UTC, |end| end.and_utc());
    (start, end)
}

#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    limits: PageLimits,
}

impl EventService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, limits: PageLimits) -> Self {
        Self {
            store,
            clock,
            limits,
        }
    }

    /// Public, paginated listing ordered by date then id.
    pub fn list_events(&self, query: &EventQuery) -> ServiceResult<Page<EventDetails>> {
        let request = PageRequest::clamped(
            query.page,
            query.size,
            self.limits.default_size,
            self.limits.max_size,
        );
        let filter = EventFilter {
            name_contains: query
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            date_between: query.day.map(day_window),
        };

        let (events, total) = self
            .store
            .query_events(&filter, request.offset(), request.size)?;
        let details = self.with_organizers(events)?;
        Ok(Page::new(details, total, request))
    }

    pub fn get_event(&self, id: EventId) -> ServiceResult<EventDetails> {
        let event = self.load(id)?;
        let organizer = self.organizer_of(&event)?;
        Ok(EventDetails { event, organizer })
    }

    pub fn create_event(
        &self,
        identity: &Identity,
        fields: EventFields,
    ) -> ServiceResult<EventDetails> {
        let caller = authenticated(identity)?;
        validate_event_fields(&fields)?;

        let now = self.clock.now();
        if fields.date <= now {
            return Err(ServiceError::invalid("Event date cannot be in the past"));
        }

        let event = Event {
            id: EventId::new(),
            name: fields.name.trim().to_string(),
            description: fields.description.trim().to_string(),
            date: fields.date,
            location: fields.location.trim().to_string(),
            organizer_id: caller.user.id,
            created_at: now,
            updated_at: now,
        };

        let mut uow = self.store.begin()?;
        uow.put_event(&event)?;
        uow.commit()?;

        tracing::info!(event_id = %event.id, user_id = %caller.user.id, "event created");
        Ok(EventDetails {
            event,
            organizer: caller.user.clone(),
        })
    }

    /// Organizer-only overwrite of the editable fields.
    ///
    /// The date is not required to be in the future here.
    pub fn update_event(
        &self,
        identity: &Identity,
        id: EventId,
        fields: EventFields,
    ) -> ServiceResult<EventDetails> {
        let caller = authenticated(identity)?;
        self.load(id)?.verify_ownership(caller, "update this event")?;
        validate_event_fields(&fields)?;

        // Re-read inside the unit of work so a delete that committed since the
        // check above is not undone by writing the row back.
        let mut uow = self.store.begin()?;
        let mut event = uow.get_event(id)?.ok_or_else(|| event_not_found(id))?;
        event.verify_ownership(caller, "update this event")?;

        event.name = fields.name.trim().to_string();
        event.description = fields.description.trim().to_string();
        event.date = fields.date;
        event.location = fields.location.trim().to_string();
        event.updated_at = self.clock.now();

        uow.put_event(&event)?;
        uow.commit()?;

        tracing::info!(event_id = %event.id, user_id = %caller.user.id, "event updated");
        Ok(EventDetails {
            event,
            organizer: caller.user.clone(),
        })
    }

    /// Organizer-only delete. RSVPs go with the event in one unit of work.
    pub fn delete_event(&self, identity: &Identity, id: EventId) -> ServiceResult<()> {
        let caller = authenticated(identity)?;
        let event = self.load(id)?;
        event.verify_ownership(caller, "delete this event")?;

        let mut uow = self.store.begin()?;
        let removed_rsvps = uow.delete_rsvps_for_event(id)?;
        if !uow.delete_event(id)? {
            return Err(event_not_found(id));
        }
        uow.commit()?;

        tracing::info!(
            event_id = %id,
            user_id = %caller.user.id,
            removed_rsvps,
            "event deleted"
        );
        Ok(())
    }

    /// Events organized by the caller.
    pub fn list_my_events(&self, identity: &Identity) -> ServiceResult<Vec<EventDetails>> {
        let caller = authenticated(identity)?;
        let events = self.store.events_by_organizer(caller.user.id)?;
        self.with_organizers(events)
    }

    /// Events the caller has any RSVP on.
    pub fn list_attending_events(&self, identity: &Identity) -> ServiceResult<Vec<EventDetails>> {
        let caller = authenticated(identity)?;
        let events = self.store.events_attended_by(caller.user.id)?;
        self.with_organizers(events)
    }

    fn load(&self, id: EventId) -> ServiceResult<Event> {
        self.store.get_event(id)?.ok_or_else(|| event_not_found(id))
    }

    fn organizer_of(&self, event: &Event) -> ServiceResult<User> {
        self.store.find_user(event.organizer_id)?.ok_or_else(|| {
            tracing::error!(event_id = %event.id, organizer_id = %event.organizer_id, "organizer record missing");
            ServiceError::Internal(format!("organizer of event {} is missing", event.id))
        })
    }

    fn with_organizers(&self, events: Vec<Event>) -> ServiceResult<Vec<EventDetails>> {
        let mut organizers: HashMap<UserId, User> = HashMap::new();
        let mut details = Vec::with_capacity(events.len());
        for event in events {
            let organizer = match organizers.get(&event.organizer_id) {
                Some(user) => user.clone(),
                None => {
                    let user = self.organizer_of(&event)?;
                    organizers.insert(user.id, user.clone());
                    user
                }
            };
            details.push(EventDetails { event, organizer });
        }
        Ok(details)
    }
}
