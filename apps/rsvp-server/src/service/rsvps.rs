// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! RSVP lifecycle.
//!
//! Per (user, event) the RSVP moves between `Absent`, `Attending`, `Maybe`
//! and `Declined`. Upserts are only allowed while the event is in the future
//! and never by the organizer; deletes are allowed at any time.

use std::sync::Arc;

use super::events::event_not_found;
use super::ownership::OwnershipEnforcer;
use super::{authenticated, ServiceError, ServiceResult};
use crate::auth::Identity;
use crate::clock::Clock;
use crate::models::{Event, EventId, Rsvp, RsvpId, RsvpStatus, User};
use crate::storage::Store;

/// An RSVP together with the attendee's public record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsvpDetails {
    pub rsvp: Rsvp,
    pub attendee: User,
}

#[derive(Clone)]
pub struct RsvpService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl RsvpService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Create the caller's RSVP for an event, or change its status.
    pub fn upsert_rsvp(
        &self,
        identity: &Identity,
        event_id: EventId,
        status: RsvpStatus,
    ) -> ServiceResult<RsvpDetails> {
        let caller = authenticated(identity)?;
        let event = self.load_event(event_id)?;

        let now = self.clock.now();
        if event.date <= now {
            return Err(ServiceError::invalid("Cannot RSVP to a past event"));
        }
        if event.organizer_id == caller.user.id {
            return Err(ServiceError::invalid("You cannot RSVP to your own event"));
        }

        let mut uow = self.store.begin()?;
        let rsvp = match uow.find_rsvp(caller.user.id, event_id)? {
            Some(mut existing) => {
                existing.status = status;
                existing.updated_at = now;
                existing
            }
            None => Rsvp {
                id: RsvpId::new(),
                user_id: caller.user.id,
                event_id,
                status,
                created_at: now,
                updated_at: now,
            },
        };
        uow.put_rsvp(&rsvp)?;
        uow.commit()?;

        tracing::info!(
            event_id = %event_id,
            user_id = %caller.user.id,
            status = %status,
            "rsvp recorded"
        );
        Ok(RsvpDetails {
            rsvp,
            attendee: caller.user.clone(),
        })
    }

    /// The roster of an event, oldest first. Organizer only.
    pub fn list_event_rsvps(
        &self,
        identity: &Identity,
        event_id: EventId,
    ) -> ServiceResult<Vec<RsvpDetails>> {
        let caller = authenticated(identity)?;
        let event = self.load_event(event_id)?;
        event.verify_ownership(caller, "view RSVPs for this event")?;

        let mut roster = Vec::new();
        for rsvp in self.store.rsvps_for_event(event_id)? {
            let attendee = self.store.find_user(rsvp.user_id)?.ok_or_else(|| {
                tracing::error!(rsvp_id = %rsvp.id, user_id = %rsvp.user_id, "attendee record missing");
                ServiceError::Internal(format!("attendee of rsvp {} is missing", rsvp.id))
            })?;
            roster.push(RsvpDetails { rsvp, attendee });
        }
        Ok(roster)
    }

    /// The caller's status for an event, `None` when they have not answered.
    pub fn get_my_rsvp_status(
        &self,
        identity: &Identity,
        event_id: EventId,
    ) -> ServiceResult<Option<RsvpStatus>> {
        let caller = authenticated(identity)?;
        self.load_event(event_id)?;
        Ok(self
            .store
            .find_rsvp(caller.user.id, event_id)?
            .map(|rsvp| rsvp.status))
    }

    /// Withdraw the caller's RSVP. Allowed after the event date.
    pub fn delete_rsvp(&self, identity: &Identity, event_id: EventId) -> ServiceResult<()> {
        let caller = authenticated(identity)?;
        self.load_event(event_id)?;

        let mut uow = self.store.begin()?;
        let Some(rsvp) = uow.find_rsvp(caller.user.id, event_id)? else {
            return Err(ServiceError::NotFound(
                "RSVP not found for this event".to_string(),
            ));
        };
        uow.delete_rsvp(rsvp.id)?;
        uow.commit()?;

        tracing::info!(event_id = %event_id, user_id = %caller.user.id, "rsvp deleted");
        Ok(())
    }

    fn load_event(&self, id: EventId) -> ServiceResult<Event> {
        self.store.get_event(id)?.ok_or_else(|| event_not_found(id))
    }
}
