// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for service tests.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use super::events::PageLimits;
use super::{AccountService, EventService, RsvpService};
use crate::auth::{AuthenticatedUser, Identity, TokenCodec};
use crate::clock::{Clock, FixedClock};
use crate::models::{EventFields, NewUser};
use crate::storage::{CredentialStore, MemoryStore};

pub(crate) fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 3, 1, 9, 0, 0).unwrap()
}

/// Valid fields for an event `days_ahead` days after [`t0`].
pub(crate) fn future_fields(name: &str, days_ahead: i64) -> EventFields {
    EventFields {
        name: name.to_string(),
        description: format!("{name} description"),
        date: t0() + Duration::days(days_ahead),
        location: "Central Park".to_string(),
    }
}

pub(crate) struct Harness {
    pub store: Arc<MemoryStore>,
    pub clock: FixedClock,
    pub codec: TokenCodec,
    pub events: EventService,
    pub rsvps: RsvpService,
    pub accounts: AccountService,
}

pub(crate) fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let clock = FixedClock::new(t0());
    let codec = TokenCodec::new(b"service-test-secret", Duration::hours(24));

    Harness {
        events: EventService::new(store.clone(), Arc::new(clock.clone()), PageLimits::default()),
        rsvps: RsvpService::new(store.clone(), Arc::new(clock.clone())),
        accounts: AccountService::new(store.clone(), codec.clone(), Arc::new(clock.clone())),
        store,
        clock,
        codec,
    }
}

impl Harness {
    /// Persist a user and return it as an authenticated caller.
    pub fn user(&self, handle: &str) -> Identity {
        let user = self
            .store
            .save_user(
                NewUser {
                    handle: handle.to_string(),
                    email: format!("{handle}@example.com"),
                    secret_hash: "unused".to_string(),
                },
                self.clock.now(),
            )
            .unwrap();
        Identity::Authenticated(AuthenticatedUser::new(user, t0() + Duration::hours(24)))
    }
}
