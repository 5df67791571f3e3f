// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{AuthenticationGate, TokenCodec};
use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::service::{AccountService, EventService, PageLimits, RsvpService};
use crate::storage::{CredentialStore, MemoryStore, Store};

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub gate: AuthenticationGate,
    pub events: EventService,
    pub rsvps: RsvpService,
    pub accounts: AccountService,
}

impl AppState {
    pub fn new(config: &AppConfig, store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        let codec = TokenCodec::new(config.jwt_secret.as_bytes(), config.token_lifetime());
        let credentials: Arc<dyn CredentialStore> = store.clone();
        let limits = PageLimits {
            default_size: config.page_default_size,
            max_size: config.page_max_size,
        };

        Self {
            gate: AuthenticationGate::new(
                codec.clone(),
                credentials.clone(),
                clock.clone(),
                config.auth_header.clone(),
                config.auth_prefix.clone(),
            ),
            events: EventService::new(store.clone(), clock.clone(), limits),
            rsvps: RsvpService::new(store.clone(), clock.clone()),
            accounts: AccountService::new(credentials, codec, clock),
            store,
        }
    }
}

impl Default for AppState {
    /// In-memory store, wall clock, default configuration.
    fn default() -> Self {
        Self::new(
            &AppConfig::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(SystemClock),
        )
    }
}
