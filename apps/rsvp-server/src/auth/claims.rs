// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and the per-request caller identity.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::roles::Capability;
use crate::models::User;

/// Claims carried by an issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the user id.
    pub sub: String,
    /// Handle at issue time. Informational only.
    pub handle: String,
    /// Issued at (Unix seconds).
    pub iat: i64,
    /// Expiration (Unix seconds).
    pub exp: i64,
}

/// A caller whose token decoded and whose user still exists.
///
/// Built per request by the gate and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user: User,
    pub capabilities: HashSet<Capability>,
    /// Token expiration.
    pub expires_at: DateTime<Utc>,
}

impl AuthenticatedUser {
    pub fn new(user: User, expires_at: DateTime<Utc>) -> Self {
        Self {
            user,
            capabilities: HashSet::from([Capability::Authenticated]),
            expires_at,
        }
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Outcome of authentication for one request.
///
/// Failing to authenticate never rejects a request by itself; operations that
/// need a user turn `Anonymous` into an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Identity {
    Authenticated(AuthenticatedUser),
    #[default]
    Anonymous,
}

impl Identity {
    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::Authenticated(caller) => Some(&caller.user),
            Identity::Anonymous => None,
        }
    }
}
