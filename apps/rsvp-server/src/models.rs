// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Domain Models
//!
//! Aggregates persisted by the store and passed through the service layer.
//! HTTP request/response shapes live next to their handlers in `api`.
//!
//! ## Aggregates
//!
//! - **User**: registered account, owns events (as organizer) and RSVPs
//! - **Event**: a dated gathering with exactly one organizer
//! - **Rsvp**: one user's attendance intent for one event

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// =============================================================================
// Identifiers
// =============================================================================

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Allocate a fresh, time-ordered identifier.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

uuid_id!(
    /// Stable identifier of a registered user. Used as the token subject.
    UserId
);
uuid_id!(
    /// Identifier of an event.
    EventId
);
uuid_id!(
    /// Identifier of an RSVP row.
    RsvpId
);

// =============================================================================
// User
// =============================================================================

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    /// Unique public handle (`[A-Za-z0-9_]`, 3 to 30 characters).
    pub handle: String,
    /// Unique, normalized email address. Used for login.
    pub email: String,
    /// Salted one-way hash of the secret. Never leaves the service.
    pub secret_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A user that has not been persisted yet.
///
/// The store assigns the identity on first insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub handle: String,
    pub email: String,
    pub secret_hash: String,
}

// =============================================================================
// Event
// =============================================================================

/// A scheduled event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub description: String,
    /// When the event takes place.
    pub date: DateTime<Utc>,
    pub location: String,
    /// The user who created the event. Immutable.
    pub organizer_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The organizer-editable part of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFields {
    pub name: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
}

// =============================================================================
// RSVP
// =============================================================================

/// Attendance intent.
///
/// Serialized in upper case; lower-case spellings are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum RsvpStatus {
    #[serde(rename = "ATTENDING", alias = "attending")]
    Attending,
    #[serde(rename = "MAYBE", alias = "maybe")]
    Maybe,
    #[serde(rename = "DECLINED", alias = "declined")]
    Declined,
}

impl std::fmt::Display for RsvpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RsvpStatus::Attending => write!(f, "ATTENDING"),
            RsvpStatus::Maybe => write!(f, "MAYBE"),
            RsvpStatus::Declined => write!(f, "DECLINED"),
        }
    }
}

/// One user's answer for one event. At most one per (user, event).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rsvp {
    pub id: RsvpId,
    pub user_id: UserId,
    pub event_id: EventId,
    pub status: RsvpStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
