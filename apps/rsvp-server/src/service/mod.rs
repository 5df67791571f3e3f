// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Service Layer
//!
//! Authorization and lifecycle rules for events and RSVPs, plus account
//! registration and login. Every operation takes the caller [`Identity`]
//! explicitly and re-reads current state from the store.
//!
//! Services are cheap to clone: they only hold `Arc`s to the store and clock.

use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{secret::HashError, AuthenticatedUser, Capability, Identity, TokenError};
use crate::storage::StoreError;

pub mod accounts;
pub mod events;
pub mod ownership;
pub mod pagination;
pub mod rsvps;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use accounts::{AccountService, AuthOutcome};
pub use events::{EventDetails, EventQuery, EventService, PageLimits};
pub use ownership::{OwnedResource, OwnershipEnforcer};
pub use pagination::{Page, PageRequest};
pub use rsvps::{RsvpDetails, RsvpService};

/// A rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error type for service operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The operation needs a user and the caller is anonymous.
    #[error("{0}")]
    Unauthenticated(String),

    /// The caller is known but may not touch this resource.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Input or lifecycle rule violated. `errors` lists offending fields.
    #[error("{message}")]
    InvalidState {
        message: String,
        errors: Vec<FieldError>,
    },

    /// A store uniqueness or reference constraint was hit.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    StorageUnavailable(String),

    /// Hashing or token signing failed.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// A lifecycle violation not tied to a single field.
    pub fn invalid(message: impl Into<String>) -> Self {
        ServiceError::InvalidState {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn validation(errors: Vec<FieldError>) -> Self {
        ServiceError::InvalidState {
            message: "Validation failed".to_string(),
            errors,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => ServiceError::StorageUnavailable(msg),
            StoreError::Conflict(msg) => ServiceError::Conflict(msg),
        }
    }
}

impl From<TokenError> for ServiceError {
    fn from(err: TokenError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<HashError> for ServiceError {
    fn from(err: HashError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// The authenticated caller, or `Unauthenticated` for anonymous requests and
/// callers lacking [`Capability::Authenticated`].
pub fn authenticated(identity: &Identity) -> ServiceResult<&AuthenticatedUser> {
    match identity {
        Identity::Authenticated(caller) if caller.has_capability(Capability::Authenticated) => {
            Ok(caller)
        }
        _ => Err(ServiceError::Unauthenticated(
            "Authentication required".to_string(),
        )),
    }
}
