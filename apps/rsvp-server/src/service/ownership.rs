// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership enforcement for organizer-only operations.

use super::{ServiceError, ServiceResult};
use crate::auth::AuthenticatedUser;
use crate::models::{Event, UserId};

/// Trait for resources that have an owner.
pub trait OwnedResource {
    fn owner_id(&self) -> UserId;
}

impl OwnedResource for Event {
    fn owner_id(&self) -> UserId {
        self.organizer_id
    }
}

/// Trait for enforcing ownership before a mutation or privileged read.
pub trait OwnershipEnforcer {
    /// Verify that the caller owns this resource.
    ///
    /// `action` completes the sentence "You do not have permission to ...".
    ///
    /// # Errors
    /// Returns `ServiceError::Forbidden` if the caller is not the owner.
    fn verify_ownership(&self, caller: &AuthenticatedUser, action: &str) -> ServiceResult<()>;
}

impl<T: OwnedResource> OwnershipEnforcer for T {
    fn verify_ownership(&self, caller: &AuthenticatedUser, action: &str) -> ServiceResult<()> {
        if self.owner_id() == caller.user.id {
            Ok(())
        } else {
            tracing::debug!(
                user_id = %caller.user.id,
                owner_id = %self.owner_id(),
                action,
                "ownership check failed"
            );
            Err(ServiceError::Forbidden(format!(
                "You do not have permission to {action}"
            )))
        }
    }
}
