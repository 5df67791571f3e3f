// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registration, login and profile lookup.

use std::sync::Arc;

use super::validation::{normalize_email, validate_registration};
use super::{authenticated, ServiceError, ServiceResult};
use crate::auth::{secret, Identity, TokenCodec};
use crate::clock::Clock;
use crate::models::{NewUser, User};
use crate::storage::CredentialStore;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// A user plus a freshly issued token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    pub user: User,
    pub token: String,
}

#[derive(Clone)]
pub struct AccountService {
    credentials: Arc<dyn CredentialStore>,
    codec: TokenCodec,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        codec: TokenCodec,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            credentials,
            codec,
            clock,
        }
    }

    pub fn register(&self, handle: &str, email: &str, secret: &str) -> ServiceResult<AuthOutcome> {
        let handle = handle.trim();
        let email = normalize_email(email);
        validate_registration(handle, &email, secret)?;

        if self.credentials.exists_by_handle(handle)? {
            return Err(ServiceError::invalid("Username is already taken"));
        }
        if self.credentials.exists_by_email(&email)? {
            return Err(ServiceError::invalid("Email is already registered"));
        }

        let now = self.clock.now();
        let user = self.credentials.save_user(
            NewUser {
                handle: handle.to_string(),
                email,
                secret_hash: secret::hash_secret(secret)?,
            },
            now,
        )?;
        let token = self.codec.issue_at(&user, now)?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(AuthOutcome { user, token })
    }

    /// Unknown email and wrong secret fail identically.
    pub fn login(&self, email: &str, secret: &str) -> ServiceResult<AuthOutcome> {
        let email = normalize_email(email);
        let user = match self.credentials.find_user_by_email(&email)? {
            Some(user) if self.credentials.verify_secret(secret, &user.secret_hash) => user,
            Some(_) => return Err(rejected_login()),
            None => {
                // Same derivation cost as a known email.
                self.credentials.verify_secret(secret, secret::DECOY_HASH);
                return Err(rejected_login());
            }
        };

        let token = self.codec.issue_at(&user, self.clock.now())?;
        tracing::info!(user_id = %user.id, "user logged in");
        Ok(AuthOutcome { user, token })
    }

    pub fn profile(&self, identity: &Identity) -> ServiceResult<User> {
        Ok(authenticated(identity)?.user.clone())
    }
}

fn rejected_login() -> ServiceError {
    tracing::debug!("login rejected");
    ServiceError::Unauthenticated(INVALID_CREDENTIALS.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;
    use crate::service::testing::{harness, t0};
    use crate::storage::StoreResult;
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn register_normalizes_and_issues_token() {
        let h = harness();
        let outcome = h
            .accounts
            .register("jane_doe", "  Jane@Example.com ", "password123")
            .unwrap();

        assert_eq!(outcome.user.email, "jane@example.com");
        assert_eq!(outcome.user.created_at, t0());
        assert_ne!(outcome.user.secret_hash, "password123");

        let claims = h.codec.decode_at(&outcome.token, t0()).unwrap();
        assert_eq!(claims.sub, outcome.user.id.to_string());
        assert_eq!(claims.handle, "jane_doe");
    }

    #[test]
    fn duplicate_handle_and_email_are_rejected() {
        let h = harness();
        h.accounts
            .register("jane", "jane@example.com", "password123")
            .unwrap();

        assert_eq!(
            h.accounts.register("jane", "other@example.com", "password123"),
            Err(ServiceError::invalid("Username is already taken"))
        );
        assert_eq!(
            h.accounts.register("janet", "JANE@example.com", "password123"),
            Err(ServiceError::invalid("Email is already registered"))
        );
    }

    #[test]
    fn invalid_registration_reports_fields() {
        let h = harness();
        assert!(matches!(
            h.accounts.register("x", "nope", "1"),
            Err(ServiceError::InvalidState { ref errors, .. }) if errors.len() == 3
        ));
    }

    #[test]
    fn login_checks_secret() {
        let h = harness();
        let registered = h
            .accounts
            .register("jane", "jane@example.com", "password123")
            .unwrap();

        let outcome = h.accounts.login("JANE@example.com", "password123").unwrap();
        assert_eq!(outcome.user, registered.user);
        assert!(h.codec.decode_at(&outcome.token, t0()).is_ok());

        let wrong = h.accounts.login("jane@example.com", "password124");
        let unknown = h.accounts.login("nobody@example.com", "password123");
        let expected: ServiceResult<AuthOutcome> = Err(ServiceError::Unauthenticated(
            "Invalid email or password".to_string(),
        ));
        assert_eq!(wrong, expected);
        assert_eq!(unknown, expected);
    }

    /// Counts secret verifications made through it.
    struct CountingCredentials {
        inner: Arc<crate::storage::MemoryStore>,
        checks: AtomicUsize,
    }

    impl CredentialStore for CountingCredentials {
        fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
            self.inner.find_user(id)
        }

        fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
            self.inner.find_user_by_email(email)
        }

        fn exists_by_handle(&self, handle: &str) -> StoreResult<bool> {
            self.inner.exists_by_handle(handle)
        }

        fn exists_by_email(&self, email: &str) -> StoreResult<bool> {
            self.inner.exists_by_email(email)
        }

        fn save_user(&self, user: NewUser, created_at: DateTime<Utc>) -> StoreResult<User> {
            self.inner.save_user(user, created_at)
        }

        fn verify_secret(&self, plaintext: &str, hash: &str) -> bool {
            self.checks.fetch_add(1, Ordering::SeqCst);
            self.inner.verify_secret(plaintext, hash)
        }
    }

    #[test]
    fn unknown_email_still_derives_a_hash() {
        let h = harness();
        let credentials = Arc::new(CountingCredentials {
            inner: h.store.clone(),
            checks: AtomicUsize::new(0),
        });
        let accounts = AccountService::new(
            credentials.clone(),
            h.codec.clone(),
            Arc::new(h.clock.clone()),
        );

        assert_eq!(
            accounts.login("nobody@example.com", "password123"),
            Err(ServiceError::Unauthenticated(INVALID_CREDENTIALS.to_string()))
        );
        assert_eq!(credentials.checks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn profile_requires_identity() {
        let h = harness();
        let jane = h.user("jane");
        assert_eq!(h.accounts.profile(&jane).unwrap().handle, "jane");
        assert!(matches!(
            h.accounts.profile(&Identity::Anonymous),
            Err(ServiceError::Unauthenticated(_))
        ));
    }
}
