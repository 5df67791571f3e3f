// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Input validation for event fields and registrations.
//!
//! All field problems are collected and reported together.

use unicode_normalization::UnicodeNormalization;

use super::{FieldError, ServiceError, ServiceResult};
use crate::models::EventFields;

const NAME_MIN: usize = 3;
const NAME_MAX: usize = 100;
const HANDLE_MIN: usize = 3;
const HANDLE_MAX: usize = 30;
const SECRET_MIN: usize = 6;

#[derive(Debug, Default)]
struct Collector {
    errors: Vec<FieldError>,
}

impl Collector {
    fn check(&mut self, ok: bool, field: &str, message: &str) -> bool {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        ok
    }

    fn finish(self) -> ServiceResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::validation(self.errors))
        }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Name 3 to 100 characters, description and location not blank.
///
/// The date is checked by the caller since only creation requires a future
/// date.
pub fn validate_event_fields(fields: &EventFields) -> ServiceResult<()> {
    let mut c = Collector::default();

    if c.check(!is_blank(&fields.name), "name", "Event name is required") {
        let len = fields.name.trim().chars().count();
        c.check(
            (NAME_MIN..=NAME_MAX).contains(&len),
            "name",
            "Event name must be between 3 and 100 characters",
        );
    }
    c.check(
        !is_blank(&fields.description),
        "description",
        "Event description is required",
    );
    c.check(
        !is_blank(&fields.location),
        "location",
        "Event location is required",
    );

    c.finish()
}

/// Canonical form of an email: NFKC, lower case, trimmed.
pub fn normalize_email(email: &str) -> String {
    email.trim().nfkc().collect::<String>().to_lowercase()
}

/// `local@domain.tld` with no whitespace.
fn is_email_shaped(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Validate a registration. `email` is expected to be normalized already.
pub fn validate_registration(handle: &str, email: &str, secret: &str) -> ServiceResult<()> {
    let mut c = Collector::default();

    if c.check(!handle.is_empty(), "username", "Username is required") {
        let len = handle.chars().count();
        c.check(
            (HANDLE_MIN..=HANDLE_MAX).contains(&len),
            "username",
            "Username must be between 3 and 30 characters",
        );
        c.check(
            handle.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_'),
            "username",
            "Username can only contain letters, numbers, and underscores",
        );
    }

    if c.check(!email.is_empty(), "email", "Email is required") {
        c.check(
            is_email_shaped(email),
            "email",
            "Please provide a valid email address",
        );
    }

    if c.check(!secret.is_empty(), "password", "Password is required") {
        c.check(
            secret.chars().count() >= SECRET_MIN,
            "password",
            "Password must be at least 6 characters long",
        );
    }

    c.finish()
}
