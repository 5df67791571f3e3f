// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the caller identity.
//!
//! Use the `Caller` extractor in handlers and pass the identity to the
//! service layer, which decides whether anonymity is acceptable:
//!
//! ```rust,ignore
//! async fn my_handler(Caller(identity): Caller) -> impl IntoResponse {
//!     // identity is Identity::Authenticated(..) or Identity::Anonymous
//! }
//! ```

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::Identity;

/// Identity attached by the authentication middleware.
///
/// Never rejects. Without the middleware in front it yields `Anonymous`.
#[derive(Debug, Clone)]
pub struct Caller(pub Identity);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Caller(
            parts.extensions.get::<Identity>().cloned().unwrap_or_default(),
        ))
    }
}
