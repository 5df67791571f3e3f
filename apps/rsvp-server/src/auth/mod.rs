// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Stateless bearer-token authentication for the event API.
//!
//! ## Auth Flow
//!
//! 1. Client registers or logs in via `/auth/*` and receives an HS256 token
//! 2. Client sends `Authorization: Bearer <token>`
//! 3. Server (`authenticate` middleware):
//!    - Verifies signature and expiry
//!    - Loads the user named by `sub`
//!    - Attaches an [`Identity`] to the request
//!
//! ## Security
//!
//! - Failed authentication degrades to [`Identity::Anonymous`]; the service
//!   layer rejects anonymous callers where a user is required
//! - No token revocation: a token is valid until `exp`
//! - Secrets are stored as salted PBKDF2 hashes

pub mod claims;
pub mod codec;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod roles;
pub mod secret;

pub use claims::{AuthenticatedUser, Identity, TokenClaims};
pub use codec::TokenCodec;
pub use error::TokenError;
pub use extractor::Caller;
pub use middleware::{authenticate, AuthenticationGate};
pub use roles::Capability;
