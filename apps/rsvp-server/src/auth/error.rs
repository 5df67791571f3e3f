// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token errors.
//!
//! These never reach a client: the gate logs them and treats the request as
//! anonymous. The kinds stay distinct so logs say why a token was refused.

/// Token issue/decode error type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Not a structurally valid token, or its claims are missing or invalid.
    #[error("Token is malformed")]
    Malformed,
    /// Signature does not match the server secret or algorithm.
    #[error("Token signature is invalid")]
    SignatureInvalid,
    /// The token lifetime has elapsed.
    #[error("Token has expired")]
    Expired,
    /// Signing a new token failed.
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

impl TokenError {
    /// Get the error code for this error (used as a log field).
    pub fn error_code(&self) -> &'static str {
        match self {
            TokenError::Malformed => "malformed_token",
            TokenError::SignatureInvalid => "invalid_signature",
            TokenError::Expired => "token_expired",
            TokenError::Signing(_) => "token_signing_failed",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                TokenError::SignatureInvalid
            }
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}
