// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Salted secret hashing (PBKDF2-HMAC-SHA256).
//!
//! Stored format: `pbkdf2-sha256$<iterations>$<salt b64>$<hash b64>`.

use std::num::NonZeroU32;

use base64ct::{Base64, Encoding};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};

const SCHEME: &str = "pbkdf2-sha256";
const ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

static ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

/// Well-formed hash with a zero salt and digest. Verifying against it costs a
/// full derivation, so a login for an unknown email takes as long as one with
/// a wrong secret.
pub const DECOY_HASH: &str = concat!(
    "pbkdf2-sha256$100000$",
    "AAAAAAAAAAAAAAAAAAAAAA==$",
    "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA="
);

/// Random salt generation failed.
#[derive(Debug, thiserror::Error)]
#[error("failed to generate salt for secret hashing")]
pub struct HashError;

/// Hash a plaintext secret with a fresh random salt.
pub fn hash_secret(plaintext: &str) -> Result<String, HashError> {
    let mut salt = [0u8; SALT_LEN];
    SystemRandom::new().fill(&mut salt).map_err(|_| HashError)?;

    let iterations = NonZeroU32::new(ITERATIONS).ok_or(HashError)?;
    let mut hash = [0u8; HASH_LEN];
    pbkdf2::derive(ALGORITHM, iterations, &salt, plaintext.as_bytes(), &mut hash);

    Ok(format!(
        "{SCHEME}${ITERATIONS}${}${}",
        Base64::encode_string(&salt),
        Base64::encode_string(&hash)
    ))
}

/// Constant-time comparison of `plaintext` against a stored hash.
///
/// Unparseable hashes never verify.
pub fn verify_secret(plaintext: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    if scheme != SCHEME {
        return false;
    }

    let Some(iterations) = iterations.parse::<u32>().ok().and_then(NonZeroU32::new) else {
        return false;
    };
    let (Ok(salt), Ok(hash)) = (Base64::decode_vec(salt), Base64::decode_vec(hash)) else {
        return false;
    };

    pbkdf2::verify(ALGORITHM, iterations, &salt, plaintext.as_bytes(), &hash).is_ok()
}
