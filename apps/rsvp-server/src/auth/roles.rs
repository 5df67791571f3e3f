// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Capabilities granted to a resolved caller.

use serde::{Deserialize, Serialize};

/// What a caller may do.
///
/// Every resolved token grants `Authenticated`. Organizer rights are not a
/// capability: they are decided per event by ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Any logged-in user.
    Authenticated,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Authenticated => write!(f, "authenticated"),
        }
    }
}
