// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! RSVP Server - Event scheduling and attendance service
//!
//! Users publish dated events and RSVP to events organized by others. A
//! stateless HS256 bearer token identifies the caller; the service layer
//! decides what that caller may do.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum) and OpenAPI document
//! - `auth` - Token codec, secret hashing and the authentication gate
//! - `service` - Authorization and lifecycle rules for events and RSVPs
//! - `storage` - Store traits with in-memory and redb backends

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod service;
pub mod state;
pub mod storage;
