// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::de::value::{Error as ValueError, StrDeserializer};
use serde::de::IntoDeserializer;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{auth::UserResponse, parse_event_id, MessageResponse};
use crate::{
    auth::Caller,
    error::{ApiError, ErrorBody},
    models::RsvpStatus,
    service::{authenticated, FieldError, RsvpDetails},
    state::AppState,
};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RsvpResponse {
    pub id: Uuid,
    pub user: UserResponse,
    pub status: RsvpStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RsvpDetails> for RsvpResponse {
    fn from(details: RsvpDetails) -> Self {
        let RsvpDetails { rsvp, attendee } = details;
        Self {
            id: rsvp.id.into(),
            user: attendee.into(),
            status: rsvp.status,
            created_at: rsvp.created_at,
            updated_at: rsvp.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct RsvpRequest {
    /// `attending`, `maybe` or `declined`, in lower or upper case.
    pub status: Option<String>,
}

impl RsvpRequest {
    /// Accepts exactly the spellings [`RsvpStatus`] deserializes from.
    fn status(&self) -> Result<RsvpStatus, ApiError> {
        let field_error =
            |message: &str| ApiError::invalid_fields(vec![FieldError::new("status", message)]);
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Err(field_error("RSVP status is required")),
            Some(raw) => {
                let input: StrDeserializer<'_, ValueError> = raw.into_deserializer();
                RsvpStatus::deserialize(input).map_err(|_| {
                    field_error("RSVP status must be one of: attending, maybe, declined")
                })
            }
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RsvpSavedResponse {
    pub message: String,
    pub rsvp: RsvpResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RsvpListResponse {
    pub rsvps: Vec<RsvpResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RsvpStatusResponse {
    /// `null` when the caller has not answered.
    pub rsvp_status: Option<RsvpStatus>,
}

#[utoipa::path(
    post,
    path = "/events/{id}/rsvp",
    params(("id" = Uuid, Path, description = "Event identifier")),
    request_body = RsvpRequest,
    tag = "RSVPs",
    responses(
        (status = 200, body = RsvpSavedResponse),
        (status = 400, body = ErrorBody),
        (status = 401, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn upsert_rsvp(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path(id): Path<String>,
    body: Result<Json<RsvpRequest>, JsonRejection>,
) -> Result<Json<RsvpSavedResponse>, ApiError> {
    authenticated(&identity)?;
    let event_id = parse_event_id(&id)?;
    let Json(request) = body?;
    let saved = state
        .rsvps
        .upsert_rsvp(&identity, event_id, request.status()?)?;
    Ok(Json(RsvpSavedResponse {
        message: "RSVP created successfully".to_string(),
        rsvp: saved.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/events/{id}/rsvp",
    params(("id" = Uuid, Path, description = "Event identifier")),
    tag = "RSVPs",
    responses(
        (status = 200, body = RsvpListResponse),
        (status = 401, body = ErrorBody),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn list_rsvps(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path(id): Path<String>,
) -> Result<Json<RsvpListResponse>, ApiError> {
    let roster = state
        .rsvps
        .list_event_rsvps(&identity, parse_event_id(&id)?)?;
    Ok(Json(RsvpListResponse {
        rsvps: roster.into_iter().map(RsvpResponse::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/events/{id}/rsvp/me",
    params(("id" = Uuid, Path, description = "Event identifier")),
    tag = "RSVPs",
    responses(
        (status = 200, body = RsvpStatusResponse),
        (status = 401, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn my_rsvp_status(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path(id): Path<String>,
) -> Result<Json<RsvpStatusResponse>, ApiError> {
    let rsvp_status = state
        .rsvps
        .get_my_rsvp_status(&identity, parse_event_id(&id)?)?;
    Ok(Json(RsvpStatusResponse { rsvp_status }))
}

#[utoipa::path(
    delete,
    path = "/events/{id}/rsvp",
    params(("id" = Uuid, Path, description = "Event identifier")),
    tag = "RSVPs",
    responses(
        (status = 200, body = MessageResponse),
        (status = 401, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn delete_rsvp(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .rsvps
        .delete_rsvp(&identity, parse_event_id(&id)?)?;
    Ok(Json(MessageResponse::new("RSVP removed successfully")))
}
