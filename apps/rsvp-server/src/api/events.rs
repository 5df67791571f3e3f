// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{auth::UserResponse, parse_event_id, MessageResponse};
use crate::{
    auth::Caller,
    error::{ApiError, ErrorBody},
    models::EventFields,
    service::{
        authenticated, validation::validate_event_fields, EventDetails, EventQuery, FieldError,
        Page, ServiceError,
    },
    state::AppState,
};

const INVALID_DATE: &str = "Please provide a valid date in ISO format (YYYY-MM-DD)";

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub organizer: UserResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventDetails> for EventResponse {
    fn from(details: EventDetails) -> Self {
        let EventDetails { event, organizer } = details;
        Self {
            id: event.id.into(),
            name: event.name,
            description: event.description,
            date: event.date,
            location: event.location,
            organizer: organizer.into(),
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResponse {
    pub total_events: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub events_per_page: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EventListResponse {
    pub events: Vec<EventResponse>,
    pub pagination: PaginationResponse,
}

impl From<Page<EventDetails>> for EventListResponse {
    fn from(page: Page<EventDetails>) -> Self {
        Self {
            pagination: PaginationResponse {
                total_events: page.total_items,
                total_pages: page.total_pages,
                current_page: page.current_page,
                events_per_page: page.page_size,
                has_next_page: page.has_next_page,
                has_prev_page: page.has_prev_page,
            },
            events: page.items.into_iter().map(EventResponse::from).collect(),
        }
    }
}

/// Create/update body. Missing fields are reported as validation errors.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct EventRequest {
    pub name: String,
    pub description: String,
    /// RFC 3339, or `YYYY-MM-DDTHH:MM[:SS]` read as UTC.
    pub date: Option<String>,
    pub location: String,
}

impl EventRequest {
    fn into_fields(self) -> Result<EventFields, ApiError> {
        let date = match self.date.as_deref().map(str::trim) {
            None | Some("") => Err(FieldError::new("date", "Event date is required")),
            Some(raw) => parse_event_date(raw).ok_or_else(|| FieldError::new("date", INVALID_DATE)),
        };

        let mut fields = EventFields {
            name: self.name,
            description: self.description,
            date: DateTime::<Utc>::MIN_UTC,
            location: self.location,
        };
        match date {
            Ok(date) => {
                fields.date = date;
                Ok(fields)
            }
            Err(date_error) => {
                // Report the other field problems alongside the date.
                let mut errors = match validate_event_fields(&fields) {
                    Err(ServiceError::InvalidState { errors, .. }) => errors,
                    _ => Vec::new(),
                };
                errors.push(date_error);
                Err(ApiError::invalid_fields(errors))
            }
        }
    }
}

fn parse_event_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

/// `YYYY-MM-DD`, or the calendar day of an RFC 3339 date-time.
fn parse_day(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListEventsParams {
    /// Case-insensitive substring of the event name.
    pub name: Option<String>,
    /// Only events on this day.
    pub date: Option<String>,
    /// Zero-based page number.
    pub page: Option<i64>,
    /// Page size.
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/events",
    params(ListEventsParams),
    tag = "Events",
    responses(
        (status = 200, body = EventListResponse),
        (status = 400, body = ErrorBody)
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    params: Result<Query<ListEventsParams>, QueryRejection>,
) -> Result<Json<EventListResponse>, ApiError> {
    let Query(params) = params?;

    let day = match params.date.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            parse_day(raw)
                .ok_or_else(|| ApiError::invalid_fields(vec![FieldError::new("date", INVALID_DATE)]))?,
        ),
    };

    let page = state.events.list_events(&EventQuery {
        name: params.name,
        day,
        page: params.page,
        size: params.limit,
    })?;
    Ok(Json(page.into()))
}

#[utoipa::path(
    post,
    path = "/events",
    request_body = EventRequest,
    tag = "Events",
    responses(
        (status = 201, body = EventResponse),
        (status = 400, body = ErrorBody),
        (status = 401, body = ErrorBody)
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    Caller(identity): Caller,
    body: Result<Json<EventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    authenticated(&identity)?;
    let Json(request) = body?;
    let created = state.events.create_event(&identity, request.into_fields()?)?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    get,
    path = "/events/my-events",
    tag = "Events",
    responses(
        (status = 200, body = [EventResponse]),
        (status = 401, body = ErrorBody)
    )
)]
pub async fn my_events(
    State(state): State<AppState>,
    Caller(identity): Caller,
) -> Result<Json<Vec<EventResponse>>, ApiError> {
    let events = state.events.list_my_events(&identity)?;
    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/events/attending",
    tag = "Events",
    responses(
        (status = 200, body = [EventResponse]),
        (status = 401, body = ErrorBody)
    )
)]
pub async fn attending_events(
    State(state): State<AppState>,
    Caller(identity): Caller,
) -> Result<Json<Vec<EventResponse>>, ApiError> {
    let events = state.events.list_attending_events(&identity)?;
    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/events/{id}",
    params(("id" = Uuid, Path, description = "Event identifier")),
    tag = "Events",
    responses(
        (status = 200, body = EventResponse),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EventResponse>, ApiError> {
    let event = state.events.get_event(parse_event_id(&id)?)?;
    Ok(Json(event.into()))
}

#[utoipa::path(
    put,
    path = "/events/{id}",
    params(("id" = Uuid, Path, description = "Event identifier")),
    request_body = EventRequest,
    tag = "Events",
    responses(
        (status = 200, body = EventResponse),
        (status = 400, body = ErrorBody),
        (status = 401, body = ErrorBody),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn update_event(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path(id): Path<String>,
    body: Result<Json<EventRequest>, JsonRejection>,
) -> Result<Json<EventResponse>, ApiError> {
    authenticated(&identity)?;
    let id = parse_event_id(&id)?;
    let Json(request) = body?;
    let updated = state
        .events
        .update_event(&identity, id, request.into_fields()?)?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/events/{id}",
    params(("id" = Uuid, Path, description = "Event identifier")),
    tag = "Events",
    responses(
        (status = 200, body = MessageResponse),
        (status = 401, body = ErrorBody),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn delete_event(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.events.delete_event(&identity, parse_event_id(&id)?)?;
    Ok(Json(MessageResponse::new("Event deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn event_dates_accept_rfc3339_and_local_forms() {
        let expected = Utc.with_ymd_and_hms(2030, 7, 15, 18, 0, 0).unwrap();
        assert_eq!(parse_event_date("2030-07-15T18:00:00Z"), Some(expected));
        assert_eq!(parse_event_date("2030-07-15T20:00:00+02:00"), Some(expected));
        assert_eq!(parse_event_date("2030-07-15T18:00:00"), Some(expected));
        assert_eq!(parse_event_date("2030-07-15T18:00"), Some(expected));
        assert_eq!(parse_event_date("next tuesday"), None);
    }

    #[test]
    fn day_filter_accepts_date_or_datetime() {
        let day = NaiveDate::from_ymd_opt(2030, 7, 15).unwrap();
        assert_eq!(parse_day("2030-07-15"), Some(day));
        assert_eq!(parse_day("2030-07-15T23:30:00+05:00"), Some(day));
        assert_eq!(parse_day("15/07/2030"), None);
    }

    #[test]
    fn missing_date_is_reported_with_other_fields() {
        let err = EventRequest {
            name: "Summer Music Festival".to_string(),
            description: String::new(),
            date: None,
            location: "Central Park".to_string(),
        }
        .into_fields()
        .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        let fields: Vec<&str> = err.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["description", "date"]);
    }

    #[test]
    fn invalid_date_has_iso_hint() {
        let err = EventRequest {
            name: "Summer Music Festival".to_string(),
            description: "Live music".to_string(),
            date: Some("July 15th".to_string()),
            location: "Central Park".to_string(),
        }
        .into_fields()
        .unwrap_err();
        assert_eq!(err.errors, vec![FieldError::new("date", INVALID_DATE)]);
    }
}
