// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::{ApiError, ErrorBody},
    models::{EventId, RsvpStatus},
    service::FieldError,
    state::AppState,
};

pub mod auth;
pub mod events;
pub mod health;
pub mod rsvps;

/// Confirmation body for deletes.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Path segment to [`EventId`]. Malformed ids are a 400, not a 404.
pub(crate) fn parse_event_id(raw: &str) -> Result<EventId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::new(StatusCode::BAD_REQUEST, "invalid_id", "Invalid event id"))
}

pub fn router(state: AppState) -> Router {
    let gate = state.gate.clone();

    let routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/profile", get(auth::profile))
        .route(
            "/events",
            get(events::list_events).post(events::create_event),
        )
        .route("/events/my-events", get(events::my_events))
        .route("/events/attending", get(events::attending_events))
        .route(
            "/events/{id}",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route(
            "/events/{id}/rsvp",
            get(rsvps::list_rsvps)
                .post(rsvps::upsert_rsvp)
                .delete(rsvps::delete_rsvp),
        )
        .route("/events/{id}/rsvp/me", get(rsvps::my_rsvp_status))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(from_fn_with_state(gate, crate::auth::authenticate))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::readiness,
        auth::register,
        auth::login,
        auth::profile,
        events::list_events,
        events::create_event,
        events::my_events,
        events::attending_events,
        events::get_event,
        events::update_event,
        events::delete_event,
        rsvps::upsert_rsvp,
        rsvps::list_rsvps,
        rsvps::my_rsvp_status,
        rsvps::delete_rsvp
    ),
    components(
        schemas(
            ErrorBody,
            FieldError,
            MessageResponse,
            RsvpStatus,
            health::HealthResponse,
            health::ReadyResponse,
            auth::UserResponse,
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            events::EventRequest,
            events::EventResponse,
            events::EventListResponse,
            events::PaginationResponse,
            rsvps::RsvpRequest,
            rsvps::RsvpResponse,
            rsvps::RsvpSavedResponse,
            rsvps::RsvpListResponse,
            rsvps::RsvpStatusResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness checks"),
        (name = "Auth", description = "Registration, login and profile"),
        (name = "Events", description = "Event listing and organizer-only management"),
        (name = "RSVPs", description = "Attendance answers and event rosters")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request},
    };
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::clock::FixedClock;
    use crate::config::AppConfig;
    use crate::storage::MemoryStore;

    struct TestApp {
        router: Router,
        clock: FixedClock,
    }

    fn app() -> TestApp {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2030, 3, 1, 9, 0, 0).unwrap());
        let state = AppState::new(
            &AppConfig::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(clock.clone()),
        );
        TestApp {
            router: router(state),
            clock,
        }
    }

    impl TestApp {
        async fn send(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut request = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let request = match body {
                Some(body) => request
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string())),
                None => request.body(Body::empty()),
            }
            .unwrap();

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        async fn register(&self, username: &str) -> (String, String) {
            let (status, body) = self
                .send(
                    Method::POST,
                    "/auth/register",
                    None,
                    Some(json!({
                        "username": username,
                        "email": format!("{username}@example.com"),
                        "password": "password123"
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            (
                body["token"].as_str().unwrap().to_string(),
                body["user"]["id"].as_str().unwrap().to_string(),
            )
        }

        async fn create_event(&self, token: &str, name: &str, days_ahead: i64) -> String {
            let date = self.clock_now() + Duration::days(days_ahead);
            let (status, body) = self
                .send(
                    Method::POST,
                    "/events",
                    Some(token),
                    Some(json!({
                        "name": name,
                        "description": "Live music all day",
                        "date": date.to_rfc3339(),
                        "location": "Central Park"
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            body["id"].as_str().unwrap().to_string()
        }

        fn clock_now(&self) -> chrono::DateTime<Utc> {
            use crate::clock::Clock;
            self.clock.now()
        }
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(AppState::default());
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn health_and_docs_are_public() {
        let app = app();
        let (status, body) = app.send(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "UP");

        let (status, _) = app.send(Method::GET, "/health/ready", None, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, doc) = app
            .send(Method::GET, "/api-doc/openapi.json", None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(doc["paths"]["/events/{id}/rsvp"].is_object());
    }

    #[tokio::test]
    async fn organizer_and_attendee_lifecycle() {
        let app = app();
        let (jane, jane_id) = app.register("jane").await;
        let (bob, bob_id) = app.register("bob").await;

        let event = app.create_event(&jane, "Summer Music Festival", 30).await;
        let rsvp_uri = format!("/events/{event}/rsvp");

        let (status, first) = app
            .send(Method::POST, &rsvp_uri, Some(&bob), Some(json!({"status": "maybe"})))
            .await;
        assert_eq!(status, StatusCode::OK, "{first}");
        assert_eq!(first["message"], "RSVP created successfully");
        assert_eq!(first["rsvp"]["status"], "MAYBE");

        let (status, second) = app
            .send(Method::POST, &rsvp_uri, Some(&bob), Some(json!({"status": "attending"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["rsvp"]["id"], first["rsvp"]["id"]);

        let (status, roster) = app.send(Method::GET, &rsvp_uri, Some(&jane), None).await;
        assert_eq!(status, StatusCode::OK);
        let rsvps = roster["rsvps"].as_array().unwrap();
        assert_eq!(rsvps.len(), 1);
        assert_eq!(rsvps[0]["status"], "ATTENDING");
        assert_eq!(rsvps[0]["user"]["id"], bob_id.as_str());

        // Only the organizer sees the roster.
        let (status, _) = app.send(Method::GET, &rsvp_uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, attending) = app
            .send(Method::GET, "/events/attending", Some(&bob), None)
            .await;
        assert_eq!(attending[0]["id"], event.as_str());
        assert_eq!(attending[0]["organizer"]["id"], jane_id.as_str());

        let (status, removed) = app.send(Method::DELETE, &rsvp_uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(removed["message"], "RSVP removed successfully");

        let (_, mine) = app
            .send(Method::GET, &format!("{rsvp_uri}/me"), Some(&bob), None)
            .await;
        assert_eq!(mine, json!({ "rsvpStatus": null }));

        let (_, roster) = app.send(Method::GET, &rsvp_uri, Some(&jane), None).await;
        assert_eq!(roster["rsvps"], json!([]));
    }

    #[tokio::test]
    async fn organizer_cannot_rsvp_and_past_events_are_closed() {
        let app = app();
        let (jane, _) = app.register("jane").await;
        let (bob, _) = app.register("bob").await;
        let event = app.create_event(&jane, "Spring Picnic", 1).await;
        let rsvp_uri = format!("/events/{event}/rsvp");

        let (status, body) = app
            .send(Method::POST, &rsvp_uri, Some(&jane), Some(json!({"status": "attending"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "You cannot RSVP to your own event");

        // Tokens last a day, so log in again after the jump.
        app.clock.advance(Duration::days(2));
        let (status, login) = app
            .send(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({"email": "bob@example.com", "password": "password123"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_ne!(login["token"].as_str().unwrap(), bob);
        let bob = login["token"].as_str().unwrap().to_string();

        let (status, body) = app
            .send(Method::POST, &rsvp_uri, Some(&bob), Some(json!({"status": "attending"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Cannot RSVP to a past event");
    }

    #[tokio::test]
    async fn only_the_organizer_edits_or_deletes() {
        let app = app();
        let (jane, _) = app.register("jane").await;
        let (bob, _) = app.register("bob").await;
        let event = app.create_event(&jane, "Summer Music Festival", 30).await;
        let uri = format!("/events/{event}");
        let update = json!({
            "name": "Summer Music Festival 2030",
            "description": "Two stages",
            "date": "2030-07-15T18:00:00Z",
            "location": "Central Park"
        });

        let (status, body) = app
            .send(Method::PUT, &uri, Some(&bob), Some(update.clone()))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error_code"], "forbidden");

        let (status, body) = app.send(Method::PUT, &uri, Some(&jane), Some(update)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Summer Music Festival 2030");

        let (status, _) = app.send(Method::DELETE, &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app.send(Method::DELETE, &uri, Some(&jane), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Event deleted successfully");

        let (status, _) = app.send(Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn listing_paginates_and_filters() {
        let app = app();
        let (jane, _) = app.register("jane").await;
        for day in 1..=10 {
            app.create_event(&jane, &format!("Meetup {day}"), day).await;
        }

        let (status, body) = app
            .send(Method::GET, "/events?page=0&limit=10", None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["events"].as_array().unwrap().len(), 10);
        assert_eq!(
            body["pagination"],
            json!({
                "totalEvents": 10,
                "totalPages": 1,
                "currentPage": 0,
                "eventsPerPage": 10,
                "hasNextPage": false,
                "hasPrevPage": false
            })
        );

        let (_, body) = app
            .send(Method::GET, "/events?page=1&limit=4", None, None)
            .await;
        assert_eq!(body["pagination"]["totalPages"], 3);
        assert_eq!(body["pagination"]["hasNextPage"], true);
        assert_eq!(body["pagination"]["hasPrevPage"], true);

        let (_, body) = app
            .send(Method::GET, "/events?date=2030-03-04", None, None)
            .await;
        let events = body["events"].as_array().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["name"], "Meetup 3");

        let (_, body) = app
            .send(Method::GET, "/events?name=meetup%201", None, None)
            .await;
        // "Meetup 1" and "Meetup 10".
        assert_eq!(body["pagination"]["totalEvents"], 2);
    }

    #[tokio::test]
    async fn anonymous_and_bad_tokens_are_unauthorized_for_mutations() {
        let app = app();
        let body = json!({
            "name": "Summer Music Festival",
            "description": "Live music",
            "date": "2030-07-15T18:00:00Z",
            "location": "Central Park"
        });

        let (status, err) = app
            .send(Method::POST, "/events", None, Some(body.clone()))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(err["error_code"], "unauthenticated");

        let (status, _) = app
            .send(Method::POST, "/events", Some("not-a-token"), Some(body))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Public reads ignore a broken token.
        let (status, _) = app
            .send(Method::GET, "/events", Some("not-a-token"), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app.send(Method::GET, "/auth/profile", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_input_is_bad_request() {
        let app = app();
        let (jane, _) = app.register("jane").await;

        let (status, body) = app
            .send(Method::GET, "/events?date=tomorrow", None, None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "date");

        let (status, body) = app.send(Method::GET, "/events/not-a-uuid", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "invalid_id");

        let (status, body) = app
            .send(
                Method::POST,
                "/events",
                Some(&jane),
                Some(json!({ "name": "No", "date": "2030-07-15T18:00:00Z" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "validation_failed");
        assert_eq!(body["errors"].as_array().unwrap().len(), 3);

        let (status, body) = app
            .send(
                Method::POST,
                "/events",
                Some(&jane),
                Some(json!({
                    "name": "Yesterday's Party",
                    "description": "Too late",
                    "date": "2030-02-28T18:00:00Z",
                    "location": "Nowhere"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Event date cannot be in the past");
    }

    #[tokio::test]
    async fn expired_token_is_unauthorized() {
        let app = app();
        let (jane, _) = app.register("jane").await;

        let (status, _) = app.send(Method::GET, "/auth/profile", Some(&jane), None).await;
        assert_eq!(status, StatusCode::OK);

        app.clock.advance(Duration::days(1));
        let (status, _) = app.send(Method::GET, "/auth/profile", Some(&jane), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
