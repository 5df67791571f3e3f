// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! The gate runs on every request. It never rejects: a missing, malformed,
//! expired or orphaned token leaves the request [`Identity::Anonymous`], and
//! operations that need a user refuse it later. Handlers read the outcome
//! with the [`Caller`](super::Caller) extractor.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderName,
    middleware::Next,
    response::Response,
};

use super::{AuthenticatedUser, Identity, TokenCodec};
use crate::clock::Clock;
use crate::models::UserId;
use crate::storage::CredentialStore;

/// Resolves the caller identity from a bearer header.
#[derive(Clone)]
pub struct AuthenticationGate {
    codec: TokenCodec,
    credentials: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
    header: HeaderName,
    prefix: String,
}

impl AuthenticationGate {
    pub fn new(
        codec: TokenCodec,
        credentials: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
        header: HeaderName,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            codec,
            credentials,
            clock,
            header,
            prefix: prefix.into(),
        }
    }

    /// Name of the header carrying the token.
    pub fn header_name(&self) -> &HeaderName {
        &self.header
    }

    /// Turn a raw header value into an identity.
    ///
    /// Costs one credential lookup when the token decodes.
    pub fn resolve(&self, header: Option<&str>) -> Identity {
        let Some(value) = header else {
            return Identity::Anonymous;
        };
        let Some(token) = value.strip_prefix(self.prefix.as_str()) else {
            tracing::debug!(header = %self.header, "auth header without expected prefix");
            return Identity::Anonymous;
        };

        let claims = match self.codec.decode_at(token.trim(), self.clock.now()) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(reason = e.error_code(), "token rejected");
                return Identity::Anonymous;
            }
        };

        let Ok(user_id) = claims.sub.parse::<UserId>() else {
            tracing::debug!(sub = %claims.sub, "token subject is not a user id");
            return Identity::Anonymous;
        };

        match self.credentials.find_user(user_id) {
            Ok(Some(user)) if user.id == user_id => {
                let expires_at = chrono::DateTime::from_timestamp(claims.exp, 0)
                    .unwrap_or_else(|| self.clock.now());
                Identity::Authenticated(AuthenticatedUser::new(user, expires_at))
            }
            Ok(_) => {
                tracing::debug!(user_id = %user_id, "token subject no longer exists");
                Identity::Anonymous
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "credential lookup failed");
                Identity::Anonymous
            }
        }
    }
}

/// Authentication middleware function.
///
/// Install with `axum::middleware::from_fn_with_state(gate, authenticate)`.
pub async fn authenticate(
    State(gate): State<AuthenticationGate>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = {
        let header = request
            .headers()
            .get(gate.header_name())
            .and_then(|value| value.to_str().ok());
        gate.resolve(header)
    };

    if let Identity::Authenticated(caller) = &identity {
        tracing::debug!(user_id = %caller.user.id, "request authenticated");
    }

    request.extensions_mut().insert(identity);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Caller;
    use crate::clock::FixedClock;
    use crate::models::NewUser;
    use crate::storage::MemoryStore;
    use axum::{body::Body, http::header::AUTHORIZATION, routing::get, Router};
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use tower::ServiceExt;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap()
    }

    struct Fixture {
        gate: AuthenticationGate,
        codec: TokenCodec,
        clock: FixedClock,
        jane: crate::models::User,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let jane = store
            .save_user(
                NewUser {
                    handle: "jane".to_string(),
                    email: "jane@example.com".to_string(),
                    secret_hash: "hash".to_string(),
                },
                t0(),
            )
            .unwrap();
        let codec = TokenCodec::new(b"gate-test-secret", Duration::hours(1));
        let clock = FixedClock::new(t0());
        let gate = AuthenticationGate::new(
            codec.clone(),
            store,
            Arc::new(clock.clone()),
            AUTHORIZATION,
            "Bearer ",
        );
        Fixture {
            gate,
            codec,
            clock,
            jane,
        }
    }

    #[test]
    fn valid_token_authenticates() {
        let f = fixture();
        let token = f.codec.issue_at(&f.jane, t0()).unwrap();

        match f.gate.resolve(Some(&format!("Bearer {token}"))) {
            Identity::Authenticated(caller) => {
                assert_eq!(caller.user, f.jane);
                assert_eq!(caller.expires_at, t0() + Duration::hours(1));
            }
            Identity::Anonymous => panic!("expected authenticated identity"),
        }
    }

    #[test]
    fn missing_header_is_anonymous() {
        assert_eq!(fixture().gate.resolve(None), Identity::Anonymous);
    }

    #[test]
    fn wrong_prefix_is_anonymous() {
        let f = fixture();
        let token = f.codec.issue_at(&f.jane, t0()).unwrap();
        assert_eq!(
            f.gate.resolve(Some(&format!("Token {token}"))),
            Identity::Anonymous
        );
        assert_eq!(f.gate.resolve(Some(&token)), Identity::Anonymous);
    }

    #[test]
    fn garbage_token_is_anonymous() {
        let f = fixture();
        assert_eq!(f.gate.resolve(Some("Bearer garbage")), Identity::Anonymous);
        assert_eq!(f.gate.resolve(Some("Bearer ")), Identity::Anonymous);
    }

    #[test]
    fn tampered_token_is_anonymous() {
        let f = fixture();
        let token = f.codec.issue_at(&f.jane, t0()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let mut payload: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
        payload["exp"] = serde_json::json!(t0().timestamp() + 365 * 24 * 3600);
        let forged = format!(
            "{}.{}.{}",
            parts[0],
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap()),
            parts[2]
        );

        assert_eq!(
            f.gate.resolve(Some(&format!("Bearer {forged}"))),
            Identity::Anonymous
        );
    }

    #[test]
    fn expired_token_is_anonymous() {
        let f = fixture();
        let token = f.codec.issue_at(&f.jane, t0()).unwrap();
        f.clock.advance(Duration::hours(1));
        assert_eq!(
            f.gate.resolve(Some(&format!("Bearer {token}"))),
            Identity::Anonymous
        );
    }

    #[test]
    fn token_of_unknown_user_is_anonymous() {
        let f = fixture();
        let ghost = crate::models::User {
            id: UserId::new(),
            handle: "ghost".to_string(),
            email: "ghost@example.com".to_string(),
            secret_hash: "hash".to_string(),
            created_at: t0(),
        };
        let token = f.codec.issue_at(&ghost, t0()).unwrap();
        assert_eq!(
            f.gate.resolve(Some(&format!("Bearer {token}"))),
            Identity::Anonymous
        );
    }

    async fn whoami(Caller(identity): Caller) -> String {
        match identity.user() {
            Some(user) => user.handle.clone(),
            None => "anonymous".to_string(),
        }
    }

    async fn call(router: Router, header: Option<String>) -> String {
        let mut request = axum::http::Request::builder().uri("/whoami");
        if let Some(value) = header {
            request = request.header(AUTHORIZATION, value);
        }
        let response = router
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn middleware_attaches_identity() {
        let f = fixture();
        let token = f.codec.issue_at(&f.jane, t0()).unwrap();
        let router = Router::new()
            .route("/whoami", get(whoami))
            .layer(axum::middleware::from_fn_with_state(
                f.gate.clone(),
                authenticate,
            ));

        assert_eq!(
            call(router.clone(), Some(format!("Bearer {token}"))).await,
            "jane"
        );
        assert_eq!(call(router.clone(), None).await, "anonymous");
        assert_eq!(
            call(router, Some("Bearer nope".to_string())).await,
            "anonymous"
        );
    }
}
