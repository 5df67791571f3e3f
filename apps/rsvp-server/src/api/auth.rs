// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::Caller,
    error::{ApiError, ErrorBody},
    models::User,
    service::{AuthOutcome, FieldError},
    state::AppState,
};

/// Public view of a user. Never carries the secret hash.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.into(),
            username: user.handle,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserResponse,
    pub token: String,
}

impl AuthResponse {
    fn new(message: &str, outcome: AuthOutcome) -> Self {
        Self {
            message: message.to_string(),
            user: outcome.user.into(),
            token: outcome.token,
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    tag = "Auth",
    responses(
        (status = 201, body = AuthResponse),
        (status = 400, body = ErrorBody)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(request) = body?;
    // Secret hashing is CPU-bound; keep it off the async workers.
    let accounts = state.accounts.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        accounts.register(&request.username, &request.email, &request.password)
    })
    .await??;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse::new("User registered successfully", outcome)),
    ))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    tag = "Auth",
    responses(
        (status = 200, body = AuthResponse),
        (status = 400, body = ErrorBody),
        (status = 401, body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(request) = body?;

    let mut missing = Vec::new();
    if request.email.trim().is_empty() {
        missing.push(FieldError::new("email", "Email is required"));
    }
    if request.password.is_empty() {
        missing.push(FieldError::new("password", "Password is required"));
    }
    if !missing.is_empty() {
        return Err(ApiError::invalid_fields(missing));
    }

    let accounts = state.accounts.clone();
    let outcome =
        tokio::task::spawn_blocking(move || accounts.login(&request.email, &request.password))
            .await??;
    Ok(Json(AuthResponse::new("Login successful", outcome)))
}

#[utoipa::path(
    get,
    path = "/auth/profile",
    tag = "Auth",
    responses(
        (status = 200, body = UserResponse),
        (status = 401, body = ErrorBody)
    )
)]
pub async fn profile(
    State(state): State<AppState>,
    Caller(identity): Caller,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.accounts.profile(&identity)?;
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Identity;

    fn registration(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
        }
    }

    #[tokio::test]
    async fn register_then_login() {
        let state = AppState::default();

        let (status, Json(registered)) = register(
            State(state.clone()),
            Ok(Json(registration("jane", "jane@example.com"))),
        )
        .await
        .expect("registration succeeds");
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(registered.message, "User registered successfully");
        assert_eq!(registered.user.username, "jane");

        let Json(logged_in) = login(
            State(state),
            Ok(Json(LoginRequest {
                email: "jane@example.com".to_string(),
                password: "password123".to_string(),
            })),
        )
        .await
        .expect("login succeeds");
        assert_eq!(logged_in.message, "Login successful");
        assert_eq!(logged_in.user.id, registered.user.id);
    }

    #[tokio::test]
    async fn login_with_blank_fields_is_bad_request() {
        let err = login(State(AppState::default()), Ok(Json(LoginRequest::default())))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.errors.len(), 2);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let state = AppState::default();
        register(
            State(state.clone()),
            Ok(Json(registration("jane", "jane@example.com"))),
        )
        .await
        .unwrap();

        let err = login(
            State(state),
            Ok(Json(LoginRequest {
                email: "jane@example.com".to_string(),
                password: "not-the-password".to_string(),
            })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.message, "Invalid email or password");
    }

    #[tokio::test]
    async fn duplicate_registration_surfaces_through_the_blocking_pool() {
        let state = AppState::default();
        register(
            State(state.clone()),
            Ok(Json(registration("jane", "jane@example.com"))),
        )
        .await
        .unwrap();

        let err = register(
            State(state),
            Ok(Json(registration("jane2", "JANE@example.com"))),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Email is already registered");
    }

    #[tokio::test]
    async fn anonymous_profile_is_unauthorized() {
        let err = profile(State(AppState::default()), Caller(Identity::Anonymous))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }
}
