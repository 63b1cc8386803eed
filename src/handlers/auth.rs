use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::config::AuthMode;
use crate::database::models::UserProfile;
use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::services::session_service::SessionService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Endpoints of the inactive auth mode are absent from this deployment.
fn require_mode(state: &AppState, mode: AuthMode) -> Result<(), ApiError> {
    if state.config.security.auth_mode == mode {
        Ok(())
    } else {
        Err(ApiError::not_found("Not found"))
    }
}

/// POST /auth/login - name-only login, creating the user on first sight
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    require_mode(&state, AuthMode::NameOnly)?;

    let name = payload.name.trim();
    if name.len() < 2 || name.len() > 100 {
        return Err(ApiError::invalid_field("name", "name must be 2-100 characters"));
    }

    let (token, user) = SessionService::new(&state).login_by_name(name).await?;
    Ok(Json(AuthResponse { token, user: user.into() }))
}

/// POST /auth/signup - credentialed account creation
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> ApiResult<Json<AuthResponse>> {
    require_mode(&state, AuthMode::Credentials)?;
    validate_signup(&payload)?;

    let (token, user) = SessionService::new(&state)
        .sign_up(payload.email.trim(), &payload.password, payload.name.trim())
        .await?;
    Ok(Json(AuthResponse { token, user: user.into() }))
}

/// POST /auth/signin
pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> ApiResult<Json<AuthResponse>> {
    require_mode(&state, AuthMode::Credentials)?;

    let (token, user) =
        SessionService::new(&state).sign_in(payload.email.trim(), &payload.password).await?;
    Ok(Json(AuthResponse { token, user: user.into() }))
}

/// POST /auth/signout - delete the presented session
pub async fn sign_out(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Value>> {
    SessionService::new(&state).sign_out(&auth.token).await?;
    Ok(Json(json!({ "success": true })))
}

/// GET /auth/me
pub async fn me(auth: AuthUser) -> Json<UserProfile> {
    Json(auth.user.into())
}

fn validate_signup(payload: &SignUpRequest) -> Result<(), ApiError> {
    let mut field_errors = HashMap::new();

    if !looks_like_email(payload.email.trim()) {
        field_errors.insert("email".to_string(), "invalid email address".to_string());
    }
    if payload.password.len() < 8 || payload.password.len() > 100 {
        field_errors.insert("password".to_string(), "password must be 8-100 characters".to_string());
    }
    let name = payload.name.trim();
    if name.len() < 2 || name.len() > 100 {
        field_errors.insert("name".to_string(), "name must be 2-100 characters".to_string());
    }

    if field_errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation_error("Validation failed", Some(field_errors)))
    }
}

fn looks_like_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape_check() {
        assert!(looks_like_email("jane@example.com"));
        assert!(!looks_like_email("jane"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("jane@com"));
        assert!(!looks_like_email("jane@.com"));
    }

    #[test]
    fn short_password_fails_validation() {
        let payload = SignUpRequest {
            email: "jane@example.com".into(),
            password: "short".into(),
            name: "Jane".into(),
        };
        let err = validate_signup(&payload).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_json()["field_errors"]["password"].is_string());
    }
}
