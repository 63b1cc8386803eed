use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Utc;

use crate::auth::{is_authorized, validate_jwt};
use crate::database::models::{Role, User};
use crate::database::{SessionRepo, UserRepo};
use crate::error::ApiError;
use crate::state::AppState;

/// Roles allowed to create and mutate posts.
pub const EDITORS: &[Role] = &[Role::Admin, Role::Editor];

/// Authenticated request context: the resolved user plus the presented
/// bearer token (sign-out deletes the session row for it).
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

impl AuthUser {
    pub fn require_role(&self, required: &[Role]) -> Result<(), ApiError> {
        if is_authorized(self.user.role, required) {
            Ok(())
        } else {
            Err(ApiError::forbidden("Forbidden"))
        }
    }
}

/// Extractor that authenticates the request. The signed token must verify
/// and the persisted session row must exist and be unexpired; either check
/// failing alone is enough to reject.
#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(parts)?;

        validate_jwt(&token, &state.config.security.jwt_secret)
            .map_err(|e| ApiError::unauthorized(e.to_string()))?;

        let session = SessionRepo::new(state.pool.clone())
            .find_by_token(&token)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

        if !session.is_live(Utc::now()) {
            return Err(ApiError::unauthorized("Invalid or expired session"));
        }

        let user = UserRepo::new(state.pool.clone())
            .find_by_id(session.user_id)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

        Ok(AuthUser { user, token })
    }
}

/// Extract the token from `Authorization: Bearer <token>`
fn extract_bearer_token(parts: &Parts) -> Result<String, ApiError> {
    let auth_header = parts
        .headers
        .get("authorization")
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header format"))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.to_string()),
        Some(_) => Err(ApiError::unauthorized("Empty bearer token")),
        None => Err(ApiError::unauthorized("Authorization header must use Bearer token format")),
    }
}
