use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::{Role, UserProfile};
use crate::database::UserRepo;
use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

/// Profile plus activity counts for the user detail endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub created_at: DateTime<Utc>,
    pub post_count: i64,
    pub comment_count: i64,
}

/// GET /users - admin only
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<UserProfile>>> {
    auth.require_role(&[Role::Admin])?;

    let users = UserRepo::new(state.pool.clone()).list().await?;
    Ok(Json(users.into_iter().map(UserProfile::from).collect()))
}

/// GET /users/:id
pub async fn get_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserDetail>> {
    let repo = UserRepo::new(state.pool.clone());
    let user = repo.find_by_id(id).await?.ok_or_else(|| ApiError::not_found("User not found"))?;
    let (post_count, comment_count) = repo.activity_counts(id).await?;

    Ok(Json(UserDetail {
        profile: UserProfile::from(&user),
        created_at: user.created_at,
        post_count,
        comment_count,
    }))
}

/// PATCH /users/me - update own name or avatar
pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<Json<UserProfile>> {
    if let Some(name) = payload.name.as_deref() {
        let name = name.trim();
        if name.len() < 2 || name.len() > 100 {
            return Err(ApiError::invalid_field("name", "name must be 2-100 characters"));
        }
    }
    if let Some(url) = payload.avatar_url.as_deref() {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ApiError::invalid_field("avatarUrl", "avatarUrl must be a valid URL"));
        }
    }

    let updated = UserRepo::new(state.pool.clone())
        .update_profile(
            auth.user.id,
            payload.name.as_deref().map(str::trim),
            payload.avatar_url.as_deref(),
        )
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(updated.into()))
}

/// PATCH /users/:id/role - the only role mutation path, admin only
pub async fn update_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<Json<UserProfile>> {
    auth.require_role(&[Role::Admin])?;

    let updated = UserRepo::new(state.pool.clone())
        .set_role(id, payload.role)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(updated.into()))
}
