use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::models::{Pillar, Platform, PostView, Status};
use crate::database::{NewPost, PostPatch};
use crate::error::{ApiError, ApiResult};
use crate::middleware::{AuthUser, EDITORS};
use crate::services::post_service::{
    AnalyticsSummary, BulkAction, BulkActionData, PostDetail, PostListResponse, PostQuery,
    PostService,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub description: String,
    pub platform: Option<Platform>,
    pub pillar: Option<Pillar>,
    pub publish_date: DateTime<Utc>,
    pub status: Option<Status>,
    pub image_url: Option<String>,
    pub assignee_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub platform: Option<Platform>,
    pub pillar: Option<Pillar>,
    pub publish_date: Option<DateTime<Utc>>,
    pub status: Option<Status>,
    pub image_url: Option<String>,
    pub assignee_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRequest {
    pub post_ids: Vec<Uuid>,
    pub action: BulkAction,
    #[serde(default)]
    pub data: Option<BulkActionData>,
}

/// GET /posts - filtered, paginated listing
pub async fn list_posts(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<PostQuery>,
) -> ApiResult<Json<PostListResponse>> {
    let response = PostService::new(&state).list_posts(&query).await?;
    Ok(Json(response))
}

/// GET /posts/:id - single post with its discussion thread
pub async fn get_post(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PostDetail>> {
    let detail = PostService::new(&state).get_post(id).await?;
    Ok(Json(detail))
}

/// POST /posts
pub async fn create_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<PostView>)> {
    auth.require_role(EDITORS)?;
    validate_post_fields(
        Some(payload.title.as_str()),
        Some(payload.description.as_str()),
        payload.image_url.as_deref(),
    )?;

    let new = NewPost {
        title: payload.title.trim().to_string(),
        description: payload.description,
        platform: payload.platform,
        pillar: payload.pillar,
        publish_date: payload.publish_date,
        // Filled by the engine from the explicit status or the date rule
        status: Status::Scheduled,
        image_url: normalize_url(payload.image_url),
        assignee_id: payload.assignee_id,
    };

    let view = PostService::new(&state).create_post(new, payload.status).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// PATCH /posts/:id
pub async fn update_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> ApiResult<Json<PostView>> {
    auth.require_role(EDITORS)?;
    validate_post_fields(
        payload.title.as_deref(),
        payload.description.as_deref(),
        payload.image_url.as_deref(),
    )?;

    let patch = PostPatch {
        title: payload.title.map(|t| t.trim().to_string()),
        description: payload.description,
        platform: payload.platform,
        pillar: payload.pillar,
        publish_date: payload.publish_date,
        status: payload.status,
        image_url: normalize_url(payload.image_url),
        assignee_id: payload.assignee_id,
    };

    let view = PostService::new(&state).update_post(id, &patch).await?;
    Ok(Json(view))
}

/// DELETE /posts/:id
pub async fn delete_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    auth.require_role(EDITORS)?;
    PostService::new(&state).delete_post(id, &auth.user).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /posts/bulk - one action across a set of post ids
pub async fn bulk_action(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<BulkRequest>,
) -> ApiResult<Json<Value>> {
    auth.require_role(EDITORS)?;
    if payload.post_ids.is_empty() {
        return Err(ApiError::invalid_field("postIds", "at least one post id is required"));
    }

    let data = payload.data.unwrap_or_default();
    let affected = PostService::new(&state)
        .apply_bulk_action(&payload.post_ids, payload.action, &data)
        .await?;

    Ok(Json(json!({ "success": true, "affected": affected })))
}

/// GET /posts/analytics/summary
pub async fn analytics_summary(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> ApiResult<Json<AnalyticsSummary>> {
    let summary = PostService::new(&state).analytics_summary().await?;
    Ok(Json(summary))
}

fn validate_post_fields(
    title: Option<&str>,
    description: Option<&str>,
    image_url: Option<&str>,
) -> Result<(), ApiError> {
    let mut field_errors = HashMap::new();

    if let Some(title) = title {
        let title = title.trim();
        if title.is_empty() || title.len() > 200 {
            field_errors.insert("title".to_string(), "title must be 1-200 characters".to_string());
        }
    }
    if let Some(description) = description {
        if description.is_empty() {
            field_errors.insert("description".to_string(), "description is required".to_string());
        }
    }
    if let Some(url) = image_url {
        // Empty string clears nothing and is accepted
        if !url.is_empty() && !(url.starts_with("http://") || url.starts_with("https://")) {
            field_errors.insert("imageUrl".to_string(), "imageUrl must be a valid URL".to_string());
        }
    }

    if field_errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation_error("Validation failed", Some(field_errors)))
    }
}

fn normalize_url(url: Option<String>) -> Option<String> {
    url.filter(|u| !u.is_empty())
}
