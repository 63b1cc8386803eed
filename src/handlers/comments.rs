use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::CommentView;
use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::services::comment_service::CommentService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub content: String,
    pub post_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

fn validate_content(content: &str) -> Result<(), ApiError> {
    if content.is_empty() || content.len() > 1000 {
        return Err(ApiError::invalid_field("content", "content must be 1-1000 characters"));
    }
    Ok(())
}

/// POST /comments
pub async fn create_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentView>)> {
    validate_content(&payload.content)?;

    let view = CommentService::new(&state)
        .create_comment(payload.post_id, &payload.content, &auth.user)
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// PATCH /comments/:id - author or admin only
pub async fn update_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCommentRequest>,
) -> ApiResult<Json<CommentView>> {
    validate_content(&payload.content)?;

    let view = CommentService::new(&state)
        .update_comment(id, &payload.content, &auth.user)
        .await?;
    Ok(Json(view))
}

/// DELETE /comments/:id - author or admin only
pub async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    CommentService::new(&state).delete_comment(id, &auth.user).await?;
    Ok(StatusCode::NO_CONTENT)
}
