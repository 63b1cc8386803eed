use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::models::{Comment, CommentView, Role, User, UserProfile};
use crate::database::{CommentRepo, MentionRepo, PostRepo, UserRepo};
use crate::error::ApiError;
use crate::mentions::{candidate_names, resolve_handles};
use crate::services::notification_service::{MentionNotification, Notifier};
use crate::state::AppState;

/// A comment may be edited or removed by its author or by an admin.
pub fn can_modify(user: &User, comment: &Comment) -> bool {
    comment.author_id == user.id || user.role == Role::Admin
}

/// Comment engine: creation with mention fan-out, plus ownership-gated
/// update and delete.
pub struct CommentService {
    pool: PgPool,
    notifier: Arc<dyn Notifier>,
}

impl CommentService {
    pub fn new(state: &AppState) -> Self {
        Self { pool: state.pool.clone(), notifier: state.notifier.clone() }
    }

    fn comments(&self) -> CommentRepo {
        CommentRepo::new(self.pool.clone())
    }

    pub async fn create_comment(
        &self,
        post_id: Uuid,
        content: &str,
        author: &User,
    ) -> Result<CommentView, ApiError> {
        let post = PostRepo::new(self.pool.clone())
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Post not found"))?;

        let comment = self.comments().insert(post_id, author.id, content).await?;

        let mentioned = self.record_mentions(&comment).await?;

        // Fan out one notification per mentioned user, detached from the
        // response path; delivery failures stay server-side.
        for recipient in &mentioned {
            let notifier = self.notifier.clone();
            let notification = MentionNotification {
                recipient: recipient.clone(),
                author_name: author.name.clone(),
                post_title: post.title.clone(),
                comment_content: comment.content.clone(),
            };
            tokio::spawn(async move {
                notifier.mention(notification).await;
            });
        }

        Ok(CommentView {
            comment,
            author: Some(UserProfile::from(author)),
            mentions: mentioned,
        })
    }

    /// Resolve @handles in the comment and persist the mention rows.
    async fn record_mentions(&self, comment: &Comment) -> Result<Vec<UserProfile>, ApiError> {
        let candidates = candidate_names(&comment.content);
        if candidates.is_empty() {
            return Ok(vec![]);
        }

        let roster = UserRepo::new(self.pool.clone()).find_by_names(&candidates).await?;
        let resolved = resolve_handles(&comment.content, &roster);
        if resolved.is_empty() {
            return Ok(vec![]);
        }

        let user_ids: Vec<Uuid> = resolved.iter().map(|u| u.id).collect();
        MentionRepo::new(self.pool.clone()).insert_many(comment.id, &user_ids).await?;

        Ok(resolved.into_iter().map(UserProfile::from).collect())
    }

    pub async fn update_comment(
        &self,
        id: Uuid,
        content: &str,
        acting_user: &User,
    ) -> Result<CommentView, ApiError> {
        let existing = self
            .comments()
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Comment not found"))?;

        if !can_modify(acting_user, &existing) {
            return Err(ApiError::forbidden("Forbidden"));
        }

        let comment = self
            .comments()
            .update_content(id, content)
            .await?
            .ok_or_else(|| ApiError::not_found("Comment not found"))?;

        let author = UserRepo::new(self.pool.clone())
            .profiles_by_ids(&[comment.author_id])
            .await?
            .into_iter()
            .next();

        Ok(CommentView { comment, author, mentions: vec![] })
    }

    pub async fn delete_comment(&self, id: Uuid, acting_user: &User) -> Result<(), ApiError> {
        let comment = self
            .comments()
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Comment not found"))?;

        if !can_modify(acting_user, &comment) {
            return Err(ApiError::forbidden("Forbidden"));
        }

        self.comments().delete(id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            email: "u@calendar.local".into(),
            name: "u".into(),
            password_hash: None,
            role,
            avatar_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn comment(author_id: Uuid) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            content: "c".into(),
            post_id: Uuid::new_v4(),
            author_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn author_and_admin_may_modify() {
        let author = user(Role::Viewer);
        let admin = user(Role::Admin);
        let bystander = user(Role::Editor);

        let c = comment(author.id);
        assert!(can_modify(&author, &c));
        assert!(can_modify(&admin, &c));
        assert!(!can_modify(&bystander, &c));
    }
}
