use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::models::{
    CommentView, Pillar, Platform, Post, PostView, Role, Status, User, UserProfile,
};
use crate::database::{CommentRepo, MentionRepo, NewPost, PostFilter, PostPatch, PostRepo, UserRepo};
use crate::error::ApiError;
use crate::state::AppState;

/// Raw list-endpoint query parameters, before filter resolution.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub platform: Option<Platform>,
    pub pillar: Option<Pillar>,
    pub status: Option<Status>,
    pub assignee_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// Calendar date (YYYY-MM-DD); expands to the whole UTC day and forces
    /// status=Scheduled for the day view.
    pub day: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub posts: Vec<PostView>,
    pub pagination: Pagination,
}

/// Single post with its discussion thread.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub assignee: Option<UserProfile>,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub by_status: HashMap<String, i64>,
    pub by_platform: HashMap<String, i64>,
    pub by_pillar: HashMap<String, i64>,
    pub this_month: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
    Delete,
    Publish,
    Draft,
    Reschedule,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkActionData {
    pub publish_date: Option<DateTime<Utc>>,
}

/// Resolve raw query parameters into the effective filter and page window.
///
/// Policy (documented decisions): a `day` filter wins over any explicit
/// status and date range; without a day or status filter the listing
/// defaults to Scheduled; both date bounds are inclusive.
pub fn resolve_filter(query: &PostQuery) -> Result<(PostFilter, i64, i64), ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).max(1);

    let mut filter = PostFilter {
        platform: query.platform,
        pillar: query.pillar,
        assignee_id: query.assignee_id,
        ..Default::default()
    };

    if let Some(day) = &query.day {
        let date = NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .map_err(|_| ApiError::invalid_field("day", "expected a date in YYYY-MM-DD format"))?;
        let start = date.and_time(NaiveTime::MIN).and_utc();
        filter.publish_from = Some(start);
        filter.publish_until = Some(start + Duration::days(1) - Duration::milliseconds(1));
        // Day view shows the schedule; any supplied status is ignored
        filter.status = Some(Status::Scheduled);
    } else {
        filter.status = Some(query.status.unwrap_or(Status::Scheduled));
        filter.publish_from = query.start_date;
        filter.publish_until = query.end_date;
    }

    Ok((filter, page, limit))
}

pub fn pagination_for(page: i64, limit: i64, total: i64) -> Pagination {
    let pages = (total + limit - 1) / limit;
    Pagination { page, limit, total, pages }
}

/// Ownership rule for deletion: admins delete anything; editors only posts
/// assigned to them or unassigned. Posts carry no creator column, so the
/// assignee stands in for the owner.
pub fn can_delete(user: &User, post: &Post) -> bool {
    match user.role {
        Role::Admin => true,
        _ => post.assignee_id.map_or(true, |assignee| assignee == user.id),
    }
}

/// Post query, mutation and analytics engine.
pub struct PostService {
    pool: PgPool,
}

impl PostService {
    pub fn new(state: &AppState) -> Self {
        Self { pool: state.pool.clone() }
    }

    fn posts(&self) -> PostRepo {
        PostRepo::new(self.pool.clone())
    }

    fn users(&self) -> UserRepo {
        UserRepo::new(self.pool.clone())
    }

    /// Filtered, paginated listing. The page fetch and its count run
    /// concurrently over the same filter snapshot.
    pub async fn list_posts(&self, query: &PostQuery) -> Result<PostListResponse, ApiError> {
        let (filter, page, limit) = resolve_filter(query)?;
        let offset = (page - 1) * limit;

        let repo = self.posts();
        let count_repo = self.posts();
        let (items, total) =
            tokio::try_join!(repo.list(&filter, limit, offset), count_repo.count(&filter))?;

        let posts = self.assemble_views(items).await?;
        Ok(PostListResponse { posts, pagination: pagination_for(page, limit, total) })
    }

    async fn assemble_views(&self, items: Vec<Post>) -> Result<Vec<PostView>, ApiError> {
        let assignee_ids: Vec<Uuid> = {
            let mut ids: Vec<Uuid> = items.iter().filter_map(|p| p.assignee_id).collect();
            ids.sort();
            ids.dedup();
            ids
        };
        let post_ids: Vec<Uuid> = items.iter().map(|p| p.id).collect();

        let users = self.users();
        let posts = self.posts();
        let (profiles, comment_counts) = tokio::try_join!(
            users.profiles_by_ids(&assignee_ids),
            posts.comment_counts(&post_ids),
        )?;
        let profiles: HashMap<Uuid, UserProfile> =
            profiles.into_iter().map(|p| (p.id, p)).collect();

        Ok(items
            .into_iter()
            .map(|post| {
                let assignee = post.assignee_id.and_then(|id| profiles.get(&id).cloned());
                let comment_count = comment_counts.get(&post.id).copied().unwrap_or(0);
                PostView { post, assignee, comment_count }
            })
            .collect())
    }

    pub async fn get_post(&self, id: Uuid) -> Result<PostDetail, ApiError> {
        let post = self
            .posts()
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Post not found"))?;

        let comments = CommentRepo::new(self.pool.clone()).list_for_post(id).await?;
        let comment_ids: Vec<Uuid> = comments.iter().map(|c| c.id).collect();
        let mentions = MentionRepo::new(self.pool.clone()).list_for_comments(&comment_ids).await?;

        // One profile fetch covers the assignee, comment authors and mentioned users
        let mut profile_ids: Vec<Uuid> = comments.iter().map(|c| c.author_id).collect();
        profile_ids.extend(mentions.iter().map(|m| m.user_id));
        profile_ids.extend(post.assignee_id);
        profile_ids.sort();
        profile_ids.dedup();
        let profiles: HashMap<Uuid, UserProfile> = self
            .users()
            .profiles_by_ids(&profile_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let comment_views = comments
            .into_iter()
            .map(|comment| {
                let author = profiles.get(&comment.author_id).cloned();
                let mentioned = mentions
                    .iter()
                    .filter(|m| m.comment_id == comment.id)
                    .filter_map(|m| profiles.get(&m.user_id).cloned())
                    .collect();
                CommentView { comment, author, mentions: mentioned }
            })
            .collect();

        let assignee = post.assignee_id.and_then(|id| profiles.get(&id).cloned());
        Ok(PostDetail { post, assignee, comments: comment_views })
    }

    /// Create a post; a missing status defaults by publish date (past dates
    /// are already out the door).
    pub async fn create_post(
        &self,
        mut new: NewPost,
        explicit_status: Option<Status>,
    ) -> Result<PostView, ApiError> {
        let status =
            explicit_status.unwrap_or_else(|| Status::default_for(new.publish_date, Utc::now()));
        new.status = status;
        let post = self.posts().insert(&new).await?;
        let views = self.assemble_views(vec![post]).await?;
        views
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::internal_server_error("Failed to load created post"))
    }

    pub async fn update_post(&self, id: Uuid, patch: &PostPatch) -> Result<PostView, ApiError> {
        let post = self
            .posts()
            .update(id, patch)
            .await?
            .ok_or_else(|| ApiError::not_found("Post not found"))?;
        let views = self.assemble_views(vec![post]).await?;
        views
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::internal_server_error("Failed to load updated post"))
    }

    pub async fn delete_post(&self, id: Uuid, acting_user: &User) -> Result<(), ApiError> {
        let post = self
            .posts()
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Post not found"))?;

        if !can_delete(acting_user, &post) {
            return Err(ApiError::forbidden("Forbidden"));
        }

        self.posts().delete(id).await?;
        Ok(())
    }

    /// One action across a set of post ids; each maps to a single bulk
    /// statement, so ids that do not exist silently drop out of the affected
    /// count.
    pub async fn apply_bulk_action(
        &self,
        post_ids: &[Uuid],
        action: BulkAction,
        data: &BulkActionData,
    ) -> Result<u64, ApiError> {
        let repo = self.posts();
        let affected = match action {
            BulkAction::Delete => repo.bulk_delete(post_ids).await?,
            BulkAction::Publish => repo.bulk_set_status(post_ids, Status::Published).await?,
            BulkAction::Draft => repo.bulk_set_status(post_ids, Status::Draft).await?,
            BulkAction::Reschedule => {
                let publish_date = data.publish_date.ok_or_else(|| {
                    ApiError::invalid_field("publishDate", "publishDate required for reschedule")
                })?;
                repo.bulk_reschedule(post_ids, publish_date).await?
            }
        };
        Ok(affected)
    }

    /// Four independent aggregates, issued concurrently.
    pub async fn analytics_summary(&self) -> Result<AnalyticsSummary, ApiError> {
        let since = start_of_month(Utc::now());
        let repo = self.posts();
        let (by_status, by_platform, by_pillar, this_month) = tokio::try_join!(
            repo.count_by_status(),
            repo.count_published_by_platform(),
            repo.count_published_by_pillar(),
            repo.count_published_since(since),
        )?;

        Ok(AnalyticsSummary {
            by_status: by_status.into_iter().map(|(s, n)| (enum_key(&s), n)).collect(),
            by_platform: by_platform
                .into_iter()
                .filter_map(|(p, n)| p.map(|p| (enum_key(&p), n)))
                .collect(),
            by_pillar: by_pillar
                .into_iter()
                .filter_map(|(p, n)| p.map(|p| (enum_key(&p), n)))
                .collect(),
            this_month,
        })
    }
}

/// First instant of the current UTC calendar month.
fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

/// JSON name of an enum variant, used as an aggregate map key.
fn enum_key<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}
