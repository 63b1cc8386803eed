use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

use super::models::{Pillar, Platform, Post, Status};

/// Fully resolved filter predicate over the posts table. Built by the query
/// engine from raw request parameters; the fetch and its matching count are
/// both driven off one instance so they see the same predicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFilter {
    pub status: Option<Status>,
    pub platform: Option<Platform>,
    pub pillar: Option<Pillar>,
    pub assignee_id: Option<Uuid>,
    /// Inclusive lower bound on publish_date
    pub publish_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on publish_date
    pub publish_until: Option<DateTime<Utc>>,
}

impl PostFilter {
    fn apply(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE TRUE");
        if let Some(status) = self.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(platform) = self.platform {
            qb.push(" AND platform = ").push_bind(platform);
        }
        if let Some(pillar) = self.pillar {
            qb.push(" AND pillar = ").push_bind(pillar);
        }
        if let Some(assignee_id) = self.assignee_id {
            qb.push(" AND assignee_id = ").push_bind(assignee_id);
        }
        if let Some(from) = self.publish_from {
            qb.push(" AND publish_date >= ").push_bind(from);
        }
        if let Some(until) = self.publish_until {
            qb.push(" AND publish_date <= ").push_bind(until);
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub description: String,
    pub platform: Option<Platform>,
    pub pillar: Option<Pillar>,
    pub publish_date: DateTime<Utc>,
    pub status: Status,
    pub image_url: Option<String>,
    pub assignee_id: Option<Uuid>,
}

/// Partial update: absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub platform: Option<Platform>,
    pub pillar: Option<Pillar>,
    pub publish_date: Option<DateTime<Utc>>,
    pub status: Option<Status>,
    pub image_url: Option<String>,
    pub assignee_id: Option<Uuid>,
}

/// Typed accessor for the posts table.
pub struct PostRepo {
    pool: PgPool,
}

impl PostRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, sqlx::Error> {
        sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn insert(&self, new: &NewPost) -> Result<Post, sqlx::Error> {
        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts
                (title, description, platform, pillar, publish_date, status, image_url, assignee_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.platform)
        .bind(new.pillar)
        .bind(new.publish_date)
        .bind(new.status)
        .bind(&new.image_url)
        .bind(new.assignee_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update(&self, id: Uuid, patch: &PostPatch) -> Result<Option<Post>, sqlx::Error> {
        sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET title        = COALESCE($2, title),
                description  = COALESCE($3, description),
                platform     = COALESCE($4, platform),
                pillar       = COALESCE($5, pillar),
                publish_date = COALESCE($6, publish_date),
                status       = COALESCE($7, status),
                image_url    = COALESCE($8, image_url),
                assignee_id  = COALESCE($9, assignee_id),
                updated_at   = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.platform)
        .bind(patch.pillar)
        .bind(patch.publish_date)
        .bind(patch.status)
        .bind(&patch.image_url)
        .bind(patch.assignee_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Filtered page, ascending by publish date.
    pub async fn list(
        &self,
        filter: &PostFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, sqlx::Error> {
        let mut qb = QueryBuilder::new("SELECT * FROM posts");
        filter.apply(&mut qb);
        qb.push(" ORDER BY publish_date ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        qb.build_query_as::<Post>().fetch_all(&self.pool).await
    }

    /// Count over the same predicate as `list`.
    pub async fn count(&self, filter: &PostFilter) -> Result<i64, sqlx::Error> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM posts");
        filter.apply(&mut qb);
        qb.build_query_scalar::<i64>().fetch_one(&self.pool).await
    }

    pub async fn comment_counts(
        &self,
        post_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, i64>, sqlx::Error> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            "SELECT post_id, COUNT(*) FROM comments WHERE post_id = ANY($1) GROUP BY post_id",
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }

    // Bulk mutations: one statement each, missing ids silently drop out of
    // the affected count.

    pub async fn bulk_delete(&self, ids: &[Uuid]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn bulk_set_status(&self, ids: &[Uuid], status: Status) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("UPDATE posts SET status = $2, updated_at = now() WHERE id = ANY($1)")
                .bind(ids)
                .bind(status)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    pub async fn bulk_reschedule(
        &self,
        ids: &[Uuid],
        publish_date: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET publish_date = $2, status = 'Scheduled', updated_at = now()
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .bind(publish_date)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    // Analytics aggregates, each over its own predicate.

    pub async fn count_by_status(&self) -> Result<Vec<(Status, i64)>, sqlx::Error> {
        sqlx::query_as("SELECT status, COUNT(*) FROM posts GROUP BY status")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn count_published_by_platform(
        &self,
    ) -> Result<Vec<(Option<Platform>, i64)>, sqlx::Error> {
        sqlx::query_as(
            "SELECT platform, COUNT(*) FROM posts WHERE status = 'Published' GROUP BY platform",
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn count_published_by_pillar(
        &self,
    ) -> Result<Vec<(Option<Pillar>, i64)>, sqlx::Error> {
        sqlx::query_as(
            "SELECT pillar, COUNT(*) FROM posts WHERE status = 'Published' GROUP BY pillar",
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn count_published_since(&self, since: DateTime<Utc>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM posts WHERE status = 'Published' AND publish_date >= $1",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await
    }
}
